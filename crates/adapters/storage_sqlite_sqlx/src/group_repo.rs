//! `SQLite` implementation of [`GroupRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};

use sitehub_app::ports::GroupRepository;
use sitehub_domain::error::SiteHubError;
use sitehub_domain::group::{Group, GroupQuery, GroupRelation, GroupSummary};
use sitehub_domain::id::{GroupId, SiteId};
use sitehub_domain::site::SiteSummary;

use crate::error::{StorageError, decode};
use crate::query::{fetch_links, push_filters, push_in, push_sort};

/// Wrapper for converting database rows into domain [`Group`].
struct Wrapper(Group);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let group_type: String = row.try_get("type")?;

        Ok(Self(Group {
            id: decode(&id)?,
            name,
            group_type: decode(&group_type)?,
            child_groups: Vec::new(),
            sites: Vec::new(),
        }))
    }
}

const INSERT: &str = r#"INSERT INTO "groups" (id, name, type) VALUES (?, ?, ?)"#;
const SELECT: &str = r#"SELECT id, name, type FROM "groups""#;
const SELECT_BY_ID: &str = r#"SELECT id, name, type FROM "groups" WHERE id = ?"#;
const UPDATE: &str = r#"UPDATE "groups" SET name = ?, type = ? WHERE id = ?"#;
const DELETE_BY_ID: &str = r#"DELETE FROM "groups" WHERE id = ?"#;

const INSERT_CHILD: &str =
    "INSERT INTO group_children (parent_group_id, child_group_id) VALUES (?, ?)";
const DELETE_CHILDREN: &str = "DELETE FROM group_children WHERE parent_group_id = ?";
const INSERT_SITE: &str = "INSERT INTO site_groups (site_id, group_id) VALUES (?, ?)";
const DELETE_SITES: &str = "DELETE FROM site_groups WHERE group_id = ?";

const SELECT_CHILD_LINKS: &str = r#"SELECT link.parent_group_id, child.id, child.name
FROM group_children link JOIN "groups" child ON child.id = link.child_group_id
WHERE link.parent_group_id"#;
const SELECT_SITE_LINKS: &str = "SELECT link.group_id, site.id, site.name
FROM site_groups link JOIN sites site ON site.id = link.site_id
WHERE link.group_id";

/// `SQLite`-backed group repository.
pub struct SqliteGroupRepository {
    pool: SqlitePool,
}

impl SqliteGroupRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn insert_links(
    tx: &mut sqlx::SqliteConnection,
    group: &Group,
) -> Result<(), sqlx::Error> {
    let group_id = group.id.to_string();
    for child in &group.child_groups {
        sqlx::query(INSERT_CHILD)
            .bind(&group_id)
            .bind(child.id.to_string())
            .execute(&mut *tx)
            .await?;
    }
    for site in &group.sites {
        sqlx::query(INSERT_SITE)
            .bind(site.id.to_string())
            .bind(&group_id)
            .execute(&mut *tx)
            .await?;
    }
    Ok(())
}

/// Load the requested relations of every group in two batched queries at most.
async fn load_relations(
    pool: &SqlitePool,
    groups: &mut [Group],
    children: bool,
    sites: bool,
) -> Result<(), sqlx::Error> {
    let ids: Vec<String> = groups.iter().map(|g| g.id.to_string()).collect();
    if children {
        let mut links = fetch_links::<GroupId>(pool, SELECT_CHILD_LINKS, &ids).await?;
        for group in groups.iter_mut() {
            group.child_groups = links
                .remove(&group.id.to_string())
                .unwrap_or_default()
                .into_iter()
                .map(|(id, name)| GroupSummary { id, name })
                .collect();
        }
    }
    if sites {
        let mut links = fetch_links::<SiteId>(pool, SELECT_SITE_LINKS, &ids).await?;
        for group in groups.iter_mut() {
            group.sites = links
                .remove(&group.id.to_string())
                .unwrap_or_default()
                .into_iter()
                .map(|(id, name)| SiteSummary { id, name })
                .collect();
        }
    }
    Ok(())
}

impl GroupRepository for SqliteGroupRepository {
    fn create(&self, group: Group) -> impl Future<Output = Result<Group, SiteHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let mut tx = pool.begin().await.map_err(StorageError::from)?;

            sqlx::query(INSERT)
                .bind(group.id.to_string())
                .bind(&group.name)
                .bind(group.group_type.as_str())
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
            insert_links(&mut tx, &group)
                .await
                .map_err(StorageError::from)?;

            tx.commit().await.map_err(StorageError::from)?;
            Ok(group)
        }
    }

    fn get_by_id(
        &self,
        id: GroupId,
    ) -> impl Future<Output = Result<Option<Group>, SiteHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            let Some(Wrapper(group)) = row else {
                return Ok(None);
            };
            let mut groups = [group];
            load_relations(&pool, &mut groups, true, true)
                .await
                .map_err(StorageError::from)?;
            let [group] = groups;
            Ok(Some(group))
        }
    }

    fn find_by_ids(
        &self,
        ids: &[GroupId],
    ) -> impl Future<Output = Result<Vec<Group>, SiteHubError>> + Send {
        let pool = self.pool.clone();
        let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
        async move {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            let mut builder = QueryBuilder::<Sqlite>::new(SELECT);
            builder.push(" WHERE id");
            push_in(&mut builder, &ids);

            let rows: Vec<Wrapper> = builder
                .build_query_as()
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn list(
        &self,
        query: &GroupQuery,
    ) -> impl Future<Output = Result<Vec<Group>, SiteHubError>> + Send {
        let pool = self.pool.clone();
        let mut builder = QueryBuilder::<Sqlite>::new(SELECT);
        push_filters(&mut builder, query.filters());
        push_sort(&mut builder, query.sort());
        let children = query.loads(GroupRelation::ChildGroups);
        let sites = query.loads(GroupRelation::Sites);
        async move {
            let rows: Vec<Wrapper> = builder
                .build_query_as()
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            let mut groups: Vec<Group> = rows.into_iter().map(|w| w.0).collect();
            load_relations(&pool, &mut groups, children, sites)
                .await
                .map_err(StorageError::from)?;
            Ok(groups)
        }
    }

    fn update(&self, group: Group) -> impl Future<Output = Result<Group, SiteHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let mut tx = pool.begin().await.map_err(StorageError::from)?;
            let id = group.id.to_string();

            sqlx::query(UPDATE)
                .bind(&group.name)
                .bind(group.group_type.as_str())
                .bind(&id)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
            for statement in [DELETE_CHILDREN, DELETE_SITES] {
                sqlx::query(statement)
                    .bind(&id)
                    .execute(&mut *tx)
                    .await
                    .map_err(StorageError::from)?;
            }
            insert_links(&mut tx, &group)
                .await
                .map_err(StorageError::from)?;

            tx.commit().await.map_err(StorageError::from)?;
            Ok(group)
        }
    }

    fn delete(&self, id: GroupId) -> impl Future<Output = Result<(), SiteHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(DELETE_BY_ID)
                .bind(id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use sitehub_app::ports::SiteRepository;
    use sitehub_domain::group::{GroupField, GroupType};
    use sitehub_domain::query::SortOrder;
    use sitehub_domain::site::{Site, SiteVariant};

    use super::*;
    use crate::pool::Config;
    use crate::site_repo::SqliteSiteRepository;

    async fn setup() -> (SqliteGroupRepository, SqliteSiteRepository) {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        (
            SqliteGroupRepository::new(db.pool().clone()),
            SqliteSiteRepository::new(db.pool().clone()),
        )
    }

    fn group(name: &str, group_type: GroupType) -> Group {
        Group::builder()
            .name(name)
            .group_type(group_type)
            .build()
            .unwrap()
    }

    fn site(name: &str) -> Site {
        Site::builder()
            .name(name)
            .installation_date(NaiveDate::from_ymd_opt(2023, 6, 17).unwrap())
            .power_megawatt(5.0, 30.0)
            .variant(SiteVariant::Italian { efficiency: 0.9 })
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_create_and_retrieve_group_with_relations() {
        let (groups, sites) = setup().await;
        let child = groups.create(group("Child", GroupType::Group2)).await.unwrap();
        let linked = sites.create(site("Farm")).await.unwrap();

        let mut parent = group("Parent", GroupType::Group1);
        parent.child_groups = vec![child.summary()];
        parent.sites = vec![linked.summary()];
        let parent = groups.create(parent).await.unwrap();

        let fetched = groups.get_by_id(parent.id).await.unwrap().unwrap();
        assert_eq!(fetched, parent);
    }

    #[tokio::test]
    async fn should_return_none_when_group_not_found() {
        let (groups, _) = setup().await;
        assert!(groups.get_by_id(GroupId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_find_only_existing_ids() {
        let (groups, _) = setup().await;
        let a = groups.create(group("A", GroupType::Group1)).await.unwrap();

        let found = groups.find_by_ids(&[a.id, GroupId::new()]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, a.id);
    }

    #[tokio::test]
    async fn should_filter_sort_and_load_requested_relations_only() {
        let (groups, _) = setup().await;
        let child = groups.create(group("Child", GroupType::Group2)).await.unwrap();
        for name in ["B", "A"] {
            let mut g = group(name, GroupType::Group1);
            g.child_groups = vec![child.summary()];
            groups.create(g).await.unwrap();
        }

        let query = GroupQuery::builder()
            .filter_field(GroupField::Type, "group1")
            .sort_by(GroupField::Name, SortOrder::Ascending)
            .build();
        let listed = groups.list(&query).await.unwrap();

        let names: Vec<&str> = listed.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(listed.iter().all(|g| g.child_groups.is_empty()));

        let query = GroupQuery::builder()
            .filter_field(GroupField::Name, "A")
            .load(GroupRelation::ChildGroups)
            .build();
        let listed = groups.list(&query).await.unwrap();
        assert_eq!(listed[0].child_groups, vec![child.summary()]);
    }

    #[tokio::test]
    async fn should_replace_links_on_update() {
        let (groups, _) = setup().await;
        let first = groups.create(group("First", GroupType::Group2)).await.unwrap();
        let second = groups.create(group("Second", GroupType::Group2)).await.unwrap();
        let mut parent = group("Parent", GroupType::Group1);
        parent.child_groups = vec![first.summary()];
        let mut parent = groups.create(parent).await.unwrap();

        parent.name = "Renamed".to_string();
        parent.child_groups = vec![second.summary()];
        groups.update(parent.clone()).await.unwrap();

        let fetched = groups.get_by_id(parent.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Renamed");
        assert_eq!(fetched.child_groups, vec![second.summary()]);
    }

    #[tokio::test]
    async fn should_cascade_links_but_keep_children_on_delete() {
        let (groups, _) = setup().await;
        let child = groups.create(group("Child", GroupType::Group2)).await.unwrap();
        let mut parent = group("Parent", GroupType::Group1);
        parent.child_groups = vec![child.summary()];
        let parent = groups.create(parent).await.unwrap();

        groups.delete(child.id).await.unwrap();

        let fetched = groups.get_by_id(parent.id).await.unwrap().unwrap();
        assert!(fetched.child_groups.is_empty());

        groups.delete(parent.id).await.unwrap();
        assert!(groups.get_by_id(parent.id).await.unwrap().is_none());
    }
}
