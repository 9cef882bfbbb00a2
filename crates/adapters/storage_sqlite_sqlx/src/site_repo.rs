//! `SQLite` implementation of [`SiteRepository`].
//!
//! Both country variants live in one `sites` table; the column of the other
//! variant stays `NULL`.

use std::future::Future;

use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};

use sitehub_app::ports::SiteRepository;
use sitehub_domain::error::SiteHubError;
use sitehub_domain::group::GroupSummary;
use sitehub_domain::id::{GroupId, SiteId};
use sitehub_domain::site::{Country, Site, SiteQuery, SiteRelation, SiteVariant};

use crate::error::{StorageError, decode};
use crate::query::{fetch_links, push_filters, push_in, push_sort};

/// Wrapper for converting database rows into domain [`Site`].
struct Wrapper(Site);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let installation_date: String = row.try_get("installation_date")?;
        let max_power_megawatt: f64 = row.try_get("max_power_megawatt")?;
        let min_power_megawatt: f64 = row.try_get("min_power_megawatt")?;
        let country: String = row.try_get("country")?;
        let useful_energy_at_1_megawatt: Option<f64> = row.try_get("useful_energy_at_1_megawatt")?;
        let efficiency: Option<f64> = row.try_get("efficiency")?;

        let variant = SiteVariant::from_fields(
            decode::<Country>(&country)?,
            useful_energy_at_1_megawatt,
            efficiency,
        )
        .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(Site {
            id: decode(&id)?,
            name,
            installation_date: decode::<NaiveDate>(&installation_date)?,
            max_power_megawatt,
            min_power_megawatt,
            variant,
            groups: Vec::new(),
        }))
    }
}

const COLUMNS: &str = "id, name, installation_date, max_power_megawatt, min_power_megawatt, \
country, useful_energy_at_1_megawatt, efficiency";

const INSERT: &str = "INSERT INTO sites (id, name, installation_date, max_power_megawatt, \
min_power_megawatt, country, useful_energy_at_1_megawatt, efficiency) VALUES (?, ?, ?, ?, ?, ?, ?, ?)";
const UPDATE: &str = "UPDATE sites SET name = ?, installation_date = ?, max_power_megawatt = ?, \
min_power_megawatt = ?, country = ?, useful_energy_at_1_megawatt = ?, efficiency = ? WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM sites WHERE id = ?";

const INSERT_GROUP: &str = "INSERT INTO site_groups (site_id, group_id) VALUES (?, ?)";
const DELETE_GROUPS: &str = "DELETE FROM site_groups WHERE site_id = ?";

const SELECT_GROUP_LINKS: &str = r#"SELECT link.site_id, grp.id, grp.name
FROM site_groups link JOIN "groups" grp ON grp.id = link.group_id
WHERE link.site_id"#;

fn select() -> QueryBuilder<'static, Sqlite> {
    let mut builder = QueryBuilder::new("SELECT ");
    builder.push(COLUMNS).push(" FROM sites");
    builder
}

/// `SQLite`-backed site repository.
pub struct SqliteSiteRepository {
    pool: SqlitePool,
}

impl SqliteSiteRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn insert_groups(tx: &mut sqlx::SqliteConnection, site: &Site) -> Result<(), sqlx::Error> {
    let site_id = site.id.to_string();
    for group in &site.groups {
        sqlx::query(INSERT_GROUP)
            .bind(&site_id)
            .bind(group.id.to_string())
            .execute(&mut *tx)
            .await?;
    }
    Ok(())
}

async fn load_groups(pool: &SqlitePool, sites: &mut [Site]) -> Result<(), sqlx::Error> {
    let ids: Vec<String> = sites.iter().map(|s| s.id.to_string()).collect();
    let mut links = fetch_links::<GroupId>(pool, SELECT_GROUP_LINKS, &ids).await?;
    for site in sites.iter_mut() {
        site.groups = links
            .remove(&site.id.to_string())
            .unwrap_or_default()
            .into_iter()
            .map(|(id, name)| GroupSummary { id, name })
            .collect();
    }
    Ok(())
}

impl SiteRepository for SqliteSiteRepository {
    fn create(&self, site: Site) -> impl Future<Output = Result<Site, SiteHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let mut tx = pool.begin().await.map_err(StorageError::from)?;

            sqlx::query(INSERT)
                .bind(site.id.to_string())
                .bind(&site.name)
                .bind(site.installation_date.to_string())
                .bind(site.max_power_megawatt)
                .bind(site.min_power_megawatt)
                .bind(site.country().as_str())
                .bind(site.variant.useful_energy_at_1_megawatt())
                .bind(site.variant.efficiency())
                .execute(&mut *tx)
                .await
                .map_err(|err| StorageError::from(err).into_site_write_error(site.installation_date))?;
            insert_groups(&mut tx, &site)
                .await
                .map_err(StorageError::from)?;

            tx.commit().await.map_err(StorageError::from)?;
            Ok(site)
        }
    }

    fn get_by_id(
        &self,
        id: SiteId,
    ) -> impl Future<Output = Result<Option<Site>, SiteHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let mut builder = select();
            builder.push(" WHERE id = ").push_bind(id.to_string());
            let row: Option<Wrapper> = builder
                .build_query_as()
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            let Some(Wrapper(site)) = row else {
                return Ok(None);
            };
            let mut sites = [site];
            load_groups(&pool, &mut sites)
                .await
                .map_err(StorageError::from)?;
            let [site] = sites;
            Ok(Some(site))
        }
    }

    fn find_by_ids(
        &self,
        ids: &[SiteId],
    ) -> impl Future<Output = Result<Vec<Site>, SiteHubError>> + Send {
        let pool = self.pool.clone();
        let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
        async move {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            let mut builder = select();
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
        query: &SiteQuery,
    ) -> impl Future<Output = Result<Vec<Site>, SiteHubError>> + Send {
        let pool = self.pool.clone();
        let mut builder = select();
        push_filters(&mut builder, query.filters());
        push_sort(&mut builder, query.sort());
        let groups = query.loads(SiteRelation::Groups);
        async move {
            let rows: Vec<Wrapper> = builder
                .build_query_as()
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            let mut sites: Vec<Site> = rows.into_iter().map(|w| w.0).collect();
            if groups {
                load_groups(&pool, &mut sites)
                    .await
                    .map_err(StorageError::from)?;
            }
            Ok(sites)
        }
    }

    fn update(&self, site: Site) -> impl Future<Output = Result<Site, SiteHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let mut tx = pool.begin().await.map_err(StorageError::from)?;
            let id = site.id.to_string();

            sqlx::query(UPDATE)
                .bind(&site.name)
                .bind(site.installation_date.to_string())
                .bind(site.max_power_megawatt)
                .bind(site.min_power_megawatt)
                .bind(site.country().as_str())
                .bind(site.variant.useful_energy_at_1_megawatt())
                .bind(site.variant.efficiency())
                .bind(&id)
                .execute(&mut *tx)
                .await
                .map_err(|err| StorageError::from(err).into_site_write_error(site.installation_date))?;
            sqlx::query(DELETE_GROUPS)
                .bind(&id)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
            insert_groups(&mut tx, &site)
                .await
                .map_err(StorageError::from)?;

            tx.commit().await.map_err(StorageError::from)?;
            Ok(site)
        }
    }

    fn delete(&self, id: SiteId) -> impl Future<Output = Result<(), SiteHubError>> + Send {
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
