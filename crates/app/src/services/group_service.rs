//! Group service: use-cases for managing groups.

use sitehub_domain::error::{ConflictError, NotFoundError, SiteHubError};
use sitehub_domain::group::{Group, GroupDraft, GroupPatch, GroupQuery, GroupRelation, GroupSummary};
use sitehub_domain::id::{GroupId, SiteId};
use sitehub_domain::site::SiteSummary;

use super::resolve_all;
use crate::ports::{GroupRepository, SiteRepository};

/// Application service for group CRUD operations.
///
/// Needs the site repository to resolve the sites a group is linked to.
pub struct GroupService<G, S> {
    groups: G,
    sites: S,
}

impl<G: GroupRepository, S: SiteRepository> GroupService<G, S> {
    /// Create a new service backed by the given repositories.
    pub fn new(groups: G, sites: S) -> Self {
        Self { groups, sites }
    }

    /// List groups, with child groups and sites loaded.
    ///
    /// `filters` pairs a field name with an optional exact-match value; pairs
    /// with an unknown field or no value are ignored. `sort` is a field name,
    /// prefixed with `-` for descending order.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn list_groups(
        &self,
        filters: &[(&str, Option<&str>)],
        sort: Option<&str>,
    ) -> Result<Vec<Group>, SiteHubError> {
        let query = filters
            .iter()
            .fold(GroupQuery::builder(), |builder, (key, value)| {
                builder.filter(key, *value)
            })
            .sort(sort)
            .load(GroupRelation::ChildGroups)
            .load(GroupRelation::Sites)
            .build();
        self.groups.list(&query).await
    }

    /// Look up a group by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`SiteHubError::NotFound`] when no group with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_group(&self, id: GroupId) -> Result<Group, SiteHubError> {
        self.groups
            .get_by_id(id)
            .await?
            .ok_or_else(|| NotFoundError::one("Group", id).into())
    }

    /// Create a group linked to the given child groups and sites.
    ///
    /// # Errors
    ///
    /// Returns [`SiteHubError::Validation`] for a malformed draft,
    /// [`SiteHubError::NotFound`] when a referenced group or site is missing,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self, draft), fields(group_name = %draft.name))]
    pub async fn create_group(&self, draft: GroupDraft) -> Result<Group, SiteHubError> {
        draft.validate()?;
        let child_groups = self.resolve_groups(&draft.child_groups).await?;
        let sites = self.resolve_sites(&draft.sites).await?;
        let group = Group::builder()
            .name(draft.name)
            .group_type(draft.group_type)
            .child_groups(child_groups)
            .sites(sites)
            .build()?;
        self.groups.create(group).await
    }

    /// Apply a partial update to an existing group.
    ///
    /// Supplied scalars are overwritten. A non-empty relation list replaces
    /// the stored relation; an absent or empty one leaves it as is.
    ///
    /// # Errors
    ///
    /// Returns [`SiteHubError::NotFound`] when the group or a referenced
    /// record is missing, [`SiteHubError::Validation`] for a malformed patch,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_group(&self, id: GroupId, patch: GroupPatch) -> Result<Group, SiteHubError> {
        patch.validate()?;
        let mut group = self.get_group(id).await?;
        if patch.is_empty() {
            tracing::debug!("empty patch, group left unchanged");
            return Ok(group);
        }
        patch.apply_scalars(&mut group);
        if let Some(ids) = patch.child_groups() {
            group.child_groups = self.resolve_groups(ids).await?;
        }
        if let Some(ids) = patch.sites() {
            group.sites = self.resolve_sites(ids).await?;
        }
        group.validate()?;
        self.groups.update(group).await
    }

    /// Delete a group that has no linked sites.
    ///
    /// Child groups are kept; only the links to them are removed.
    ///
    /// # Errors
    ///
    /// Returns [`SiteHubError::NotFound`] when the group does not exist,
    /// [`SiteHubError::Conflict`] while sites are still linked to it,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_group(&self, id: GroupId) -> Result<(), SiteHubError> {
        let group = self.get_group(id).await?;
        if !group.sites.is_empty() {
            tracing::debug!(linked_sites = group.sites.len(), "refusing to delete group");
            return Err(ConflictError::GroupLinkedToSites { id: id.to_string() }.into());
        }
        self.groups.delete(id).await
    }

    async fn resolve_groups(&self, ids: &[GroupId]) -> Result<Vec<GroupSummary>, SiteHubError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found = self.groups.find_by_ids(ids).await?;
        let groups = resolve_all("Group", ids, found, |g| g.id)?;
        Ok(groups.iter().map(Group::summary).collect())
    }

    async fn resolve_sites(&self, ids: &[SiteId]) -> Result<Vec<SiteSummary>, SiteHubError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found = self.sites.find_by_ids(ids).await?;
        let sites = resolve_all("Site", ids, found, |s| s.id)?;
        Ok(sites.iter().map(|s| s.summary()).collect())
    }
}
