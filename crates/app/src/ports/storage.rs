//! Storage port: repository traits for groups and sites.
//!
//! Records handed back by `create`, `update`, `get_by_id` and `list` carry
//! their relations as `{id, name}` summaries. `find_by_ids` is a plain lookup
//! used to resolve references and leaves relation lists empty.

use std::future::Future;

use sitehub_domain::error::SiteHubError;
use sitehub_domain::group::{Group, GroupQuery};
use sitehub_domain::id::{GroupId, SiteId};
use sitehub_domain::site::{Site, SiteQuery};

/// Repository for persisting and querying [`Group`]s.
pub trait GroupRepository {
    /// Insert a group together with its child-group and site links.
    fn create(&self, group: Group) -> impl Future<Output = Result<Group, SiteHubError>> + Send;

    /// Get a group by id, with every relation loaded.
    fn get_by_id(
        &self,
        id: GroupId,
    ) -> impl Future<Output = Result<Option<Group>, SiteHubError>> + Send;

    /// Get every existing group among `ids`. Unknown ids are skipped.
    fn find_by_ids(
        &self,
        ids: &[GroupId],
    ) -> impl Future<Output = Result<Vec<Group>, SiteHubError>> + Send;

    /// List groups matching `query`, loading only the relations it names.
    fn list(
        &self,
        query: &GroupQuery,
    ) -> impl Future<Output = Result<Vec<Group>, SiteHubError>> + Send;

    /// Overwrite a group's scalars and replace both of its link sets.
    fn update(&self, group: Group) -> impl Future<Output = Result<Group, SiteHubError>> + Send;

    /// Delete a group and every link that references it.
    fn delete(&self, id: GroupId) -> impl Future<Output = Result<(), SiteHubError>> + Send;
}

/// Repository for persisting and querying [`Site`]s.
pub trait SiteRepository {
    /// Insert a site together with its group links.
    fn create(&self, site: Site) -> impl Future<Output = Result<Site, SiteHubError>> + Send;

    /// Get a site by id, with its groups loaded.
    fn get_by_id(
        &self,
        id: SiteId,
    ) -> impl Future<Output = Result<Option<Site>, SiteHubError>> + Send;

    /// Get every existing site among `ids`. Unknown ids are skipped.
    fn find_by_ids(
        &self,
        ids: &[SiteId],
    ) -> impl Future<Output = Result<Vec<Site>, SiteHubError>> + Send;

    /// List sites matching `query`, loading only the relations it names.
    fn list(&self, query: &SiteQuery)
    -> impl Future<Output = Result<Vec<Site>, SiteHubError>> + Send;

    /// Overwrite a site's scalars and replace its group links.
    fn update(&self, site: Site) -> impl Future<Output = Result<Site, SiteHubError>> + Send;

    /// Delete a site and its group links.
    fn delete(&self, id: SiteId) -> impl Future<Output = Result<(), SiteHubError>> + Send;
}
