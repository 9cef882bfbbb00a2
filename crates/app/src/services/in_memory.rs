//! In-memory store backing the service tests.
//!
//! Rows are kept bare and link tables are kept apart, the way a relational
//! store holds them, so relation summaries always reflect current names.

use std::future::Future;
use std::sync::{Arc, Mutex};

use sitehub_domain::error::SiteHubError;
use sitehub_domain::group::{Group, GroupQuery, GroupRelation};
use sitehub_domain::id::{GroupId, SiteId};
use sitehub_domain::site::{Site, SiteQuery, SiteRelation};

use crate::ports::{GroupRepository, SiteRepository};

#[derive(Default)]
struct Tables {
    groups: Vec<Group>,
    sites: Vec<Site>,
    group_children: Vec<(GroupId, GroupId)>,
    site_groups: Vec<(SiteId, GroupId)>,
}

impl Tables {
    fn group_row(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    fn site_row(&self, id: SiteId) -> Option<&Site> {
        self.sites.iter().find(|s| s.id == id)
    }

    fn hydrate_group(&self, row: &Group, children: bool, sites: bool) -> Group {
        let mut group = row.clone();
        if children {
            group.child_groups = self
                .group_children
                .iter()
                .filter(|(parent, _)| *parent == row.id)
                .filter_map(|(_, child)| self.group_row(*child))
                .map(Group::summary)
                .collect();
        }
        if sites {
            group.sites = self
                .site_groups
                .iter()
                .filter(|(_, group_id)| *group_id == row.id)
                .filter_map(|(site_id, _)| self.site_row(*site_id))
                .map(Site::summary)
                .collect();
        }
        group
    }

    fn hydrate_site(&self, row: &Site, groups: bool) -> Site {
        let mut site = row.clone();
        if groups {
            site.groups = self
                .site_groups
                .iter()
                .filter(|(site_id, _)| *site_id == row.id)
                .filter_map(|(_, group_id)| self.group_row(*group_id))
                .map(Group::summary)
                .collect();
        }
        site
    }

    fn write_group(&mut self, group: &Group) {
        let mut row = group.clone();
        row.child_groups.clear();
        row.sites.clear();
        match self.groups.iter_mut().find(|g| g.id == group.id) {
            Some(existing) => *existing = row,
            None => self.groups.push(row),
        }
        self.group_children.retain(|(parent, _)| *parent != group.id);
        self.group_children
            .extend(group.child_groups.iter().map(|child| (group.id, child.id)));
        self.site_groups.retain(|(_, group_id)| *group_id != group.id);
        self.site_groups
            .extend(group.sites.iter().map(|site| (site.id, group.id)));
    }

    fn write_site(&mut self, site: &Site) {
        let mut row = site.clone();
        row.groups.clear();
        match self.sites.iter_mut().find(|s| s.id == site.id) {
            Some(existing) => *existing = row,
            None => self.sites.push(row),
        }
        self.site_groups.retain(|(site_id, _)| *site_id != site.id);
        self.site_groups
            .extend(site.groups.iter().map(|group| (site.id, group.id)));
    }
}

/// Cloning shares the tables, so one store can back both ports.
#[derive(Clone, Default)]
pub(crate) struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl GroupRepository for InMemoryStore {
    fn create(&self, group: Group) -> impl Future<Output = Result<Group, SiteHubError>> + Send {
        let mut tables = self.tables.lock().unwrap();
        tables.write_group(&group);
        let created = tables.hydrate_group(&group, true, true);
        async { Ok(created) }
    }

    fn get_by_id(
        &self,
        id: GroupId,
    ) -> impl Future<Output = Result<Option<Group>, SiteHubError>> + Send {
        let tables = self.tables.lock().unwrap();
        let result = tables
            .group_row(id)
            .map(|row| tables.hydrate_group(row, true, true));
        async { Ok(result) }
    }

    fn find_by_ids(
        &self,
        ids: &[GroupId],
    ) -> impl Future<Output = Result<Vec<Group>, SiteHubError>> + Send {
        let tables = self.tables.lock().unwrap();
        let result: Vec<Group> = tables
            .groups
            .iter()
            .filter(|g| ids.contains(&g.id))
            .cloned()
            .collect();
        async { Ok(result) }
    }

    fn list(
        &self,
        query: &GroupQuery,
    ) -> impl Future<Output = Result<Vec<Group>, SiteHubError>> + Send {
        let tables = self.tables.lock().unwrap();
        let children = query.loads(GroupRelation::ChildGroups);
        let sites = query.loads(GroupRelation::Sites);
        let all: Vec<Group> = tables
            .groups
            .iter()
            .map(|row| tables.hydrate_group(row, children, sites))
            .collect();
        let result = query.apply(all);
        async { Ok(result) }
    }

    fn update(&self, group: Group) -> impl Future<Output = Result<Group, SiteHubError>> + Send {
        let mut tables = self.tables.lock().unwrap();
        tables.write_group(&group);
        let updated = tables.hydrate_group(&group, true, true);
        async { Ok(updated) }
    }

    fn delete(&self, id: GroupId) -> impl Future<Output = Result<(), SiteHubError>> + Send {
        let mut tables = self.tables.lock().unwrap();
        tables.groups.retain(|g| g.id != id);
        tables
            .group_children
            .retain(|(parent, child)| *parent != id && *child != id);
        tables.site_groups.retain(|(_, group_id)| *group_id != id);
        async { Ok(()) }
    }
}

impl SiteRepository for InMemoryStore {
    fn create(&self, site: Site) -> impl Future<Output = Result<Site, SiteHubError>> + Send {
        let mut tables = self.tables.lock().unwrap();
        tables.write_site(&site);
        let created = tables.hydrate_site(&site, true);
        async { Ok(created) }
    }

    fn get_by_id(
        &self,
        id: SiteId,
    ) -> impl Future<Output = Result<Option<Site>, SiteHubError>> + Send {
        let tables = self.tables.lock().unwrap();
        let result = tables.site_row(id).map(|row| tables.hydrate_site(row, true));
        async { Ok(result) }
    }

    fn find_by_ids(
        &self,
        ids: &[SiteId],
    ) -> impl Future<Output = Result<Vec<Site>, SiteHubError>> + Send {
        let tables = self.tables.lock().unwrap();
        let result: Vec<Site> = tables
            .sites
            .iter()
            .filter(|s| ids.contains(&s.id))
            .cloned()
            .collect();
        async { Ok(result) }
    }

    fn list(
        &self,
        query: &SiteQuery,
    ) -> impl Future<Output = Result<Vec<Site>, SiteHubError>> + Send {
        let tables = self.tables.lock().unwrap();
        let groups = query.loads(SiteRelation::Groups);
        let all: Vec<Site> = tables
            .sites
            .iter()
            .map(|row| tables.hydrate_site(row, groups))
            .collect();
        let result = query.apply(all);
        async { Ok(result) }
    }

    fn update(&self, site: Site) -> impl Future<Output = Result<Site, SiteHubError>> + Send {
        let mut tables = self.tables.lock().unwrap();
        tables.write_site(&site);
        let updated = tables.hydrate_site(&site, true);
        async { Ok(updated) }
    }

    fn delete(&self, id: SiteId) -> impl Future<Output = Result<(), SiteHubError>> + Send {
        let mut tables = self.tables.lock().unwrap();
        tables.sites.retain(|s| s.id != id);
        tables.site_groups.retain(|(site_id, _)| *site_id != id);
        async { Ok(()) }
    }
}
