//! Site service: use-cases for managing sites and their installation rules.

use chrono::NaiveDate;
use sitehub_domain::error::{ConflictError, NotFoundError, SiteHubError};
use sitehub_domain::group::{Group, GroupSummary, GroupType};
use sitehub_domain::id::{GroupId, SiteId};
use sitehub_domain::site::{
    Country, Site, SiteDraft, SiteField, SitePatch, SiteQuery, SiteRelation,
    check_weekend_installation,
};

use super::resolve_all;
use crate::ports::{GroupRepository, SiteRepository};

/// Application service for site CRUD operations.
///
/// Installation rules depend on the country:
/// - at most one French site per installation date
/// - Italian sites are installed on Saturdays or Sundays only
///
/// Sites can never be linked to a [`GroupType::Group3`] group.
pub struct SiteService<S, G> {
    sites: S,
    groups: G,
}

impl<S: SiteRepository, G: GroupRepository> SiteService<S, G> {
    /// Create a new service backed by the given repositories.
    pub fn new(sites: S, groups: G) -> Self {
        Self { sites, groups }
    }

    /// List sites, with their groups loaded.
    ///
    /// See [`GroupService::list_groups`](super::GroupService::list_groups)
    /// for the meaning of `filters` and `sort`.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn list_sites(
        &self,
        filters: &[(&str, Option<&str>)],
        sort: Option<&str>,
    ) -> Result<Vec<Site>, SiteHubError> {
        let query = filters
            .iter()
            .fold(SiteQuery::builder(), |builder, (key, value)| {
                builder.filter(key, *value)
            })
            .sort(sort)
            .load(SiteRelation::Groups)
            .build();
        self.sites.list(&query).await
    }

    /// Look up a site by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`SiteHubError::NotFound`] when no site with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_site(&self, id: SiteId) -> Result<Site, SiteHubError> {
        self.sites
            .get_by_id(id)
            .await?
            .ok_or_else(|| NotFoundError::one("Site", id).into())
    }

    /// Create a site after checking its installation rule and groups.
    ///
    /// # Errors
    ///
    /// Returns [`SiteHubError::Validation`] for a malformed draft,
    /// [`SiteHubError::Conflict`] when an installation rule or a `group3`
    /// link rejects it, [`SiteHubError::NotFound`] when a group is missing,
    /// [`SiteHubError::Unsupported`] for an unknown country,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self, draft), fields(site_name = %draft.name))]
    pub async fn create_site(&self, draft: SiteDraft) -> Result<Site, SiteHubError> {
        draft.validate()?;
        if let Ok(country) = draft.country.parse::<Country>() {
            self.check_installation(country, draft.installation_date, None)
                .await?;
        }
        let groups = self.resolve_groups(&draft.groups).await?;
        let site = draft.into_site(groups)?;
        self.sites.create(site).await
    }

    /// Apply a partial update to an existing site.
    ///
    /// The installation rule is checked against the country and date the
    /// site will have afterwards, ignoring the site itself.
    ///
    /// # Errors
    ///
    /// Same as [`SiteService::create_site`], plus [`SiteHubError::NotFound`]
    /// when the site does not exist.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_site(&self, id: SiteId, patch: SitePatch) -> Result<Site, SiteHubError> {
        patch.validate()?;
        let groups = match patch.groups() {
            Some(ids) => Some(self.resolve_groups(ids).await?),
            None => None,
        };
        let mut site = self.get_site(id).await?;
        let country = patch.effective_country(&site)?;
        let date = patch.effective_installation_date(&site);
        self.check_installation(country, date, Some(site.id)).await?;
        patch.apply_to(&mut site)?;
        if let Some(groups) = groups {
            site.groups = groups;
        }
        self.sites.update(site).await
    }

    /// Delete a site by id, unlinking it from its groups.
    ///
    /// # Errors
    ///
    /// Returns [`SiteHubError::NotFound`] when the site does not exist,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_site(&self, id: SiteId) -> Result<(), SiteHubError> {
        self.get_site(id).await?;
        self.sites.delete(id).await
    }

    async fn check_installation(
        &self,
        country: Country,
        date: NaiveDate,
        exclude: Option<SiteId>,
    ) -> Result<(), SiteHubError> {
        match country {
            Country::Fr => {
                let query = SiteQuery::builder()
                    .filter_field(SiteField::Country, Country::Fr.as_str())
                    .filter_field(SiteField::InstallationDate, date.to_string())
                    .build();
                let taken = self
                    .sites
                    .list(&query)
                    .await?
                    .iter()
                    .any(|other| Some(other.id) != exclude);
                if taken {
                    tracing::debug!(%date, "french installation date already taken");
                    return Err(ConflictError::FrenchInstallationDateTaken { date }.into());
                }
                Ok(())
            }
            Country::It => check_weekend_installation(date).map_err(|err| {
                tracing::debug!(%date, "italian installation outside weekend");
                err.into()
            }),
        }
    }

    async fn resolve_groups(&self, ids: &[GroupId]) -> Result<Vec<GroupSummary>, SiteHubError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found = self.groups.find_by_ids(ids).await?;
        let groups = resolve_all("Group", ids, found, |g| g.id)?;
        if let Some(group) = groups.iter().find(|g| g.group_type == GroupType::Group3) {
            return Err(ConflictError::GroupTypeNotAllowed {
                id: group.id.to_string(),
            }
            .into());
        }
        Ok(groups.iter().map(Group::summary).collect())
    }
}

#[cfg(test)]
mod tests {
    use sitehub_domain::error::{UnsupportedValueError, ValidationError};
    use sitehub_domain::site::SiteVariant;

    use super::*;
    use crate::services::in_memory::InMemoryStore;

    type Service = SiteService<InMemoryStore, InMemoryStore>;

    fn make_service() -> (Service, InMemoryStore) {
        let store = InMemoryStore::default();
        (SiteService::new(store.clone(), store.clone()), store)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn french(name: &str, installation_date: NaiveDate) -> SiteDraft {
        SiteDraft {
            name: name.to_string(),
            installation_date,
            max_power_megawatt: 50.0,
            min_power_megawatt: 10.0,
            country: "fr".to_string(),
            useful_energy_at_1_megawatt: Some(0.85),
            efficiency: None,
            groups: Vec::new(),
        }
    }

    fn italian(name: &str, installation_date: NaiveDate) -> SiteDraft {
        SiteDraft {
            name: name.to_string(),
            installation_date,
            max_power_megawatt: 30.0,
            min_power_megawatt: 5.0,
            country: "it".to_string(),
            useful_energy_at_1_megawatt: None,
            efficiency: Some(0.92),
            groups: Vec::new(),
        }
    }

    async fn seed_group(store: &InMemoryStore, name: &str, group_type: GroupType) -> Group {
        let group = Group::builder()
            .name(name)
            .group_type(group_type)
            .build()
            .unwrap();
        GroupRepository::create(store, group).await.unwrap()
    }

    #[tokio::test]
    async fn should_create_french_site_with_groups() {
        let (svc, store) = make_service();
        let group = seed_group(&store, "Group A", GroupType::Group1).await;

        let mut draft = french("Solar", date(2025, 6, 23));
        draft.groups = vec![group.id];
        let site = svc.create_site(draft).await.unwrap();

        assert_eq!(site.country(), Country::Fr);
        assert_eq!(site.groups, vec![group.summary()]);
        assert_eq!(svc.get_site(site.id).await.unwrap(), site);
    }

    #[tokio::test]
    async fn should_reject_second_french_site_on_same_date() {
        let (svc, _) = make_service();
        svc.create_site(french("First", date(2025, 6, 23))).await.unwrap();

        let result = svc.create_site(french("Second", date(2025, 6, 23))).await;
        assert!(matches!(
            result,
            Err(SiteHubError::Conflict(
                ConflictError::FrenchInstallationDateTaken { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn should_allow_italian_site_on_french_date() {
        let (svc, _) = make_service();
        svc.create_site(french("First", date(2023, 6, 17))).await.unwrap();
        assert!(svc.create_site(italian("Second", date(2023, 6, 17))).await.is_ok());
    }

    #[tokio::test]
    async fn should_reject_italian_site_on_weekday() {
        let (svc, _) = make_service();
        let result = svc.create_site(italian("Weekday", date(2023, 6, 16))).await;
        assert!(matches!(
            result,
            Err(SiteHubError::Conflict(
                ConflictError::ItalianInstallationOnWeekday { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn should_accept_italian_site_on_sunday() {
        let (svc, _) = make_service();
        assert!(svc.create_site(italian("Sunday", date(2023, 6, 18))).await.is_ok());
    }

    #[tokio::test]
    async fn should_reject_site_linked_to_group3() {
        let (svc, store) = make_service();
        let group = seed_group(&store, "Forbidden", GroupType::Group3).await;

        let mut draft = italian("Farm", date(2023, 6, 17));
        draft.groups = vec![group.id];
        let result = svc.create_site(draft).await;

        match result {
            Err(SiteHubError::Conflict(ConflictError::GroupTypeNotAllowed { id })) => {
                assert_eq!(id, group.id.to_string());
            }
            other => panic!("expected group3 conflict, got {other:?}"),
        }
        assert!(svc.list_sites(&[], None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_return_not_found_when_group_missing() {
        let (svc, _) = make_service();
        let mut draft = italian("Farm", date(2023, 6, 17));
        draft.groups = vec![GroupId::new()];
        let result = svc.create_site(draft).await;
        assert!(matches!(result, Err(SiteHubError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_reject_unknown_country_as_unsupported() {
        let (svc, _) = make_service();
        let mut draft = italian("Farm", date(2023, 6, 17));
        draft.country = "de".to_string();
        draft.efficiency = None;

        let result = svc.create_site(draft).await;
        match result {
            Err(SiteHubError::Unsupported(UnsupportedValueError { value, .. })) => {
                assert_eq!(value, "de");
            }
            other => panic!("expected unsupported country, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn should_reject_french_site_without_useful_energy() {
        let (svc, _) = make_service();
        let mut draft = french("Farm", date(2025, 6, 23));
        draft.useful_energy_at_1_megawatt = None;

        let result = svc.create_site(draft).await;
        assert!(matches!(
            result,
            Err(SiteHubError::Validation(
                ValidationError::MissingCountryField { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn should_filter_sites_by_country_and_sort_by_date() {
        let (svc, _) = make_service();
        svc.create_site(french("Late", date(2025, 6, 24))).await.unwrap();
        svc.create_site(italian("Weekend", date(2023, 6, 17))).await.unwrap();
        svc.create_site(french("Early", date(2025, 6, 23))).await.unwrap();

        let names: Vec<String> = svc
            .list_sites(&[("country", Some("fr"))], Some("installation_date"))
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Early", "Late"]);
    }

    #[tokio::test]
    async fn should_keep_own_date_when_updating_french_site() {
        let (svc, _) = make_service();
        let site = svc.create_site(french("Solar", date(2025, 6, 23))).await.unwrap();

        let patch = SitePatch {
            max_power_megawatt: Some(60.0),
            ..SitePatch::default()
        };
        let updated = svc.update_site(site.id, patch).await.unwrap();
        assert!((updated.max_power_megawatt - 60.0).abs() < f64::EPSILON);
        assert_eq!(updated.installation_date, site.installation_date);
    }

    #[tokio::test]
    async fn should_reject_update_moving_to_taken_french_date() {
        let (svc, _) = make_service();
        svc.create_site(french("First", date(2025, 6, 23))).await.unwrap();
        let second = svc.create_site(french("Second", date(2025, 6, 24))).await.unwrap();

        let patch = SitePatch {
            installation_date: Some(date(2025, 6, 23)),
            ..SitePatch::default()
        };
        let result = svc.update_site(second.id, patch).await;
        assert!(matches!(result, Err(SiteHubError::Conflict(_))));
        assert_eq!(
            svc.get_site(second.id).await.unwrap().installation_date,
            date(2025, 6, 24)
        );
    }

    #[tokio::test]
    async fn should_switch_country_when_new_field_is_supplied() {
        let (svc, _) = make_service();
        let site = svc.create_site(french("Solar", date(2023, 6, 17))).await.unwrap();

        let patch = SitePatch {
            country: Some("it".to_string()),
            efficiency: Some(0.9),
            ..SitePatch::default()
        };
        let updated = svc.update_site(site.id, patch).await.unwrap();
        assert_eq!(updated.variant, SiteVariant::Italian { efficiency: 0.9 });
    }

    #[tokio::test]
    async fn should_reject_group3_on_update() {
        let (svc, store) = make_service();
        let site = svc.create_site(italian("Farm", date(2023, 6, 17))).await.unwrap();
        let group = seed_group(&store, "Forbidden", GroupType::Group3).await;

        let patch = SitePatch {
            groups: Some(vec![group.id]),
            ..SitePatch::default()
        };
        let result = svc.update_site(site.id, patch).await;
        assert!(matches!(
            result,
            Err(SiteHubError::Conflict(ConflictError::GroupTypeNotAllowed { .. }))
        ));
    }

    #[tokio::test]
    async fn should_keep_groups_when_patch_list_is_empty() {
        let (svc, store) = make_service();
        let group = seed_group(&store, "Group A", GroupType::Group2).await;
        let mut draft = italian("Farm", date(2023, 6, 17));
        draft.groups = vec![group.id];
        let site = svc.create_site(draft).await.unwrap();

        let patch = SitePatch {
            name: Some("Renamed".to_string()),
            groups: Some(Vec::new()),
            ..SitePatch::default()
        };
        let updated = svc.update_site(site.id, patch).await.unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.groups, vec![group.summary()]);
    }

    #[tokio::test]
    async fn should_return_not_found_when_updating_missing_site() {
        let (svc, _) = make_service();
        let result = svc.update_site(SiteId::new(), SitePatch::default()).await;
        assert!(matches!(result, Err(SiteHubError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_delete_site_and_unlink_groups() {
        let (svc, store) = make_service();
        let group = seed_group(&store, "Group A", GroupType::Group1).await;
        let mut draft = italian("Farm", date(2023, 6, 17));
        draft.groups = vec![group.id];
        let site = svc.create_site(draft).await.unwrap();

        svc.delete_site(site.id).await.unwrap();

        assert!(matches!(
            svc.get_site(site.id).await,
            Err(SiteHubError::NotFound(_))
        ));
        let group = GroupRepository::get_by_id(&store, group.id)
            .await
            .unwrap()
            .unwrap();
        assert!(group.sites.is_empty());
    }

    #[tokio::test]
    async fn should_return_not_found_when_deleting_missing_site() {
        let (svc, _) = make_service();
        let result = svc.delete_site(SiteId::new()).await;
        assert!(matches!(result, Err(SiteHubError::NotFound(_))));
    }
}
