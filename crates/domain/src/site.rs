//! Site: a power installation whose extra fields depend on its country.
//!
//! The country is the discriminator: French sites carry
//! `useful_energy_at_1_megawatt`, Italian sites carry `efficiency`, and
//! neither may carry the other's field. [`SiteVariant`] holds exactly one of
//! them, so a stored [`Site`] can never mix the two.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{ConflictError, SiteHubError, UnsupportedValueError, ValidationError};
use crate::group::GroupSummary;
use crate::id::{GroupId, SiteId};
use crate::query::{Field, FieldKey, FieldValue, ListQuery};

const USEFUL_ENERGY: &str = "useful_energy_at_1_megawatt";
const EFFICIENCY: &str = "efficiency";

/// Supported site countries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Country {
    Fr,
    It,
}

impl Country {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fr => "fr",
            Self::It => "it",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Country {
    type Err = UnsupportedValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fr" => Ok(Self::Fr),
            "it" => Ok(Self::It),
            other => Err(UnsupportedValueError {
                kind: "country",
                value: other.to_owned(),
            }),
        }
    }
}

/// Country-specific part of a site, tagged by `country` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "country")]
pub enum SiteVariant {
    #[serde(rename = "fr")]
    French { useful_energy_at_1_megawatt: f64 },
    #[serde(rename = "it")]
    Italian { efficiency: f64 },
}

impl SiteVariant {
    #[must_use]
    pub fn country(self) -> Country {
        match self {
            Self::French { .. } => Country::Fr,
            Self::Italian { .. } => Country::It,
        }
    }

    #[must_use]
    pub fn useful_energy_at_1_megawatt(self) -> Option<f64> {
        match self {
            Self::French {
                useful_energy_at_1_megawatt,
            } => Some(useful_energy_at_1_megawatt),
            Self::Italian { .. } => None,
        }
    }

    #[must_use]
    pub fn efficiency(self) -> Option<f64> {
        match self {
            Self::Italian { efficiency } => Some(efficiency),
            Self::French { .. } => None,
        }
    }

    /// Build the variant for `country` from optionally supplied fields.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ForbiddenCountryField`] when the other
    /// country's field is supplied, and [`ValidationError::MissingCountryField`]
    /// when this country's field is absent.
    pub fn from_fields(
        country: Country,
        useful_energy_at_1_megawatt: Option<f64>,
        efficiency: Option<f64>,
    ) -> Result<Self, ValidationError> {
        let country_key = country.as_str();
        match country {
            Country::Fr => {
                if efficiency.is_some() {
                    return Err(ValidationError::ForbiddenCountryField {
                        field: EFFICIENCY,
                        country: country_key,
                    });
                }
                let useful_energy_at_1_megawatt = useful_energy_at_1_megawatt.ok_or(
                    ValidationError::MissingCountryField {
                        field: USEFUL_ENERGY,
                        country: country_key,
                    },
                )?;
                Ok(Self::French {
                    useful_energy_at_1_megawatt,
                })
            }
            Country::It => {
                if useful_energy_at_1_megawatt.is_some() {
                    return Err(ValidationError::ForbiddenCountryField {
                        field: USEFUL_ENERGY,
                        country: country_key,
                    });
                }
                let efficiency = efficiency.ok_or(ValidationError::MissingCountryField {
                    field: EFFICIENCY,
                    country: country_key,
                })?;
                Ok(Self::Italian { efficiency })
            }
        }
    }
}

/// `{id, name}` reference to a site, as rendered inside groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSummary {
    pub id: SiteId,
    pub name: String,
}

/// A site with its linked groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub name: String,
    pub installation_date: NaiveDate,
    pub max_power_megawatt: f64,
    pub min_power_megawatt: f64,
    #[serde(flatten)]
    pub variant: SiteVariant,
    pub groups: Vec<GroupSummary>,
}

impl Site {
    /// Create a builder for constructing a [`Site`].
    #[must_use]
    pub fn builder() -> SiteBuilder {
        SiteBuilder::default()
    }

    #[must_use]
    pub fn country(&self) -> Country {
        self.variant.country()
    }

    #[must_use]
    pub fn summary(&self) -> SiteSummary {
        SiteSummary {
            id: self.id,
            name: self.name.clone(),
        }
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`SiteHubError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), SiteHubError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Site`].
#[derive(Debug, Default)]
pub struct SiteBuilder {
    id: Option<SiteId>,
    name: Option<String>,
    installation_date: Option<NaiveDate>,
    max_power_megawatt: f64,
    min_power_megawatt: f64,
    variant: Option<SiteVariant>,
    groups: Vec<GroupSummary>,
}

impl SiteBuilder {
    #[must_use]
    pub fn id(mut self, id: SiteId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn installation_date(mut self, date: NaiveDate) -> Self {
        self.installation_date = Some(date);
        self
    }

    #[must_use]
    pub fn power_megawatt(mut self, min: f64, max: f64) -> Self {
        self.min_power_megawatt = min;
        self.max_power_megawatt = max;
        self
    }

    #[must_use]
    pub fn variant(mut self, variant: SiteVariant) -> Self {
        self.variant = Some(variant);
        self
    }

    #[must_use]
    pub fn groups(mut self, groups: Vec<GroupSummary>) -> Self {
        self.groups = groups;
        self
    }

    /// Consume the builder, validate, and return a [`Site`].
    ///
    /// # Errors
    ///
    /// Returns [`SiteHubError::Validation`] if `name` is empty or if the
    /// installation date or country variant is missing.
    pub fn build(self) -> Result<Site, SiteHubError> {
        let installation_date = self
            .installation_date
            .ok_or(ValidationError::MissingField("installation_date"))?;
        let variant = self.variant.ok_or(ValidationError::MissingField("country"))?;
        let site = Site {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            installation_date,
            max_power_megawatt: self.max_power_megawatt,
            min_power_megawatt: self.min_power_megawatt,
            variant,
            groups: self.groups,
        };
        site.validate()?;
        Ok(site)
    }
}

/// Italian sites may only be installed on Saturday or Sunday.
///
/// # Errors
///
/// Returns [`ConflictError::ItalianInstallationOnWeekday`] for any other day.
pub fn check_weekend_installation(date: NaiveDate) -> Result<(), ConflictError> {
    match date.weekday() {
        Weekday::Sat | Weekday::Sun => Ok(()),
        _ => Err(ConflictError::ItalianInstallationOnWeekday { date }),
    }
}

/// Fields a site list can be filtered or sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteField {
    Id,
    Name,
    Country,
    InstallationDate,
    MaxPowerMegawatt,
    MinPowerMegawatt,
}

impl FieldKey for SiteField {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "country" => Some(Self::Country),
            "installation_date" => Some(Self::InstallationDate),
            "max_power_megawatt" => Some(Self::MaxPowerMegawatt),
            "min_power_megawatt" => Some(Self::MinPowerMegawatt),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Country => "country",
            Self::InstallationDate => "installation_date",
            Self::MaxPowerMegawatt => "max_power_megawatt",
            Self::MinPowerMegawatt => "min_power_megawatt",
        }
    }
}

impl Field<Site> for SiteField {
    fn value(self, record: &Site) -> FieldValue<'_> {
        match self {
            Self::Id => FieldValue::Text(Cow::Owned(record.id.to_string())),
            Self::Name => FieldValue::Text(Cow::Borrowed(&record.name)),
            Self::Country => FieldValue::Text(Cow::Borrowed(record.country().as_str())),
            Self::InstallationDate => FieldValue::Date(record.installation_date),
            Self::MaxPowerMegawatt => FieldValue::Number(record.max_power_megawatt),
            Self::MinPowerMegawatt => FieldValue::Number(record.min_power_megawatt),
        }
    }
}

/// Relations that can be loaded alongside a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteRelation {
    Groups,
}

/// List query over sites.
pub type SiteQuery = ListQuery<SiteField, SiteRelation>;

/// Input for creating a site.
///
/// `country` stays a plain string here: unknown countries pass shape
/// validation and are rejected when the variant is built.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteDraft {
    pub name: String,
    pub installation_date: NaiveDate,
    pub max_power_megawatt: f64,
    pub min_power_megawatt: f64,
    pub country: String,
    #[serde(default)]
    pub useful_energy_at_1_megawatt: Option<f64>,
    #[serde(default)]
    pub efficiency: Option<f64>,
    #[serde(default)]
    pub groups: Vec<GroupId>,
}

impl SiteDraft {
    /// Check the input shape, including the country-conditional fields.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the name or country is empty, or
    /// when a French/Italian site misses its own field or carries the other's.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.country.is_empty() {
            return Err(ValidationError::EmptyCountry);
        }
        if let Ok(country) = self.country.parse::<Country>() {
            SiteVariant::from_fields(
                country,
                self.useful_energy_at_1_megawatt,
                self.efficiency,
            )?;
        }
        Ok(())
    }

    /// Build the country variant.
    ///
    /// # Errors
    ///
    /// Returns [`SiteHubError::Unsupported`] for an unknown country and
    /// [`SiteHubError::Validation`] for mismatched variant fields.
    pub fn variant(&self) -> Result<SiteVariant, SiteHubError> {
        let country: Country = self.country.parse()?;
        Ok(SiteVariant::from_fields(
            country,
            self.useful_energy_at_1_megawatt,
            self.efficiency,
        )?)
    }

    /// Turn the draft into a new [`Site`] linked to `groups`.
    ///
    /// # Errors
    ///
    /// See [`SiteDraft::variant`] and [`SiteBuilder::build`].
    pub fn into_site(self, groups: Vec<GroupSummary>) -> Result<Site, SiteHubError> {
        let variant = self.variant()?;
        Site::builder()
            .name(self.name)
            .installation_date(self.installation_date)
            .power_megawatt(self.min_power_megawatt, self.max_power_megawatt)
            .variant(variant)
            .groups(groups)
            .build()
    }
}

/// Partial update of a site. Only supplied fields change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SitePatch {
    pub name: Option<String>,
    pub installation_date: Option<NaiveDate>,
    pub max_power_megawatt: Option<f64>,
    pub min_power_megawatt: Option<f64>,
    pub country: Option<String>,
    pub useful_energy_at_1_megawatt: Option<f64>,
    pub efficiency: Option<f64>,
    pub groups: Option<Vec<GroupId>>,
}

impl SitePatch {
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when a supplied name or country is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.as_deref().is_some_and(str::is_empty) {
            return Err(ValidationError::EmptyName);
        }
        if self.country.as_deref().is_some_and(str::is_empty) {
            return Err(ValidationError::EmptyCountry);
        }
        Ok(())
    }

    /// Group ids that replace the stored ones. Empty lists count as absent.
    #[must_use]
    pub fn groups(&self) -> Option<&[GroupId]> {
        self.groups.as_deref().filter(|ids| !ids.is_empty())
    }

    /// Country the site will have once this patch is applied.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedValueError`] when the supplied country is unknown.
    pub fn effective_country(&self, site: &Site) -> Result<Country, UnsupportedValueError> {
        self.country
            .as_deref()
            .map_or(Ok(site.country()), str::parse::<Country>)
    }

    /// Installation date the site will have once this patch is applied.
    #[must_use]
    pub fn effective_installation_date(&self, site: &Site) -> NaiveDate {
        self.installation_date.unwrap_or(site.installation_date)
    }

    /// Apply every supplied scalar field to `site`.
    ///
    /// The variant is recomputed for the effective country: the stored value
    /// is kept when the country does not change and nothing new is supplied.
    /// `site` is left untouched on error.
    ///
    /// # Errors
    ///
    /// Returns [`SiteHubError::Unsupported`] for an unknown country and
    /// [`SiteHubError::Validation`] when the variant fields do not fit it.
    pub fn apply_to(&self, site: &mut Site) -> Result<(), SiteHubError> {
        let country = self.effective_country(site)?;
        let variant = SiteVariant::from_fields(
            country,
            self.useful_energy_at_1_megawatt
                .or_else(|| site.variant.useful_energy_at_1_megawatt()),
            self.efficiency.or_else(|| site.variant.efficiency()),
        )
        .or_else(|err| match err {
            // the stored field of the previous variant does not carry over
            ValidationError::ForbiddenCountryField { .. } if self.country.is_some() => {
                SiteVariant::from_fields(
                    country,
                    self.useful_energy_at_1_megawatt,
                    self.efficiency,
                )
            }
            other => Err(other),
        })?;

        if let Some(name) = &self.name {
            site.name.clone_from(name);
        }
        if let Some(date) = self.installation_date {
            site.installation_date = date;
        }
        if let Some(max) = self.max_power_megawatt {
            site.max_power_megawatt = max;
        }
        if let Some(min) = self.min_power_megawatt {
            site.min_power_megawatt = min;
        }
        site.variant = variant;
        Ok(())
    }
}
