//! Group: a typed collection of sites that may nest other groups.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SiteHubError, UnsupportedValueError, ValidationError};
use crate::id::{GroupId, SiteId};
use crate::query::{Field, FieldKey, FieldValue, ListQuery};
use crate::site::SiteSummary;

/// Kind of a group. Sites may never reference a [`GroupType::Group3`] group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupType {
    Group1,
    Group2,
    Group3,
}

impl GroupType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Group1 => "group1",
            Self::Group2 => "group2",
            Self::Group3 => "group3",
        }
    }
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupType {
    type Err = UnsupportedValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "group1" => Ok(Self::Group1),
            "group2" => Ok(Self::Group2),
            "group3" => Ok(Self::Group3),
            other => Err(UnsupportedValueError {
                kind: "group type",
                value: other.to_owned(),
            }),
        }
    }
}

/// `{id, name}` reference to a group, as rendered inside other records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub id: GroupId,
    pub name: String,
}

/// A named, typed group with its child groups and linked sites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    #[serde(rename = "type")]
    pub group_type: GroupType,
    pub child_groups: Vec<GroupSummary>,
    pub sites: Vec<SiteSummary>,
}

impl Group {
    /// Create a builder for constructing a [`Group`].
    #[must_use]
    pub fn builder() -> GroupBuilder {
        GroupBuilder::default()
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

    #[must_use]
    pub fn summary(&self) -> GroupSummary {
        GroupSummary {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// Step-by-step builder for [`Group`].
#[derive(Debug, Default)]
pub struct GroupBuilder {
    id: Option<GroupId>,
    name: Option<String>,
    group_type: Option<GroupType>,
    child_groups: Vec<GroupSummary>,
    sites: Vec<SiteSummary>,
}

impl GroupBuilder {
    #[must_use]
    pub fn id(mut self, id: GroupId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn group_type(mut self, group_type: GroupType) -> Self {
        self.group_type = Some(group_type);
        self
    }

    #[must_use]
    pub fn child_groups(mut self, child_groups: Vec<GroupSummary>) -> Self {
        self.child_groups = child_groups;
        self
    }

    #[must_use]
    pub fn sites(mut self, sites: Vec<SiteSummary>) -> Self {
        self.sites = sites;
        self
    }

    /// Consume the builder, validate, and return a [`Group`].
    ///
    /// # Errors
    ///
    /// Returns [`SiteHubError::Validation`] if `name` is missing or empty, or
    /// if no type was given.
    pub fn build(self) -> Result<Group, SiteHubError> {
        let group_type = self
            .group_type
            .ok_or(ValidationError::MissingField("type"))?;
        let group = Group {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            group_type,
            child_groups: self.child_groups,
            sites: self.sites,
        };
        group.validate()?;
        Ok(group)
    }
}

/// Fields a group list can be filtered or sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    Id,
    Name,
    Type,
}

impl FieldKey for GroupField {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "type" => Some(Self::Type),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Type => "type",
        }
    }
}

impl Field<Group> for GroupField {
    fn value(self, record: &Group) -> FieldValue<'_> {
        match self {
            Self::Id => FieldValue::Text(Cow::Owned(record.id.to_string())),
            Self::Name => FieldValue::Text(Cow::Borrowed(&record.name)),
            Self::Type => FieldValue::Text(Cow::Borrowed(record.group_type.as_str())),
        }
    }
}

/// Relations that can be loaded alongside a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupRelation {
    ChildGroups,
    Sites,
}

/// List query over groups.
pub type GroupQuery = ListQuery<GroupField, GroupRelation>;

/// Input for creating a group. Relations are given as id lists.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub group_type: GroupType,
    #[serde(default)]
    pub child_groups: Vec<GroupId>,
    #[serde(default)]
    pub sites: Vec<SiteId>,
}

impl GroupDraft {
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when `name` is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(())
    }
}

/// Partial update of a group. Only supplied fields change.
///
/// A non-empty relation list replaces the stored relation; an absent or empty
/// list leaves it untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupPatch {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub group_type: Option<GroupType>,
    pub child_groups: Option<Vec<GroupId>>,
    pub sites: Option<Vec<SiteId>>,
}

impl GroupPatch {
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when a supplied `name` is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.as_deref().is_some_and(str::is_empty) {
            return Err(ValidationError::EmptyName);
        }
        Ok(())
    }

    /// Whether the patch would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.group_type.is_none()
            && self.child_groups().is_none()
            && self.sites().is_none()
    }

    /// Child group ids that replace the stored ones, if any.
    #[must_use]
    pub fn child_groups(&self) -> Option<&[GroupId]> {
        self.child_groups.as_deref().filter(|ids| !ids.is_empty())
    }

    /// Site ids that replace the stored ones, if any.
    #[must_use]
    pub fn sites(&self) -> Option<&[SiteId]> {
        self.sites.as_deref().filter(|ids| !ids.is_empty())
    }

    /// Copy the supplied scalar fields onto `group`.
    pub fn apply_scalars(&self, group: &mut Group) {
        if let Some(name) = &self.name {
            group.name.clone_from(name);
        }
        if let Some(group_type) = self.group_type {
            group.group_type = group_type;
        }
    }
}
