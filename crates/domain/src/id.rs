//! Typed identifier newtypes backed by UUIDs.
//!
//! Identifiers are assigned by the domain when a record is created, so the
//! store never has to hand one back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|_| ValidationError::InvalidId(s.to_owned()))
            }
        }
    };
}

define_id!(
    /// Unique identifier for a [`Group`](crate::group::Group).
    GroupId
);

define_id!(
    /// Unique identifier for a [`Site`](crate::site::Site).
    SiteId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_generate_unique_ids_when_called_twice() {
        assert_ne!(GroupId::new(), GroupId::new());
    }

    #[test]
    fn should_parse_what_display_renders() {
        let id = SiteId::new();
        let parsed: SiteId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn should_serialize_as_bare_uuid_string() {
        let id = GroupId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }

    #[test]
    fn should_return_invalid_id_when_parsing_garbage() {
        let result = SiteId::from_str("999");
        assert_eq!(result, Err(ValidationError::InvalidId("999".to_string())));
    }
}
