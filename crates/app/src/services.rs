//! Application services: use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::hash::Hash;

use sitehub_domain::error::NotFoundError;

pub mod group_service;
pub mod site_service;

#[cfg(test)]
pub(crate) mod in_memory;

pub use group_service::GroupService;
pub use site_service::SiteService;

/// Match `found` against the distinct ids in `requested`, keeping request
/// order. Every id that did not resolve is reported in one error.
pub(crate) fn resolve_all<I, T>(
    entity: &'static str,
    requested: &[I],
    found: Vec<T>,
    id_of: impl Fn(&T) -> I,
) -> Result<Vec<T>, NotFoundError>
where
    I: Copy + Eq + Hash + Display,
{
    let mut by_id: HashMap<I, T> = found.into_iter().map(|r| (id_of(&r), r)).collect();
    let mut seen = HashSet::with_capacity(requested.len());
    let mut resolved = Vec::with_capacity(requested.len());
    let mut missing = Vec::new();
    for &id in requested {
        if !seen.insert(id) {
            continue;
        }
        match by_id.remove(&id) {
            Some(record) => resolved.push(record),
            None => missing.push(id),
        }
    }
    if missing.is_empty() {
        Ok(resolved)
    } else {
        Err(NotFoundError::many(entity, &missing))
    }
}
