//! # sitehub-domain
//!
//! Pure domain model for the sitehub site registry.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions
//! - Define **Groups** (typed, nestable collections) and **Sites** (power
//!   installations whose extra fields depend on their country)
//! - Define **List queries** (equality filters, sort, eager-loaded relations)
//!   over a closed set of fields per record type
//! - Define the **input schemas** (drafts and patches) and their validation
//! - Contain the business rules that need no IO (weekend installation rule)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod query;

pub mod group;
pub mod site;
