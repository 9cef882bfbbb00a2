//! # sitehub-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `GroupRepository`: CRUD and list queries for groups
//!   - `SiteRepository`: CRUD and list queries for sites
//! - Define **driving/inbound ports** as use-case structs:
//!   - `GroupService`: create, list, get, patch, delete groups
//!   - `SiteService`: create, list, get, patch, delete sites
//! - Enforce the business rules that need the store: one French site per
//!   installation date, no `group3` group linked to a site, no deleting a
//!   group that still has sites
//!
//! ## Dependency rule
//! Depends on `sitehub-domain` only.
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod services;
