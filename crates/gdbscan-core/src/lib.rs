//! `gdbscan-core` is the core library for the `gdbscan` project: read-only inspection of
//! geodatabase workspaces.
//!
//! This crate includes:
//! - **Store**: the [`store::GeoStore`] contract and the directory-backed [`store::FileGdb`].
//! - **Existence checks**: [`check::check`] partitions expected names into found, missing and
//!   errored.
//! - **Inventory**: [`inventory::run_inventory`] counts every feature class, reads its spatial
//!   reference and appends one line per feature class to a [`run_log::RunLog`].

pub mod check;
pub mod error;
pub mod inventory;
pub mod run_log;
pub mod store;
pub mod types;
