//! Read-only access to a geospatial workspace.
//!
//! The [`GeoStore`] trait is the whole contract the checker and the inventory need from a
//! geodatabase. Nothing in it mutates the store.

mod file_gdb;
#[cfg(test)]
pub(crate) mod memory;

pub use file_gdb::FileGdb;

use crate::error::StoreQueryError;
use crate::types::CollectionDescription;

/// Read-only queries against one opened workspace.
///
/// Paths handed to [`GeoStore::count`] and [`GeoStore::describe`] are relative to the
/// workspace root, using `/` between a feature dataset and its feature class
/// (`Transportation/Streets`). Listing order is whatever the store reports.
pub trait GeoStore {
    /// Workspace locator as given by the user.
    fn locator(&self) -> &str;

    /// Full addressable path of a relative feature class path.
    fn resolve(&self, path: &str) -> String;

    /// Whether a feature class or feature dataset called `name` exists at the root.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreQueryError`] if the root cannot be queried.
    fn exists(&self, name: &str) -> Result<bool, StoreQueryError>;

    /// Names of the feature classes directly at the workspace root.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreQueryError`] if the root cannot be listed.
    fn list_top_level_collections(&self) -> Result<Vec<String>, StoreQueryError>;

    /// Names of the feature datasets in the workspace.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreQueryError`] if the root cannot be listed.
    fn list_containers(&self) -> Result<Vec<String>, StoreQueryError>;

    /// Names of the feature classes inside `container`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreQueryError`] if the dataset cannot be listed.
    fn list_collections_in_container(
        &self,
        container: &str,
    ) -> Result<Vec<String>, StoreQueryError>;

    /// Number of features stored in the feature class at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreQueryError`] on permission problems, corruption or a missing path.
    fn count(&self, path: &str) -> Result<u64, StoreQueryError>;

    /// Descriptive metadata for the feature class at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreQueryError`] on permission problems, corruption or a missing path.
    fn describe(&self, path: &str) -> Result<CollectionDescription, StoreQueryError>;
}
