//! In-memory [`GeoStore`] used by unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use super::GeoStore;
use crate::error::StoreQueryError;
use crate::types::{CollectionDescription, SpatialReference};

#[derive(Debug, Clone)]
struct Layer {
    count: u64,
    spatial_reference: Option<String>,
}

/// Store whose contents and failures are scripted by the test.
///
/// Any query touching a path registered with [`MemoryStore::failing`] returns a
/// [`StoreQueryError::Io`]. A failing dataset name makes its listing fail.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    top_level: Vec<String>,
    datasets: Vec<(String, Vec<String>)>,
    layers: HashMap<String, Layer>,
    failing: HashSet<String>,
    queries: RefCell<Vec<String>>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_feature_class(
        mut self,
        name: &str,
        count: u64,
        spatial_reference: Option<&str>,
    ) -> Self {
        self.top_level.push(name.to_string());
        self.layers.insert(
            name.to_string(),
            Layer {
                count,
                spatial_reference: spatial_reference.map(str::to_string),
            },
        );
        self
    }

    pub(crate) fn with_dataset(
        mut self,
        dataset: &str,
        layers: &[(&str, u64, Option<&str>)],
    ) -> Self {
        let mut names = Vec::new();
        for (name, count, spatial_reference) in layers {
            names.push((*name).to_string());
            self.layers.insert(
                format!("{dataset}/{name}"),
                Layer {
                    count: *count,
                    spatial_reference: spatial_reference.map(str::to_string),
                },
            );
        }
        self.datasets.push((dataset.to_string(), names));
        self
    }

    pub(crate) fn failing(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    /// Every query issued so far, as `operation:path`.
    pub(crate) fn queries(&self) -> Vec<String> {
        self.queries.borrow().clone()
    }

    fn record(&self, operation: &str, path: &str) -> Result<(), StoreQueryError> {
        self.queries.borrow_mut().push(format!("{operation}:{path}"));
        if self.failing.contains(path) {
            return Err(StoreQueryError::Io {
                path: path.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied"),
            });
        }
        Ok(())
    }

    fn layer(&self, path: &str) -> Result<&Layer, StoreQueryError> {
        self.layers.get(path).ok_or_else(|| StoreQueryError::NotFound {
            path: path.to_string(),
        })
    }
}

impl GeoStore for MemoryStore {
    fn locator(&self) -> &str {
        "memory://test.gdb"
    }

    fn resolve(&self, path: &str) -> String {
        format!("{}/{path}", self.locator())
    }

    fn exists(&self, name: &str) -> Result<bool, StoreQueryError> {
        self.record("exists", name)?;
        Ok(self.top_level.iter().any(|n| n == name)
            || self.datasets.iter().any(|(n, _)| n == name))
    }

    fn list_top_level_collections(&self) -> Result<Vec<String>, StoreQueryError> {
        self.record("list", "")?;
        Ok(self.top_level.clone())
    }

    fn list_containers(&self) -> Result<Vec<String>, StoreQueryError> {
        self.record("datasets", "")?;
        Ok(self.datasets.iter().map(|(name, _)| name.clone()).collect())
    }

    fn list_collections_in_container(
        &self,
        container: &str,
    ) -> Result<Vec<String>, StoreQueryError> {
        self.record("list", container)?;
        self.datasets
            .iter()
            .find(|(name, _)| name == container)
            .map(|(_, layers)| layers.clone())
            .ok_or_else(|| StoreQueryError::NotFound {
                path: container.to_string(),
            })
    }

    fn count(&self, path: &str) -> Result<u64, StoreQueryError> {
        self.record("count", path)?;
        Ok(self.layer(path)?.count)
    }

    fn describe(&self, path: &str) -> Result<CollectionDescription, StoreQueryError> {
        self.record("describe", path)?;
        let layer = self.layer(path)?;
        Ok(CollectionDescription {
            spatial_reference: layer.spatial_reference.as_ref().map(|name| SpatialReference {
                name: Some(name.clone()),
            }),
        })
    }
}
