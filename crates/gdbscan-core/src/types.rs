//! Data types shared by the existence checker and the inventory reporter.

use std::fmt;

/// Label logged when a feature class has no spatial reference.
pub const UNKNOWN_SPATIAL_REFERENCE: &str = "Unknown";

/// Label logged when a spatial reference exists but carries no name.
pub const UNNAMED_SPATIAL_REFERENCE: &str = "Unnamed Spatial Reference";

/// Identifies one feature class inside a workspace.
///
/// Top-level feature classes have no dataset; nested ones keep the name of the
/// feature dataset that contains them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureCollectionRef {
    dataset: Option<String>,
    name: String,
}

impl FeatureCollectionRef {
    /// A feature class that sits directly at the workspace root.
    #[must_use]
    pub fn top_level(name: impl Into<String>) -> Self {
        Self {
            dataset: None,
            name: name.into(),
        }
    }

    /// A feature class nested inside `dataset`.
    #[must_use]
    pub fn in_dataset(dataset: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            dataset: Some(dataset.into()),
            name: name.into(),
        }
    }

    /// Bare feature class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Containing feature dataset, if any.
    #[must_use]
    pub fn dataset(&self) -> Option<&str> {
        self.dataset.as_deref()
    }

    /// Path relative to the workspace: `Dataset/Name` or `Name`.
    #[must_use]
    pub fn relative_path(&self) -> String {
        match &self.dataset {
            Some(dataset) => format!("{dataset}/{}", self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for FeatureCollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative_path())
    }
}

/// Coordinate system metadata attached to a feature class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpatialReference {
    /// Display name, e.g. `EPSG:2227` or `NAD 1983 StatePlane California III FIPS 0403 Feet`
    pub name: Option<String>,
}

/// Descriptive metadata returned by [`crate::store::GeoStore::describe`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionDescription {
    /// Spatial reference, absent when the feature class does not declare one
    pub spatial_reference: Option<SpatialReference>,
}

impl CollectionDescription {
    /// Label written to the log for this description.
    ///
    /// ```
    /// use gdbscan_core::types::{CollectionDescription, SpatialReference};
    ///
    /// assert_eq!(CollectionDescription::default().spatial_reference_label(), "Unknown");
    ///
    /// let named = CollectionDescription {
    ///     spatial_reference: Some(SpatialReference { name: Some("EPSG:4326".into()) }),
    /// };
    /// assert_eq!(named.spatial_reference_label(), "EPSG:4326");
    /// ```
    #[must_use]
    pub fn spatial_reference_label(&self) -> String {
        match &self.spatial_reference {
            None => UNKNOWN_SPATIAL_REFERENCE.to_string(),
            Some(sr) => match sr.name.as_deref().map(str::trim) {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => UNNAMED_SPATIAL_REFERENCE.to_string(),
            },
        }
    }
}

/// Facts gathered for one feature class during an inventory run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureCollectionRecord {
    /// Number of features
    pub count: u64,
    /// Spatial reference label, [`UNKNOWN_SPATIAL_REFERENCE`] when absent
    pub spatial_reference: String,
}
