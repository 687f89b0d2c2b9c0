//! File geodatabase backed by a plain directory.
//!
//! Layout:
//!
//! ```text
//! City.gdb/
//! ├── Parcels.geojson          feature class `Parcels`
//! ├── Roads.json               feature class `Roads`
//! └── Transportation/          feature dataset `Transportation`
//!     └── Streets.geojson      feature class `Transportation/Streets`
//! ```
//!
//! Hidden entries are skipped and directories below a feature dataset are ignored. Listings
//! are sorted by name so repeated runs report the same order.
//!
//! Each directory is listed once per opened store and the most recently parsed document is
//! kept, so an inventory run reads every file once for both `count` and `describe`. Two files
//! with the same stem (`Roads.geojson` and `Roads.json`) list as one feature class whose
//! queries fail with [`StoreQueryError::Ambiguous`].

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::debug;
use serde::Deserialize;
use serde::de::IgnoredAny;

use super::GeoStore;
use crate::error::{StoreQueryError, WorkspaceError};
use crate::types::{CollectionDescription, SpatialReference};

/// File extensions recognised as feature classes (compared case-insensitively).
const FEATURE_CLASS_EXTENSIONS: &[&str] = &["geojson", "json"];

#[derive(Debug)]
enum Entry {
    FeatureClass { name: String, path: PathBuf },
    Dataset(String),
}

/// Contents of one directory.
#[derive(Debug, Default)]
struct Listing {
    /// Feature class name to the files backing it, more than one on a stem collision
    feature_classes: BTreeMap<String, Vec<PathBuf>>,
    /// Sorted dataset names
    datasets: Vec<String>,
}

impl Listing {
    fn read(dir: &Path) -> Result<Self, StoreQueryError> {
        let read_dir = fs::read_dir(dir).map_err(|e| io_error(dir, e))?;

        let mut listing = Self::default();
        for dir_entry in read_dir {
            let dir_entry = dir_entry.map_err(|e| io_error(dir, e))?;
            match classify(&dir_entry).map_err(|e| io_error(&dir_entry.path(), e))? {
                Some(Entry::FeatureClass { name, path }) => {
                    listing.feature_classes.entry(name).or_default().push(path);
                },
                Some(Entry::Dataset(name)) => listing.datasets.push(name),
                None => {},
            }
        }

        listing.datasets.sort();
        for files in listing.feature_classes.values_mut() {
            files.sort();
        }
        Ok(listing)
    }

    fn has_dataset(&self, name: &str) -> bool {
        self.datasets
            .binary_search_by(|dataset| dataset.as_str().cmp(name))
            .is_ok()
    }
}

/// The parts of a parsed GeoJSON document the store answers queries from.
#[derive(Debug)]
struct Document {
    kind: Option<String>,
    feature_count: Option<u64>,
    spatial_reference: Option<SpatialReference>,
}

/// A directory-based geodatabase opened read-only.
#[derive(Debug, Clone)]
pub struct FileGdb {
    root: PathBuf,
    locator: String,
    listings: RefCell<HashMap<PathBuf, Rc<Listing>>>,
    last_document: RefCell<Option<(PathBuf, Rc<Document>)>>,
}

impl FileGdb {
    /// Opens the workspace at `locator`.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkspaceError`] if the locator does not exist, is not a directory or
    /// cannot be listed.
    pub fn open(locator: impl AsRef<Path>) -> Result<Self, WorkspaceError> {
        let root = locator.as_ref().to_path_buf();

        let metadata = match fs::metadata(&root) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(WorkspaceError::NotFound { path: root });
            },
            Err(e) => {
                return Err(WorkspaceError::Unreadable {
                    source: io_error(&root, e),
                    path: root,
                });
            },
        };

        if !metadata.is_dir() {
            return Err(WorkspaceError::NotADirectory { path: root });
        }

        // Probe once so an unreadable workspace fails before any processing.
        if let Err(e) = fs::read_dir(&root) {
            return Err(WorkspaceError::Unreadable {
                source: io_error(&root, e),
                path: root,
            });
        }

        debug!("Opened file geodatabase {}", root.display());
        Ok(Self {
            locator: root.display().to_string(),
            root,
            listings: RefCell::default(),
            last_document: RefCell::default(),
        })
    }

    fn listing(&self, dir: &Path) -> Result<Rc<Listing>, StoreQueryError> {
        if let Some(listing) = self.listings.borrow().get(dir) {
            return Ok(Rc::clone(listing));
        }

        let listing = Rc::new(Listing::read(dir)?);
        self.listings
            .borrow_mut()
            .insert(dir.to_path_buf(), Rc::clone(&listing));
        Ok(listing)
    }

    fn dataset_dir(&self, dataset: &str) -> Result<PathBuf, StoreQueryError> {
        if self.listing(&self.root)?.has_dataset(dataset) {
            Ok(self.root.join(dataset))
        } else {
            Err(StoreQueryError::NotFound {
                path: dataset.to_string(),
            })
        }
    }

    /// Finds the file backing the feature class at relative `path`.
    fn locate(&self, path: &str) -> Result<PathBuf, StoreQueryError> {
        let not_found = || StoreQueryError::NotFound {
            path: path.to_string(),
        };

        let (dir, name) = match path.split_once('/') {
            Some((dataset, name)) => {
                let dir = self.dataset_dir(dataset).map_err(|e| match e {
                    StoreQueryError::NotFound { .. } => not_found(),
                    other => other,
                })?;
                (dir, name)
            },
            None => (self.root.clone(), path),
        };

        let listing = self.listing(&dir)?;
        let files = listing.feature_classes.get(name).ok_or_else(not_found)?;
        match files.as_slice() {
            [file] => Ok(file.clone()),
            _ => Err(StoreQueryError::Ambiguous {
                path: path.to_string(),
                files: files
                    .iter()
                    .filter_map(|file| file.file_name())
                    .map(|file| file.to_string_lossy())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    /// Parses the document behind `path`, reusing the last parse when it is the same file.
    fn document(&self, path: &str) -> Result<Rc<Document>, StoreQueryError> {
        let file = self.locate(path)?;
        if let Some((cached, document)) = self.last_document.borrow().as_ref() {
            if *cached == file {
                return Ok(Rc::clone(document));
            }
        }

        debug!("Reading {}", file.display());
        let bytes = fs::read(&file).map_err(|e| StoreQueryError::Io {
            path: path.to_string(),
            source: e,
        })?;
        let raw: RawDocument = serde_json::from_slice(&bytes).map_err(|e| corrupt(path, &e))?;

        let document = Rc::new(Document {
            kind: raw.kind,
            feature_count: raw.features.map(|features| features.len() as u64),
            spatial_reference: raw.crs.map(Crs::into_spatial_reference),
        });
        *self.last_document.borrow_mut() = Some((file, Rc::clone(&document)));
        Ok(document)
    }
}

impl GeoStore for FileGdb {
    fn locator(&self) -> &str {
        &self.locator
    }

    fn resolve(&self, path: &str) -> String {
        path.split('/')
            .fold(self.root.clone(), |acc, part| acc.join(part))
            .display()
            .to_string()
    }

    fn exists(&self, name: &str) -> Result<bool, StoreQueryError> {
        let root = self.listing(&self.root)?;
        Ok(root.feature_classes.contains_key(name) || root.has_dataset(name))
    }

    fn list_top_level_collections(&self) -> Result<Vec<String>, StoreQueryError> {
        Ok(self
            .listing(&self.root)?
            .feature_classes
            .keys()
            .cloned()
            .collect())
    }

    fn list_containers(&self) -> Result<Vec<String>, StoreQueryError> {
        Ok(self.listing(&self.root)?.datasets.clone())
    }

    fn list_collections_in_container(
        &self,
        container: &str,
    ) -> Result<Vec<String>, StoreQueryError> {
        let dir = self.dataset_dir(container)?;
        Ok(self.listing(&dir)?.feature_classes.keys().cloned().collect())
    }

    fn count(&self, path: &str) -> Result<u64, StoreQueryError> {
        let document = self.document(path)?;
        debug!("Counting features in {path}");

        match (document.kind.as_deref(), document.feature_count) {
            (Some("FeatureCollection"), Some(count)) => Ok(count),
            (Some("FeatureCollection"), None) => Err(StoreQueryError::NotAFeatureClass {
                path: path.to_string(),
                reason: "FeatureCollection has no features array".to_string(),
            }),
            (Some("Feature"), _) => Ok(1),
            (Some(other), _) => Err(StoreQueryError::NotAFeatureClass {
                path: path.to_string(),
                reason: format!("unexpected GeoJSON type '{other}'"),
            }),
            (None, _) => Err(StoreQueryError::NotAFeatureClass {
                path: path.to_string(),
                reason: "document has no GeoJSON type".to_string(),
            }),
        }
    }

    fn describe(&self, path: &str) -> Result<CollectionDescription, StoreQueryError> {
        let document = self.document(path)?;
        debug!("Describing {path}");

        Ok(CollectionDescription {
            spatial_reference: document.spatial_reference.clone(),
        })
    }
}

/// Only the members of a GeoJSON document the store looks at.
#[derive(Deserialize)]
struct RawDocument {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    features: Option<Vec<IgnoredAny>>,
    /// The legacy `crs` member; `null` and absence both mean "no spatial reference"
    #[serde(default)]
    crs: Option<Crs>,
}

#[derive(Deserialize)]
struct Crs {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    properties: Option<CrsProperties>,
}

#[derive(Deserialize)]
struct CrsProperties {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    code: Option<u32>,
}

impl Crs {
    fn into_spatial_reference(self) -> SpatialReference {
        let name = match (self.kind.as_deref(), self.properties) {
            (Some("name"), Some(props)) => props.name,
            (Some("EPSG"), Some(props)) => props.code.map(|code| format!("EPSG:{code}")),
            _ => None,
        };
        SpatialReference { name }
    }
}

fn classify(dir_entry: &fs::DirEntry) -> io::Result<Option<Entry>> {
    let file_name = dir_entry.file_name();
    let Some(file_name) = file_name.to_str() else {
        return Ok(None);
    };
    if file_name.starts_with('.') {
        return Ok(None);
    }

    let path = dir_entry.path();
    // Follows symlinks, unlike `DirEntry::metadata`. Dangling links are skipped.
    let metadata = match fs::metadata(&path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    if metadata.is_dir() {
        return Ok(Some(Entry::Dataset(file_name.to_string())));
    }

    Ok(feature_class_name(file_name).map(|name| Entry::FeatureClass {
        name: name.to_string(),
        path,
    }))
}

fn feature_class_name(file_name: &str) -> Option<&str> {
    let (stem, extension) = file_name.rsplit_once('.')?;
    let recognised = FEATURE_CLASS_EXTENSIONS
        .iter()
        .any(|ext| extension.eq_ignore_ascii_case(ext));
    (recognised && !stem.is_empty()).then_some(stem)
}

fn io_error(path: &Path, source: io::Error) -> StoreQueryError {
    StoreQueryError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn corrupt(path: &str, err: &serde_json::Error) -> StoreQueryError {
    StoreQueryError::Corrupt {
        path: path.to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const PARCELS: &str = r#"{
  "type": "FeatureCollection",
  "crs": { "type": "name", "properties": { "name": "EPSG:2227" } },
  "features": [
    { "type": "Feature", "geometry": { "type": "Point", "coordinates": [1.0, 2.0] }, "properties": {} },
    { "type": "Feature", "geometry": { "type": "Point", "coordinates": [3.0, 4.0] }, "properties": {} },
    { "type": "Feature", "geometry": null, "properties": { "id": 3 } }
  ]
}"#;

    const NO_CRS: &str = r#"{ "type": "FeatureCollection", "features": [] }"#;

    fn create_gdb() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("Parcels.geojson"), PARCELS).unwrap();
        fs::write(root.join("Roads.json"), NO_CRS).unwrap();
        fs::write(root.join("README.txt"), "not a feature class").unwrap();
        fs::write(root.join(".hidden.geojson"), NO_CRS).unwrap();
        fs::create_dir(root.join("Transportation")).unwrap();
        fs::write(root.join("Transportation/Streets.geojson"), PARCELS).unwrap();
        fs::write(root.join("Transportation/Rail.GEOJSON"), NO_CRS).unwrap();
        fs::create_dir(root.join("Transportation/nested")).unwrap();
        fs::write(root.join("Transportation/nested/Deep.geojson"), NO_CRS).unwrap();
        temp_dir
    }

    #[test]
    fn test_open_missing_workspace() {
        let temp_dir = TempDir::new().unwrap();
        let result = FileGdb::open(temp_dir.path().join("missing.gdb"));
        assert!(matches!(result, Err(WorkspaceError::NotFound { .. })));
    }

    #[test]
    fn test_open_file_is_not_a_workspace() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("Parcels.geojson");
        fs::write(&file, NO_CRS).unwrap();
        let result = FileGdb::open(&file);
        assert!(matches!(result, Err(WorkspaceError::NotADirectory { .. })));
    }

    #[test]
    fn test_listings_are_sorted_and_filtered() {
        let temp_dir = create_gdb();
        let gdb = FileGdb::open(temp_dir.path()).unwrap();

        assert_eq!(
            gdb.list_top_level_collections().unwrap(),
            vec!["Parcels", "Roads"]
        );
        assert_eq!(gdb.list_containers().unwrap(), vec!["Transportation"]);
        assert_eq!(
            gdb.list_collections_in_container("Transportation").unwrap(),
            vec!["Rail", "Streets"]
        );
    }

    #[test]
    fn test_list_missing_container_fails() {
        let temp_dir = create_gdb();
        let gdb = FileGdb::open(temp_dir.path()).unwrap();
        assert!(gdb.list_collections_in_container("Hydrology").is_err());
        assert!(gdb.list_collections_in_container("..").is_err());
    }

    #[test]
    fn test_exists_top_level_only() {
        let temp_dir = create_gdb();
        let gdb = FileGdb::open(temp_dir.path()).unwrap();

        assert!(gdb.exists("Parcels").unwrap());
        assert!(gdb.exists("Transportation").unwrap());
        assert!(!gdb.exists("Streets").unwrap());
        assert!(!gdb.exists("Transportation/Streets").unwrap());
        assert!(!gdb.exists("README").unwrap());
        assert!(!gdb.exists("..").unwrap());
        assert!(!gdb.exists("").unwrap());
    }

    #[test]
    fn test_count_and_describe() {
        let temp_dir = create_gdb();
        let gdb = FileGdb::open(temp_dir.path()).unwrap();

        assert_eq!(gdb.count("Parcels").unwrap(), 3);
        assert_eq!(gdb.count("Transportation/Streets").unwrap(), 3);
        assert_eq!(gdb.count("Roads").unwrap(), 0);

        let parcels = gdb.describe("Parcels").unwrap();
        assert_eq!(parcels.spatial_reference_label(), "EPSG:2227");

        let roads = gdb.describe("Roads").unwrap();
        assert_eq!(roads.spatial_reference, None);
        assert_eq!(roads.spatial_reference_label(), "Unknown");
    }

    #[test]
    fn test_describe_null_and_epsg_crs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(
            root.join("Null.geojson"),
            r#"{ "type": "FeatureCollection", "crs": null, "features": [] }"#,
        )
        .unwrap();
        fs::write(
            root.join("Epsg.geojson"),
            r#"{ "type": "FeatureCollection", "crs": { "type": "EPSG", "properties": { "code": 4326 } }, "features": [] }"#,
        )
        .unwrap();
        fs::write(
            root.join("Linked.geojson"),
            r#"{ "type": "FeatureCollection", "crs": { "type": "link", "properties": { "href": "data.crs", "type": "proj4" } }, "features": [] }"#,
        )
        .unwrap();
        let gdb = FileGdb::open(root).unwrap();

        assert_eq!(gdb.describe("Null").unwrap().spatial_reference_label(), "Unknown");
        assert_eq!(gdb.describe("Epsg").unwrap().spatial_reference_label(), "EPSG:4326");
        assert_eq!(
            gdb.describe("Linked").unwrap().spatial_reference_label(),
            "Unnamed Spatial Reference"
        );
    }

    #[test]
    fn test_single_feature_counts_as_one() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("Site.geojson"),
            r#"{ "type": "Feature", "geometry": null, "properties": {} }"#,
        )
        .unwrap();
        let gdb = FileGdb::open(temp_dir.path()).unwrap();
        assert_eq!(gdb.count("Site").unwrap(), 1);
    }

    #[test]
    fn test_corrupt_and_foreign_documents() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("Corrupt.geojson"), "{ not json").unwrap();
        fs::write(
            temp_dir.path().join("Point.geojson"),
            r#"{ "type": "Point", "coordinates": [0, 0] }"#,
        )
        .unwrap();
        let gdb = FileGdb::open(temp_dir.path()).unwrap();

        assert!(matches!(
            gdb.count("Corrupt"),
            Err(StoreQueryError::Corrupt { .. })
        ));
        assert!(matches!(
            gdb.describe("Corrupt"),
            Err(StoreQueryError::Corrupt { .. })
        ));
        assert!(matches!(
            gdb.count("Point"),
            Err(StoreQueryError::NotAFeatureClass { .. })
        ));
    }

    #[test]
    fn test_count_missing_path() {
        let temp_dir = create_gdb();
        let gdb = FileGdb::open(temp_dir.path()).unwrap();

        assert!(matches!(
            gdb.count("Hydrology/Rivers"),
            Err(StoreQueryError::NotFound { .. })
        ));
        assert!(matches!(
            gdb.count("Transportation/nested/Deep"),
            Err(StoreQueryError::NotFound { .. })
        ));
        assert!(matches!(
            gdb.count("../Parcels"),
            Err(StoreQueryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_stem_collision_is_ambiguous() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("Roads.geojson"), PARCELS).unwrap();
        fs::write(root.join("Roads.json"), NO_CRS).unwrap();
        let gdb = FileGdb::open(root).unwrap();

        assert_eq!(gdb.list_top_level_collections().unwrap(), vec!["Roads"]);
        assert!(gdb.exists("Roads").unwrap());

        let err = gdb.count("Roads").unwrap_err();
        assert!(matches!(err, StoreQueryError::Ambiguous { .. }));
        assert_eq!(
            err.to_string(),
            "'Roads' is ambiguous: backed by Roads.geojson, Roads.json"
        );
        assert!(matches!(
            gdb.describe("Roads"),
            Err(StoreQueryError::Ambiguous { .. })
        ));
    }

    #[test]
    fn test_count_and_describe_share_one_read() {
        let temp_dir = create_gdb();
        let gdb = FileGdb::open(temp_dir.path()).unwrap();

        assert_eq!(gdb.count("Parcels").unwrap(), 3);
        fs::remove_file(temp_dir.path().join("Parcels.geojson")).unwrap();

        // Both the listing and the parsed document are reused.
        assert_eq!(
            gdb.describe("Parcels").unwrap().spatial_reference_label(),
            "EPSG:2227"
        );
        assert_eq!(
            gdb.list_top_level_collections().unwrap(),
            vec!["Parcels", "Roads"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unlistable_dataset_fails_alone() {
        let temp_dir = create_gdb();
        let root = temp_dir.path();
        fs::create_dir(root.join("Utilities")).unwrap();
        let looped = root.join("Utilities").join("Loop.geojson");
        std::os::unix::fs::symlink(&looped, &looped).unwrap();
        let gdb = FileGdb::open(root).unwrap();

        assert_eq!(gdb.list_containers().unwrap(), vec!["Transportation", "Utilities"]);
        assert!(matches!(
            gdb.list_collections_in_container("Utilities"),
            Err(StoreQueryError::Io { .. })
        ));
        assert_eq!(
            gdb.list_collections_in_container("Transportation").unwrap(),
            vec!["Rail", "Streets"]
        );
    }

    #[test]
    fn test_resolve_joins_workspace() {
        let temp_dir = create_gdb();
        let gdb = FileGdb::open(temp_dir.path()).unwrap();
        let resolved = gdb.resolve("Transportation/Streets");
        assert_eq!(
            resolved,
            temp_dir
                .path()
                .join("Transportation")
                .join("Streets")
                .display()
                .to_string()
        );
    }
}
