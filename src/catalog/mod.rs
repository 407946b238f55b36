/// Model catalogs: the ordered list of files and access to their bytes
///
/// - `local.rs` - filesystem catalog served by the HTTP server
/// - `http.rs` - client catalog used by the viewer window
///
/// Both sides share `CatalogSnapshot`, which is also the JSON body of
/// `GET /files`.

pub mod http;
pub mod local;

use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::error::FetchError;

/// File suffix of binary glTF containers; nothing else is listed
pub const MODEL_SUFFIX: &str = ".glb";

/// One model in the catalog, identified by its path relative to the base
/// directory (or an absolute path in list mode)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelFile {
    pub id: String,
}

impl ModelFile {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Label shown under the thumbnail
    pub fn display_name(&self) -> &str {
        display_name(&self.id)
    }
}

/// The catalog as served by `GET /files`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub base_path: Option<String>,
    pub files: Vec<String>,
}

impl CatalogSnapshot {
    pub fn models(&self) -> Vec<ModelFile> {
        self.files.iter().map(ModelFile::new).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.files.iter().any(|f| f == id)
    }
}

/// Source of model files
///
/// Implementations must return files in a stable order; the thumbnail grid
/// is laid out in exactly this order.
pub trait FileCatalog: Send + Sync + 'static {
    fn snapshot(&self) -> impl Future<Output = Result<CatalogSnapshot, FetchError>> + Send;

    fn read(&self, id: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// Text after the last `/`, or after the last `\` when there is no `/`
pub fn display_name(id: &str) -> &str {
    let cut = if id.contains('/') {
        id.rfind('/')
    } else {
        id.rfind('\\')
    };
    match cut {
        Some(i) => &id[i + 1..],
        None => id,
    }
}

/// Header label for the base directory: `/home/me/models` -> `home > me > models`
pub fn format_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim();
    let trimmed = trimmed
        .strip_prefix('/')
        .or_else(|| trimmed.strip_prefix('\\'))
        .unwrap_or(trimmed);
    trimmed.replace(['/', '\\'], " > ")
}

/// In-memory catalog used by loader, pipeline and preview tests
#[cfg(test)]
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    pub struct MemoryCatalog {
        files: Vec<String>,
        bytes: HashMap<String, Vec<u8>>,
        fail_snapshot: bool,
        reads: AtomicUsize,
    }

    impl MemoryCatalog {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_file(mut self, id: &str, bytes: Vec<u8>) -> Self {
            self.files.push(id.to_string());
            self.bytes.insert(id.to_string(), bytes);
            self
        }

        /// Listed, but reading it fails
        pub fn with_missing(mut self, id: &str) -> Self {
            self.files.push(id.to_string());
            self
        }

        pub fn failing_snapshot(mut self) -> Self {
            self.fail_snapshot = true;
            self
        }

        pub fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    impl FileCatalog for MemoryCatalog {
        async fn snapshot(&self) -> Result<CatalogSnapshot, FetchError> {
            if self.fail_snapshot {
                return Err(FetchError::Http {
                    what: "/files".to_string(),
                    reason: "connection refused".to_string(),
                });
            }
            Ok(CatalogSnapshot {
                base_path: None,
                files: self.files.clone(),
            })
        }

        async fn read(&self, id: &str) -> Result<Vec<u8>, FetchError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.bytes
                .get(id)
                .cloned()
                .ok_or_else(|| FetchError::NotInCatalog(id.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("cars/red/sedan.glb"), "sedan.glb");
        assert_eq!(display_name("C:\\models\\tree.glb"), "tree.glb");
        assert_eq!(display_name("plain.glb"), "plain.glb");
        // A forward slash wins over backslashes
        assert_eq!(display_name("a\\b/c.glb"), "c.glb");
    }

    #[test]
    fn test_format_base_path() {
        assert_eq!(format_base_path("/home/me/models"), "home > me > models");
        assert_eq!(format_base_path("  \\share\\art  "), "share > art");
        assert_eq!(format_base_path("relative/dir"), "relative > dir");
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = CatalogSnapshot {
            base_path: Some("/models".to_string()),
            files: vec!["a.glb".to_string()],
        };
        let json = serde_json::to_value(&snapshot).expect("serialize");
        assert_eq!(json["basePath"], "/models");
        assert_eq!(json["files"][0], "a.glb");

        let listed: CatalogSnapshot =
            serde_json::from_str(r#"{"basePath":null,"files":["/x/b.glb"]}"#).expect("parse");
        assert_eq!(listed.base_path, None);
        assert!(listed.contains("/x/b.glb"));
    }
}
