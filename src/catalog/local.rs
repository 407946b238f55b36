/// Filesystem catalog
///
/// Built once at startup from the command line inputs. Two modes:
/// - Directory mode: every `.glb` file in a directory (optionally recursive),
///   ids relative to the directory, which becomes the base path
/// - List mode: an explicit list of files (arguments or piped stdin), ids are
///   absolute paths and there is no base path
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{CatalogSnapshot, FileCatalog, MODEL_SUFFIX};
use crate::error::{CatalogError, FetchError};

/// Where the catalog's files come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Directory { path: PathBuf, recursive: bool },
    List(Vec<String>),
}

impl CatalogSource {
    /// Pick the mode from the raw inputs
    ///
    /// Piped stdin or a first argument ending in `.glb` means list mode; the
    /// list is stdin when present, otherwise the arguments. Anything else
    /// treats the first argument (default `.`) as a directory.
    pub fn from_inputs(stdin: Option<&str>, files: &[String], recursive: bool) -> Self {
        let stdin = stdin.filter(|s| !s.trim().is_empty());
        let probe = stdin.or(files.first().map(String::as_str)).unwrap_or("");

        if clean_path(probe).ends_with(MODEL_SUFFIX) {
            let raw: Vec<&str> = match stdin {
                Some(text) => vec![text],
                None => files.iter().map(String::as_str).collect(),
            };
            let entries = raw
                .iter()
                .flat_map(|s| s.split(['\r', '\n']))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            CatalogSource::List(entries)
        } else {
            let dir = files.first().map(|f| clean_path(f)).unwrap_or(".");
            CatalogSource::Directory {
                path: PathBuf::from(dir),
                recursive,
            }
        }
    }
}

/// Strip whitespace and the stray quotes some terminals add around paths
pub fn clean_path(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('\'').unwrap_or(trimmed);
    trimmed.trim_end_matches(['\'', '"'])
}

#[derive(Debug, Clone)]
pub struct LocalCatalog {
    snapshot: CatalogSnapshot,
    /// Directory that ids are relative to (directory mode only)
    base: Option<PathBuf>,
}

impl LocalCatalog {
    /// Scan the filesystem and fix the file list
    pub fn build(source: &CatalogSource) -> Result<Self, CatalogError> {
        let catalog = match source {
            CatalogSource::Directory { path, recursive } => {
                let base = absolute(path)?;
                if !base.is_dir() {
                    return Err(CatalogError::NotADirectory {
                        path: base.display().to_string(),
                    });
                }
                let files = list_directory(&base, *recursive)?;
                Self {
                    snapshot: CatalogSnapshot {
                        base_path: Some(base.display().to_string()),
                        files,
                    },
                    base: Some(base),
                }
            }
            CatalogSource::List(entries) => {
                let mut files = Vec::with_capacity(entries.len());
                for entry in entries {
                    let path = absolute(Path::new(clean_path(entry)))?;
                    let id = path.display().to_string();
                    if id.ends_with(MODEL_SUFFIX) {
                        files.push(id);
                    }
                }
                Self {
                    snapshot: CatalogSnapshot {
                        base_path: None,
                        files,
                    },
                    base: None,
                }
            }
        };

        info!(
            "📁 Catalog ready: {} models{}",
            catalog.snapshot.files.len(),
            catalog
                .snapshot
                .base_path
                .as_deref()
                .map(|p| format!(" in {}", p))
                .unwrap_or_default()
        );
        Ok(catalog)
    }

    pub fn files(&self) -> &[String] {
        &self.snapshot.files
    }

    /// Filesystem path of a catalog entry; `None` for ids not in the catalog
    pub fn resolve(&self, id: &str) -> Option<PathBuf> {
        if !self.snapshot.contains(id) {
            return None;
        }
        Some(match &self.base {
            Some(base) => base.join(id),
            None => PathBuf::from(id),
        })
    }
}

impl FileCatalog for LocalCatalog {
    async fn snapshot(&self) -> Result<CatalogSnapshot, FetchError> {
        Ok(self.snapshot.clone())
    }

    async fn read(&self, id: &str) -> Result<Vec<u8>, FetchError> {
        let path = self
            .resolve(id)
            .ok_or_else(|| FetchError::NotInCatalog(id.to_string()))?;

        debug!("📂 Reading {}", path.display());
        tokio::fs::read(&path).await.map_err(|e| FetchError::Io {
            id: id.to_string(),
            reason: e.to_string(),
        })
    }
}

fn absolute(path: &Path) -> Result<PathBuf, CatalogError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Model files under `base`, sorted by name, as paths relative to `base`
fn list_directory(base: &Path, recursive: bool) -> Result<Vec<String>, CatalogError> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();

    for entry in WalkDir::new(base)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(true)
        .sort_by_file_name()
    {
        // Only an unreadable base directory is fatal
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) if source.depth() == 0 => {
                return Err(CatalogError::Walk {
                    path: base.display().to_string(),
                    source,
                });
            }
            Err(e) => {
                warn!("⚠️  Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(base) else {
            continue;
        };
        let id = relative.to_string_lossy().to_string();
        if id.ends_with(MODEL_SUFFIX) {
            files.push(id);
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn model_dir() -> TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("b.glb"), b"b").expect("write");
        fs::write(dir.path().join("a.glb"), b"a").expect("write");
        fs::write(dir.path().join("notes.txt"), b"skip").expect("write");
        fs::write(dir.path().join("a.glb.bak"), b"skip").expect("write");
        fs::create_dir(dir.path().join("nested")).expect("mkdir");
        fs::write(dir.path().join("nested").join("c.glb"), b"c").expect("write");
        dir
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("  '/tmp/a.glb'  "), "/tmp/a.glb");
        assert_eq!(clean_path("/tmp/a.glb\"\n"), "/tmp/a.glb");
        assert_eq!(clean_path("plain"), "plain");
    }

    #[test]
    fn test_source_from_inputs() {
        let dir = CatalogSource::from_inputs(None, &["models".to_string()], true);
        assert_eq!(
            dir,
            CatalogSource::Directory {
                path: PathBuf::from("models"),
                recursive: true
            }
        );

        let listed = CatalogSource::from_inputs(
            None,
            &["x.glb".to_string(), "y.glb\nz.glb".to_string()],
            false,
        );
        assert_eq!(
            listed,
            CatalogSource::List(vec!["x.glb".into(), "y.glb".into(), "z.glb".into()])
        );

        // Piped input wins over arguments
        let piped = CatalogSource::from_inputs(Some("p.glb\r\nq.glb\n\n"), &[], false);
        assert_eq!(piped, CatalogSource::List(vec!["p.glb".into(), "q.glb".into()]));

        let default = CatalogSource::from_inputs(Some("  "), &[], false);
        assert!(matches!(default, CatalogSource::Directory { path, .. } if path == Path::new(".")));
    }

    #[test]
    fn test_directory_listing_is_sorted_and_filtered() {
        let dir = model_dir();
        let catalog = LocalCatalog::build(&CatalogSource::Directory {
            path: dir.path().to_path_buf(),
            recursive: false,
        })
        .expect("build");

        assert_eq!(catalog.files(), ["a.glb", "b.glb"]);
        assert_eq!(
            catalog.snapshot.base_path.as_deref(),
            Some(dir.path().display().to_string().as_str())
        );
    }

    #[test]
    fn test_recursive_listing_uses_relative_ids() {
        let dir = model_dir();
        let catalog = LocalCatalog::build(&CatalogSource::Directory {
            path: dir.path().to_path_buf(),
            recursive: true,
        })
        .expect("build");

        let nested = Path::new("nested").join("c.glb").display().to_string();
        assert_eq!(catalog.files().len(), 3);
        assert!(catalog.files().contains(&nested));
        assert_eq!(catalog.resolve(&nested), Some(dir.path().join("nested").join("c.glb")));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("a.glb"), b"a").expect("write");
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("stale-link"))
            .expect("symlink");
        std::os::unix::fs::symlink(dir.path().join("gone.glb"), dir.path().join("z.glb"))
            .expect("symlink");

        let catalog = LocalCatalog::build(&CatalogSource::Directory {
            path: dir.path().to_path_buf(),
            recursive: false,
        })
        .expect("build");

        assert_eq!(catalog.files(), ["a.glb"]);
    }

    #[test]
    fn test_not_a_directory() {
        let dir = model_dir();
        let result = LocalCatalog::build(&CatalogSource::Directory {
            path: dir.path().join("notes.txt"),
            recursive: false,
        });
        assert!(matches!(result, Err(CatalogError::NotADirectory { .. })));
    }

    #[tokio::test]
    async fn test_list_mode_reads_absolute_paths() {
        let dir = model_dir();
        let a = dir.path().join("a.glb").display().to_string();
        let catalog = LocalCatalog::build(&CatalogSource::List(vec![
            format!("'{}'", a),
            dir.path().join("notes.txt").display().to_string(),
        ]))
        .expect("build");

        let snapshot = catalog.snapshot().await.expect("snapshot");
        assert_eq!(snapshot.base_path, None);
        assert_eq!(snapshot.files, vec![a.clone()]);
        assert_eq!(catalog.read(&a).await.expect("read"), b"a");
    }

    #[tokio::test]
    async fn test_read_rejects_unlisted_ids() {
        let dir = model_dir();
        let catalog = LocalCatalog::build(&CatalogSource::Directory {
            path: dir.path().to_path_buf(),
            recursive: false,
        })
        .expect("build");

        assert_eq!(
            catalog.read("notes.txt").await,
            Err(FetchError::NotInCatalog("notes.txt".to_string()))
        );
        assert_eq!(catalog.read("a.glb").await.expect("read"), b"a");
    }
}
