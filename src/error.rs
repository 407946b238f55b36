/// Error types shared across the catalog, loader, renderer and server.
///
/// Errors that travel through iced messages are `Clone`, so their
/// underlying causes are flattened into strings.
use thiserror::Error;

/// Failure to obtain bytes or the file list from a catalog
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("file not in catalog: {0}")]
    NotInCatalog(String),

    #[error("failed to read {id}: {reason}")]
    Io { id: String, reason: String },

    #[error("request for {what} failed: {reason}")]
    Http { what: String, reason: String },
}

/// Failure to turn a model file into a scene graph
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("could not fetch {id}: {source}")]
    Fetch {
        id: String,
        #[source]
        source: FetchError,
    },

    #[error("could not parse {id}: {reason}")]
    Parse { id: String, reason: String },
}

impl LoadError {
    /// Identifier of the file that failed to load
    pub fn file_id(&self) -> &str {
        match self {
            LoadError::Fetch { id, .. } | LoadError::Parse { id, .. } => id,
        }
    }
}

/// Failure while rasterizing or encoding a rendered frame
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("render worker stopped: {0}")]
    Worker(String),
}

/// Why one file produced no thumbnail
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThumbnailError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Failure to build the catalog from the command line inputs
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("{path} is not a directory")]
    NotADirectory { path: String },

    #[error("failed to list {path}: {source}")]
    Walk {
        path: String,
        #[source]
        source: walkdir::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to start or run the HTTP server
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_keeps_file_id() {
        let err = LoadError::Fetch {
            id: "a.glb".to_string(),
            source: FetchError::NotInCatalog("a.glb".to_string()),
        };
        assert_eq!(err.file_id(), "a.glb");

        let err = LoadError::Parse {
            id: "b.glb".to_string(),
            reason: "bad magic".to_string(),
        };
        assert_eq!(err.file_id(), "b.glb");
        assert_eq!(err.to_string(), "could not parse b.glb: bad magic");
    }
}
