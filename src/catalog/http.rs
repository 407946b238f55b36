/// HTTP catalog used by the viewer window
///
/// Talks to the bundled server the same way any other client would:
/// `GET /files` for the list, `GET /files/<id>` for bytes (the id travels as
/// one percent-encoded path segment) and `GET /heartbeat` to keep the server
/// alive.
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use super::{CatalogSnapshot, FileCatalog};
use crate::error::FetchError;

#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: Client,
    base: Url,
}

impl HttpCatalog {
    pub fn new(base: Url) -> Self {
        Self {
            client: Client::new(),
            base,
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// URL of an endpoint, built from path segments so each is encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|_| FetchError::Http {
                what: self.base.to_string(),
                reason: "base URL cannot hold a path".to_string(),
            })?
            .clear()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url, id: Option<&str>) -> Result<reqwest::Response, FetchError> {
        let what = url.path().to_string();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Http {
                what: what.clone(),
                reason: e.to_string(),
            })?;

        match (response.status(), id) {
            (StatusCode::NOT_FOUND, Some(id)) => Err(FetchError::NotInCatalog(id.to_string())),
            (status, _) if !status.is_success() => Err(FetchError::Http {
                what,
                reason: status.to_string(),
            }),
            _ => Ok(response),
        }
    }

    /// Ping the server so its idle timer restarts
    pub async fn heartbeat(&self) -> Result<(), FetchError> {
        let url = self.endpoint(&["heartbeat"])?;
        self.get(url, None).await?;
        debug!("💓 Heartbeat sent");
        Ok(())
    }
}

impl FileCatalog for HttpCatalog {
    async fn snapshot(&self) -> Result<CatalogSnapshot, FetchError> {
        let url = self.endpoint(&["files"])?;
        let response = self.get(url, None).await?;
        response
            .json::<CatalogSnapshot>()
            .await
            .map_err(|e| FetchError::Http {
                what: "/files".to_string(),
                reason: e.to_string(),
            })
    }

    async fn read(&self, id: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.endpoint(&["files", id])?;
        let response = self.get(url, Some(id)).await?;
        let bytes = response.bytes().await.map_err(|e| FetchError::Http {
            what: id.to_string(),
            reason: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_ids_are_one_segment() {
        let catalog = HttpCatalog::new(Url::parse("http://127.0.0.1:8080/?flip").expect("url"));

        let url = catalog
            .endpoint(&["files", "nested/dir name/c.glb"])
            .expect("endpoint");
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/files/nested%2Fdir%20name%2Fc.glb"
        );

        let url = catalog.endpoint(&["heartbeat"]).expect("endpoint");
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/heartbeat");
    }
}
