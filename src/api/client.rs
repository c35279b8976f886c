use reqwest::{Client, Response, StatusCode};
use url::Url;

use super::types::{DeleteResponse, ErrorBody, PinsPage};
use crate::config::AppConfig;
use crate::error::ViewerError;
use crate::state::SortKey;

/// HTTP client for the archive server
///
/// Cheap to clone; every async task gets its own copy.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Result<Self, ViewerError> {
        let base_url = Url::parse(&config.server_url)?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ViewerError::Network(e.to_string()))?;

        log::info!("🌐 Archive server: {}", base_url);

        Ok(Self { client, base_url })
    }

    /// Resolve a possibly server-relative path (e.g., "/images/x.jpg")
    pub fn resolve(&self, path: &str) -> Result<Url, ViewerError> {
        Ok(self.base_url.join(path)?)
    }

    fn pins_url(&self, offset: usize, limit: usize, sort: SortKey) -> Result<Url, ViewerError> {
        let mut url = self.resolve("/api/pins")?;
        url.query_pairs_mut()
            .append_pair("offset", &offset.to_string())
            .append_pair("limit", &limit.to_string())
            .append_pair("sort", sort.as_str());
        Ok(url)
    }

    fn delete_url(&self, pin_id: &str, delete_file: bool) -> Result<Url, ViewerError> {
        let mut url = self.resolve("/api/pins/")?;
        url.path_segments_mut()
            .map_err(|_| ViewerError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(pin_id);
        url.query_pairs_mut()
            .append_pair("delete_file", if delete_file { "true" } else { "false" });
        Ok(url)
    }

    /// Turn a non-success status into an error, using FastAPI's `detail`
    /// when present
    async fn check_status(response: Response) -> Result<Response, ViewerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.detail)
            .unwrap_or_else(|_| {
                status.canonical_reason().unwrap_or("Unknown error").to_string()
            });

        Err(ViewerError::Status {
            status: status.as_u16(),
            message,
        })
    }

    /// `GET /api/pins?offset&limit&sort`
    pub async fn fetch_pins(
        &self,
        offset: usize,
        limit: usize,
        sort: SortKey,
    ) -> Result<PinsPage, ViewerError> {
        let url = self.pins_url(offset, limit, sort)?;
        log::debug!("GET {}", url);

        let response = Self::check_status(self.client.get(url).send().await?).await?;
        Ok(response.json::<PinsPage>().await?)
    }

    /// `DELETE /api/pins/{pin_id}?delete_file`
    pub async fn delete_pin(&self, pin_id: &str, delete_file: bool) -> Result<DeleteResponse, ViewerError> {
        let url = self.delete_url(pin_id, delete_file)?;
        log::debug!("DELETE {}", url);

        let response = Self::check_status(self.client.delete(url).send().await?).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(DeleteResponse::default());
        }
        // Body is informational only
        Ok(response.json::<DeleteResponse>().await.unwrap_or_default())
    }

    /// Download raw image bytes
    pub async fn fetch_image(&self, image_url: &str) -> Result<Vec<u8>, ViewerError> {
        let url = self.resolve(image_url)?;
        let response = Self::check_status(self.client.get(url).send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(server: &str) -> ApiClient {
        let config = AppConfig {
            server_url: server.to_string(),
            request_timeout_secs: 2,
            ..AppConfig::default()
        };
        ApiClient::new(&config).unwrap()
    }

    #[test]
    fn test_pins_url() {
        let api = client("http://localhost:8000");
        let url = api.pins_url(100, 50, SortKey::Random).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/pins?offset=100&limit=50&sort=random"
        );
    }

    #[test]
    fn test_delete_url_escapes_pin_id() {
        let api = client("http://localhost:8000/");
        let url = api.delete_url("12/34", true).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/pins/12%2F34?delete_file=true"
        );
    }

    #[test]
    fn test_resolve_keeps_absolute_urls() {
        let api = client("http://localhost:8000");
        assert_eq!(
            api.resolve("/images/abc.jpg").unwrap().as_str(),
            "http://localhost:8000/images/abc.jpg"
        );
        assert_eq!(
            api.resolve("https://cdn.example.com/x.png").unwrap().as_str(),
            "https://cdn.example.com/x.png"
        );
    }

    #[test]
    fn test_rejects_bad_server_url() {
        let config = AppConfig {
            server_url: "not a url".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(ApiClient::new(&config), Err(ViewerError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // Nothing listens on port 9 of localhost in the test environment
        let api = client("http://127.0.0.1:9");
        let result = api.fetch_pins(0, 50, SortKey::Newest).await;
        assert!(matches!(result, Err(ViewerError::Network(_))));
    }
}
