//! Unsplash photo search client.

use serde::Deserialize;
use tracing::instrument;
use url::Url;

use super::{ProviderError, StockPhoto, StockPhotoSearch, truncate_body};
use crate::config::UnsplashConfig;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    urls: PhotoUrls,
    user: Photographer,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: String,
    small: String,
}

#[derive(Debug, Deserialize)]
struct Photographer {
    name: String,
    username: String,
    links: PhotographerLinks,
}

#[derive(Debug, Deserialize)]
struct PhotographerLinks {
    html: String,
}

impl From<Photo> for StockPhoto {
    fn from(photo: Photo) -> Self {
        Self {
            url: photo.urls.regular,
            thumbnail_url: photo.urls.small,
            photographer: photo.user.name,
            username: photo.user.username,
            profile_url: photo.user.links.html,
        }
    }
}

pub struct UnsplashClient {
    http: reqwest::Client,
    config: UnsplashConfig,
}

impl UnsplashClient {
    pub fn new(config: UnsplashConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    fn access_key(&self) -> Option<&str> {
        self.config.access_key.as_deref().filter(|key| !key.is_empty())
    }

    fn search_url(&self, query: &str) -> Result<Url, ProviderError> {
        let base = self.config.base_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/search/photos"))
            .map_err(|e| ProviderError::InvalidResponse(format!("invalid Unsplash base URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("per_page", "1")
            .append_pair("orientation", "landscape");
        Ok(url)
    }
}

#[async_trait::async_trait]
impl StockPhotoSearch for UnsplashClient {
    fn is_configured(&self) -> bool {
        self.access_key().is_some()
    }

    #[instrument(skip(self), err)]
    async fn search(&self, query: &str) -> Result<Vec<StockPhoto>, ProviderError> {
        let access_key = self.access_key().ok_or(ProviderError::NotConfigured { provider: "Unsplash" })?;

        let response = self
            .http
            .get(self.search_url(query)?)
            .header("Authorization", format!("Client-ID {access_key}"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: SearchResponse = response.json().await?;
        Ok(parsed.results.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::install_crypto_provider;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> UnsplashClient {
        install_crypto_provider();
        UnsplashClient::new(UnsplashConfig {
            access_key: Some("access-123".to_string()),
            base_url: server.uri(),
            ..UnsplashConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_search_maps_first_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/photos"))
            .and(query_param("query", "ancient library alexandria scrolls books"))
            .and(query_param("per_page", "1"))
            .and(query_param("orientation", "landscape"))
            .and(header("authorization", "Client-ID access-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{
                    "urls": {"regular": "https://images.example.com/r.jpg", "small": "https://images.example.com/s.jpg"},
                    "user": {"name": "Ana Lima", "username": "analima", "links": {"html": "https://unsplash.com/@analima"}}
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let photos = client_for(&server).search("ancient library alexandria scrolls books").await.unwrap();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].url, "https://images.example.com/r.jpg");
        assert_eq!(photos[0].thumbnail_url, "https://images.example.com/s.jpg");
        assert_eq!(photos[0].photographer, "Ana Lima");
        assert_eq!(photos[0].profile_url, "https://unsplash.com/@analima");
    }

    #[tokio::test]
    async fn test_search_empty_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 0, "results": []})))
            .mount(&server)
            .await;

        let photos = client_for(&server).search("nothing").await.unwrap();
        assert!(photos.is_empty());
    }

    #[tokio::test]
    async fn test_search_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("OAuth error"))
            .mount(&server)
            .await;

        assert!(matches!(
            client_for(&server).search("x").await,
            Err(ProviderError::Status { status: 401, .. })
        ));
    }
}
