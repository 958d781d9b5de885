use axum::body::Bytes;

use crate::config::Config;
use crate::error::ApiError;

/// Accept header sent when fetching upstream page/cover images.
const IMAGE_ACCEPT: &str = "image/webp,image/avif,image/png,image/jpeg,*/*";

/// Raw image bytes as served by the upstream host.
pub struct FetchedImage {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Fetches page and cover images from upstream hosts. The upstream
/// requires a Referer from the catalog's own origin.
pub struct ImageFetcher {
    http: reqwest::Client,
    referer: String,
}

impl ImageFetcher {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("olliverse-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            referer: config.referer.clone(),
        })
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedImage, ApiError> {
        validate_url(url)?;

        let response = self
            .http
            .get(url)
            .header(reqwest::header::REFERER, &self.referer)
            .header(reqwest::header::ACCEPT, IMAGE_ACCEPT)
            .send()
            .await
            .map_err(|e| ApiError::UpstreamRequest(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::UpstreamStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::UpstreamRequest(e.to_string()))?;

        Ok(FetchedImage {
            bytes,
            content_type,
        })
    }
}

fn validate_url(url: &str) -> Result<(), ApiError> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid image URL: {}", e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ApiError::InvalidRequest(format!(
            "Unsupported URL scheme: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_and_https_urls_accepted() {
        assert!(validate_url("https://uploads.example.org/covers/a/b.jpg").is_ok());
        assert!(validate_url("http://localhost:8080/page.png").is_ok());
    }

    #[test]
    fn test_other_schemes_rejected() {
        assert!(validate_url("file:///etc/passwd").is_err());
        assert!(validate_url("ftp://example.org/x").is_err());
        assert!(validate_url("not a url").is_err());
    }
}
