use crate::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Results per listing page, matching the frontend's pagination math.
pub const PAGE_SIZE: u32 = 20;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub catalog_url: String,
    pub uploads_url: String,
    pub referer: String,
    pub request_timeout: Duration,
    pub max_scale: f32,
    pub history_file: PathBuf,
    pub history_capacity: usize,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            catalog_url: trim_trailing_slash(args.catalog_url),
            uploads_url: trim_trailing_slash(args.uploads_url),
            referer: args.referer,
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            max_scale: args.max_scale,
            history_file: args.history_file.unwrap_or_else(default_history_file),
            history_capacity: args.history_capacity,
        }
    }
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

fn default_history_file() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("olliverse").join("history.json"))
        .unwrap_or_else(|| PathBuf::from("olliverse-history.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slashes_removed() {
        assert_eq!(
            trim_trailing_slash("https://api.example.org///".to_string()),
            "https://api.example.org"
        );
        assert_eq!(
            trim_trailing_slash("https://api.example.org".to_string()),
            "https://api.example.org"
        );
    }
}
