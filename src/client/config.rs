//! Client configuration.

/// Configuration for the platform HTTP clients.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL of the asset service.
    pub asset_url: String,

    /// Base URL of the catalog API.
    pub catalog_url: String,

    /// Bearer token for write operations.
    pub auth_token: Option<String>,
}

impl CatalogConfig {
    pub fn new(asset_url: impl Into<String>, catalog_url: impl Into<String>) -> Self {
        Self {
            asset_url: trim_base(asset_url.into()),
            catalog_url: trim_base(catalog_url.into()),
            auth_token: None,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Read URLs from `BINDERY_ASSET_URL` / `BINDERY_CATALOG_URL` /
    /// `BINDERY_AUTH_TOKEN`, falling back to the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("BINDERY_ASSET_URL") {
            config.asset_url = trim_base(url);
        }
        if let Ok(url) = std::env::var("BINDERY_CATALOG_URL") {
            config.catalog_url = trim_base(url);
        }
        if let Ok(token) = std::env::var("BINDERY_AUTH_TOKEN") {
            config.auth_token = Some(token);
        }
        config
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080", "http://localhost:9090")
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_urls_lose_trailing_slashes() {
        let config = CatalogConfig::new("https://assets.inkline.dev/", "https://api.inkline.dev//");
        assert_eq!(config.asset_url, "https://assets.inkline.dev");
        assert_eq!(config.catalog_url, "https://api.inkline.dev");
    }
}
