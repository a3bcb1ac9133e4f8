/// Default storage bucket for application documents.
const DEFAULT_STORAGE_BUCKET: &str = "applications";

/// Connection settings for the external platform.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Project base URL, e.g. `https://xyz.platform.co`. `None` selects the
    /// in-memory platform (local development only).
    pub url: Option<String>,
    /// Public (anon) API key sent as `apikey` on every request.
    pub anon_key: String,
    /// Service-role key used for server-side row and storage access.
    pub service_key: String,
    /// Bucket holding resumes, decks and memos.
    pub storage_bucket: String,
}

impl PlatformConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                   | Required | Default        |
    /// |---------------------------|----------|----------------|
    /// | `PLATFORM_URL`            | no       | in-memory      |
    /// | `PLATFORM_ANON_KEY`       | with URL | --             |
    /// | `PLATFORM_SERVICE_KEY`    | with URL | --             |
    /// | `PLATFORM_STORAGE_BUCKET` | no       | `applications` |
    ///
    /// # Panics
    ///
    /// Panics if `PLATFORM_URL` is set but either key is missing.
    pub fn from_env() -> Self {
        let url = std::env::var("PLATFORM_URL")
            .ok()
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());

        let (anon_key, service_key) = if url.is_some() {
            (
                std::env::var("PLATFORM_ANON_KEY")
                    .expect("PLATFORM_ANON_KEY must be set when PLATFORM_URL is set"),
                std::env::var("PLATFORM_SERVICE_KEY")
                    .expect("PLATFORM_SERVICE_KEY must be set when PLATFORM_URL is set"),
            )
        } else {
            (String::new(), String::new())
        };

        let storage_bucket = std::env::var("PLATFORM_STORAGE_BUCKET")
            .unwrap_or_else(|_| DEFAULT_STORAGE_BUCKET.to_string());

        Self {
            url,
            anon_key,
            service_key,
            storage_bucket,
        }
    }
}
