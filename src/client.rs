use std::env;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Url};

use crate::lookup::ZipLookup;
use crate::types::LookupResponse;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
const BASE_URL_ENV: &str = "ZIPFILL_BASE_URL";

/// Configuration for ZipLookupClient
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Origin (and optional path prefix) serving `/api/zip/{code}`
    pub base_url: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl LookupConfig {
    /// Read `ZIPFILL_BASE_URL`, falling back to the local server
    pub fn from_env() -> Self {
        Self {
            base_url: env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        }
    }
}

/// HTTP client for the zip lookup endpoint
#[derive(Debug, Clone)]
pub struct ZipLookupClient {
    http_client: Client,
    base_url: Url,
}

impl ZipLookupClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(LookupConfig {
            base_url: base_url.to_string(),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::with_config(LookupConfig::from_env())
    }

    pub fn with_config(config: LookupConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid lookup base URL: {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("Lookup base URL cannot carry a path: {}", base_url));
        }

        // No timeout: a hung lookup simply never settles.
        let http_client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of the lookup for `code`, with the code percent-encoded as a
    /// single path segment.
    pub fn endpoint(&self, code: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Lookup base URL cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(["api", "zip", code]);
        Ok(url)
    }

    /// Fetch the localities for a zip code
    pub async fn fetch(&self, code: &str) -> Result<LookupResponse> {
        let url = self.endpoint(code)?;

        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Lookup for {} was rejected", code))?;

        response
            .json::<LookupResponse>()
            .await
            .with_context(|| format!("Malformed lookup body for {}", code))
    }
}

impl ZipLookup for ZipLookupClient {
    async fn lookup(&self, code: &str) -> Option<LookupResponse> {
        match self.fetch(code).await {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::debug!(code, error = %format!("{:#}", e), "zip lookup yielded no data");
                None
            }
        }
    }
}
