//! Hakai API access for failed CTD casts.

use crate::CliResult;
use clap::Args;
use ctd_issues_core::{CAST_FIELDS, CastRecord, HakaiCredentials};
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;

/// Default Hakai API root.
pub const DEFAULT_API_ROOT: &str = "https://hecate.hakai.org/api";
const CAST_VIEW_PATH: &str = "ctd/views/file/cast";

/// CLI arguments for reaching the Hakai API.
#[derive(Args, Clone, Debug)]
pub struct HakaiArgs {
    /// Base URL of the Hakai API.
    #[arg(long, env = "HAKAI_API_ROOT", default_value = DEFAULT_API_ROOT)]
    pub api_root: String,
    /// Hakai API credential string (token_type=...&access_token=...).
    #[arg(long, env = "HAKAI_API_CREDENTIALS", hide_env_values = true)]
    pub credentials: Option<String>,
}

/// Source of failed CTD casts.
pub trait HakaiClient {
    /// Fetch every cast whose processing reported an error.
    fn fetch_failed_casts<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = CliResult<Vec<CastRecord>>> + Send + 'a>>;
}

/// Reqwest-backed Hakai API client.
pub struct ReqwestHakaiClient {
    client: Client,
    url: String,
    authorization: String,
}

impl ReqwestHakaiClient {
    /// Build a client for `api_root` authenticated with `credentials`.
    pub fn new(api_root: &str, credentials: &HakaiCredentials) -> CliResult<Self> {
        let client = Client::builder().user_agent("ctd-issues-cli").build()?;
        Ok(Self {
            client,
            url: failed_casts_url(api_root)?,
            authorization: credentials.authorization_header(),
        })
    }

    /// Build a client from CLI arguments, requiring credentials.
    pub fn from_args(args: &HakaiArgs) -> CliResult<Self> {
        let raw = args
            .credentials
            .as_deref()
            .ok_or("HAKAI_API_CREDENTIALS is required to query the Hakai API")?;
        let credentials = HakaiCredentials::parse(raw)?;
        if credentials.is_expired(chrono::Utc::now()) {
            log::warn!(
                "Hakai API credentials expired at {}; the request may be rejected",
                credentials
                    .expires_at()
                    .map(|expiry| expiry.to_rfc3339())
                    .unwrap_or_default()
            );
        }
        Self::new(&args.api_root, &credentials)
    }
}

impl HakaiClient for ReqwestHakaiClient {
    fn fetch_failed_casts<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = CliResult<Vec<CastRecord>>> + Send + 'a>> {
        Box::pin(fetch_failed_casts(
            &self.client,
            &self.url,
            &self.authorization,
        ))
    }
}

/// Normalize the API root for consistent request URLs.
fn normalize_api_root(api_root: &str) -> CliResult<String> {
    let trimmed = api_root.trim();
    if trimmed.is_empty() {
        return Err("hakai api root is required".into());
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Query URL selecting every cast with a non-empty process error.
fn failed_casts_url(api_root: &str) -> CliResult<String> {
    let root = normalize_api_root(api_root)?;
    Ok(format!(
        "{root}/{CAST_VIEW_PATH}?process_error!=null&process_error!=''&limit=-1&fields={}",
        CAST_FIELDS.join(",")
    ))
}

async fn fetch_failed_casts(
    client: &Client,
    url: &str,
    authorization: &str,
) -> CliResult<Vec<CastRecord>> {
    log::info!("Fetching failed CTD casts from {url}");
    let response = client
        .get(url)
        .header("Authorization", authorization)
        .header("Accept", "application/json")
        .send()
        .await?;
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(format!("hakai api error ({status}): {body}").into());
    }
    let casts = response.json::<Vec<CastRecord>>().await?;
    log::info!("Received {} failed casts", casts.len());
    Ok(casts)
}
