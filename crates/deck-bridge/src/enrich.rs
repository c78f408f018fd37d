//! Background enrichment: cover-art upgrade and cross-platform share links.
//!
//! Requests are spawned onto the runtime and never cancelled.  Each one
//! carries the generation token that was current when it was issued; the
//! engine drops completions whose token is no longer current.
use deck_proto::config::ApiConfig;
use deck_proto::state::ShareOption;
use regex::Regex;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::engine::EngineEvent;
use crate::error::{BridgeError, Result};

/// Platforms offered in the share dialog, in display order, with their
/// `linksByPlatform` key and accent color.
pub const SHARE_PLATFORMS: [(&str, &str, &str); 3] = [
    ("spotify", "Spotify", "#a6e3a1"),
    ("tidal", "Tidal", "#89dceb"),
    ("youtube", "YouTube", "#f38ba8"),
];

#[derive(Clone)]
pub struct Enricher {
    client: reqwest::Client,
    links_url: String,
    cover_resolution: String,
    cover_token: Regex,
    event_tx: mpsc::Sender<EngineEvent>,
}

impl Enricher {
    pub fn new(
        client: reqwest::Client,
        api: &ApiConfig,
        event_tx: mpsc::Sender<EngineEvent>,
    ) -> Result<Self> {
        Ok(Self {
            client,
            links_url: api.links_url.clone(),
            cover_resolution: api.cover_resolution.clone(),
            cover_token: Regex::new(r"\d+x\d+\.jpg")?,
            event_tx,
        })
    }

    /// Swap the first `<w>x<h>.jpg` token for the configured resolution.
    pub fn upgrade_cover_url(&self, url: &str) -> String {
        let replacement = format!("{}.jpg", self.cover_resolution);
        self.cover_token
            .replace(url, regex::NoExpand(&replacement))
            .into_owned()
    }

    /// Spawn a cover fetch.  Returns `false` when the URL is not fetchable
    /// and nothing was started.
    pub fn spawn_cover_fetch(&self, url: &str, generation: u64) -> bool {
        let url = self.upgrade_cover_url(url);
        if !url.starts_with("http") {
            debug!("cover: skipping non-http url {}", url);
            return false;
        }

        let client = self.client.clone();
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            debug!("cover: fetching {} (gen {})", url, generation);
            let result = fetch_cover(&client, &url).await;
            let _ = event_tx
                .send(EngineEvent::CoverFetched { generation, result })
                .await;
        });
        true
    }

    /// Spawn a share-link lookup for `track_url`.  Returns `false` when the
    /// URL is not resolvable and nothing was started.
    pub fn spawn_link_resolution(&self, track_url: &str, generation: u64) -> bool {
        if !track_url.starts_with("http") {
            debug!("links: skipping non-http url {}", track_url);
            return false;
        }

        let client = self.client.clone();
        let links_url = self.links_url.clone();
        let track_url = track_url.to_string();
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            debug!("links: resolving {} (gen {})", track_url, generation);
            let result = resolve_links(&client, &links_url, &track_url).await;
            let _ = event_tx
                .send(EngineEvent::LinksResolved { generation, result })
                .await;
        });
        true
    }
}

pub async fn fetch_cover(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(BridgeError::Status(response.status()));
    }
    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Err(BridgeError::EmptyBody);
    }
    Ok(bytes.to_vec())
}

pub async fn resolve_links(
    client: &reqwest::Client,
    links_url: &str,
    track_url: &str,
) -> Result<Vec<ShareOption>> {
    let response = client
        .get(links_url)
        .query(&[("url", track_url)])
        .header("Accept", "application/json")
        .send()
        .await?;

    let body: Value = response.json().await?;
    share_options_from_response(&body)
}

/// Build share options from a link-aggregation response.
pub fn share_options_from_response(body: &Value) -> Result<Vec<ShareOption>> {
    let links = body
        .get("linksByPlatform")
        .and_then(Value::as_object)
        .ok_or_else(|| BridgeError::MalformedResponse("missing linksByPlatform".into()))?;

    let options = SHARE_PLATFORMS
        .iter()
        .filter_map(|(key, name, color)| {
            let url = links.get(*key)?.get("url")?.as_str()?;
            Some(ShareOption {
                service_name: name.to_string(),
                url: url.to_string(),
                accent_color: color.to_string(),
            })
        })
        .collect();
    Ok(options)
}
