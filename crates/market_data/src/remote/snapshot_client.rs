use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use common::models::{Signal, SymbolMeta};

use crate::remote::stream_event::SignalEvent;

/// Read-only source of the initial signal snapshot, split out as a trait
/// so startup seeding can be exercised against a scripted source.
#[async_trait]
pub trait SignalSource: Send + Sync {
    async fn fetch_signals(&self) -> anyhow::Result<Vec<Signal>>;
}

/// REST client for the two seed fetches done at startup: the recent
/// signal snapshot and the symbol metadata for the selection UI.
pub struct SnapshotClient {
    client: Client,
    base_url: Url,
}

impl SnapshotClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url).context("Invalid snapshot base URL")?;
        let client = Client::builder()
            .user_agent("signal_dashboard/0.1.0")
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, base_url })
    }

    pub async fn fetch_symbols(&self) -> anyhow::Result<Vec<SymbolMeta>> {
        let url = self.base_url.join("api/symbols")?;
        let symbols: Vec<SymbolMeta> = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch symbol metadata")?
            .error_for_status()?
            .json()
            .await
            .context("Failed to parse symbol metadata")?;
        debug!("Fetched metadata for {} symbols", symbols.len());
        Ok(symbols)
    }
}

#[async_trait]
impl SignalSource for SnapshotClient {
    async fn fetch_signals(&self) -> anyhow::Result<Vec<Signal>> {
        let url = self.base_url.join("api/signals")?;
        let payloads: Vec<SignalEvent> = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch signal snapshot")?
            .error_for_status()?
            .json()
            .await
            .context("Failed to parse signal snapshot")?;

        // Bad rows are isolated: one unparseable signal must not sink
        // the whole snapshot.
        let mut signals = Vec::with_capacity(payloads.len());
        for payload in &payloads {
            match payload.to_domain() {
                Ok(signal) => signals.push(signal),
                Err(e) => warn!("Skipping snapshot signal {}: {e}", payload.id),
            }
        }
        debug!("Loaded {} snapshot signals", signals.len());
        Ok(signals)
    }
}
