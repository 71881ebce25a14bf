use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use tracing::instrument;

use crate::Standings;

/// Anything that can report the fan-of-month standings.
#[async_trait]
pub trait StandingsSource: Send + Sync {
    async fn fetch_standings(&self) -> anyhow::Result<Standings>;
}

#[derive(Clone, Debug)]
pub struct StandingsClient {
    client: Client,
    url: String,
}

impl StandingsClient {
    pub fn new(url: String, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            url,
        })
    }
}

#[async_trait]
impl StandingsSource for StandingsClient {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_standings(&self) -> anyhow::Result<Standings> {
        let standings = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.url))?
            .error_for_status()?
            .json::<Standings>()
            .await
            .context("Failed to decode fan-of-month standings")?;

        tracing::debug!(
            "Received standings for {} {} with {} fans",
            standings.month,
            standings.year,
            standings.top_fans.len()
        );
        Ok(standings)
    }
}
