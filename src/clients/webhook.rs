//! reqwest implementation of [`WebhookClient`].

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::traits::{WebhookClient, WebhookResponse};
use crate::error::Result;

pub struct HttpWebhookClient {
    client: reqwest::Client,
}

impl HttpWebhookClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build reqwest client with timeout")?;
        Ok(Self { client })
    }
}

async fn collect(resp: reqwest::Response) -> Result<WebhookResponse> {
    let status = resp.status().as_u16();
    let body = resp.text().await?;
    debug!(status, bytes = body.len(), "webhook responded");
    Ok(WebhookResponse { status, body })
}

#[async_trait]
impl WebhookClient for HttpWebhookClient {
    async fn post_json(&self, url: &str, body: &Value) -> Result<WebhookResponse> {
        debug!(url, "posting to webhook");
        let resp = self
            .client
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;
        collect(resp).await
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<WebhookResponse> {
        debug!(url, "fetching webhook");
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .query(query)
            .send()
            .await?;
        collect(resp).await
    }
}
