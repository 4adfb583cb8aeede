//! Headless-browser probe for WhatsApp buttons that only reveal their
//! target after a click.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ScraperError;
use crate::rate_limit::RateLimiter;

/// CSS selector for widgets worth clicking.
pub const WHATSAPP_WIDGET_SELECTOR: &str = "a[href*='whatsapp'], [class*='whatsapp'], [id*='whatsapp'], [class*='WhatsApp'], [aria-label*='WhatsApp'], [class*='wa-']";

/// Clicks WhatsApp-styled widgets on a live page and reports every URL the
/// page tried to open (popups, navigations, outgoing requests).
#[async_trait]
pub trait ButtonProbe: Send + Sync {
    async fn capture_urls(&self, page_url: &str) -> Result<Vec<String>, ScraperError>;
}

/// Runs the click script through a Browserless `/function` endpoint.
const PROBE_SCRIPT: &str = r"
export default async function ({ page, context }) {
  const urls = [];
  page.on('request', (r) => urls.push(r.url()));
  page.on('popup', (p) => urls.push(p.url()));
  await page.evaluateOnNewDocument(() => {
    window.open = (u) => { (window.__opened = window.__opened || []).push(String(u)); return null; };
  });
  await page.goto(context.url, { waitUntil: 'networkidle2', timeout: context.timeoutMs });
  const handles = await page.$$(context.selector);
  for (const h of handles.slice(0, context.maxClicks)) {
    try { await h.click(); await new Promise((r) => setTimeout(r, 1500)); } catch (e) {}
  }
  const opened = await page.evaluate(() => window.__opened || []);
  return { data: { urls: urls.concat(opened, [page.url()]) }, type: 'application/json' };
}
";

#[derive(Debug, Deserialize)]
struct ProbeResponse {
    #[serde(default)]
    urls: Vec<String>,
}

pub struct BrowserlessProbe {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    limiter: Arc<RateLimiter>,
}

impl BrowserlessProbe {
    /// Each POST takes a token for the Browserless host from `limiter`, the
    /// same limiter the fetcher uses.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        token: Option<&str>,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, ScraperError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(45))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            limiter,
        })
    }
}

#[async_trait]
impl ButtonProbe for BrowserlessProbe {
    async fn capture_urls(&self, page_url: &str) -> Result<Vec<String>, ScraperError> {
        let endpoint = format!("{}/function", self.base_url);

        let body = serde_json::json!({
            "code": PROBE_SCRIPT,
            "context": {
                "url": page_url,
                "selector": WHATSAPP_WIDGET_SELECTOR,
                "maxClicks": 5,
                "timeoutMs": 20_000,
            },
        });

        self.limiter.acquire(&endpoint).await;
        let mut request = self.client.post(&endpoint).json(&body);
        if let Some(ref token) = self.token {
            request = request.query(&[("token", token)]);
        }
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let err = if status.is_server_error() {
                ScraperError::ServerError {
                    status: status.as_u16(),
                    url: endpoint,
                }
            } else {
                ScraperError::ClientError {
                    status: status.as_u16(),
                    url: endpoint,
                }
            };
            return Err(err);
        }

        let text = resp.text().await?;
        let parsed: ProbeResponse =
            serde_json::from_str(&text).map_err(|e| ScraperError::Deserialize {
                context: format!("browserless probe response for {page_url}"),
                source: e,
            })?;
        Ok(parsed.urls)
    }
}
