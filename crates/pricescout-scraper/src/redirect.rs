//! Follows aggregator redirect and affiliate chains down to the seller.

use std::sync::{Arc, LazyLock};

use futures::stream::{self, StreamExt};
use pricescout_core::{DomainSet, SourcesConfig};
use scraper::{Html, Selector};

use crate::client::Fetcher;
use crate::origin::{absolutize, host_of};

/// Hard ceiling on indirection steps per URL.
pub const MAX_HOPS: usize = 5;

const PURCHASE_KEYWORDS: &[&str] = &[
    "buy",
    "go to store",
    "to the store",
    "visit store",
    "shop now",
    "view deal",
    "לחנות",
    "מעבר לחנות",
    "לאתר החנות",
    "מעבר לאתר",
    "לרכישה",
    "קנה",
    "לקנייה",
];

static BUY_BUTTON_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "a[class*=buy], a[class*=store], a[class*=shop], a[class*=go-to], a[class*=goto], \
         a[id*=buy], a[data-store-url], a[rel~=sponsored]",
    )
    .expect("valid selector")
});
static META_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[http-equiv]").expect("valid selector"));
static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));

/// Outcome of resolving one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub original: String,
    /// Last URL reached.
    pub url: String,
    /// `false` when `url` is still on an aggregator domain and must not be
    /// attributed to a concrete seller.
    pub resolved: bool,
    pub hops: usize,
}

pub struct RedirectResolver {
    fetcher: Arc<Fetcher>,
    aggregators: DomainSet,
    social: DomainSet,
    concurrency: usize,
}

impl RedirectResolver {
    #[must_use]
    pub fn new(fetcher: Arc<Fetcher>, aggregators: DomainSet, social: DomainSet) -> Self {
        Self {
            fetcher,
            aggregators,
            social,
            concurrency: 5,
        }
    }

    #[must_use]
    pub fn from_sources(fetcher: Arc<Fetcher>, sources: &SourcesConfig) -> Self {
        Self::new(
            fetcher,
            sources.aggregator_domains.clone(),
            sources.social_domains.clone(),
        )
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub fn is_aggregator(&self, url: &str) -> bool {
        host_of(url).is_some_and(|h| self.aggregators.contains_host(&h))
    }

    fn is_social(&self, url: &str) -> bool {
        host_of(url).is_some_and(|h| self.social.contains_host(&h))
    }

    /// Resolves `url` through at most [`MAX_HOPS`] indirection steps.
    ///
    /// Non-aggregator URLs are returned untouched with zero hops. A failed
    /// hop stops resolution at the last URL reached.
    pub async fn resolve(&self, url: &str) -> Resolution {
        let mut current = url.to_string();
        let mut hops = 0;

        while hops < MAX_HOPS && self.is_aggregator(&current) {
            hops += 1;
            let next = if current.contains("/redir/") {
                self.fetcher.head_location(&current).await
            } else {
                self.follow_page(&current).await
            };
            match next {
                Some(next) if next != current => {
                    tracing::debug!(from = %current, to = %next, hop = hops, "redirect hop");
                    current = next;
                }
                _ => break,
            }
        }

        let resolved = !self.is_aggregator(&current);
        if !resolved {
            tracing::debug!(url, last = %current, hops, "redirect chain left unresolved");
        }
        Resolution {
            original: url.to_string(),
            url: current,
            resolved,
            hops,
        }
    }

    /// Resolves a batch with bounded parallelism, preserving input order.
    pub async fn resolve_many(&self, urls: &[String]) -> Vec<Resolution> {
        let pending: Vec<_> = urls.iter().map(|url| self.resolve(url)).collect();
        stream::iter(pending)
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// GETs an aggregator page; returns where it ends up or the best
    /// outbound store link on it.
    async fn follow_page(&self, url: &str) -> Option<String> {
        let page = self.fetcher.get(url, None).await?;
        if !self.is_aggregator(&page.url) {
            return Some(page.url);
        }
        self.find_store_link(&page.body, &page.url)
            .or_else(|| (page.url != url).then_some(page.url))
    }

    /// Meta refresh, then buy/store buttons, then anchors whose text reads
    /// like a purchase call-to-action. Social links are never returned.
    #[must_use]
    pub fn find_store_link(&self, html: &str, base: &str) -> Option<String> {
        let doc = Html::parse_document(html);
        let base_host = host_of(base);

        let refresh = doc
            .select(&META_SELECTOR)
            .filter(|m| {
                m.value()
                    .attr("http-equiv")
                    .is_some_and(|v| v.eq_ignore_ascii_case("refresh"))
            })
            .filter_map(|m| m.value().attr("content"))
            .find_map(meta_refresh_target)
            .and_then(|target| absolutize(base, &target))
            .filter(|u| !self.is_social(u));
        if refresh.is_some() {
            return refresh;
        }

        let button = doc
            .select(&BUY_BUTTON_SELECTOR)
            .filter_map(|a| {
                a.value()
                    .attr("data-store-url")
                    .or_else(|| a.value().attr("href"))
            })
            .filter_map(|href| absolutize(base, href))
            .find(|u| leaves_page(u, base_host.as_deref()) && !self.is_social(u));
        if button.is_some() {
            return button;
        }

        doc.select(&ANCHOR_SELECTOR)
            .filter(|a| {
                let text = a.text().collect::<String>().to_lowercase();
                let label = a.value().attr("title").unwrap_or_default().to_lowercase();
                PURCHASE_KEYWORDS
                    .iter()
                    .any(|k| text.contains(k) || label.contains(k))
            })
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| absolutize(base, href))
            .find(|u| leaves_page(u, base_host.as_deref()) && !self.is_social(u))
    }
}

/// A candidate moves resolution forward when it points off the current host,
/// or at the host's own `/redir/` endpoint.
fn leaves_page(candidate: &str, base_host: Option<&str>) -> bool {
    host_of(candidate).as_deref() != base_host || candidate.contains("/redir/")
}

/// `"0; url=https://shop.example/"` -> `"https://shop.example/"`.
fn meta_refresh_target(content: &str) -> Option<String> {
    let lower = content.to_ascii_lowercase();
    let idx = lower.find("url=")?;
    let target = content[idx + 4..]
        .trim()
        .trim_matches(|c| c == '\'' || c == '"');
    (!target.is_empty()).then(|| target.to_string())
}
