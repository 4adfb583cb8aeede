pub mod adapters;
pub mod aggregate;
pub mod client;
pub mod error;
pub mod extract;
pub mod origin;
pub mod rate_limit;
pub mod redirect;
pub mod search;
pub mod seller;
pub mod version;

pub use adapters::{
    AdapterContext, AdapterRegistry, BugAdapter, KspAdapter, SourceAdapter, WisebuyAdapter,
    ZapAdapter,
};
pub use aggregate::aggregate;
pub use client::{FetchMetrics, FetchedPage, Fetcher, FetcherConfig, RetryPolicy};
pub use error::{AdapterError, ScraperError};
pub use extract::{
    normalize_phone, BrowserlessProbe, ButtonProbe, ContactExtractor, PriceExtractor,
    PriceResult, PriceStrategy,
};
pub use rate_limit::RateLimiter;
pub use redirect::{RedirectResolver, Resolution, MAX_HOPS};
pub use search::{PriceSearch, SearchOutcome};
pub use seller::SellerNormalizer;
