//! Price and contact extraction engines.

mod contact;
mod jsonld;
mod number;
mod price;
mod probe;

pub use contact::{is_mobile, normalize_phone, ContactExtractor};
pub use price::{PriceExtractor, PriceResult, PriceStrategy};
pub use probe::{BrowserlessProbe, ButtonProbe, WHATSAPP_WIDGET_SELECTOR};

pub(crate) use jsonld::jsonld_site_name;
pub(crate) use number::{first_amount, json_amount};
