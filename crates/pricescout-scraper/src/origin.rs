//! URL host and origin helpers shared by the fetcher, resolver and adapters.

use reqwest::Url;

/// Extracts the lowercase hostname from `url`, without a leading `www.`.
///
/// Returns `None` when `url` is not an absolute URL with a host.
#[must_use]
pub fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

/// Extracts the scheme+host origin from a URL.
///
/// Given `"https://www.bug.co.il/search?q=x"`, returns `"https://www.bug.co.il"`.
#[must_use]
pub fn origin_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .map(|u| u.origin().ascii_serialization())
        .filter(|o| o != "null")
}

/// Resolves `href` against `base`, returning an absolute URL.
///
/// `javascript:`, `mailto:` and fragment-only links yield `None`.
#[must_use]
pub fn absolutize(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
    {
        return None;
    }
    let base = Url::parse(base).ok()?;
    base.join(href).ok().map(String::from)
}

/// Strips the host down to a bare business label: `www.bug.co.il` -> `bug`,
/// `shop.example.com` -> `example`.
#[must_use]
pub fn domain_label(host: &str) -> Option<String> {
    const SECOND_LEVEL: &[&str] = &["co", "org", "net", "ac", "gov", "com", "muni"];

    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    match labels.len() {
        0 => None,
        1 => Some(labels[0].to_string()),
        n => {
            let tld = labels[n - 1];
            let sld = labels[n - 2];
            if tld.len() == 2 && SECOND_LEVEL.contains(&sld) && n >= 3 {
                Some(labels[n - 3].to_string())
            } else {
                Some(sld.to_string())
            }
        }
    }
}
