//! Detection of anti-bot interstitials served with a 200 status.

/// Returns `true` when `body` is a bot-challenge page rather than content.
///
/// Cloudflare, PerimeterX and Incapsula all answer blocked clients with a
/// successful status and a tiny challenge document; treating those as
/// content would make every downstream extractor report a miss.
pub(crate) fn looks_like_bot_challenge(body: &str) -> bool {
    // Challenge pages are small; real listing pages are not.
    if body.len() > 200_000 {
        return false;
    }
    let lowered = body.to_ascii_lowercase();
    let has_cloudflare_banner = lowered.contains("attention required! | cloudflare");
    let has_challenge_platform = lowered.contains("/cdn-cgi/challenge-platform/");
    let has_just_a_moment = lowered.contains("just a moment...");
    let has_cookie_gate = lowered.contains("please enable cookies");
    let has_cf_chl = lowered.contains("cf-chl-");
    let has_perimeterx = lowered.contains("px-captcha");
    let has_incapsula = lowered.contains("_incapsula_resource");

    // Cloudflare's jsd telemetry script also lives under challenge-platform
    // on ordinary pages, so the path alone proves nothing.
    has_cloudflare_banner
        || (has_challenge_platform && (has_just_a_moment || has_cf_chl))
        || has_perimeterx
        || has_incapsula
        || (has_just_a_moment && has_cookie_gate)
        || (has_just_a_moment && has_cf_chl)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_cloudflare_interstitial() {
        let body = "<html><head><title>Just a moment...</title></head>\
                    <body><script src=\"/cdn-cgi/challenge-platform/h/b/orchestrate\"></script></body></html>";
        assert!(looks_like_bot_challenge(body));
    }

    #[test]
    fn detects_perimeterx_captcha() {
        assert!(looks_like_bot_challenge(
            "<div id=\"px-captcha\"></div>"
        ));
    }

    #[test]
    fn ordinary_page_is_not_a_challenge() {
        let body = "<html><body><h1>Samsung TV</h1><span class=\"price\">₪2,990</span></body></html>";
        assert!(!looks_like_bot_challenge(body));
    }

    #[test]
    fn cloudflare_jsd_script_on_a_normal_page_is_content() {
        let body = "<html><head><title>Samsung TV</title></head><body>\
                    <span class=\"price\">₪2,990</span>\
                    <script src=\"/cdn-cgi/challenge-platform/scripts/jsd/main.js\"></script>\
                    </body></html>";
        assert!(!looks_like_bot_challenge(body));
    }

    #[test]
    fn challenge_form_with_platform_script_is_blocked() {
        let body = "<div id=\"cf-chl-widget-a1b2\"></div>\
                    <script src=\"/cdn-cgi/challenge-platform/h/g/orchestrate/chl_page/v1\"></script>";
        assert!(looks_like_bot_challenge(body));
    }

    #[test]
    fn just_a_moment_alone_is_not_enough() {
        assert!(!looks_like_bot_challenge(
            "<p>Just a moment... while we load your cart</p>"
        ));
    }
}
