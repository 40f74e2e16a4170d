//! URL canonicalization and tracking-redirect resolution.
//!
//! Two raw URLs identify the same article iff their canonical forms are
//! byte-equal. All functions here are pure and fail-soft: anything that
//! does not parse as a URL is returned unchanged.

use percent_encoding::percent_decode_str;
use url::Url;

/// Query parameters dropped outright (exact key match, lowercased).
const TRACKING_PARAMS: &[&str] = &[
    "fbclid",
    "msclkid",
    "twclid",
    "igshid",
    "yclid",
    "ref",
    "referrer",
    "source",
    "s",
    "mkt_tok",
    "oly_enc_id",
    "oly_anon_id",
    "__s",
    "vero_id",
    "wickedid",
    "rb_clickid",
];

/// Query parameters dropped by key prefix: UTM campaign tags, Mailchimp
/// click ids, Google Ads click ids (gclid/gclsrc).
const TRACKING_PREFIXES: &[&str] = &["utm_", "mc_", "gcl"];

/// Host prefixes that mark a link as a tracking-redirect wrapper.
const REDIRECT_HOST_PREFIXES: &[&str] = &[
    "tracking.",
    "click.",
    "clicks.",
    "links.",
    "link.",
    "email.",
    "e.",
    "go.",
    "redirect.",
];

/// Query parameter names under which redirectors carry the destination.
const REDIRECT_PARAM_NAMES: &[&str] =
    &["url", "r", "redirect", "target", "destination", "goto", "link"];

fn is_tracking_param(key: &str) -> bool {
    let k = key.to_ascii_lowercase();
    TRACKING_PARAMS.contains(&k.as_str()) || TRACKING_PREFIXES.iter().any(|p| k.starts_with(p))
}

fn is_redirect_host(host: &str) -> bool {
    REDIRECT_HOST_PREFIXES.iter().any(|p| host.starts_with(p))
        || host.ends_with("list-manage.com")
}

/// Normalize a URL string to a stable identity key.
///
/// Steps, in order: force https, lowercase the host, drop tracking query
/// parameters, sort the remaining parameters by key, drop the fragment,
/// strip a single trailing slash unless the path is root.
/// Idempotent; unparseable input is returned unchanged.
pub fn canonicalize(raw: &str) -> String {
    let mut u = match Url::parse(raw) {
        Ok(u) => u,
        Err(_) => return raw.to_string(),
    };

    if u.scheme() == "http" {
        // Both schemes are "special" per the URL spec, so this cannot fail.
        let _ = u.set_scheme("https");
    }

    if let Some(host) = u.host_str() {
        let lower = host.to_ascii_lowercase();
        if lower != host {
            let _ = u.set_host(Some(&lower));
        }
    }

    let mut pairs: Vec<(String, String)> = u
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    if pairs.is_empty() {
        u.set_query(None);
    } else {
        let qs = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        u.set_query(Some(&qs));
    }

    u.set_fragment(None);

    let path = u.path().to_string();
    if path.len() > 1 {
        if let Some(stripped) = path.strip_suffix('/') {
            u.set_path(stripped);
        }
    }

    u.to_string()
}

/// Resolve a known tracking-redirect wrapper to its embedded destination.
///
/// Recognized shapes: a percent-encoded `http(s)://` URL carried in a path
/// segment (the newsletter click-tracker shape), or a destination held in a
/// named query parameter (`url`, `r`, `redirect`, ...). Returns the input
/// unchanged when no shape matches or decoding fails.
pub fn resolve_redirect(raw: &str) -> String {
    let u = match Url::parse(raw) {
        Ok(u) => u,
        Err(_) => return raw.to_string(),
    };
    let host = match u.host_str() {
        Some(h) => h.to_ascii_lowercase(),
        None => return raw.to_string(),
    };
    if !is_redirect_host(&host) {
        return raw.to_string();
    }

    // Path-embedded destination, e.g. /CL0/https%3A%2F%2Fexample.com%2Fa/1/…
    if let Some(segments) = u.path_segments() {
        for seg in segments {
            if !seg.contains("http") {
                continue;
            }
            let decoded = percent_decode_str(seg).decode_utf8_lossy();
            if (decoded.starts_with("https://") || decoded.starts_with("http://"))
                && Url::parse(&decoded).is_ok()
            {
                return decoded.into_owned();
            }
        }
    }

    // Named query parameter destination.
    for name in REDIRECT_PARAM_NAMES {
        let hit = u
            .query_pairs()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.into_owned());
        if let Some(dest) = hit {
            if (dest.starts_with("https://") || dest.starts_with("http://"))
                && Url::parse(&dest).is_ok()
            {
                return dest;
            }
        }
    }

    raw.to_string()
}

/// Full normalization: resolve a tracking redirect, then canonicalize.
pub fn normalize(raw: &str) -> String {
    canonicalize(&resolve_redirect(raw))
}
