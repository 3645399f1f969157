//! URL normalization
//!
//! Canonicalizes raw user/search input into the URL the rest of the
//! pipeline operates on: Markdown-link wrappers are unwrapped, and desktop
//! blog URLs are rewritten to their mobile form. The mobile rendering of
//! these blog pages exposes post images far more reliably than the desktop
//! markup, which directly improves the extraction stage's image hit rate.
//!
//! Normalization is pure and total: malformed input comes back unchanged,
//! never as an error.

use url::Url;

/// Desktop host whose URLs are rewritten to the mobile subdomain
const DESKTOP_BLOG_HOST: &str = "blog.naver.com";

/// Mobile URL template target
const MOBILE_BLOG_BASE: &str = "https://m.blog.naver.com";

/// Both forms of a normalized source URL.
///
/// `original` is the input with Markdown wrapping removed; `target` is the
/// form actually fetched and persisted. The duplicate guard matches either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUrl {
    pub original: String,
    pub target: String,
}

/// Normalize a raw URL string.
pub fn normalize(raw: &str) -> NormalizedUrl {
    let original = unwrap_markdown_link(raw.trim()).to_string();
    let target = to_mobile_url(&original);
    NormalizedUrl { original, target }
}

/// Extract the first parenthesized `http(s)://…` group from Markdown link
/// syntax `[text](url)`. Input without the `](` marker passes through.
fn unwrap_markdown_link(raw: &str) -> &str {
    if !raw.contains("](") {
        return raw;
    }

    let mut offset = 0;
    while let Some(open) = raw[offset..].find('(') {
        let start = offset + open + 1;
        let rest = &raw[start..];
        if rest.starts_with("http://") || rest.starts_with("https://") {
            if let Some(close) = rest.find(')') {
                return &raw[start..start + close];
            }
        }
        offset = start;
    }

    raw
}

/// Rewrite a desktop blog URL to its mobile-subdomain form.
///
/// Query parameters naming the author and post win over path segments; a
/// URL matching neither shape, or one that fails to parse, is returned
/// unchanged.
fn to_mobile_url(url: &str) -> String {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return url.to_string(),
    };

    match parsed.host_str() {
        Some(host) if host.contains(DESKTOP_BLOG_HOST) => {}
        _ => return url.to_string(),
    }

    let blog_id = query_param(&parsed, "blogId");
    let log_no = query_param(&parsed, "logNo");
    if let (Some(blog_id), Some(log_no)) = (blog_id, log_no) {
        return format!("{}/{}/{}", MOBILE_BLOG_BASE, blog_id, log_no);
    }

    let segments: Vec<&str> = parsed.path().split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() >= 2 {
        return format!("{}/{}/{}", MOBILE_BLOG_BASE, segments[0], segments[1]);
    }

    url.to_string()
}

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
