//! Live subscription address construction

use url::Url;

use crate::error::{Result, RagSyncError};

/// Build the subscription URL for `token`.
///
/// Without an override, the scheme follows the page's transport security
/// (`https` → `wss`, anything else → `ws`) and the host and port are the
/// page's. With an override (hosted deployments), the override's scheme,
/// host and any path prefix are used instead; `http(s)` overrides are mapped
/// to `ws(s)`.
///
/// The token is appended as a single percent-encoded path segment after
/// `api/ws`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use ragsync::live::live_endpoint;
///
/// let page = Url::parse("https://rag.example.com").unwrap();
/// let url = live_endpoint(&page, None, "abc").unwrap();
/// assert_eq!(url.as_str(), "wss://rag.example.com/api/ws/abc");
/// ```
pub fn live_endpoint(page_url: &Url, override_base: Option<&Url>, token: &str) -> Result<Url> {
    let mut url = match override_base {
        Some(base) => {
            let mut base = base.clone();
            let scheme = ws_scheme_for(base.scheme()).ok_or_else(|| {
                RagSyncError::Config(format!(
                    "Unsupported live base URL scheme: {}",
                    base.scheme()
                ))
            })?;
            if base.scheme() != scheme {
                base.set_scheme(scheme).map_err(|_| {
                    RagSyncError::Config(format!("Cannot use {} as a live base URL", base))
                })?;
            }
            base.set_query(None);
            base.set_fragment(None);
            base
        }
        None => {
            let host = page_url.host_str().ok_or_else(|| {
                RagSyncError::Config(format!("Page URL has no host: {}", page_url))
            })?;
            let scheme = if page_url.scheme() == "https" { "wss" } else { "ws" };
            let authority = match page_url.port() {
                Some(port) => format!("{}:{}", host, port),
                None => host.to_string(),
            };
            Url::parse(&format!("{}://{}/", scheme, authority))
                .map_err(|e| RagSyncError::Config(format!("Invalid live URL: {}", e)))?
        }
    };

    url.path_segments_mut()
        .map_err(|_| RagSyncError::Config("Live URL cannot take a path".into()))?
        .pop_if_empty()
        .extend(["api", "ws", token]);

    Ok(url)
}

fn ws_scheme_for(scheme: &str) -> Option<&'static str> {
    match scheme {
        "ws" | "http" => Some("ws"),
        "wss" | "https" => Some("wss"),
        _ => None,
    }
}
