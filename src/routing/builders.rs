//! Route builders for the remote dream API.
//!
//! Every builder targets the configured origin. The download route is the
//! only one that takes a caller-supplied URL, so it re-checks the origin
//! and travels without the credential.

use url::Url;

use crate::http::params::{decode_component, QueryParams};
use crate::http::request::{MimeType, Request};
use crate::routing::router::{AuthorizationExemptions, Rejection, RouteTable};

pub const DREAM_QUERY: &str = "/dream_query";
pub const DREAM_DOWNLOAD: &str = "/dream_download";
pub const FRIEND_REQUESTS: &str = "/friend_requests";

/// Page size used for every dream land search.
pub const SEARCH_LIMIT: u32 = 150;

/// Register every relay route against `base_url`.
pub fn register_default_routes(table: &mut RouteTable, exemptions: &mut AuthorizationExemptions, base_url: &str) {
    let base = base_url.trim_end_matches('/').to_string();

    let b = base.clone();
    table.register(DREAM_QUERY, "id", move |_: &[u8], query: &QueryParams| -> Result<Request, Rejection> {
        let id = required(query, "id")?;
        let mut request = dream_search(&b);
        request.set_query_param("q[id]", id);
        Ok(request)
    });

    let b = base.clone();
    table.register(DREAM_QUERY, "land_name", move |_: &[u8], query: &QueryParams| -> Result<Request, Rejection> {
        let name = required(query, "land_name")?;
        let mut request = dream_search(&b);
        request.set_query_param("q[search_type]", "name");
        request.set_query_param("q[land_name]", name);
        Ok(request)
    });

    let b = base.clone();
    table.register(DREAM_QUERY, "recommend", move |_: &[u8], query: &QueryParams| -> Result<Request, Rejection> {
        let lang = query
            .get("lang")
            .ok_or_else(|| Rejection::new("recommend needs lang"))?;
        let mut request = dream_search(&b);
        request.set_query_param("q[search_type]", "recommend");
        request.set_query_param("q[lang]", lang);
        Ok(request)
    });

    let b = base.clone();
    table.register(DREAM_DOWNLOAD, "default", move |body: &[u8], _: &QueryParams| -> Result<Request, Rejection> {
        build_download(&b, body)
    });
    exemptions.set(DREAM_DOWNLOAD, true);

    table.register(FRIEND_REQUESTS, "type", move |_: &[u8], query: &QueryParams| -> Result<Request, Rejection> {
        let kind = required(query, "type")?;
        if kind != "receive" && kind != "send" {
            return Err(Rejection::new(format!("unknown friend request type {:?}", kind)));
        }
        let mut request = Request::new(format!("{}/api/v1/friend_requests", base));
        request.set_query_param("type", kind);
        Ok(request)
    });
}

fn required<'a>(query: &'a QueryParams, key: &str) -> Result<&'a str, Rejection> {
    query
        .get(key)
        .ok_or_else(|| Rejection::new(format!("missing {}", key)))
}

fn dream_search(base: &str) -> Request {
    let mut request = Request::new(format!("{}/api/v1/dream_lands", base));
    request.set_mime_type(MimeType::Msgpack);
    request.set_query_param("offset", "0");
    request.set_query_param("limit", SEARCH_LIMIT.to_string());
    request
}

/// GET the URL in `body`, which must live on `base`'s origin.
fn build_download(base: &str, body: &[u8]) -> Result<Request, Rejection> {
    let raw = std::str::from_utf8(body)
        .map_err(|_| Rejection::new("download URL is not UTF-8"))?
        .trim();
    if raw.is_empty() {
        return Err(Rejection::new("download URL is empty"));
    }
    if !raw.starts_with(base) {
        return Err(Rejection::new("download URL is not on the origin"));
    }

    let target = Url::parse(raw).map_err(|e| Rejection::new(format!("download URL: {}", e)))?;
    let origin = Url::parse(base).map_err(|e| Rejection::new(format!("origin URL: {}", e)))?;
    if target.origin() != origin.origin() {
        return Err(Rejection::new("download URL is not on the origin"));
    }

    let mut params = QueryParams::new();
    if let Some(query) = target.query() {
        for pair in query.split('&') {
            // Pairs without '=' are dropped; duplicates are kept.
            if let Some((key, value)) = pair.split_once('=') {
                params.push(decode_component(key), decode_component(value));
            }
        }
    }

    // Forward the caller's text up to the query, not the normalized form.
    let exact = raw.split(['?', '#']).next().unwrap_or(raw);

    let mut request = Request::new(exact);
    request.set_query_params(params);
    Ok(request)
}
