//! Session store adapters.
//!
//! The identity client reads and writes cookies through [`SessionStore`].
//! Two adapters exist:
//!
//! - [`RequestCookies`] - only the incoming request is available; writes are
//!   dropped. Used where a response is not being built by the caller, such as
//!   the tenant layout gate.
//! - [`ResponseCookies`] - full read-write. Writes are visible to later reads
//!   in the same request and are accumulated as `Set-Cookie` headers that the
//!   caller applies to whichever response it finally returns.

use std::collections::BTreeMap;

use axum::http::{HeaderMap, HeaderValue, header::SET_COOKIE};
use axum::response::Response;
use tracing::warn;

use super::cookies::{CookieOptions, parse_cookies, render_cookie_header};

/// Cookie access for the identity client.
///
/// Reading a missing cookie yields `None`; nothing here fails.
pub trait SessionStore: Send + Sync {
    /// Returns the value of a cookie.
    fn get(&self, name: &str) -> Option<String>;

    /// Writes a cookie.
    fn set(&mut self, name: &str, value: &str, options: &CookieOptions);

    /// Removes a cookie by writing an empty value with `Max-Age=0`.
    fn remove(&mut self, name: &str, options: &CookieOptions);

    /// Returns false when writes are dropped.
    fn is_writable(&self) -> bool;
}

/// Read-only view of the request cookies.
#[derive(Debug, Clone, Default)]
pub struct RequestCookies {
    cookies: BTreeMap<String, String>,
}

impl RequestCookies {
    /// Reads the cookies of a request.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            cookies: parse_cookies(headers),
        }
    }
}

impl SessionStore for RequestCookies {
    fn get(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }

    fn set(&mut self, _name: &str, _value: &str, _options: &CookieOptions) {}

    fn remove(&mut self, _name: &str, _options: &CookieOptions) {}

    fn is_writable(&self) -> bool {
        false
    }
}

/// Read-write cookie set threaded through one request.
#[derive(Debug, Clone, Default)]
pub struct ResponseCookies {
    cookies: BTreeMap<String, String>,
    // name -> rendered Set-Cookie; last write per name wins
    pending: BTreeMap<String, String>,
}

impl ResponseCookies {
    /// Starts from the cookies of a request.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            cookies: parse_cookies(headers),
            pending: BTreeMap::new(),
        }
    }

    /// Returns true if any write is waiting to be applied.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Returns the pending `Set-Cookie` values.
    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.pending.values().map(String::as_str)
    }

    /// Appends every pending write to `response` as a `Set-Cookie` header.
    pub fn apply(&self, response: &mut Response) {
        for value in self.pending.values() {
            match HeaderValue::from_str(value) {
                Ok(header) => {
                    response.headers_mut().append(SET_COOKIE, header);
                }
                Err(e) => warn!(error = %e, "Dropping unrepresentable Set-Cookie header"),
            }
        }
    }

    /// Renders the current cookie view as a `Cookie` request header.
    ///
    /// Returns `None` when no cookie remains.
    pub fn request_cookie_header(&self) -> Option<HeaderValue> {
        if self.cookies.is_empty() {
            return None;
        }
        HeaderValue::from_str(&render_cookie_header(&self.cookies)).ok()
    }
}

impl SessionStore for ResponseCookies {
    fn get(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: &str, options: &CookieOptions) {
        self.cookies.insert(name.to_string(), value.to_string());
        self.pending
            .insert(name.to_string(), options.render(name, value));
    }

    fn remove(&mut self, name: &str, options: &CookieOptions) {
        self.cookies.remove(name);
        self.pending
            .insert(name.to_string(), options.expired().render(name, ""));
    }

    fn is_writable(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    fn headers(cookie: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static(cookie));
        headers
    }

    #[test]
    fn test_request_cookies_are_read_only() {
        let mut store = RequestCookies::from_headers(&headers("sid=abc"));
        store.set("sid", "changed", &CookieOptions::default());
        store.remove("sid", &CookieOptions::default());

        assert_eq!(store.get("sid").as_deref(), Some("abc"));
        assert!(!store.is_writable());
    }

    #[test]
    fn test_response_cookies_read_their_writes() {
        let mut store = ResponseCookies::from_headers(&headers("sid=abc; theme=dark"));
        store.set("sid", "new", &CookieOptions::default());

        assert_eq!(store.get("sid").as_deref(), Some("new"));
        assert_eq!(
            store.request_cookie_header().unwrap(),
            "sid=new; theme=dark"
        );
    }

    #[test]
    fn test_remove_is_empty_value_with_zero_max_age() {
        let mut store = ResponseCookies::from_headers(&headers("sid=abc"));
        store.remove("sid", &CookieOptions::default());

        assert!(store.get("sid").is_none());
        let pending: Vec<&str> = store.pending().collect();
        assert_eq!(pending, vec!["sid=; Path=/; Max-Age=0; SameSite=Lax"]);
        assert!(store.request_cookie_header().is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let mut store = ResponseCookies::default();
        store.set("sid", "one", &CookieOptions::default());
        store.set("sid", "two", &CookieOptions::default());
        assert_eq!(store.pending().count(), 1);
        assert!(store.pending().all(|v| v.starts_with("sid=two")));
    }

    #[test]
    fn test_apply_appends_set_cookie() {
        let mut store = ResponseCookies::default();
        store.set("a", "1", &CookieOptions::default());
        store.set("b", "2", &CookieOptions::default());

        let mut response = Response::new(axum::body::Body::empty());
        store.apply(&mut response);
        assert_eq!(response.headers().get_all(SET_COOKIE).iter().count(), 2);
    }

    #[test]
    fn test_apply_without_writes_is_noop() {
        let store = ResponseCookies::from_headers(&headers("sid=abc"));
        let mut response = Response::new(axum::body::Body::empty());
        store.apply(&mut response);
        assert!(!store.has_pending());
        assert!(response.headers().get(SET_COOKIE).is_none());
    }
}
