//! Cookie header parsing and `Set-Cookie` rendering.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use axum::http::{HeaderMap, header::COOKIE};

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    /// Sent on top-level navigations.
    #[default]
    Lax,
    /// Never sent cross-site.
    Strict,
    /// Always sent (requires `Secure` in browsers).
    None,
}

impl SameSite {
    /// Returns the attribute value.
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
            SameSite::None => "None",
        }
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SameSite {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lax" => Ok(SameSite::Lax),
            "strict" => Ok(SameSite::Strict),
            "none" => Ok(SameSite::None),
            other => Err(format!(
                "Invalid cookie SameSite value '{}' (expected lax, strict or none)",
                other
            )),
        }
    }
}

/// Attributes written with a cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    /// `Path` attribute.
    pub path: String,
    /// `Max-Age` in seconds; `None` makes a browser-session cookie.
    pub max_age: Option<i64>,
    /// `SameSite` attribute.
    pub same_site: SameSite,
    /// `Secure` flag.
    pub secure: bool,
    /// `HttpOnly` flag.
    pub http_only: bool,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            max_age: None,
            same_site: SameSite::Lax,
            secure: false,
            http_only: false,
        }
    }
}

impl CookieOptions {
    /// Returns these options with immediate expiry.
    pub fn expired(&self) -> Self {
        Self {
            max_age: Some(0),
            ..self.clone()
        }
    }

    /// Renders a `Set-Cookie` header value.
    pub fn render(&self, name: &str, value: &str) -> String {
        let mut out = format!("{}={}; Path={}", name, value, self.path);
        if let Some(max_age) = self.max_age {
            out.push_str(&format!("; Max-Age={}", max_age));
        }
        out.push_str(&format!("; SameSite={}", self.same_site));
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        out
    }
}

/// Parses every `Cookie` header of a request into a name → value map.
///
/// Later duplicates win. Pairs without `=` are ignored.
pub fn parse_cookies(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut cookies = BTreeMap::new();
    for header in headers.get_all(COOKIE) {
        let Ok(raw) = header.to_str() else {
            continue;
        };
        for pair in raw.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                let name = name.trim();
                if !name.is_empty() {
                    cookies.insert(name.to_string(), value.trim().to_string());
                }
            }
        }
    }
    cookies
}

/// Renders a `Cookie` request header value from a cookie map.
pub fn render_cookie_header(cookies: &BTreeMap<String, String>) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ")
}
