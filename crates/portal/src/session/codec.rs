//! Session cookie codec.
//!
//! A session is stored as `base64-` followed by the unpadded base64url
//! encoding of the token pair as JSON. Browsers cap a cookie at roughly 4KB,
//! so encoded values longer than [`MAX_CHUNK_SIZE`] are split across
//! `{name}.0`, `{name}.1`, ... and reassembled on read.

use base64::Engine;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use softget_backend::types::SessionTokens;
use thiserror::Error;
use tracing::debug;

use super::cookies::CookieOptions;
use super::store::SessionStore;

/// Prefix marking a base64-encoded session value.
pub const BASE64_PREFIX: &str = "base64-";

/// Largest value written into a single cookie.
pub const MAX_CHUNK_SIZE: usize = 3180;

/// Errors decoding a stored session.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The base64 payload is malformed.
    #[error("invalid base64 session: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded payload is not a token pair.
    #[error("invalid session JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encodes a token pair as a cookie value.
pub fn encode(tokens: &SessionTokens) -> String {
    // SessionTokens only holds strings and an integer
    let json = serde_json::to_vec(tokens).unwrap_or_default();
    format!("{}{}", BASE64_PREFIX, URL_SAFE_NO_PAD.encode(json))
}

/// Decodes a cookie value into a token pair.
///
/// Accepts the prefixed base64 form and bare JSON.
pub fn decode(value: &str) -> Result<SessionTokens, CodecError> {
    match value.strip_prefix(BASE64_PREFIX) {
        Some(encoded) => {
            let bytes = URL_SAFE_NO_PAD
                .decode(encoded.trim_end_matches('='))
                .or_else(|_| URL_SAFE.decode(encoded))?;
            Ok(serde_json::from_slice(&bytes)?)
        }
        None => Ok(serde_json::from_str(value)?),
    }
}

/// Splits a value into chunks of at most `size` bytes.
fn chunk(value: &str, size: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = value;
    while !rest.is_empty() {
        let mut end = rest.len().min(size);
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (head, tail) = rest.split_at(end);
        chunks.push(head);
        rest = tail;
    }
    chunks
}

/// Reads and writes the session through a [`SessionStore`].
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
    options: CookieOptions,
}

impl SessionCookie {
    /// Creates a codec for the cookie `name`.
    pub fn new(name: impl Into<String>, options: CookieOptions) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }

    /// Returns the base cookie name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the cookie attributes.
    pub fn options(&self) -> &CookieOptions {
        &self.options
    }

    fn chunk_name(&self, index: usize) -> String {
        format!("{}.{}", self.name, index)
    }

    /// Names of the chunk cookies present in `store`, in order.
    fn chunk_names<S: SessionStore + ?Sized>(&self, store: &S) -> Vec<String> {
        (0..)
            .map(|i| self.chunk_name(i))
            .take_while(|name| store.get(name).is_some())
            .collect()
    }

    /// Returns the raw stored value, reassembling chunks.
    pub fn read_raw<S: SessionStore + ?Sized>(&self, store: &S) -> Option<String> {
        if let Some(value) = store.get(&self.name) {
            return Some(value);
        }
        let chunks = self.chunk_names(store);
        if chunks.is_empty() {
            return None;
        }
        Some(chunks.iter().filter_map(|name| store.get(name)).collect())
    }

    /// Returns the stored session.
    ///
    /// A missing or undecodable value is absent.
    pub fn read<S: SessionStore + ?Sized>(&self, store: &S) -> Option<SessionTokens> {
        let raw = self.read_raw(store)?;
        if raw.is_empty() {
            return None;
        }
        match decode(&raw) {
            Ok(tokens) => Some(tokens),
            Err(e) => {
                debug!(cookie = %self.name, error = %e, "Ignoring undecodable session cookie");
                None
            }
        }
    }

    /// Stores a session, chunking when needed and removing stale cookies.
    pub fn write<S: SessionStore + ?Sized>(&self, store: &mut S, tokens: &SessionTokens) {
        let encoded = encode(tokens);
        let existing = self.chunk_names(store);

        if encoded.len() <= MAX_CHUNK_SIZE {
            store.set(&self.name, &encoded, &self.options);
            for name in existing {
                store.remove(&name, &self.options);
            }
            return;
        }

        let chunks = chunk(&encoded, MAX_CHUNK_SIZE);
        for (i, part) in chunks.iter().enumerate() {
            store.set(&self.chunk_name(i), part, &self.options);
        }
        for name in existing.iter().skip(chunks.len()) {
            store.remove(name, &self.options);
        }
        if store.get(&self.name).is_some() {
            store.remove(&self.name, &self.options);
        }
    }

    /// Removes the session and every chunk.
    pub fn clear<S: SessionStore + ?Sized>(&self, store: &mut S) {
        for name in self.chunk_names(store) {
            store.remove(&name, &self.options);
        }
        store.remove(&self.name, &self.options);
    }
}
