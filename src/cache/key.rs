//! Cache key derivation.
//!
//! A [`Fingerprint`] is the lowercase hex SHA-256 digest of the selected
//! text immediately followed by the page hostname. There is no separator
//! between the two, so `("ab", "c")` and `("a", "bc")` hash identically.

use std::fmt;

use sha2::{Digest, Sha256};

/// Hostname used when the requesting page has no usable URL.
pub const UNKNOWN_HOST: &str = "unknown";

/// 64-character lowercase hex SHA-256 digest identifying a (text, host) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// The hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the cache key for `text` selected on a page served from `hostname`.
pub fn derive_key(text: &str, hostname: &str) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update(hostname.as_bytes());
    Fingerprint(hex::encode(hasher.finalize()))
}

/// Extract the hostname from the requesting page URL.
///
/// Returns [`UNKNOWN_HOST`] when there is no URL or it cannot be parsed.
/// URLs without a host component (e.g. `about:blank`) yield an empty string.
pub fn hostname_of(page_url: Option<&str>) -> String {
    page_url
        .and_then(|raw| url::Url::parse(raw).ok())
        .map(|url| url.host_str().unwrap_or_default().to_string())
        .unwrap_or_else(|| UNKNOWN_HOST.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        assert_eq!(derive_key("x", "y"), derive_key("x", "y"));
    }

    #[test]
    fn known_digest() {
        // sha256("abc")
        assert_eq!(
            derive_key("ab", "c").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn fixed_length_lowercase_hex() {
        let key = derive_key("photosynthesis", "en.wikipedia.org");
        assert_eq!(key.as_str().len(), 64);
        assert!(
            key.as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn differs_on_text_and_host() {
        let base = derive_key("hello", "a.com");
        assert_ne!(base, derive_key("world", "a.com"));
        assert_ne!(base, derive_key("hello", "b.com"));
    }

    #[test]
    fn concatenation_ambiguity_is_preserved() {
        assert_eq!(derive_key("ab", "c"), derive_key("a", "bc"));
    }

    #[test]
    fn hostname_extraction() {
        assert_eq!(
            hostname_of(Some("https://en.wikipedia.org/wiki/Rust")),
            "en.wikipedia.org"
        );
        assert_eq!(hostname_of(None), UNKNOWN_HOST);
        assert_eq!(hostname_of(Some("not a url")), UNKNOWN_HOST);
        assert_eq!(hostname_of(Some("about:blank")), "");
    }
}
