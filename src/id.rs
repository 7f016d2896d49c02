//! Content-derived paste identifiers.
//!
//! An identifier is the SHA-1 digest of the paste content, encoded as
//! URL-safe base64 without padding. Identical content always maps to the
//! same identifier, so resubmitting a paste overwrites it in place.

use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use regex::Regex;
use sha1::{Digest, Sha1};

static VALID_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_-]+$").expect("identifier pattern is valid")
});

/// Derives the identifier for `content`. Total over any byte sequence.
pub fn derive(content: &[u8]) -> String {
    let digest = Sha1::digest(content);
    // No-op with the URL-safe alphabet; keeps '/' out of storage keys even
    // if the engine above is ever swapped for the standard one.
    URL_SAFE_NO_PAD.encode(digest).replace('/', "-")
}

/// Returns `true` if `id` is safe to use as a storage key.
///
/// Anything outside `[A-Za-z0-9_-]` (dots, slashes, percent-escapes) is
/// rejected before a path is ever built from it.
pub fn is_valid(id: &str) -> bool {
    VALID_ID.is_match(id)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn derive_matches_known_digest() {
        assert_eq!(derive(b"hello"), "qvTGHdzF6KLavt4PO0gs2a6pQ00");
        assert_eq!(derive(b""), "2jmj7l5rSw0yVb_vlWAYkK_YBwk");
    }

    proptest! {
        #[test]
        fn derive_is_deterministic_and_path_safe(content in any::<Vec<u8>>()) {
            let id = derive(&content);
            prop_assert_eq!(&id, &derive(&content));
            prop_assert_eq!(id.len(), 27);
            prop_assert!(!id.contains('/') && !id.contains('='), "{}", id);
            prop_assert!(is_valid(&id), "{}", id);
        }
    }

    #[test]
    fn rejects_unsafe_identifiers() {
        assert!(!is_valid(""));
        assert!(!is_valid("../etc/passwd"));
        assert!(!is_valid("abc.txt"));
        assert!(!is_valid("a/b"));
        assert!(!is_valid("a%2Fb"));
        assert!(is_valid("qvTGHdzF6KLavt4PO0gs2a6pQ00"));
        assert!(is_valid("with-hyphen_and_underscore"));
    }
}
