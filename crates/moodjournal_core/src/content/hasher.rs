//! Deterministic document digests.
//!
//! # Invariants
//! - Canonical bytes are the compact `serde_json` form of `Document`. serde
//!   emits struct fields in declaration order (title, description,
//!   affirmations, mood, timestamp) and never sorts or reorders them, so two
//!   documents hash equal iff every field is equal.
//! - No whitespace or locale-dependent formatting enters the canonical form.

use crate::model::document::{Digest, Document};
use sha2::{Digest as _, Sha256};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Length of a hex digest produced by [`digest`].
pub const DIGEST_HEX_LEN: usize = 64;

/// Failure to produce the canonical form of a document.
#[derive(Debug)]
pub struct DigestError(serde_json::Error);

impl Display for DigestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to serialize document for hashing: {}", self.0)
    }
}

impl Error for DigestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

/// Canonical text form, also stored verbatim in the `entries.content` column.
pub fn canonical_json(document: &Document) -> Result<String, DigestError> {
    serde_json::to_string(document).map_err(DigestError)
}

/// Canonical byte form used for hashing.
pub fn canonical_bytes(document: &Document) -> Result<Vec<u8>, DigestError> {
    canonical_json(document).map(String::into_bytes)
}

/// Computes the content digest of `document`.
pub fn digest(document: &Document) -> Result<Digest, DigestError> {
    let bytes = canonical_bytes(document)?;
    Ok(digest_bytes(&bytes))
}

/// Hex SHA-256 of raw bytes.
pub fn digest_bytes(bytes: &[u8]) -> Digest {
    hex::encode(Sha256::digest(bytes))
}

/// Returns whether `value` has the shape of a digest produced here.
pub fn is_digest(value: &str) -> bool {
    value.len() == DIGEST_HEX_LEN
        && value
            .bytes()
            .all(|byte| byte.is_ascii_digit() || (b'a'..=b'f').contains(&byte))
}

#[cfg(test)]
mod tests {
    use super::{canonical_bytes, digest, digest_bytes, is_digest, DIGEST_HEX_LEN};
    use crate::model::document::Document;

    fn sample() -> Document {
        let mut document = Document::new(
            "Morning Anxiety",
            "feeling overwhelmed",
            "2026-01-02T07:30:00.000Z",
        );
        document.affirmations = vec!["I am safe".to_string(), "I can breathe".to_string()];
        document.mood = "anxious".to_string();
        document
    }

    #[test]
    fn digest_is_deterministic() {
        let document = sample();
        assert_eq!(digest(&document).unwrap(), digest(&document).unwrap());
        assert_eq!(digest(&document).unwrap(), digest(&document.clone()).unwrap());
    }

    #[test]
    fn digest_is_lowercase_hex() {
        let hash = digest(&sample()).unwrap();
        assert_eq!(hash.len(), DIGEST_HEX_LEN);
        assert!(is_digest(&hash));
        assert!(!is_digest("ABC"));
    }

    #[test]
    fn any_field_change_changes_digest() {
        let base = sample();
        let base_hash = digest(&base).unwrap();

        let mut other = base.clone();
        other.affirmations.push("one more".to_string());
        assert_ne!(digest(&other).unwrap(), base_hash);

        let mut other = base.clone();
        other.mood = "calm".to_string();
        assert_ne!(digest(&other).unwrap(), base_hash);
    }

    #[test]
    fn canonical_form_keeps_field_order() {
        let bytes = canonical_bytes(&sample()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let title_at = text.find("\"title\"").unwrap();
        let description_at = text.find("\"description\"").unwrap();
        let affirmations_at = text.find("\"affirmations\"").unwrap();
        let mood_at = text.find("\"mood\"").unwrap();
        let timestamp_at = text.find("\"timestamp\"").unwrap();
        assert!(title_at < description_at);
        assert!(description_at < affirmations_at);
        assert!(affirmations_at < mood_at);
        assert!(mood_at < timestamp_at);
    }

    #[test]
    fn digest_bytes_matches_known_vector() {
        assert_eq!(
            digest_bytes(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
