//! Deterministic identifiers for upload sessions and staged parts.
//!
//! Nothing is persisted: ids are recomputed from their inputs on every call
//! and compared for equality.

use md5::{Digest, Md5};
use mpart_common::error::{MpartError, Result};

/// Session id for `(bucket, key)`: uppercase hex MD5 of the two strings
/// concatenated.
pub fn derive_session_id(bucket: &str, key: &str) -> String {
    upper_hex_md5(&[bucket.as_bytes(), key.as_bytes()])
}

/// On-disk name of a staged part. Depends only on identifiers, never on the
/// part's content.
pub fn derive_part_name(session_id: &str, part_number: u32) -> String {
    upper_hex_md5(&[session_id.as_bytes(), part_number.to_string().as_bytes()])
}

pub fn verify_session_id(bucket: &str, key: &str, presented: &str) -> Result<()> {
    if derive_session_id(bucket, key) != presented {
        return Err(MpartError::SessionNotFound(presented.to_string()));
    }
    Ok(())
}

fn upper_hex_md5(chunks: &[&[u8]]) -> String {
    let mut hasher = Md5::new();
    for chunk in chunks {
        hasher.update(chunk);
    }
    format!("{:X}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use mpart_common::error::MpartError;

    use super::{derive_part_name, derive_session_id, verify_session_id};

    #[test]
    fn session_id_is_deterministic() {
        assert_eq!(derive_session_id("b1", "k1"), derive_session_id("b1", "k1"));
    }

    #[test]
    fn session_id_is_uppercase_md5_of_concatenation() {
        // md5("") is the well-known d41d8cd9... digest.
        assert_eq!(derive_session_id("", ""), "D41D8CD98F00B204E9800998ECF8427E");
        let id = derive_session_id("photos", "2024/cat.png");
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|ch| ch.is_ascii_digit() || ch.is_ascii_uppercase()));
    }

    #[test]
    fn changing_either_input_changes_the_id() {
        let base = derive_session_id("b1", "k1");
        assert_ne!(base, derive_session_id("b2", "k1"));
        assert_ne!(base, derive_session_id("b1", "k2"));
    }

    #[test]
    fn part_name_depends_on_session_and_number() {
        let session = derive_session_id("b1", "k1");
        assert_eq!(derive_part_name(&session, 1), derive_part_name(&session, 1));
        assert_ne!(derive_part_name(&session, 1), derive_part_name(&session, 2));
        assert_ne!(
            derive_part_name(&session, 1),
            derive_part_name(&derive_session_id("b1", "k2"), 1)
        );
    }

    #[test]
    fn verify_rejects_foreign_session_ids() {
        let session = derive_session_id("b1", "k1");
        assert!(verify_session_id("b1", "k1", &session).is_ok());
        assert!(matches!(
            verify_session_id("b1", "k1", "NOTREAL"),
            Err(MpartError::SessionNotFound(id)) if id == "NOTREAL"
        ));
        assert!(verify_session_id("b1", "k1", &session.to_lowercase()).is_err());
    }
}
