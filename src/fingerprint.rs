use sha2::{Digest, Sha256};

pub const FINGERPRINT_LEN: usize = 8;
pub const CHAPTER_PREFIX_CHARS: usize = 500;
pub const SEGMENT_PREFIX_CHARS: usize = 200;

/// Short content identifier over the first `prefix_len` characters of `text`.
///
/// Edits past the prefix window do not change the fingerprint. Collisions on
/// identical prefixes are accepted; this is a cache-key disambiguator, not a
/// content hash.
pub fn fingerprint(text: &str, prefix_len: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(char_prefix(text, prefix_len).as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(FINGERPRINT_LEN);
    hex
}

fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_prefix_same_fingerprint() {
        let a = format!("{}tail one", "x".repeat(500));
        let b = format!("{}something else entirely", "x".repeat(500));
        assert_eq!(fingerprint(&a, 500), fingerprint(&b, 500));
        assert_eq!(fingerprint(&a, 500), fingerprint(&a, 500));
    }

    #[test]
    fn differing_prefix_changes_fingerprint() {
        assert_ne!(
            fingerprint("The moor stretched", 200),
            fingerprint("The sea stretched", 200)
        );
    }

    #[test]
    fn fixed_length_hex() {
        for input in ["", "a", "ünïcödé text that is long enough"] {
            let fp = fingerprint(input, 10);
            assert_eq!(fp.len(), FINGERPRINT_LEN);
            assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn prefix_counts_characters_not_bytes() {
        assert_eq!(char_prefix("éééé", 2), "éé");
        assert_eq!(char_prefix("ab", 5), "ab");
    }
}
