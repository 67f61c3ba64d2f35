use sha2::{Digest, Sha256};

/// Bytes of the SHA-256 digest kept for content keys.
const KEY_BYTES: usize = 16;
const MAX_SLUG_LEN: usize = 48;

/// Stable content-addressed key for a source URL: 32 lowercase hex digits.
pub fn content_key(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(KEY_BYTES * 2);
    for byte in digest.iter().take(KEY_BYTES) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}

/// ASCII-only, archive-safe slug: `The Woman's Tale!` -> `The_Womans_Tale`.
pub fn slugify(input: &str) -> String {
    let mut compacted = String::with_capacity(input.len());
    let mut prev_underscore = false;
    for c in input.replace('\u{a0}', " ").chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            compacted.push(c);
            prev_underscore = false;
        } else if c.is_whitespace() || c == '_' || c == '.' || c == ',' {
            if !prev_underscore {
                compacted.push('_');
            }
            prev_underscore = true;
        }
        // Everything else is dropped.
    }
    let mut final_name = compacted.trim_matches(&['_', '-'][..]).to_string();
    if final_name.len() > MAX_SLUG_LEN {
        final_name.truncate(MAX_SLUG_LEN);
        final_name = final_name.trim_end_matches(&['_', '-'][..]).to_string();
    }
    if final_name.is_empty() {
        final_name = "untitled".to_string();
    }
    final_name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_key_is_stable_and_sized() {
        let a = content_key("https://example.com/a.png");
        assert_eq!(a, content_key("https://example.com/a.png"));
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, content_key("https://example.com/b.png"));
    }

    #[test]
    fn content_key_matches_sha256_prefix() {
        // sha256("abc") = ba7816bf8f01cfea414140de5dae2223...
        assert_eq!(content_key("abc"), "ba7816bf8f01cfea414140de5dae2223");
    }

    #[test]
    fn slug_keeps_ascii_and_collapses_separators() {
        assert_eq!(slugify("mad investor chaos and the woman of asmodeus"), "mad_investor_chaos_and_the_woman_of_asmodeus");
        assert_eq!(slugify("Sandbox:  The  Alien Maths!"), "Sandbox_The_Alien_Maths");
        assert_eq!(slugify("???"), "untitled");
    }

    #[test]
    fn slug_is_truncated() {
        let long = "a".repeat(100);
        assert_eq!(slugify(&long).len(), MAX_SLUG_LEN);
    }
}
