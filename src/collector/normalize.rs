// file: src/collector/normalize.rs
// description: url canonicalization and content fingerprinting
// reference: https://docs.rs/url

use sha2::{Digest, Sha256};
use url::Url;

/// Canonicalize a URL for duplicate lookup: lower-case scheme and host,
/// drop the query string and fragment, strip any trailing slash. Total
/// function; input that does not parse gets a best-effort cleanup instead
/// of an error.
pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();

    match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            // scheme and host are lower-cased by the parser
            url.to_string().trim_end_matches('/').to_string()
        }
        Err(_) => {
            let cut = trimmed.split(['?', '#']).next().unwrap_or(trimmed);
            cut.trim_end_matches('/').to_string()
        }
    }
}

/// Deterministic SHA-256 fingerprint of the content, hex encoded. Empty
/// content maps to the empty-string sentinel rather than the hash of empty
/// bytes, so empty pages never collide with real content in storage
/// matching.
pub fn content_fingerprint(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }

    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
