//! Deterministic, length-bounded identifiers.

use sha2::{Digest, Sha256};

// length of the short hash suffix appended to truncated parts
const SHORTHASH: usize = 6;

/// Join `parts` with `/`, bounding the result to fewer than `l` bytes.
///
/// If the joined string fits, it is returned unchanged. Otherwise parts are
/// truncated from the last toward the first, each to `l / parts.len()`
/// bytes with a `-{hash}` suffix derived from the sha256 of the original
/// joined string. If everything has been truncated and the result is still
/// too long, the hash itself, cut to `l`, is returned. The same inputs
/// always produce the same output.
#[must_use]
pub fn hashname(l: usize, parts: &[&str]) -> String {
    let mut parts: Vec<String> = parts.iter().map(|s| (*s).to_string()).collect();
    let joined = parts.join("/");
    if l > joined.len() {
        // under the limit, nothing to do
        return joined;
    }
    let hash: String = Sha256::digest(joined.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();
    let per_part = l / parts.len();
    for n in (0..parts.len()).rev() {
        parts[n] = truncate(per_part, &parts[n], &hash[..SHORTHASH]);
        let joined = parts.join("/");
        if l > joined.len() {
            return joined;
        }
    }
    // truncated everything and still too long, fall back to the hash
    hash[..l.min(hash.len())].to_string()
}

// truncate s to l bytes by replacing its tail with -suffix
fn truncate(l: usize, s: &str, suffix: &str) -> String {
    if l >= s.len() {
        // under the limit, nothing to do
        return s.to_string();
    }
    if l <= suffix.len() {
        return suffix[..l.min(suffix.len())].to_string();
    }
    format!("{}-{}", &s[..l - suffix.len() - 1], suffix)
}
