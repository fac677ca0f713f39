//! Level id → level hash transform.

use md5::Context;

const CUSTOM_LEVEL_PREFIX: &str = "custom_level_";
const LEVEL_HASH_LEN: usize = 40;

/// Derives the catalog hash for a level id.
///
/// `custom_level_<40 hex>` ids carry their hash and map to it upper-cased.
/// Anything else (built-in levels, malformed ids) maps to the MD5 hex digest
/// of the id itself, so the result is never empty.
pub fn level_id_to_hash(level_id: &str) -> String {
    if let Some(embedded) = embedded_hash(level_id) {
        return embedded.to_ascii_uppercase();
    }

    let mut context = Context::new();
    context.consume(level_id.as_bytes());
    format!("{:x}", context.finalize())
}

fn embedded_hash(level_id: &str) -> Option<&str> {
    let rest = level_id.strip_prefix(CUSTOM_LEVEL_PREFIX)?;
    let candidate = rest.split([' ', '_']).next()?;
    let is_hash = candidate.len() == LEVEL_HASH_LEN
        && candidate.chars().all(|c| c.is_ascii_hexdigit());
    is_hash.then_some(candidate)
}
