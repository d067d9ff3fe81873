//! Deterministic A/B bucketing
//!
//! Assigns each session to an experiment variant as a pure function of
//! the session id and experiment key, using xxHash64. The same session
//! always resolves to the same variant for the lifetime of the session;
//! no stored state is needed.

use xxhash_rust::xxh64::xxh64;

/// Experiment key for the automatic popup style test
pub const POPUP_STYLE_EXPERIMENT: &str = "popup_style";

/// Deterministic bucket index in `0..variant_count`
///
/// Pure function: no clock, no randomness, no storage.
pub fn bucket_for(session_id: &str, experiment_key: &str, variant_count: u64) -> u64 {
    debug_assert!(variant_count > 0);
    let key = format!("{}:{}", experiment_key, session_id);
    xxh64(key.as_bytes(), 0) % variant_count
}

/// Pick one of the given variants for a session
pub fn variant_for<'a, T>(session_id: &str, experiment_key: &str, variants: &'a [T]) -> &'a T {
    let idx = bucket_for(session_id, experiment_key, variants.len() as u64);
    &variants[idx as usize]
}
