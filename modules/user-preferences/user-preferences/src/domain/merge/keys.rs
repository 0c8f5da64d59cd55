//! Key classification applied before the merge descends into a value.

use user_preferences_sdk::SettingsRecord;

/// Names that alias structural slots and are never applied.
pub const RESERVED_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// Double-underscore affix marking internal or shared slots.
const INTERNAL_AFFIX: &str = "__";

/// Whether `key` belongs to the rejection set.
///
/// Matches the fixed names above plus any key starting or ending with `__`.
/// Matching is exact and case-sensitive; `Constructor` is not reserved, it
/// is merely unknown.
#[must_use]
pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key) || key.starts_with(INTERNAL_AFFIX) || key.ends_with(INTERNAL_AFFIX)
}

/// Whether `key` may appear at the top level of a settings patch.
#[must_use]
pub fn is_top_level_field(key: &str) -> bool {
    SettingsRecord::FIELDS.contains(&key)
}
