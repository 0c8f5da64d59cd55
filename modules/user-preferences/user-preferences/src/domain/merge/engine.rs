//! Schema-driven merge of a validated patch into a settings record.
//!
//! Every key is matched against the declared fields of the concrete struct
//! at its position. A key that is reserved, undeclared or carries an
//! unusable value is recorded and skipped; its subtree is never visited.
//! Scalars replace, objects merge key by key, arrays replace wholesale and
//! `null` restores the field's default.

use user_preferences_sdk::document::child_path;
use user_preferences_sdk::{
    DigestFrequency, DropReason, DroppedKey, MergeError, MergePatch, NotificationSettings,
    PatchObject, PatchValue, PrivacySettings, ProfileVisibility, SettingsRecord, Theme,
};

use super::keys::{is_reserved, is_top_level_field};

const LANGUAGE_MIN_LEN: usize = 2;
const LANGUAGE_MAX_LEN: usize = 35;

/// Value constraints for free-form settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRules {
    pub max_string_length: usize,
    pub max_list_length: usize,
}

impl Default for MergeRules {
    fn default() -> Self {
        Self {
            max_string_length: 64,
            max_list_length: 50,
        }
    }
}

/// A freshly built record plus the keys that were not applied, in the
/// order they were encountered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub settings: SettingsRecord,
    pub dropped: Vec<DroppedKey>,
}

/// Merge `patch` into a copy of `current`.
///
/// `current` is never modified; on error nothing is produced.
///
/// # Errors
/// `MalformedDocument` when a non-object, non-null value sits where the
/// schema declares an object.
pub fn merge(
    current: &SettingsRecord,
    patch: &MergePatch,
    rules: &MergeRules,
) -> Result<MergeOutcome, MergeError> {
    let mut settings = current.clone();
    let mut merger = Merger {
        rules: *rules,
        dropped: Vec::new(),
    };
    merger.merge_root(&mut settings, patch.root())?;
    Ok(MergeOutcome {
        settings,
        dropped: merger.dropped,
    })
}

struct Merger {
    rules: MergeRules,
    dropped: Vec<DroppedKey>,
}

impl Merger {
    fn merge_root(
        &mut self,
        settings: &mut SettingsRecord,
        patch: &PatchObject,
    ) -> Result<(), MergeError> {
        for (key, value) in patch.entries() {
            let path = child_path("", key);
            if is_reserved(key) {
                self.drop_key(path, DropReason::Reserved);
                continue;
            }
            if !is_top_level_field(key) {
                self.drop_key(path, DropReason::NotAllowed);
                continue;
            }
            match key {
                SettingsRecord::THEME => {
                    self.assign(&mut settings.theme, value, path, Theme::default, enum_value(Theme::parse));
                }
                SettingsRecord::LANGUAGE => {
                    self.assign(
                        &mut settings.language,
                        value,
                        path,
                        || SettingsRecord::default().language,
                        language_value,
                    );
                }
                SettingsRecord::NOTIFICATIONS => {
                    self.merge_notifications(&mut settings.notifications, value, &path)?;
                }
                SettingsRecord::PRIVACY => {
                    self.merge_privacy(&mut settings.privacy, value, &path)?;
                }
                _ => self.drop_key(path, DropReason::NotAllowed),
            }
        }
        Ok(())
    }

    fn merge_notifications(
        &mut self,
        slot: &mut NotificationSettings,
        value: &PatchValue,
        path: &str,
    ) -> Result<(), MergeError> {
        let Some(patch) = object_at(value, path)? else {
            *slot = NotificationSettings::default();
            return Ok(());
        };
        let defaults = NotificationSettings::default();
        for (key, value) in patch.entries() {
            let field = child_path(path, key);
            if is_reserved(key) {
                self.drop_key(field, DropReason::Reserved);
                continue;
            }
            match key {
                NotificationSettings::EMAIL => {
                    self.assign(&mut slot.email, value, field, || defaults.email, bool_value);
                }
                NotificationSettings::PUSH => {
                    self.assign(&mut slot.push, value, field, || defaults.push, bool_value);
                }
                NotificationSettings::MENTIONS => {
                    self.assign(&mut slot.mentions, value, field, || defaults.mentions, bool_value);
                }
                NotificationSettings::DIGEST => {
                    self.assign(
                        &mut slot.digest,
                        value,
                        field,
                        DigestFrequency::default,
                        enum_value(DigestFrequency::parse),
                    );
                }
                NotificationSettings::MUTED_TOPICS => {
                    let rules = self.rules;
                    self.assign(&mut slot.muted_topics, value, field, Vec::new, |v| {
                        string_list_value(v, &rules)
                    });
                }
                _ => self.drop_key(field, DropReason::NotAllowed),
            }
        }
        Ok(())
    }

    fn merge_privacy(
        &mut self,
        slot: &mut PrivacySettings,
        value: &PatchValue,
        path: &str,
    ) -> Result<(), MergeError> {
        let Some(patch) = object_at(value, path)? else {
            *slot = PrivacySettings::default();
            return Ok(());
        };
        let defaults = PrivacySettings::default();
        for (key, value) in patch.entries() {
            let field = child_path(path, key);
            if is_reserved(key) {
                self.drop_key(field, DropReason::Reserved);
                continue;
            }
            match key {
                PrivacySettings::PROFILE_VISIBILITY => {
                    self.assign(
                        &mut slot.profile_visibility,
                        value,
                        field,
                        ProfileVisibility::default,
                        enum_value(ProfileVisibility::parse),
                    );
                }
                PrivacySettings::SHOW_ONLINE_STATUS => {
                    self.assign(
                        &mut slot.show_online_status,
                        value,
                        field,
                        || defaults.show_online_status,
                        bool_value,
                    );
                }
                PrivacySettings::ALLOW_DIRECT_MESSAGES => {
                    self.assign(
                        &mut slot.allow_direct_messages,
                        value,
                        field,
                        || defaults.allow_direct_messages,
                        bool_value,
                    );
                }
                _ => self.drop_key(field, DropReason::NotAllowed),
            }
        }
        Ok(())
    }

    /// Write a leaf field: `null` restores the default, a value `convert`
    /// accepts replaces the current one, anything else is dropped.
    fn assign<T>(
        &mut self,
        slot: &mut T,
        value: &PatchValue,
        path: String,
        default: impl FnOnce() -> T,
        convert: impl FnOnce(&PatchValue) -> Option<T>,
    ) {
        if matches!(value, PatchValue::Null) {
            *slot = default();
            return;
        }
        match convert(value) {
            Some(next) => *slot = next,
            None => self.drop_key(path, DropReason::InvalidValue),
        }
    }

    fn drop_key(&mut self, path: String, reason: DropReason) {
        self.dropped.push(DroppedKey { path, reason });
    }
}

/// `Ok(None)` for `null`, the object for an object, an error for anything else.
fn object_at<'a>(value: &'a PatchValue, path: &str) -> Result<Option<&'a PatchObject>, MergeError> {
    match value {
        PatchValue::Null => Ok(None),
        PatchValue::Object(obj) => Ok(Some(obj)),
        other => Err(MergeError::malformed(
            path,
            format!("expected object, found {}", other.kind()),
        )),
    }
}

fn bool_value(value: &PatchValue) -> Option<bool> {
    match value {
        PatchValue::Bool(b) => Some(*b),
        _ => None,
    }
}

fn enum_value<E>(parse: fn(&str) -> Option<E>) -> impl FnOnce(&PatchValue) -> Option<E> {
    move |value| match value {
        PatchValue::String(s) => parse(s),
        _ => None,
    }
}

fn language_value(value: &PatchValue) -> Option<String> {
    let PatchValue::String(tag) = value else {
        return None;
    };
    let valid_len = (LANGUAGE_MIN_LEN..=LANGUAGE_MAX_LEN).contains(&tag.len());
    let valid_chars = tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    (valid_len && valid_chars).then(|| tag.clone())
}

fn string_list_value(value: &PatchValue, rules: &MergeRules) -> Option<Vec<String>> {
    let PatchValue::Array(items) = value else {
        return None;
    };
    if items.len() > rules.max_list_length {
        return None;
    }
    items
        .iter()
        .map(|item| match item {
            PatchValue::String(s) if !s.is_empty() && s.chars().count() <= rules.max_string_length => {
                Some(s.clone())
            }
            _ => None,
        })
        .collect()
}
