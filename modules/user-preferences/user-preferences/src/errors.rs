//! Error catalog of the user-preferences module.

use agora_errors::ErrDef;

macro_rules! catalog {
    ($($name:ident => $status:literal, $title:literal, $code:literal;)+) => {
        /// Catalog entries, one per problem type the module can return.
        pub struct ErrorCode;

        impl ErrorCode {
            $(
                #[must_use]
                pub const fn $name() -> ErrDef {
                    ErrDef {
                        status: $status,
                        title: $title,
                        code: $code,
                        type_url: concat!("https://errors.agora.dev/", $code),
                    }
                }
            )+

            /// Every entry, for catalog consistency checks.
            pub const ALL: &'static [ErrDef] = &[$(Self::$name()),+];
        }
    };
}

catalog! {
    user_preferences_not_found_v1 => 404, "Not Found", "agora.user_preferences.not_found.v1";
    user_preferences_document_too_large_v1 => 413, "Payload Too Large", "agora.user_preferences.document_too_large.v1";
    user_preferences_document_too_deep_v1 => 422, "Document Too Deep", "agora.user_preferences.document_too_deep.v1";
    user_preferences_document_too_wide_v1 => 422, "Document Too Wide", "agora.user_preferences.document_too_wide.v1";
    user_preferences_malformed_document_v1 => 400, "Malformed Document", "agora.user_preferences.malformed_document.v1";
    user_preferences_keys_rejected_v1 => 422, "Keys Rejected", "agora.user_preferences.keys_rejected.v1";
    user_preferences_validation_v1 => 422, "Validation Failed", "agora.user_preferences.validation.v1";
    user_preferences_invalid_request_v1 => 400, "Bad Request", "agora.user_preferences.invalid_request.v1";
    user_preferences_unknown_capability_v1 => 400, "Unknown Capability", "agora.user_preferences.unknown_capability.v1";
    user_preferences_forbidden_v1 => 403, "Forbidden", "agora.user_preferences.forbidden.v1";
    user_preferences_conflict_v1 => 409, "Conflict", "agora.user_preferences.conflict.v1";
    user_preferences_internal_v1 => 500, "Internal Server Error", "agora.user_preferences.internal.v1";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_are_unique_and_versioned() {
        let codes: HashSet<&str> = ErrorCode::ALL.iter().map(|d| d.code).collect();
        assert_eq!(codes.len(), ErrorCode::ALL.len());
        for def in ErrorCode::ALL {
            assert!(def.code.starts_with("agora.user_preferences."), "{}", def.code);
            assert!(def.code.ends_with(".v1"), "{}", def.code);
            assert!(def.type_url.ends_with(def.code));
        }
    }

    #[test]
    fn statuses_are_valid_http_codes() {
        for def in ErrorCode::ALL {
            assert!((400..=599).contains(&def.status), "{}", def.code);
        }
    }
}
