//! # Username Derivation
//!
//! Turns free-form supplier names into stable login usernames.
//!
//! Supplier accounts are provisioned automatically during the statistics
//! pass, so the username must be a pure function of the supplier name:
//! re-running a sync with the same data must never mint a second account
//! for the same supplier.
//!
//! ## Rules
//! 1. Lowercase the whole name
//! 2. Collapse every run of non-alphanumeric characters into a single `_`
//! 3. Truncate to [`USERNAME_MAX_LEN`] characters
//! 4. Strip leading and trailing `_` (truncation can expose one)
//! 5. If nothing survives, fall back to `"supplier"`
//!
//! Quotes, dashes and legal-form noise ("OOO", "MChJ") in provider names
//! are common, so the collapse rule matters more than it looks.

use crate::USERNAME_MAX_LEN;

// =============================================================================
// Derivation
// =============================================================================

/// Derive a login username from a supplier display name.
///
/// Deterministic: the same name always yields the same username.
///
/// # Examples
///
/// ```
/// use apteka_core::username::derive_username;
///
/// assert_eq!(derive_username("Grand Pharm Trade"), "grand_pharm_trade");
/// assert_eq!(derive_username("OOO \"Meros-Farm\""), "ooo_meros_farm");
/// assert_eq!(derive_username("  "), "supplier");
/// ```
pub fn derive_username(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;

    for ch in name.trim().to_lowercase().chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(ch);
        } else {
            pending_sep = true;
        }
    }

    let truncated: String = out.chars().take(USERNAME_MAX_LEN).collect();
    let trimmed = truncated.trim_matches('_');

    if trimmed.is_empty() {
        "supplier".to_string()
    } else {
        trimmed.to_string()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_name() {
        assert_eq!(derive_username("Grand Pharm Trade"), "grand_pharm_trade");
    }

    #[test]
    fn test_already_clean() {
        assert_eq!(derive_username("asklepiy"), "asklepiy");
    }

    #[test]
    fn test_collapses_symbol_runs() {
        assert_eq!(derive_username("OOO \"Meros-Farm\""), "ooo_meros_farm");
        assert_eq!(derive_username("A  --  B"), "a_b");
    }

    #[test]
    fn test_strips_edges() {
        assert_eq!(derive_username("\"Asklepiy\""), "asklepiy");
        assert_eq!(derive_username("...dori-darmon..."), "dori_darmon");
    }

    #[test]
    fn test_unicode_names_survive() {
        // Cyrillic letters are alphanumeric and must pass through.
        assert_eq!(derive_username("Дори-Дармон"), "дори_дармон");
    }

    #[test]
    fn test_truncates_long_names() {
        let long = "Very Long Pharmaceutical Distribution Company Name LLC";
        let username = derive_username(long);
        assert!(username.chars().count() <= USERNAME_MAX_LEN);
        assert_eq!(username, "very_long_pharmaceutical_distrib");
    }

    #[test]
    fn test_truncation_never_ends_with_separator() {
        // 31 chars then a separator boundary right at the cut point.
        let name = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa b";
        let username = derive_username(name);
        assert!(!username.ends_with('_'));
    }

    #[test]
    fn test_fallback_for_unusable_names() {
        assert_eq!(derive_username(""), "supplier");
        assert_eq!(derive_username("   "), "supplier");
        assert_eq!(derive_username("***"), "supplier");
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(
            derive_username("Nika Pharm"),
            derive_username("Nika Pharm")
        );
    }
}
