//! Property-based tests for label derivation
//!
//! Tests the name-to-label pipeline invariants using proptest.

use form_pdf::label::{humanize_name, is_degenerate, resolve_label};
use form_pdf::{DetectedLabel, Rect};
use proptest::prelude::*;

fn widget_rect() -> Rect {
    Rect {
        x: 100.0,
        y: 500.0,
        width: 120.0,
        height: 18.0,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // ============================================================
    // Humanization Invariants
    // ============================================================

    /// Separators never leak into a derived label.
    #[test]
    fn humanized_names_drop_separators(name in "[A-Za-z][A-Za-z0-9_\\-\\.]{0,24}") {
        let label = humanize_name(&name);
        prop_assert!(!label.is_empty());
        prop_assert!(label.chars().all(|c| c.is_ascii_alphanumeric() || c == ' '));
        prop_assert!(!label.starts_with(' ') && !label.ends_with(' '));
    }

    /// With no detected text and no position, resolution falls through
    /// to the humanized name, degenerate or not.
    #[test]
    fn without_hints_resolution_is_the_humanized_name(name in "[A-Za-z][A-Za-z0-9_]{0,24}") {
        prop_assert_eq!(resolve_label(&name, &[], None), humanize_name(&name));
    }

    // ============================================================
    // Positional Label Priority
    // ============================================================

    /// A confident nearby label beats the raw name, whatever it is.
    #[test]
    fn confident_nearby_label_wins_over_any_name(
        name in "[A-Za-z][A-Za-z0-9_]{0,24}",
        text in "[A-Za-z][A-Za-z ]{0,30}",
    ) {
        let labels = vec![DetectedLabel {
            page: 1,
            rect: Rect { x: 100.0, y: 520.0, width: 80.0, height: 12.0 },
            text: text.clone(),
            confidence: 0.9,
            kind: None,
        }];
        prop_assert_eq!(
            resolve_label(&name, &labels, Some((1, &widget_rect()))),
            text.trim()
        );
    }

    // ============================================================
    // Degeneracy Gate
    // ============================================================

    /// Ordinary words are always shown to the user.
    #[test]
    fn real_words_are_never_degenerate(word in "[g-z]{3,12}") {
        prop_assert!(!is_degenerate(&word));
    }

    /// Placeholder names stay degenerate with any trailing index.
    #[test]
    fn placeholder_names_are_degenerate(
        stem in "(f|text|box|fill|check|field|untitled)",
        index in 0u32..999,
    ) {
        let indexed = format!("{stem}{index}");
        prop_assert!(is_degenerate(&indexed));
        prop_assert!(is_degenerate(&stem));
    }
}
