//! Human label resolution for extracted fields
//!
//! Priority order:
//! 1. a document-intelligence label at the field's position, when its
//!    confidence clears the threshold;
//! 2. a label derived from the raw field name (split on casing and
//!    separators, title-cased);
//! 3. when that result is degenerate, nearby extracted text lines
//!    matched against a fixed pattern list for common identity and
//!    travel fields.

use crate::intel::DetectedLabel;
use crate::overlay::Rect;
use lazy_static::lazy_static;
use regex::Regex;

/// Minimum confidence for an externally detected label to win.
pub const LABEL_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Maximum distance in PDF points between a text line and a widget for
/// the line to count as "nearby".
const NEARBY_DISTANCE: f64 = 40.0;

lazy_static! {
    static ref CAMEL_BOUNDARY: Regex = Regex::new(r"([a-z0-9])([A-Z])").unwrap();
    static ref SEPARATORS: Regex = Regex::new(r"[_\-.\[\]]+").unwrap();
    static ref TRAILING_INDEX: Regex = Regex::new(r"\s*\d+\s*$").unwrap();

    /// Fixed patterns for common identity/travel fields, tried in order.
    static ref FALLBACK_PATTERNS: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"(?i)\b(surname|family\s+name|last\s+name)\b").unwrap(), "Surname"),
        (Regex::new(r"(?i)\b(given\s+names?|first\s+name|forename)\b").unwrap(), "Given Names"),
        (Regex::new(r"(?i)\bdate\s+of\s+birth\b|\bd\.?o\.?b\.?\b").unwrap(), "Date of Birth"),
        (Regex::new(r"(?i)\bpassport\s*(number|no\.?)\b").unwrap(), "Passport Number"),
        (Regex::new(r"(?i)\bdate\s+of\s+issue\b").unwrap(), "Date of Issue"),
        (Regex::new(r"(?i)\bdate\s+of\s+expiry\b|\bexpiry\s+date\b").unwrap(), "Date of Expiry"),
        (Regex::new(r"(?i)\bnationality\b|\bcitizenship\b").unwrap(), "Nationality"),
        (Regex::new(r"(?i)\bplace\s+of\s+birth\b").unwrap(), "Place of Birth"),
        (Regex::new(r"(?i)\bcountry\s+of\s+birth\b").unwrap(), "Country of Birth"),
        (Regex::new(r"(?i)\bpurpose\s+of\s+(travel|visit|journey)\b").unwrap(), "Purpose of Travel"),
    ];

    /// Raw names that carry no meaning on their own.
    static ref PLACEHOLDER_NAME: Regex =
        Regex::new(r"(?i)^(untitled|field|text|fill|check|box|f)\d*$").unwrap();
}

/// Derive a human label from a raw field name: `applicantDOB_1` →
/// `Applicant DOB 1`, `passport_number` → `Passport Number`.
pub fn humanize_name(name: &str) -> String {
    let spaced = CAMEL_BOUNDARY.replace_all(name, "$1 $2");
    let spaced = SEPARATORS.replace_all(&spaced, " ");
    spaced
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) if word.chars().all(|c| c.is_lowercase() || c.is_numeric()) => {
                    first.to_uppercase().collect::<String>() + chars.as_str()
                }
                _ => word.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A label too short or placeholder-like to show a user.
pub fn is_degenerate(label: &str) -> bool {
    let trimmed = TRAILING_INDEX.replace(label.trim(), "");
    trimmed.len() < 3 || PLACEHOLDER_NAME.is_match(trimmed.trim())
}

fn rect_distance(a: &Rect, b: &Rect) -> f64 {
    let dx = if a.x + a.width < b.x {
        b.x - (a.x + a.width)
    } else if b.x + b.width < a.x {
        a.x - (b.x + b.width)
    } else {
        0.0
    };
    let dy = if a.y + a.height < b.y {
        b.y - (a.y + a.height)
    } else if b.y + b.height < a.y {
        a.y - (b.y + b.height)
    } else {
        0.0
    };
    (dx * dx + dy * dy).sqrt()
}

/// Find a confident external label positioned at the widget.
fn positional_label(
    labels: &[DetectedLabel],
    page: u32,
    rect: &Rect,
) -> Option<String> {
    labels
        .iter()
        .filter(|l| l.page == page && l.confidence >= LABEL_CONFIDENCE_THRESHOLD)
        .filter(|l| rect_distance(&l.rect, rect) <= NEARBY_DISTANCE)
        .min_by(|a, b| {
            rect_distance(&a.rect, rect)
                .partial_cmp(&rect_distance(&b.rect, rect))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|l| l.text.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Match nearby text lines against the fixed identity/travel patterns.
fn pattern_fallback(labels: &[DetectedLabel], page: u32, rect: &Rect) -> Option<String> {
    let mut nearby: Vec<&DetectedLabel> = labels
        .iter()
        .filter(|l| l.page == page && rect_distance(&l.rect, rect) <= NEARBY_DISTANCE)
        .collect();
    nearby.sort_by(|a, b| {
        rect_distance(&a.rect, rect)
            .partial_cmp(&rect_distance(&b.rect, rect))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for line in nearby {
        for (pattern, canonical_label) in FALLBACK_PATTERNS.iter() {
            if pattern.is_match(&line.text) {
                return Some((*canonical_label).to_string());
            }
        }
    }
    None
}

/// Resolve the display label for a field.
///
/// `position` is the field's widget rect when known; without it the
/// positional and fallback passes are skipped.
pub fn resolve_label(
    name: &str,
    labels: &[DetectedLabel],
    position: Option<(u32, &Rect)>,
) -> String {
    if let Some((page, rect)) = position {
        if let Some(external) = positional_label(labels, page, rect) {
            return external;
        }
    }

    let derived = humanize_name(name);
    if !is_degenerate(&derived) {
        return derived;
    }

    if let Some((page, rect)) = position {
        if let Some(matched) = pattern_fallback(labels, page, rect) {
            return matched;
        }
    }

    // Degenerate but nothing better: keep the derived form.
    derived
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn humanize_splits_casing_and_separators() {
        assert_eq!(humanize_name("passport_number"), "Passport Number");
        assert_eq!(humanize_name("dateOfBirth"), "Date Of Birth");
        assert_eq!(humanize_name("Surname[2]"), "Surname 2");
        assert_eq!(humanize_name("given-names"), "Given Names");
    }

    #[test]
    fn degenerate_labels_detected() {
        assert!(is_degenerate("f1"));
        assert!(is_degenerate("Text3"));
        assert!(is_degenerate("Untitled"));
        assert!(!is_degenerate("Passport Number"));
    }

    fn label_at(page: u32, x: f64, y: f64, text: &str, confidence: f64) -> DetectedLabel {
        DetectedLabel {
            page,
            rect: Rect {
                x,
                y,
                width: 80.0,
                height: 12.0,
            },
            text: text.to_string(),
            confidence,
            kind: None,
        }
    }

    #[test]
    fn confident_positional_label_wins_over_name() {
        let rect = Rect {
            x: 100.0,
            y: 500.0,
            width: 120.0,
            height: 18.0,
        };
        let labels = vec![label_at(1, 100.0, 520.0, "Family name", 0.92)];
        assert_eq!(
            resolve_label("txt_07", &labels, Some((1, &rect))),
            "Family name"
        );
    }

    #[test]
    fn low_confidence_label_is_ignored() {
        let rect = Rect {
            x: 100.0,
            y: 500.0,
            width: 120.0,
            height: 18.0,
        };
        let labels = vec![label_at(1, 100.0, 520.0, "Family name", 0.3)];
        assert_eq!(
            resolve_label("passport_number", &labels, Some((1, &rect))),
            "Passport Number"
        );
    }

    #[test]
    fn pattern_fallback_rescues_degenerate_names() {
        let rect = Rect {
            x: 100.0,
            y: 500.0,
            width: 120.0,
            height: 18.0,
        };
        // Low confidence, so it cannot win positionally, but the text
        // still matches the fixed surname pattern.
        let labels = vec![label_at(1, 100.0, 520.0, "Surname (as in passport)", 0.4)];
        assert_eq!(resolve_label("f3", &labels, Some((1, &rect))), "Surname");
    }

    #[test]
    fn far_away_lines_are_not_nearby() {
        let rect = Rect {
            x: 100.0,
            y: 500.0,
            width: 120.0,
            height: 18.0,
        };
        let labels = vec![label_at(1, 100.0, 100.0, "Surname", 0.9)];
        assert_eq!(resolve_label("f3", &labels, Some((1, &rect))), "F3");
    }
}
