//! Field grouper: collapse character-box runs into logical units
//!
//! Forms often split one value across N single-character boxes
//! (`Surname_1`..`Surname_5`). For completion accounting those count as
//! one logical group, filled as soon as any member holds a value.

use lazy_static::lazy_static;
use regex::Regex;
use shared_types::FieldDefinition;

lazy_static! {
    /// Trailing numeric suffix or bracketed index: `_3`, `3`, `[2]`, `.2`.
    static ref TRAILING_INDEX: Regex = Regex::new(r"(?:[_\-. ]*\d+|\[\d+\])\s*$").unwrap();
}

/// One logical group of raw fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldGroup {
    pub key: String,
    /// Member field names, in input order.
    pub members: Vec<String>,
    /// True iff at least one member has a non-empty trimmed value.
    pub filled: bool,
}

/// Group key of a raw field name: the name with trailing numeric
/// suffixes and bracketed indices stripped.
pub fn group_key(name: &str) -> String {
    let stripped = TRAILING_INDEX.replace(name, "");
    let stripped = stripped.trim();
    if stripped.is_empty() {
        // A purely numeric name is its own group.
        name.to_string()
    } else {
        stripped.to_string()
    }
}

/// Partition fields into logical groups, ordered by first occurrence.
///
/// Every field belongs to exactly one group; membership and filled-ness
/// do not depend on input order.
pub fn partition(fields: &[FieldDefinition]) -> Vec<FieldGroup> {
    let mut groups: Vec<FieldGroup> = Vec::new();

    for field in fields {
        let key = group_key(&field.name);
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => {
                group.members.push(field.name.clone());
                group.filled = group.filled || field.is_filled();
            }
            None => groups.push(FieldGroup {
                key,
                members: vec![field.name.clone()],
                filled: field.is_filled(),
            }),
        }
    }

    groups
}

/// Completion percentage over logical groups:
/// `round(100 × filled / total)`, and 0 for an empty field list.
pub fn completion_percentage(fields: &[FieldDefinition]) -> u8 {
    let groups = partition(fields);
    if groups.is_empty() {
        return 0;
    }
    let filled = groups.iter().filter(|g| g.filled).count();
    ((filled as f64 / groups.len() as f64) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use shared_types::FieldKind;

    fn field(name: &str, value: &str) -> FieldDefinition {
        let mut f = FieldDefinition::new(name, FieldKind::Text, name);
        f.value = value.to_string();
        f
    }

    #[test]
    fn suffix_variants_share_a_group() {
        assert_eq!(group_key("Surname_1"), "Surname");
        assert_eq!(group_key("Surname3"), "Surname");
        assert_eq!(group_key("Surname[2]"), "Surname");
        assert_eq!(group_key("Surname.4"), "Surname");
        assert_eq!(group_key("PassportNo"), "PassportNo");
    }

    #[test]
    fn character_boxes_count_as_one_group() {
        let fields: Vec<FieldDefinition> = (1..=5)
            .map(|i| field(&format!("Surname_{}", i), "X"))
            .chain(std::iter::once(field("PassportNo", "")))
            .collect();

        let groups = partition(&fields);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "Surname");
        assert_eq!(groups[0].members.len(), 5);
        assert!(groups[0].filled);
        assert!(!groups[1].filled);

        // Five filled surname boxes, passport empty: exactly half done.
        assert_eq!(completion_percentage(&fields), 50);
    }

    #[test]
    fn group_filled_by_any_member() {
        let fields = vec![field("Dob_1", ""), field("Dob_2", "7"), field("Dob_3", " ")];
        let groups = partition(&fields);
        assert_eq!(groups.len(), 1);
        assert!(groups[0].filled);
    }

    #[test]
    fn empty_list_scores_zero() {
        assert_eq!(completion_percentage(&[]), 0);
    }

    fn arbitrary_fields() -> impl Strategy<Value = Vec<FieldDefinition>> {
        proptest::collection::vec(
            ("[A-Za-z]{1,8}(_[0-9]{1,2})?", "[a-z]{0,4}"),
            0..20,
        )
        .prop_map(|pairs| {
            pairs
                .into_iter()
                .map(|(name, value)| field(&name, &value))
                .collect()
        })
    }

    proptest! {
        /// Every field lands in exactly one group.
        #[test]
        fn partition_is_total(fields in arbitrary_fields()) {
            let groups = partition(&fields);
            let member_count: usize = groups.iter().map(|g| g.members.len()).sum();
            prop_assert_eq!(member_count, fields.len());

            for f in &fields {
                let holding: Vec<_> = groups
                    .iter()
                    .filter(|g| g.members.iter().any(|m| m == &f.name))
                    .collect();
                prop_assert!(!holding.is_empty());
            }
        }

        /// Group membership and filled-ness are stable under input
        /// reordering.
        #[test]
        fn partition_stable_under_reordering(fields in arbitrary_fields()) {
            let mut reversed = fields.clone();
            reversed.reverse();

            let mut forward: Vec<(String, bool, Vec<String>)> = partition(&fields)
                .into_iter()
                .map(|g| {
                    let mut members = g.members;
                    members.sort();
                    (g.key, g.filled, members)
                })
                .collect();
            let mut backward: Vec<(String, bool, Vec<String>)> = partition(&reversed)
                .into_iter()
                .map(|g| {
                    let mut members = g.members;
                    members.sort();
                    (g.key, g.filled, members)
                })
                .collect();
            forward.sort();
            backward.sort();
            prop_assert_eq!(forward, backward);
        }

        /// Score formula holds whenever there is at least one group.
        #[test]
        fn score_matches_formula(fields in arbitrary_fields()) {
            let groups = partition(&fields);
            let score = completion_percentage(&fields);
            if groups.is_empty() {
                prop_assert_eq!(score, 0);
            } else {
                let filled = groups.iter().filter(|g| g.filled).count();
                let expected = ((filled as f64 / groups.len() as f64) * 100.0).round() as u8;
                prop_assert_eq!(score, expected);
            }
        }
    }
}
