//! Canonical mapper: fuzzy field-identity matching
//!
//! Matching is a declarative rule table rather than nested
//! string-contains checks: each canonical key lists required token
//! groups, and a key matches when every group contributes at least one
//! token present in the input. The first matching entry in declaration
//! order wins; that ordering is a designed policy (more specific keys
//! are declared before the general ones they would otherwise shadow).

use shared_types::CanonicalKey;
use std::collections::HashSet;

use CanonicalKey::*;

/// Rule table: (key, required token groups). A key may appear more
/// than once to cover independent synonym shapes.
///
/// Declaration order is load-bearing: `CountryOfBirth` and
/// `PlaceOfBirth` must precede `DateOfBirth`, and the passport date
/// keys must precede the generic date keys they share tokens with.
const RULES: &[(CanonicalKey, &[&[&str]])] = &[
    (PassportExpiryDate, &[&["passport"], &["expiry", "expiration", "expires"]]),
    (PassportExpiryDate, &[&["expiry", "expiration", "expires"]]),
    (PassportIssueDate, &[&["issue", "issued"]]),
    (PassportNumber, &[&["passport"], &["number", "no", "num"]]),
    (CountryOfBirth, &[&["country"], &["birth"]]),
    (PlaceOfBirth, &[&["place"], &["birth"]]),
    (DateOfBirth, &[&["dob", "birth", "birthdate"]]),
    (Nationality, &[&["nationality", "citizenship", "citizen"]]),
    (FirstName, &[&["first", "given"], &["name", "names"]]),
    (FirstName, &[&["forename"]]),
    (LastName, &[&["last", "family"], &["name"]]),
    (LastName, &[&["surname"]]),
    (FullName, &[&["full"], &["name"]]),
    (Gender, &[&["gender", "sex"]]),
    (MaritalStatus, &[&["marital"]]),
    (Email, &[&["email", "mail"]]),
    (Phone, &[&["phone", "telephone", "mobile", "cell"]]),
    (PostalCode, &[&["postal", "postcode", "zip"]]),
    (City, &[&["city", "town"]]),
    (Address, &[&["address", "street"]]),
    (Occupation, &[&["occupation", "profession", "job"]]),
    (Employer, &[&["employer", "company"]]),
    (TravelPurpose, &[&["purpose"]]),
    (ArrivalDate, &[&["arrival", "arrive", "entry"]]),
    (DepartureDate, &[&["departure", "depart", "exit"]]),
];

/// Lowercase alphanumeric tokens of a string.
fn tokenize(input: &str) -> HashSet<String> {
    input
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn match_tokens(tokens: &HashSet<String>) -> Option<CanonicalKey> {
    for (key, groups) in RULES {
        let satisfied = groups
            .iter()
            .all(|group| group.iter().any(|token| tokens.contains(*token)));
        if satisfied {
            return Some(*key);
        }
    }
    None
}

/// Resolve a single string to a canonical key, if any.
pub fn match_key(input: &str) -> Option<CanonicalKey> {
    let tokens = tokenize(input);
    if tokens.is_empty() {
        return None;
    }
    match_tokens(&tokens)
}

/// Resolve a field to at most one canonical key: the raw name is tried
/// first, then the human label. Pure function of its inputs and the
/// static table.
pub fn map_canonical(name: &str, label: &str) -> Option<CanonicalKey> {
    match_key(name).or_else(|| match_key(label))
}
