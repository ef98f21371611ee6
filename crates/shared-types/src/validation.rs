//! Canonical key vocabulary and validation issue types

use serde::{Deserialize, Serialize};

/// Closed vocabulary of semantic field identities.
///
/// Raw field names are matched against this vocabulary by the canonical
/// mapper; the mapping is computed on demand and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalKey {
    FirstName,
    LastName,
    FullName,
    DateOfBirth,
    PassportNumber,
    PassportIssueDate,
    PassportExpiryDate,
    Nationality,
    CountryOfBirth,
    PlaceOfBirth,
    Gender,
    MaritalStatus,
    Phone,
    Email,
    Address,
    City,
    PostalCode,
    Occupation,
    Employer,
    TravelPurpose,
    ArrivalDate,
    DepartureDate,
}

impl CanonicalKey {
    /// Human-readable name used when an issue has no better display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            CanonicalKey::FirstName => "First Name",
            CanonicalKey::LastName => "Last Name",
            CanonicalKey::FullName => "Full Name",
            CanonicalKey::DateOfBirth => "Date of Birth",
            CanonicalKey::PassportNumber => "Passport Number",
            CanonicalKey::PassportIssueDate => "Passport Issue Date",
            CanonicalKey::PassportExpiryDate => "Passport Expiry Date",
            CanonicalKey::Nationality => "Nationality",
            CanonicalKey::CountryOfBirth => "Country of Birth",
            CanonicalKey::PlaceOfBirth => "Place of Birth",
            CanonicalKey::Gender => "Gender",
            CanonicalKey::MaritalStatus => "Marital Status",
            CanonicalKey::Phone => "Phone",
            CanonicalKey::Email => "Email",
            CanonicalKey::Address => "Address",
            CanonicalKey::City => "City",
            CanonicalKey::PostalCode => "Postal Code",
            CanonicalKey::Occupation => "Occupation",
            CanonicalKey::Employer => "Employer",
            CanonicalKey::TravelPurpose => "Purpose of Travel",
            CanonicalKey::ArrivalDate => "Arrival Date",
            CanonicalKey::DepartureDate => "Departure Date",
        }
    }
}

/// Severity of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Error,
    Warning,
    Info,
}

/// Which validation pass produced an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSource {
    Structured,
    Vision,
}

/// A single finding from a validation run.
///
/// Issues are transient: each run regenerates the full list for its
/// source, replacing (never appending to) the previous run's issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub id: String,
    /// Display name of the affected field.
    pub field_name: String,
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Originating `FieldDefinition` name, for navigation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_value: Option<String>,
    pub source: IssueSource,
}

impl ValidationIssue {
    pub fn new(
        field_name: impl Into<String>,
        kind: IssueKind,
        message: impl Into<String>,
        source: IssueSource,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            field_name: field_name.into(),
            kind,
            message: message.into(),
            suggestion: None,
            field_key: None,
            actual_value: None,
            source,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_field_key(mut self, key: impl Into<String>) -> Self {
        self.field_key = Some(key.into());
        self
    }

    pub fn with_actual_value(mut self, value: impl Into<String>) -> Self {
        self.actual_value = Some(value.into());
        self
    }
}
