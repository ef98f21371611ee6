//! Applicant profile and destination context

use crate::validation::CanonicalKey;
use serde::{Deserialize, Serialize};

/// Destination the document is being prepared for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationContext {
    /// Destination country, e.g. "United States".
    pub country: String,
    /// Visa category, e.g. "B-2" or "Schengen C".
    pub visa_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub marital_status: String,
    #[serde(default)]
    pub country_of_birth: String,
    #[serde(default)]
    pub place_of_birth: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassportInfo {
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub nationality: String,
    #[serde(default)]
    pub issue_date: String,
    #[serde(default)]
    pub expiry_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmploymentInfo {
    #[serde(default)]
    pub occupation: String,
    #[serde(default)]
    pub employer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelInfo {
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub arrival_date: String,
    #[serde(default)]
    pub departure_date: String,
}

/// Stored profile record returned by the profile store collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantProfile {
    #[serde(default)]
    pub personal: PersonalInfo,
    #[serde(default)]
    pub passport: PassportInfo,
    #[serde(default)]
    pub contact: ContactInfo,
    #[serde(default)]
    pub employment: EmploymentInfo,
    #[serde(default)]
    pub travel: TravelInfo,
}

impl ApplicantProfile {
    /// Autofill projection: the profile value for a canonical key,
    /// or `None` when the profile holds nothing usable for it.
    pub fn autofill_value(&self, key: CanonicalKey) -> Option<&str> {
        let value = match key {
            CanonicalKey::FirstName => &self.personal.first_name,
            CanonicalKey::LastName => &self.personal.last_name,
            CanonicalKey::FullName => return None, // composed, see full_name()
            CanonicalKey::DateOfBirth => &self.personal.date_of_birth,
            CanonicalKey::Gender => &self.personal.gender,
            CanonicalKey::MaritalStatus => &self.personal.marital_status,
            CanonicalKey::CountryOfBirth => &self.personal.country_of_birth,
            CanonicalKey::PlaceOfBirth => &self.personal.place_of_birth,
            CanonicalKey::PassportNumber => &self.passport.number,
            CanonicalKey::Nationality => &self.passport.nationality,
            CanonicalKey::PassportIssueDate => &self.passport.issue_date,
            CanonicalKey::PassportExpiryDate => &self.passport.expiry_date,
            CanonicalKey::Phone => &self.contact.phone,
            CanonicalKey::Email => &self.contact.email,
            CanonicalKey::Address => &self.contact.address,
            CanonicalKey::City => &self.contact.city,
            CanonicalKey::PostalCode => &self.contact.postal_code,
            CanonicalKey::Occupation => &self.employment.occupation,
            CanonicalKey::Employer => &self.employment.employer,
            CanonicalKey::TravelPurpose => &self.travel.purpose,
            CanonicalKey::ArrivalDate => &self.travel.arrival_date,
            CanonicalKey::DepartureDate => &self.travel.departure_date,
        };
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }

    /// "First Last" when both parts are present, else whichever exists.
    pub fn full_name(&self) -> Option<String> {
        let first = self.personal.first_name.trim();
        let last = self.personal.last_name.trim();
        match (first.is_empty(), last.is_empty()) {
            (true, true) => None,
            (false, true) => Some(first.to_string()),
            (true, false) => Some(last.to_string()),
            (false, false) => Some(format!("{} {}", first, last)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> ApplicantProfile {
        ApplicantProfile {
            personal: PersonalInfo {
                first_name: "Amara".to_string(),
                last_name: "Okafor".to_string(),
                date_of_birth: "14/03/1990".to_string(),
                ..Default::default()
            },
            passport: PassportInfo {
                number: "A1234567".to_string(),
                nationality: "Nigerian".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn autofill_value_returns_trimmed_non_empty() {
        let profile = sample_profile();
        assert_eq!(
            profile.autofill_value(CanonicalKey::PassportNumber),
            Some("A1234567")
        );
        assert_eq!(profile.autofill_value(CanonicalKey::Email), None);
    }

    #[test]
    fn full_name_composes_both_parts() {
        let profile = sample_profile();
        assert_eq!(profile.full_name().as_deref(), Some("Amara Okafor"));

        let empty = ApplicantProfile::default();
        assert_eq!(empty.full_name(), None);
    }
}
