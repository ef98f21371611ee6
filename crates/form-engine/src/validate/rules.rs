//! Destination-country rule sets for the structured pass

use chrono::NaiveDate;
use shared_types::CanonicalKey;

/// Date layout a destination expects on its forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    DayMonthYear,
    MonthDayYear,
}

impl DateFormat {
    pub fn parse(&self, input: &str) -> Option<NaiveDate> {
        let pattern = match self {
            DateFormat::DayMonthYear => "%d/%m/%Y",
            DateFormat::MonthDayYear => "%m/%d/%Y",
        };
        NaiveDate::parse_from_str(input.trim(), pattern).ok()
    }

    pub fn hint(&self) -> &'static str {
        match self {
            DateFormat::DayMonthYear => "DD/MM/YYYY",
            DateFormat::MonthDayYear => "MM/DD/YYYY",
        }
    }
}

/// Deterministic rule parameters for one destination.
#[derive(Debug, Clone)]
pub struct CountryRuleSet {
    pub date_format: DateFormat,
    /// Months of passport validity required beyond the travel reference
    /// date (departure date when known, otherwise today).
    pub passport_validity_months: u32,
    pub mandatory: &'static [CanonicalKey],
    pub notes: &'static [&'static str],
}

const BASE_MANDATORY: &[CanonicalKey] = &[
    CanonicalKey::LastName,
    CanonicalKey::FirstName,
    CanonicalKey::DateOfBirth,
    CanonicalKey::PassportNumber,
    CanonicalKey::Nationality,
];

const US_MANDATORY: &[CanonicalKey] = &[
    CanonicalKey::LastName,
    CanonicalKey::FirstName,
    CanonicalKey::DateOfBirth,
    CanonicalKey::PassportNumber,
    CanonicalKey::Nationality,
    CanonicalKey::TravelPurpose,
];

const SCHENGEN_COUNTRIES: &[&str] = &[
    "austria", "belgium", "croatia", "czech republic", "czechia", "denmark", "estonia",
    "finland", "france", "germany", "greece", "hungary", "iceland", "italy", "latvia",
    "liechtenstein", "lithuania", "luxembourg", "malta", "netherlands", "norway", "poland",
    "portugal", "slovakia", "slovenia", "spain", "sweden", "switzerland",
];

/// Resolve the rule set for a destination. Unknown destinations get a
/// permissive generic set rather than an error.
pub fn rules_for(country: &str) -> CountryRuleSet {
    let normalized = country.trim().to_lowercase();

    if matches!(normalized.as_str(), "united states" | "usa" | "us") {
        return CountryRuleSet {
            date_format: DateFormat::MonthDayYear,
            passport_validity_months: 6,
            mandatory: US_MANDATORY,
            notes: &[
                "US forms use the MM/DD/YYYY date order",
                "Answer every question; write N/A rather than leaving a box blank",
            ],
        };
    }

    if matches!(normalized.as_str(), "united kingdom" | "uk" | "great britain") {
        return CountryRuleSet {
            date_format: DateFormat::DayMonthYear,
            passport_validity_months: 6,
            mandatory: BASE_MANDATORY,
            notes: &["UK forms use the DD/MM/YYYY date order"],
        };
    }

    if SCHENGEN_COUNTRIES.contains(&normalized.as_str()) {
        return CountryRuleSet {
            date_format: DateFormat::DayMonthYear,
            passport_validity_months: 3,
            mandatory: BASE_MANDATORY,
            notes: &[
                "Schengen applications require a passport valid 3 months beyond the intended departure",
            ],
        };
    }

    CountryRuleSet {
        date_format: DateFormat::DayMonthYear,
        passport_validity_months: 6,
        mandatory: BASE_MANDATORY,
        notes: &[],
    }
}
