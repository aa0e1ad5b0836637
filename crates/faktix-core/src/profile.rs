//! # Profile Completeness
//!
//! Decides whether the user's profile holds everything an invoice needs.
//!
//! ## Validation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stored document (JSON) ──► check_profile_json                          │
//! │        │                         │                                      │
//! │        │ absent / unparseable    │ parsed (lenient: bad leaves = "")    │
//! │        ▼                         ▼                                      │
//! │  ProfileCheck::missing_profile   validate_profile(profile, policy)      │
//! │                                  │                                      │
//! │                                  ├─ for each Requirement, in order:     │
//! │                                  │    any of its fields non-blank? ok   │
//! │                                  │    DIČ waived for sole traders       │
//! │                                  ▼                                      │
//! │                            ProfileCheck { is_valid, missing, message }  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An incomplete profile is an expected outcome, not an error. Nothing in
//! this module panics or returns `Err`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::ProfileRecord;

// =============================================================================
// Profile Fields
// =============================================================================

/// Addressable leaf of a [`ProfileRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    FirstName,
    LastName,
    Email,
    Phone,
    Address,
    City,
    PostalCode,
    CompanyName,
    RegistrationNumber,
    Ico,
    VatId,
    BusinessAddress,
    BusinessCity,
    BusinessPostalCode,
    BusinessType,
    TradeLicenseType,
    AccountNumber,
    BankName,
    Iban,
}

impl ProfileField {
    /// Raw value of the field; "" when its section is missing.
    pub fn value(self, profile: &ProfileRecord) -> &str {
        use ProfileField::*;

        let personal = profile.personal.as_ref();
        let business = profile.business.as_ref();
        let banking = profile.banking.as_ref();

        match self {
            FirstName => personal.map_or("", |p| p.first_name.as_str()),
            LastName => personal.map_or("", |p| p.last_name.as_str()),
            Email => personal.map_or("", |p| p.email.as_str()),
            Phone => personal.map_or("", |p| p.phone.as_str()),
            Address => personal.map_or("", |p| p.address.as_str()),
            City => personal.map_or("", |p| p.city.as_str()),
            PostalCode => personal.map_or("", |p| p.postal_code.as_str()),
            CompanyName => business.map_or("", |b| b.company_name.as_str()),
            RegistrationNumber => business.map_or("", |b| b.registration_number.as_str()),
            Ico => business.map_or("", |b| b.ico.as_str()),
            VatId => business.map_or("", |b| b.vat_id.as_str()),
            BusinessAddress => business.map_or("", |b| b.address.as_str()),
            BusinessCity => business.map_or("", |b| b.city.as_str()),
            BusinessPostalCode => business.map_or("", |b| b.postal_code.as_str()),
            BusinessType => business.map_or("", |b| b.business_type.as_str()),
            TradeLicenseType => business.map_or("", |b| b.trade_license_type.as_str()),
            AccountNumber => banking.map_or("", |b| b.account_number.as_str()),
            BankName => banking.map_or("", |b| b.bank_name.as_str()),
            Iban => banking.map_or("", |b| b.iban.as_str()),
        }
    }

    /// Whether the trimmed value is empty.
    pub fn is_blank(self, profile: &ProfileRecord) -> bool {
        self.value(profile).trim().is_empty()
    }
}

// =============================================================================
// Policy
// =============================================================================

/// One required entry of the profile, reported under `label` when missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub label: String,
    /// Satisfied when ANY of these fields is non-blank.
    pub fields: Vec<ProfileField>,
    /// Not required when the entity type is a sole-trader type.
    pub waived_for_vat_exempt: bool,
}

impl Requirement {
    fn new(label: &str, fields: &[ProfileField]) -> Self {
        Requirement {
            label: label.to_string(),
            fields: fields.to_vec(),
            waived_for_vat_exempt: false,
        }
    }

    fn unless_vat_exempt(mut self) -> Self {
        self.waived_for_vat_exempt = true;
        self
    }

    fn is_satisfied(&self, profile: &ProfileRecord) -> bool {
        self.fields.iter().any(|field| !field.is_blank(profile))
    }
}

/// Required-field policy.
///
/// The sole-trader markers and the requirement table are data, so the
/// policy can be extended without touching [`validate_profile`].
///
/// ## Example
/// ```rust
/// use faktix_core::profile::ProfilePolicy;
///
/// let policy = ProfilePolicy::default().with_vat_exempt_marker("neplátce");
/// assert!(policy.is_vat_exempt("OSVČ - volná živnost"));
/// assert!(policy.is_vat_exempt("Neplátce DPH"));
/// assert!(!policy.is_vat_exempt("s.r.o."));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePolicy {
    requirements: Vec<Requirement>,
    /// Lowercased substrings of the entity type that waive the DIČ.
    vat_exempt_markers: Vec<String>,
}

/// Entity-type substrings identifying a sole trader, with and without
/// diacritics.
pub const SOLE_TRADER_MARKERS: &[&str] = &["živnost", "zivnost", "osvč", "osvc", "fyzická", "fyzicka"];

impl Default for ProfilePolicy {
    fn default() -> Self {
        use ProfileField::*;

        ProfilePolicy {
            requirements: vec![
                Requirement::new("Jméno", &[FirstName]),
                Requirement::new("Příjmení", &[LastName]),
                Requirement::new("E-mail", &[Email]),
                Requirement::new("Telefon", &[Phone]),
                Requirement::new("Adresa", &[Address]),
                Requirement::new("Město", &[City]),
                Requirement::new("PSČ", &[PostalCode]),
                Requirement::new("Název firmy", &[CompanyName]),
                Requirement::new("IČO", &[RegistrationNumber, Ico]),
                Requirement::new("DIČ", &[VatId]).unless_vat_exempt(),
                Requirement::new("Adresa firmy", &[BusinessAddress]),
                Requirement::new("Město firmy", &[BusinessCity]),
                Requirement::new("PSČ firmy", &[BusinessPostalCode]),
                Requirement::new("Typ podnikání", &[BusinessType]),
                Requirement::new("Číslo účtu", &[AccountNumber]),
                Requirement::new("Název banky", &[BankName]),
                Requirement::new("IBAN", &[Iban]),
            ],
            vat_exempt_markers: SOLE_TRADER_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl ProfilePolicy {
    /// Adds a sole-trader marker (matched case-insensitively).
    pub fn with_vat_exempt_marker(mut self, marker: impl AsRef<str>) -> Self {
        let marker = marker.as_ref().trim().to_lowercase();
        if !marker.is_empty() && !self.vat_exempt_markers.contains(&marker) {
            self.vat_exempt_markers.push(marker);
        }
        self
    }

    /// Appends a requirement at the end of the enumeration order.
    pub fn with_requirement(mut self, label: &str, fields: &[ProfileField]) -> Self {
        self.requirements.push(Requirement::new(label, fields));
        self
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn vat_exempt_markers(&self) -> &[String] {
        &self.vat_exempt_markers
    }

    /// Whether `business_type` contains a sole-trader marker.
    pub fn is_vat_exempt(&self, business_type: &str) -> bool {
        let business_type = business_type.to_lowercase();
        self.vat_exempt_markers
            .iter()
            .any(|marker| business_type.contains(marker.as_str()))
    }

    /// Every requirement label, in order.
    fn all_labels(&self) -> Vec<String> {
        self.requirements.iter().map(|r| r.label.clone()).collect()
    }
}

// =============================================================================
// Verdict
// =============================================================================

/// Outcome of a completeness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCheck {
    pub is_valid: bool,
    /// The profile document itself could not be read.
    pub profile_missing: bool,
    /// Labels of missing fields, in policy order.
    pub missing_fields: Vec<String>,
    /// User-facing message; `None` when valid.
    pub message: Option<String>,
}

impl ProfileCheck {
    fn from_missing(missing_fields: Vec<String>) -> Self {
        if missing_fields.is_empty() {
            return ProfileCheck {
                is_valid: true,
                profile_missing: false,
                missing_fields,
                message: None,
            };
        }

        let message = format!(
            "Pro vystavení faktury doplňte v profilu: {}.",
            missing_fields.join(", ")
        );
        ProfileCheck {
            is_valid: false,
            profile_missing: false,
            missing_fields,
            message: Some(message),
        }
    }

    /// Verdict when no usable profile document exists.
    pub fn missing_profile(policy: &ProfilePolicy) -> Self {
        ProfileCheck {
            is_valid: false,
            profile_missing: true,
            missing_fields: policy.all_labels(),
            message: Some("Profil nebyl nalezen. Před vystavením faktury vyplňte svůj profil.".to_string()),
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Checks `profile` against `policy`.
///
/// ## Example
/// ```rust
/// use faktix_core::profile::{validate_profile, ProfilePolicy};
/// use faktix_core::ProfileRecord;
///
/// let check = validate_profile(&ProfileRecord::default(), &ProfilePolicy::default());
/// assert!(!check.is_valid);
/// assert_eq!(check.missing_fields[0], "Jméno");
/// ```
pub fn validate_profile(profile: &ProfileRecord, policy: &ProfilePolicy) -> ProfileCheck {
    let vat_exempt = policy.is_vat_exempt(ProfileField::BusinessType.value(profile));

    let missing = policy
        .requirements
        .iter()
        .filter(|req| !(req.waived_for_vat_exempt && vat_exempt))
        .filter(|req| !req.is_satisfied(profile))
        .map(|req| req.label.clone())
        .collect();

    ProfileCheck::from_missing(missing)
}

/// Checks a stored profile document, failing closed.
///
/// `None`, a non-object document, or a document that cannot be read at all
/// yields [`ProfileCheck::missing_profile`].
pub fn check_profile_value(document: Option<&serde_json::Value>, policy: &ProfilePolicy) -> ProfileCheck {
    match document {
        Some(value) if value.is_object() => match ProfileRecord::deserialize(value) {
            Ok(profile) => validate_profile(&profile, policy),
            Err(_) => ProfileCheck::missing_profile(policy),
        },
        _ => ProfileCheck::missing_profile(policy),
    }
}

/// Checks a stored profile document given as JSON text, failing closed.
pub fn check_profile_json(document: &str, policy: &ProfilePolicy) -> ProfileCheck {
    match serde_json::from_str::<serde_json::Value>(document) {
        Ok(value) => check_profile_value(Some(&value), policy),
        Err(_) => ProfileCheck::missing_profile(policy),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BankingInfo, BusinessInfo, PersonalInfo};

    fn complete_profile(business_type: &str, vat_id: &str) -> ProfileRecord {
        ProfileRecord {
            personal: Some(PersonalInfo {
                first_name: "Jana".to_string(),
                last_name: "Dvořáková".to_string(),
                email: "jana@example.cz".to_string(),
                phone: "+420 777 123 456".to_string(),
                address: "Květná 12".to_string(),
                city: "Brno".to_string(),
                postal_code: "602 00".to_string(),
            }),
            business: Some(BusinessInfo {
                company_name: "Jana Dvořáková".to_string(),
                vat_id: vat_id.to_string(),
                registration_number: String::new(),
                ico: "27082440".to_string(),
                address: "Květná 12".to_string(),
                city: "Brno".to_string(),
                postal_code: "602 00".to_string(),
                business_type: business_type.to_string(),
                trade_license_type: "undefined".to_string(),
            }),
            banking: Some(BankingInfo {
                account_number: "19-2000145399/0800".to_string(),
                bank_name: "Česká spořitelna".to_string(),
                iban: "CZ6508000000192000145399".to_string(),
            }),
        }
    }

    #[test]
    fn test_complete_profile_is_valid() {
        let check = validate_profile(&complete_profile("s.r.o.", "CZ27082440"), &ProfilePolicy::default());
        assert!(check.is_valid);
        assert!(check.missing_fields.is_empty());
        assert_eq!(check.message, None);
    }

    #[test]
    fn test_sole_trader_does_not_need_vat_id() {
        let policy = ProfilePolicy::default();
        let check = validate_profile(&complete_profile("OSVČ - volná živnost", ""), &policy);
        assert!(check.is_valid, "{:?}", check.missing_fields);

        for business_type in ["Fyzická osoba", "FYZICKA OSOBA", "zivnostnik", "osvc"] {
            let check = validate_profile(&complete_profile(business_type, ""), &policy);
            assert!(check.is_valid, "{business_type} should waive DIČ");
        }
    }

    #[test]
    fn test_company_needs_vat_id() {
        let check = validate_profile(&complete_profile("s.r.o.", "   "), &ProfilePolicy::default());
        assert!(!check.is_valid);
        assert_eq!(check.missing_fields, vec!["DIČ".to_string()]);
        assert_eq!(
            check.message.as_deref(),
            Some("Pro vystavení faktury doplňte v profilu: DIČ.")
        );
    }

    #[test]
    fn test_registration_id_accepts_either_field() {
        let policy = ProfilePolicy::default();
        let mut profile = complete_profile("s.r.o.", "CZ27082440");

        if let Some(business) = profile.business.as_mut() {
            business.ico.clear();
            business.registration_number = "27082440".to_string();
        }
        assert!(validate_profile(&profile, &policy).is_valid);

        if let Some(business) = profile.business.as_mut() {
            business.registration_number = " ".to_string();
        }
        assert_eq!(validate_profile(&profile, &policy).missing_fields, vec!["IČO".to_string()]);
    }

    #[test]
    fn test_trade_license_type_never_required() {
        let mut profile = complete_profile("OSVČ", "");
        if let Some(business) = profile.business.as_mut() {
            business.trade_license_type.clear();
        }
        assert!(validate_profile(&profile, &ProfilePolicy::default()).is_valid);
    }

    #[test]
    fn test_missing_section_reports_all_its_fields() {
        let mut profile = complete_profile("s.r.o.", "CZ27082440");
        profile.banking = None;

        let check = validate_profile(&profile, &ProfilePolicy::default());
        assert_eq!(check.missing_fields, vec!["Číslo účtu", "Název banky", "IBAN"]);
        assert_eq!(
            check.message.as_deref(),
            Some("Pro vystavení faktury doplňte v profilu: Číslo účtu, Název banky, IBAN.")
        );
    }

    #[test]
    fn test_empty_profile_lists_fields_in_order() {
        let check = validate_profile(&ProfileRecord::default(), &ProfilePolicy::default());
        assert!(!check.is_valid);
        assert!(!check.profile_missing);
        // no entity type, so DIČ is required too
        assert_eq!(check.missing_fields.len(), 17);
        assert_eq!(check.missing_fields.first().map(String::as_str), Some("Jméno"));
        assert_eq!(check.missing_fields.last().map(String::as_str), Some("IBAN"));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let profile = complete_profile("a.s.", "");
        let policy = ProfilePolicy::default();
        assert_eq!(validate_profile(&profile, &policy), validate_profile(&profile, &policy));
    }

    #[test]
    fn test_custom_marker_extends_policy() {
        let profile = complete_profile("Neplátce DPH", "");
        assert!(!validate_profile(&profile, &ProfilePolicy::default()).is_valid);

        let policy = ProfilePolicy::default().with_vat_exempt_marker("NEPLÁTCE");
        assert!(validate_profile(&profile, &policy).is_valid);
        assert_eq!(policy.vat_exempt_markers().len(), SOLE_TRADER_MARKERS.len() + 1);
    }

    #[test]
    fn test_check_profile_json_fails_closed() {
        let policy = ProfilePolicy::default();

        for document in ["", "not json", "null", "[]", "\"profile\"", "42"] {
            let check = check_profile_json(document, &policy);
            assert!(!check.is_valid);
            assert!(check.profile_missing, "{document:?} should be treated as missing");
            assert_eq!(check.missing_fields.len(), policy.requirements().len());
        }

        assert!(check_profile_value(None, &policy).profile_missing);
    }

    #[test]
    fn test_check_profile_json_reads_partial_documents() {
        let check = check_profile_json(
            r#"{ "personal": { "firstName": "Jana", "lastName": 7 }, "banking": null }"#,
            &ProfilePolicy::default(),
        );
        assert!(!check.profile_missing);
        assert!(!check.missing_fields.contains(&"Jméno".to_string()));
        assert!(check.missing_fields.contains(&"Příjmení".to_string()));
        assert!(check.missing_fields.contains(&"IBAN".to_string()));
    }

    #[test]
    fn test_round_trip_through_json() {
        let profile = complete_profile("OSVČ", "");
        let json = serde_json::to_string(&profile).unwrap();
        assert!(check_profile_json(&json, &ProfilePolicy::default()).is_valid);
    }
}
