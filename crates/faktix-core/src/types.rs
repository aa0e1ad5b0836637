//! # Domain Types
//!
//! Core domain types used throughout Faktix.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌──────────────────┐      │
//! │  │  InvoiceRecord  │   │  ProfileRecord  │   │ CalculatorSchema │      │
//! │  │  ─────────────  │   │  ─────────────  │   │  ──────────────  │      │
//! │  │  id (UUID)      │   │  personal       │   │  fields[]        │      │
//! │  │  invoice_number │   │  business       │   │  formulas[]      │      │
//! │  │  items[]        │   │  banking        │   └────────┬─────────┘      │
//! │  │  total (Money)  │   └─────────────────┘            │ calculate      │
//! │  │  status         │                                  ▼                │
//! │  └─────────────────┘                       ┌──────────────────────┐    │
//! │                                            │ CalculationResult[]  │    │
//! │                                            │ ──► Calculation      │    │
//! │                                            │     (saved snapshot) │    │
//! │                                            └──────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Field names are camelCase, matching the documents the web front end
//! stores. Profile leaves are read leniently: an absent value, `null`, or a
//! value of the wrong JSON type reads as the empty string.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, TaxRate};
use crate::validation::validate_due_days;

// =============================================================================
// Invoice Status
// =============================================================================

/// Lifecycle status of an invoice.
///
/// ```text
///   Draft ──► Sent ──► Paid
///     │        │  ▲      ▲
///     │        ▼  │      │
///     │      Overdue ────┘
///     └──────────────────► Paid (cash on the spot)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Being written, not yet sent to the customer.
    #[default]
    Draft,
    /// Sent to the customer, awaiting payment.
    Sent,
    /// Payment received.
    Paid,
    /// Sent and past its due date.
    Overdue,
}

impl InvoiceStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
        }
    }

    /// Whether a status change from `self` to `to` is allowed.
    ///
    /// Paid is terminal. Setting the current status again is a no-op and
    /// always allowed.
    pub fn can_transition_to(&self, to: InvoiceStatus) -> bool {
        use InvoiceStatus::*;
        match (*self, to) {
            (from, to) if from == to => true,
            (Draft, Sent) | (Draft, Paid) => true,
            (Sent, Paid) | (Sent, Overdue) => true,
            (Overdue, Paid) | (Overdue, Sent) => true,
            _ => false,
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(InvoiceStatus::Draft),
            "sent" => Ok(InvoiceStatus::Sent),
            "paid" => Ok(InvoiceStatus::Paid),
            "overdue" => Ok(InvoiceStatus::Overdue),
            _ => Err(CoreError::UnknownInvoiceStatus(s.to_string())),
        }
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// The customer an invoice is addressed to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub name: String,
    #[serde(default)]
    pub ico: Option<String>,
    #[serde(default)]
    pub dic: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// One line of an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,
    /// Fractional quantities are normal (hours, m², kg).
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    pub unit_price: Money,
    #[serde(default)]
    pub vat_rate: TaxRate,
}

impl LineItem {
    /// Amount before DPH.
    pub fn net(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// DPH on the net amount.
    pub fn vat(&self) -> Money {
        self.net().calculate_vat(self.vat_rate)
    }

    pub fn gross(&self) -> Money {
        self.net() + self.vat()
    }
}

/// An issued or drafted invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    /// Opaque identifier (UUID v4 for locally created invoices).
    pub id: String,

    /// Human-facing number, `YYYY-NNNN`.
    pub invoice_number: String,

    #[ts(as = "String")]
    pub issue_date: NaiveDate,

    #[ts(as = "String")]
    pub due_date: NaiveDate,

    pub customer: Customer,

    #[serde(default)]
    pub items: Vec<LineItem>,

    /// Gross total including DPH.
    #[serde(default)]
    pub total: Money,

    #[serde(default)]
    pub status: InvoiceStatus,
}

impl InvoiceRecord {
    /// Creates a draft invoice due `due_days` after `issue_date`.
    ///
    /// `due_days` must lie in `0..=MAX_DUE_DAYS`, and the due date must
    /// still be a representable date.
    pub fn new_draft(
        invoice_number: impl Into<String>,
        customer: Customer,
        issue_date: NaiveDate,
        due_days: i64,
    ) -> CoreResult<Self> {
        let due_days = validate_due_days(due_days)?;
        let due_date = issue_date
            .checked_add_signed(Duration::days(due_days))
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "due_date".to_string(),
                reason: format!("{issue_date} + {due_days} days is out of range"),
            })?;

        Ok(InvoiceRecord {
            id: uuid::Uuid::new_v4().to_string(),
            invoice_number: invoice_number.into(),
            issue_date,
            due_date,
            customer,
            items: Vec::new(),
            total: Money::zero(),
            status: InvoiceStatus::Draft,
        })
    }

    /// Sets `total` to the sum of the line items' gross amounts.
    pub fn recompute_total(&mut self) -> Money {
        self.total = self.items.iter().map(LineItem::gross).sum();
        self.total
    }

    /// A sent invoice whose due date has passed.
    ///
    /// Drafts and paid invoices are never overdue.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.status {
            InvoiceStatus::Sent | InvoiceStatus::Overdue => self.due_date < today,
            InvoiceStatus::Draft | InvoiceStatus::Paid => false,
        }
    }

    /// Status to display on `today`: sent invoices past due show as overdue.
    pub fn effective_status(&self, today: NaiveDate) -> InvoiceStatus {
        if self.status == InvoiceStatus::Sent && self.is_overdue(today) {
            InvoiceStatus::Overdue
        } else {
            self.status
        }
    }

    /// Changes the status if the lifecycle allows it.
    pub fn set_status(&mut self, to: InvoiceStatus) -> CoreResult<()> {
        if !self.status.can_transition_to(to) {
            return Err(CoreError::InvalidStatusTransition {
                invoice_number: self.invoice_number.clone(),
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

// =============================================================================
// Profile
// =============================================================================

/// The user's profile document: who issues the invoices.
///
/// Every section is optional at the deserialization boundary. A section
/// that is absent or not a JSON object reads as `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    #[serde(default, deserialize_with = "lenient_section")]
    pub personal: Option<PersonalInfo>,

    #[serde(default, deserialize_with = "lenient_section")]
    pub business: Option<BusinessInfo>,

    #[serde(default, deserialize_with = "lenient_section")]
    pub banking: Option<BankingInfo>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub first_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub city: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub postal_code: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BusinessInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub company_name: String,
    /// DIČ.
    #[serde(default, alias = "dic", deserialize_with = "lenient_string")]
    pub vat_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub registration_number: String,
    /// IČ(O); alternate to `registration_number`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub ico: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub city: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub postal_code: String,
    /// Declared entity type, e.g. "OSVČ - volná živnost" or "s.r.o.".
    #[serde(default, deserialize_with = "lenient_string")]
    pub business_type: String,
    /// Trade-license subtype; may hold the literal "undefined".
    #[serde(default, deserialize_with = "lenient_string")]
    pub trade_license_type: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BankingInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub account_number: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub bank_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub iban: String,
}

/// Reads a string leaf; any other JSON type (or null) becomes "".
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        _ => String::new(),
    })
}

/// Reads a section; anything that is not an object (or fails to read)
/// becomes `None`.
fn lenient_section<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(value @ serde_json::Value::Object(_)) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

// =============================================================================
// Calculator Schema
// =============================================================================

/// How an input field is rendered and read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Number,
    Select,
    Text,
}

/// A value typed into a calculator field.
///
/// The UI sends numbers for number inputs and strings for everything else;
/// both are accepted for any field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(untagged)]
pub enum InputValue {
    Number(f64),
    Text(String),
}

impl InputValue {
    /// Numeric value of the input; unparsable or non-finite values are 0.
    ///
    /// Text is trimmed and a decimal comma is accepted (`"12,5"`).
    pub fn as_number(&self) -> f64 {
        let value = match self {
            InputValue::Number(n) => *n,
            InputValue::Text(s) => s.trim().replace(',', ".").parse::<f64>().unwrap_or(0.0),
        };
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }
}

impl From<f64> for InputValue {
    fn from(value: f64) -> Self {
        InputValue::Number(value)
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        InputValue::Text(value.to_string())
    }
}

/// Current inputs of a calculation, keyed by field name.
pub type CalculatorInputs = BTreeMap<String, InputValue>;

/// One input field of a calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InputField {
    /// Identifier used inside formulas.
    pub name: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default, rename = "default")]
    pub default_value: Option<InputValue>,
}

/// One output of a calculator: a material and how to compute its quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Formula {
    pub material: String,
    /// Arithmetic over field names, e.g. `m * 4`.
    pub formula: String,
    pub unit: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Price per unit, carried into the result.
    #[serde(default)]
    pub unit_cost: Option<Money>,
}

/// A calculator definition, authored by a template or the AI assistant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorSchema {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fields: Vec<InputField>,
    #[serde(default)]
    pub formulas: Vec<Formula>,
}

/// A computed material quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub material: String,
    /// Rounded up to 0.01.
    pub quantity: f64,
    pub unit: String,
    #[serde(default)]
    pub unit_cost: Option<Money>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CalculationResult {
    /// quantity × unit cost, if a unit cost is known.
    pub fn total_cost(&self) -> Option<Money> {
        self.unit_cost.map(|cost| cost.multiply_quantity(self.quantity))
    }
}

/// A saved calculation: snapshots of schema, inputs and results.
///
/// Immutable once saved. Reloading shows `results` as stored, never a
/// recomputation against a possibly edited schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Calculation {
    pub id: String,
    pub title: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub inputs: CalculatorInputs,
    pub results: Vec<CalculationResult>,
    pub schema: CalculatorSchema,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sent_invoice(due: NaiveDate) -> InvoiceRecord {
        let mut invoice = InvoiceRecord::new_draft(
            "2025-0001",
            Customer {
                name: "Stavby Novák s.r.o.".to_string(),
                ..Customer::default()
            },
            due - Duration::days(14),
            14,
        )
        .unwrap();
        invoice.status = InvoiceStatus::Sent;
        invoice
    }

    #[test]
    fn test_invoice_status_default() {
        assert_eq!(InvoiceStatus::default(), InvoiceStatus::Draft);
    }

    #[test]
    fn test_invoice_status_parse_and_display() {
        assert_eq!("Paid".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Paid);
        assert_eq!(" overdue ".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Overdue);
        assert!("cancelled".parse::<InvoiceStatus>().is_err());
        assert_eq!(InvoiceStatus::Sent.to_string(), "sent");
    }

    #[test]
    fn test_status_transitions() {
        assert!(InvoiceStatus::Draft.can_transition_to(InvoiceStatus::Sent));
        assert!(InvoiceStatus::Sent.can_transition_to(InvoiceStatus::Overdue));
        assert!(InvoiceStatus::Overdue.can_transition_to(InvoiceStatus::Paid));
        assert!(!InvoiceStatus::Paid.can_transition_to(InvoiceStatus::Sent));
        assert!(!InvoiceStatus::Draft.can_transition_to(InvoiceStatus::Overdue));

        let mut invoice = sent_invoice(date(2025, 3, 1));
        invoice.set_status(InvoiceStatus::Paid).unwrap();
        let err = invoice.set_status(InvoiceStatus::Draft).unwrap_err();
        assert!(matches!(err, CoreError::InvalidStatusTransition { .. }));
    }

    #[test]
    fn test_new_draft_due_date() {
        let invoice = InvoiceRecord::new_draft("2025-0001", Customer::default(), date(2025, 1, 20), 14).unwrap();
        assert_eq!(invoice.due_date, date(2025, 2, 3));
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert!(invoice.total.is_zero());
    }

    #[test]
    fn test_new_draft_rejects_unrepresentable_due_dates() {
        let issued = date(2025, 6, 1);
        let err = InvoiceRecord::new_draft("2025-0001", Customer::default(), issued, 100_000_000)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));
        assert!(InvoiceRecord::new_draft("2025-0001", Customer::default(), issued, -1).is_err());

        let err = InvoiceRecord::new_draft("2025-0001", Customer::default(), NaiveDate::MAX, 1)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::InvalidFormat { .. })
        ));

        let zero = InvoiceRecord::new_draft("2025-0001", Customer::default(), issued, 0).unwrap();
        assert_eq!(zero.due_date, issued);
    }

    #[test]
    fn test_recompute_total_includes_vat() {
        let mut invoice = InvoiceRecord::new_draft("2025-0002", Customer::default(), date(2025, 1, 1), 14).unwrap();
        invoice.items = vec![
            LineItem {
                description: "Pokládka dlažby".to_string(),
                quantity: 12.5,
                unit: "m2".to_string(),
                unit_price: Money::from_haler(40_000),
                vat_rate: TaxRate::STANDARD,
            },
            LineItem {
                description: "Doprava".to_string(),
                quantity: 1.0,
                unit: "ks".to_string(),
                unit_price: Money::from_haler(50_000),
                vat_rate: TaxRate::ZERO,
            },
        ];

        // 12.5 × 400 = 5000 + 21 % = 6050; + 500
        assert_eq!(invoice.recompute_total().haler(), 655_000);
        assert_eq!(invoice.total.haler(), 655_000);
    }

    #[test]
    fn test_overdue_only_for_sent_invoices() {
        let invoice = sent_invoice(date(2025, 3, 1));
        assert!(!invoice.is_overdue(date(2025, 3, 1)));
        assert!(invoice.is_overdue(date(2025, 3, 2)));
        assert_eq!(invoice.effective_status(date(2025, 3, 2)), InvoiceStatus::Overdue);

        let mut paid = invoice.clone();
        paid.status = InvoiceStatus::Paid;
        assert!(!paid.is_overdue(date(2026, 1, 1)));
        assert_eq!(paid.effective_status(date(2026, 1, 1)), InvoiceStatus::Paid);
    }

    #[test]
    fn test_profile_reads_leniently() {
        let profile: ProfileRecord = serde_json::from_str(
            r#"{
                "personal": { "firstName": "Jana", "phone": 777123456, "city": null },
                "business": "not an object",
                "banking": { "iban": "CZ6508000000192000145399" }
            }"#,
        )
        .unwrap();

        let personal = profile.personal.unwrap();
        assert_eq!(personal.first_name, "Jana");
        assert_eq!(personal.phone, "");
        assert_eq!(personal.city, "");
        assert!(profile.business.is_none());
        assert_eq!(profile.banking.unwrap().iban, "CZ6508000000192000145399");
    }

    #[test]
    fn test_profile_accepts_dic_alias() {
        let profile: ProfileRecord =
            serde_json::from_str(r#"{ "business": { "dic": "CZ12345678" } }"#).unwrap();
        assert_eq!(profile.business.unwrap().vat_id, "CZ12345678");
    }

    #[test]
    fn test_input_value_as_number() {
        assert_eq!(InputValue::Number(12.5).as_number(), 12.5);
        assert_eq!(InputValue::from(" 12,5 ").as_number(), 12.5);
        assert_eq!(InputValue::from("abc").as_number(), 0.0);
        assert_eq!(InputValue::from("").as_number(), 0.0);
        assert_eq!(InputValue::from("inf").as_number(), 0.0);
        assert_eq!(InputValue::Number(f64::NAN).as_number(), 0.0);
    }

    #[test]
    fn test_schema_wire_format() {
        let schema: CalculatorSchema = serde_json::from_str(
            r#"{
                "title": "Obklad",
                "fields": [
                    { "name": "m", "label": "Plocha", "type": "number", "unit": "m2", "default": 10 },
                    { "name": "typ", "label": "Typ", "type": "select", "options": ["A", "B"] }
                ],
                "formulas": [
                    { "material": "Lepidlo", "formula": "m * 4", "unit": "kg" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(schema.fields[0].kind, FieldKind::Number);
        assert_eq!(schema.fields[0].default_value, Some(InputValue::Number(10.0)));
        assert_eq!(schema.fields[1].kind, FieldKind::Select);
        assert_eq!(schema.formulas[0].unit_cost, None);
        assert!(schema.description.is_empty());
    }

    #[test]
    fn test_result_total_cost() {
        let result = CalculationResult {
            material: "Lepidlo".to_string(),
            quantity: 50.0,
            unit: "kg".to_string(),
            unit_cost: Some(Money::from_haler(2_450)),
            description: None,
        };
        assert_eq!(result.total_cost(), Some(Money::from_haler(122_500)));
    }
}
