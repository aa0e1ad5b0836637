//! # Formula Calculator
//!
//! Evaluates a [`CalculatorSchema`] against the current inputs.
//!
//! ## Evaluation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  inputs { m: "12,5", typ: "A", stray: 3 }                               │
//! │       │                                                                 │
//! │       ▼  bind every schema field (absent / unparsable → 0)              │
//! │  bindings { m: 12.5, typ: 0 }          ("stray" is not a field)          │
//! │       │                                                                 │
//! │       ▼  for each formula, in declaration order                         │
//! │  expr::parse ──► Expr::eval ──► ceil to 0.01                            │
//! │       │                │                                                │
//! │       │ Err            └──► CalculationResult { material, qty, unit }   │
//! │       ▼                                                                 │
//! │  warn! + SkippedFormula        (other formulas keep going)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is cached: every call recomputes from the schema and inputs.

pub mod expr;

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::warn;

use crate::error::FormulaError;
use crate::money::Money;
use crate::types::{Calculation, CalculationResult, CalculatorInputs, CalculatorSchema, Formula};

use self::expr::Bindings;

// =============================================================================
// Outcome
// =============================================================================

/// A formula left out of the results.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFormula {
    /// Position in `schema.formulas`.
    pub index: usize,
    pub material: String,
    pub formula: String,
    pub error: FormulaError,
}

/// Results plus the formulas that failed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CalculationOutcome {
    pub results: Vec<CalculationResult>,
    pub skipped: Vec<SkippedFormula>,
}

// =============================================================================
// Evaluation
// =============================================================================

/// Rounds up to the next 0.01.
///
/// Purchased quantities must never come out short, hence ceiling. Values
/// within 1e-9 of a whole hundredth count as that hundredth, so binary noise
/// (`0.1 * 3 = 0.30000000000000004`) does not add a cent.
pub fn ceil_cents(value: f64) -> f64 {
    let scaled = value * 100.0;
    let nearest = scaled.round();
    let hundredths = if (scaled - nearest).abs() < 1e-9 {
        nearest
    } else {
        scaled.ceil()
    };
    // normalizes -0.0
    hundredths / 100.0 + 0.0
}

/// Numeric value for every field of the schema.
pub fn bind_inputs(schema: &CalculatorSchema, inputs: &CalculatorInputs) -> Bindings {
    schema
        .fields
        .iter()
        .map(|field| {
            let value = inputs.get(&field.name).map_or(0.0, |v| v.as_number());
            (field.name.clone(), value)
        })
        .collect()
}

fn evaluate_formula(formula: &Formula, bindings: &Bindings) -> Result<CalculationResult, FormulaError> {
    let quantity = ceil_cents(expr::evaluate(&formula.formula, bindings)?);
    // scaling by 100 can overflow values that were finite before rounding
    if !quantity.is_finite() {
        return Err(FormulaError::NonFinite);
    }
    Ok(CalculationResult {
        material: formula.material.clone(),
        quantity,
        unit: formula.unit.clone(),
        unit_cost: formula.unit_cost,
        description: formula.description.clone(),
    })
}

/// Evaluates every formula, reporting the ones that failed.
pub fn calculate_detailed(schema: &CalculatorSchema, inputs: &CalculatorInputs) -> CalculationOutcome {
    let bindings = bind_inputs(schema, inputs);
    let mut outcome = CalculationOutcome::default();

    for (index, formula) in schema.formulas.iter().enumerate() {
        match evaluate_formula(formula, &bindings) {
            Ok(result) => outcome.results.push(result),
            Err(error) => {
                warn!(
                    calculator = %schema.title,
                    material = %formula.material,
                    formula = %formula.formula,
                    %error,
                    "Skipping calculator formula"
                );
                outcome.skipped.push(SkippedFormula {
                    index,
                    material: formula.material.clone(),
                    formula: formula.formula.clone(),
                    error,
                });
            }
        }
    }

    outcome
}

/// Results for every formula that evaluates, in declaration order.
///
/// ## Example
/// ```rust
/// use faktix_core::calculator::calculate;
/// use faktix_core::{CalculatorInputs, CalculatorSchema, Formula, InputField, FieldKind, InputValue};
///
/// let schema = CalculatorSchema {
///     title: "Obklad".into(),
///     description: String::new(),
///     fields: vec![InputField {
///         name: "m".into(),
///         label: "Plocha".into(),
///         kind: FieldKind::Number,
///         unit: Some("m2".into()),
///         options: None,
///         default_value: None,
///     }],
///     formulas: vec![Formula {
///         material: "Lepidlo".into(),
///         formula: "m * 4".into(),
///         unit: "kg".into(),
///         description: None,
///         unit_cost: None,
///     }],
/// };
/// let inputs = CalculatorInputs::from([("m".to_string(), InputValue::Number(12.5))]);
///
/// let results = calculate(&schema, &inputs);
/// assert_eq!(results[0].quantity, 50.0);
/// assert_eq!(results[0].unit, "kg");
/// ```
pub fn calculate(schema: &CalculatorSchema, inputs: &CalculatorInputs) -> Vec<CalculationResult> {
    calculate_detailed(schema, inputs).results
}

// =============================================================================
// Aggregation
// =============================================================================

/// Total quantity per unit (units compared after trimming).
pub fn aggregate_by_unit(results: &[CalculationResult]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for result in results {
        *totals.entry(result.unit.trim().to_string()).or_insert(0.0) += result.quantity;
    }
    for total in totals.values_mut() {
        *total = (*total * 100.0).round() / 100.0;
    }
    totals
}

/// Sum of the costs of results that carry a unit cost.
pub fn estimated_cost(results: &[CalculationResult]) -> Money {
    results.iter().filter_map(CalculationResult::total_cost).sum()
}

// =============================================================================
// Schema / Calculation helpers
// =============================================================================

impl CalculatorSchema {
    /// Initial inputs taken from field defaults.
    pub fn default_inputs(&self) -> CalculatorInputs {
        self.fields
            .iter()
            .filter_map(|field| {
                field
                    .default_value
                    .clone()
                    .map(|value| (field.name.clone(), value))
            })
            .collect()
    }
}

impl Calculation {
    /// Freezes a finished calculation for saving.
    pub fn snapshot(
        title: impl Into<String>,
        schema: &CalculatorSchema,
        inputs: &CalculatorInputs,
        results: Vec<CalculationResult>,
        date: DateTime<Utc>,
    ) -> Self {
        Calculation {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            date,
            inputs: inputs.clone(),
            results,
            schema: schema.clone(),
        }
    }

    /// Computes the results and freezes them.
    pub fn compute(
        title: impl Into<String>,
        schema: &CalculatorSchema,
        inputs: &CalculatorInputs,
        date: DateTime<Utc>,
    ) -> Self {
        let results = calculate(schema, inputs);
        Calculation::snapshot(title, schema, inputs, results, date)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldKind, InputField, InputValue};

    fn field(name: &str) -> InputField {
        InputField {
            name: name.to_string(),
            label: name.to_uppercase(),
            kind: FieldKind::Number,
            unit: None,
            options: None,
            default_value: None,
        }
    }

    fn formula(material: &str, expression: &str, unit: &str) -> Formula {
        Formula {
            material: material.to_string(),
            formula: expression.to_string(),
            unit: unit.to_string(),
            description: None,
            unit_cost: None,
        }
    }

    fn tiling_schema() -> CalculatorSchema {
        CalculatorSchema {
            title: "Obklad koupelny".to_string(),
            description: "Spotřeba materiálu na obklad".to_string(),
            fields: vec![field("m"), field("prorez")],
            formulas: vec![
                formula("Lepidlo", "m * 4", "kg"),
                formula("Obklad", "m * (1 + prorez / 100)", "m2"),
                formula("Spárovačka", "m * 0.3", "kg"),
            ],
        }
    }

    fn inputs(pairs: &[(&str, InputValue)]) -> CalculatorInputs {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_glue_for_twelve_and_a_half_meters() {
        let schema = CalculatorSchema {
            fields: vec![field("m")],
            formulas: vec![formula("Lepidlo", "m * 4", "kg")],
            ..CalculatorSchema::default()
        };
        let results = calculate(&schema, &inputs(&[("m", InputValue::Number(12.5))]));

        assert_eq!(
            results,
            vec![CalculationResult {
                material: "Lepidlo".to_string(),
                quantity: 50.0,
                unit: "kg".to_string(),
                unit_cost: None,
                description: None,
            }]
        );
    }

    #[test]
    fn test_results_follow_formula_order() {
        let results = calculate(
            &tiling_schema(),
            &inputs(&[("m", "12,5".into()), ("prorez", InputValue::Number(10.0))]),
        );
        let materials: Vec<&str> = results.iter().map(|r| r.material.as_str()).collect();
        assert_eq!(materials, ["Lepidlo", "Obklad", "Spárovačka"]);
        assert_eq!(results[1].quantity, 13.75);
        assert_eq!(results[2].quantity, 3.75);
    }

    #[test]
    fn test_quantities_round_up() {
        let schema = CalculatorSchema {
            fields: vec![field("m")],
            formulas: vec![formula("Penetrace", "m / 3", "l")],
            ..CalculatorSchema::default()
        };
        let results = calculate(&schema, &inputs(&[("m", InputValue::Number(10.0))]));
        // 3.333… → 3.34, never 3.33
        assert_eq!(results[0].quantity, 3.34);
    }

    #[test]
    fn test_ceil_cents() {
        assert_eq!(ceil_cents(50.0), 50.0);
        assert_eq!(ceil_cents(50.001), 50.01);
        assert_eq!(ceil_cents(0.1 * 3.0), 0.3);
        assert_eq!(ceil_cents(-1.234), -1.23);
        assert_eq!(ceil_cents(-0.001).to_bits(), 0.0f64.to_bits());
    }

    #[test]
    fn test_missing_and_unparsable_inputs_are_zero() {
        let results = calculate(&tiling_schema(), &inputs(&[("m", "abc".into())]));
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.quantity == 0.0));
    }

    #[test]
    fn test_disallowed_formula_is_skipped_alone() {
        let mut schema = tiling_schema();
        schema.formulas.insert(1, formula("Hack", "globalThis.process.exit(1)", "ks"));
        schema.formulas.push(formula("Dělení", "m / 0", "ks"));

        let outcome = calculate_detailed(
            &schema,
            &inputs(&[("m", InputValue::Number(12.5)), ("prorez", InputValue::Number(0.0))]),
        );

        let materials: Vec<&str> = outcome.results.iter().map(|r| r.material.as_str()).collect();
        assert_eq!(materials, ["Lepidlo", "Obklad", "Spárovačka"]);
        assert_eq!(outcome.results[0].quantity, 50.0);

        assert_eq!(outcome.skipped.len(), 2);
        assert_eq!(outcome.skipped[0].index, 1);
        assert_eq!(outcome.skipped[0].material, "Hack");
        assert_eq!(outcome.skipped[1].error, FormulaError::DivisionByZero);
    }

    #[test]
    fn test_quantity_too_large_to_round_is_skipped() {
        let schema = CalculatorSchema {
            fields: vec![field("m")],
            formulas: vec![formula("Obří", "m * 1", "ks"), formula("Lepidlo", "4", "kg")],
            ..CalculatorSchema::default()
        };
        let outcome = calculate_detailed(&schema, &inputs(&[("m", InputValue::Number(1e307))]));

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].material, "Lepidlo");
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].error, FormulaError::NonFinite);

        // every stored quantity survives a JSON round trip
        let json = serde_json::to_string(&outcome.results).unwrap();
        let back: Vec<CalculationResult> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, outcome.results);
    }

    #[test]
    fn test_only_schema_fields_are_bound() {
        let schema = CalculatorSchema {
            fields: vec![field("m")],
            formulas: vec![formula("X", "m + extra", "ks")],
            ..CalculatorSchema::default()
        };
        let outcome = calculate_detailed(
            &schema,
            &inputs(&[("m", InputValue::Number(1.0)), ("extra", InputValue::Number(2.0))]),
        );
        assert!(outcome.results.is_empty());
        assert_eq!(
            outcome.skipped[0].error,
            FormulaError::UnknownIdentifier("extra".to_string())
        );
    }

    #[test]
    fn test_empty_schema_yields_nothing() {
        let outcome = calculate_detailed(&CalculatorSchema::default(), &CalculatorInputs::new());
        assert_eq!(outcome, CalculationOutcome::default());
    }

    #[test]
    fn test_recompute_is_stateless() {
        let schema = tiling_schema();
        let first = calculate(&schema, &inputs(&[("m", InputValue::Number(1.0))]));
        let second = calculate(&schema, &inputs(&[("m", InputValue::Number(2.0))]));
        let again = calculate(&schema, &inputs(&[("m", InputValue::Number(1.0))]));
        assert_ne!(first, second);
        assert_eq!(first, again);
    }

    #[test]
    fn test_default_inputs() {
        let mut schema = tiling_schema();
        schema.fields[1].default_value = Some(InputValue::Number(10.0));

        let defaults = schema.default_inputs();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults.get("prorez"), Some(&InputValue::Number(10.0)));
    }

    #[test]
    fn test_aggregate_and_cost() {
        let mut schema = tiling_schema();
        schema.formulas[0].unit_cost = Some(Money::from_haler(2_000));
        schema.formulas[2].unit_cost = Some(Money::from_haler(9_900));

        let results = calculate(&schema, &inputs(&[("m", InputValue::Number(10.0))]));
        let totals = aggregate_by_unit(&results);
        assert_eq!(totals.get("kg"), Some(&43.0));
        assert_eq!(totals.get("m2"), Some(&10.0));

        // 40 kg × 20 Kč + 3 kg × 99 Kč
        assert_eq!(estimated_cost(&results), Money::from_haler(80_000 + 29_700));
    }

    #[test]
    fn test_snapshot_keeps_results_as_computed() {
        let schema = tiling_schema();
        let values = inputs(&[("m", InputValue::Number(4.0))]);
        let calculation = Calculation::compute("Koupelna", &schema, &values, Utc::now());

        assert_eq!(calculation.results, calculate(&schema, &values));
        assert_eq!(calculation.schema, schema);
        assert_eq!(calculation.inputs, values);
        assert!(!calculation.id.is_empty());
    }
}
