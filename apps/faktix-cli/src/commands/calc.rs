//! # Calculator Commands
//!
//! A calculator is a JSON [`CalculatorSchema`] file. Inputs start from the
//! fields' defaults and are overridden with `--set name=value`.
//!
//! ```text
//! faktix calc run obklad.json --set m=12,5 --set typ=A
//! faktix calc save obklad.json --title "Koupelna Novákovi" --set m=12.5
//! ```

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::commands::{read_json_file, to_output};
use crate::error::{CliError, CliResult};
use crate::state::AppState;
use faktix_core::calculator::{aggregate_by_unit, calculate_detailed, estimated_cost, SkippedFormula};
use faktix_core::validation::validate_calculation_title;
use faktix_core::{Calculation, CalculationResult, CalculatorInputs, CalculatorSchema, InputValue, Money};

#[derive(Debug, Args)]
pub struct CalcArgs {
    #[command(subcommand)]
    pub command: CalcCommands,
}

#[derive(Debug, Subcommand)]
pub enum CalcCommands {
    /// Evaluate a calculator without saving
    Run(RunArgs),
    /// Evaluate a calculator and save the snapshot
    Save {
        #[command(flatten)]
        run: RunArgs,
        /// Title of the saved calculation
        #[arg(long)]
        title: String,
    },
    /// List saved calculations, newest first
    List,
    /// Show a saved calculation exactly as it was saved
    Show { id: String },
    /// Delete a saved calculation
    Delete { id: String },
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Calculator schema (JSON)
    pub schema: PathBuf,

    /// Input value, repeatable: --set m=12.5
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, InputValue)>,
}

/// Parses `name=value`. Numeric values become numbers, anything else text.
pub fn parse_assignment(raw: &str) -> Result<(String, InputValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;

    let name = name.trim();
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(format!("invalid field name '{name}'"));
    }

    let value = match value.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => InputValue::Number(number),
        _ => InputValue::Text(value.to_string()),
    };
    Ok((name.to_string(), value))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SkippedView {
    material: String,
    formula: String,
    error: String,
}

impl From<SkippedFormula> for SkippedView {
    fn from(skipped: SkippedFormula) -> Self {
        SkippedView {
            material: skipped.material,
            formula: skipped.formula,
            error: skipped.error.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunOutput {
    title: String,
    inputs: CalculatorInputs,
    results: Vec<CalculationResult>,
    skipped: Vec<SkippedView>,
    totals_by_unit: BTreeMap<String, f64>,
    estimated_cost: Option<Money>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculationSummary {
    id: String,
    title: String,
    date: DateTime<Utc>,
    calculator: String,
    results: usize,
}

pub async fn run(args: CalcArgs, state: &AppState) -> CliResult<serde_json::Value> {
    match args.command {
        CalcCommands::Run(run) => {
            let schema = load_schema(&run.schema)?;
            to_output(&evaluate(&schema, run.set))
        }
        CalcCommands::Save { run, title } => {
            let title = validate_calculation_title(&title)?;
            let schema = load_schema(&run.schema)?;
            let inputs = merge_inputs(&schema, run.set);
            let calculation = Calculation::compute(title, &schema, &inputs, Utc::now());

            state.db.calculations().save(state.user_id(), &calculation).await?;
            to_output(&calculation)
        }
        CalcCommands::List => {
            let summaries: Vec<CalculationSummary> = state
                .db
                .calculations()
                .list(state.user_id())
                .await?
                .into_iter()
                .map(|c| CalculationSummary {
                    results: c.results.len(),
                    calculator: c.schema.title,
                    id: c.id,
                    title: c.title,
                    date: c.date,
                })
                .collect();
            to_output(&summaries)
        }
        CalcCommands::Show { id } => {
            let calculation = state
                .db
                .calculations()
                .get_by_id(state.user_id(), &id)
                .await?
                .ok_or_else(|| CliError::not_found("Calculation", &id))?;
            to_output(&calculation)
        }
        CalcCommands::Delete { id } => {
            state.db.calculations().delete(state.user_id(), &id).await?;
            Ok(serde_json::json!({ "deleted": id }))
        }
    }
}

fn load_schema(path: &Path) -> CliResult<CalculatorSchema> {
    Ok(serde_json::from_str(&read_json_file(path)?)?)
}

/// Field defaults overridden by explicit assignments.
fn merge_inputs(schema: &CalculatorSchema, set: Vec<(String, InputValue)>) -> CalculatorInputs {
    let mut inputs = schema.default_inputs();
    inputs.extend(set);
    inputs
}

fn evaluate(schema: &CalculatorSchema, set: Vec<(String, InputValue)>) -> RunOutput {
    let inputs = merge_inputs(schema, set);
    let outcome = calculate_detailed(schema, &inputs);

    let has_costs = outcome.results.iter().any(|r| r.unit_cost.is_some());
    RunOutput {
        title: schema.title.clone(),
        totals_by_unit: aggregate_by_unit(&outcome.results),
        estimated_cost: has_costs.then(|| estimated_cost(&outcome.results)),
        skipped: outcome.skipped.into_iter().map(SkippedView::from).collect(),
        results: outcome.results,
        inputs,
    }
}
