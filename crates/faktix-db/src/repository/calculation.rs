//! # Calculation Repository
//!
//! Saved calculator runs.
//!
//! ## Snapshot Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  save()                                                                 │
//! │    schema ──► schema_json     (the calculator as it was)                │
//! │    inputs ──► inputs_json     (what the user typed)                     │
//! │    results ─► results_json    (what was shown)                          │
//! │                                                                         │
//! │  get_by_id() returns all three unchanged. Results are never             │
//! │  recomputed, so editing a calculator later does not rewrite history.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no update operation: a changed calculation is saved as a new one.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{from_json, to_json};
use faktix_core::validation::{validate_calculation_title, validate_uuid};
use faktix_core::{Calculation, CalculationResult, CalculatorInputs, CalculatorSchema};

const SELECT_CALCULATION: &str = r#"
    SELECT
        id,
        title,
        created_at,
        inputs_json,
        results_json,
        schema_json
    FROM calculations
"#;

#[derive(Debug, sqlx::FromRow)]
struct CalculationRow {
    id: String,
    title: String,
    created_at: DateTime<Utc>,
    inputs_json: String,
    results_json: String,
    schema_json: String,
}

impl TryFrom<CalculationRow> for Calculation {
    type Error = DbError;

    fn try_from(row: CalculationRow) -> DbResult<Self> {
        Ok(Calculation {
            id: row.id,
            title: row.title,
            date: row.created_at,
            inputs: from_json::<CalculatorInputs>(&row.inputs_json)?,
            results: from_json::<Vec<CalculationResult>>(&row.results_json)?,
            schema: from_json::<CalculatorSchema>(&row.schema_json)?,
        })
    }
}

/// Repository for saved calculations.
#[derive(Debug, Clone)]
pub struct CalculationRepository {
    pool: SqlitePool,
}

impl CalculationRepository {
    /// Creates a new CalculationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CalculationRepository { pool }
    }

    /// Stores a calculation snapshot.
    ///
    /// ## Errors
    /// - `Validation` for an empty or overlong title, or a malformed id
    /// - `UniqueViolation` if the id was saved before
    pub async fn save(&self, user_id: &str, calculation: &Calculation) -> DbResult<()> {
        validate_uuid(&calculation.id)?;
        validate_calculation_title(&calculation.title)?;

        debug!(
            user_id,
            id = %calculation.id,
            results = calculation.results.len(),
            "Saving calculation"
        );

        sqlx::query(
            r#"
            INSERT INTO calculations (
                id, user_id, title, created_at,
                inputs_json, results_json, schema_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&calculation.id)
        .bind(user_id)
        .bind(&calculation.title)
        .bind(calculation.date)
        .bind(to_json(&calculation.inputs)?)
        .bind(to_json(&calculation.results)?)
        .bind(to_json(&calculation.schema)?)
        .execute(&self.pool)
        .await?;

        info!(user_id, id = %calculation.id, title = %calculation.title, "Calculation saved");
        Ok(())
    }

    /// Gets a saved calculation by ID.
    pub async fn get_by_id(&self, user_id: &str, id: &str) -> DbResult<Option<Calculation>> {
        let row = sqlx::query_as::<_, CalculationRow>(&format!(
            "{SELECT_CALCULATION} WHERE user_id = ?1 AND id = ?2"
        ))
        .bind(user_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Calculation::try_from).transpose()
    }

    /// All saved calculations of a user, newest first.
    pub async fn list(&self, user_id: &str) -> DbResult<Vec<Calculation>> {
        let rows = sqlx::query_as::<_, CalculationRow>(&format!(
            "{SELECT_CALCULATION} WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Calculation::try_from).collect()
    }

    /// Deletes a saved calculation.
    pub async fn delete(&self, user_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM calculations WHERE user_id = ?1 AND id = ?2")
            .bind(user_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Calculation", id));
        }

        debug!(user_id, id, "Calculation deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
