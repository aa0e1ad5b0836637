//! # Invoice Commands
//!
//! ## Issuing Flow
//! ```text
//! faktix invoice new --customer "Stavby Novák s.r.o."
//!      │
//!      ▼
//! profile gate ── incomplete? ──► PROFILE_INCOMPLETE (nothing stored)
//!      │ ok
//!      ▼
//! allocate YYYY-NNNN from stored numbers ──► insert draft ──► print
//! ```

use clap::{Args, Subcommand};
use serde::Serialize;
use tracing::info;

use crate::commands::to_output;
use crate::error::{CliError, CliResult, ErrorCode};
use crate::state::AppState;
use faktix_core::validation::{validate_dic, validate_due_days, validate_ico};
use faktix_core::{Customer, InvoiceRecord, InvoiceStatus};

#[derive(Debug, Args)]
pub struct InvoiceArgs {
    #[command(subcommand)]
    pub command: InvoiceCommands,
}

#[derive(Debug, Subcommand)]
pub enum InvoiceCommands {
    /// Show the number the next invoice will get
    Next,
    /// Create a draft invoice under the next number
    New(NewArgs),
    /// List invoices, newest first
    List,
    /// Change an invoice's status (draft, sent, paid, overdue)
    Status {
        id: String,
        status: String,
    },
    /// Delete an invoice
    Delete { id: String },
}

#[derive(Debug, Args)]
pub struct NewArgs {
    /// Customer name
    #[arg(long)]
    pub customer: String,

    /// Customer IČO
    #[arg(long)]
    pub ico: Option<String>,

    /// Customer DIČ
    #[arg(long)]
    pub dic: Option<String>,

    /// Customer billing address
    #[arg(long)]
    pub address: Option<String>,

    /// Customer e-mail
    #[arg(long)]
    pub email: Option<String>,

    /// Days until due, 0-365 (default: FAKTIX_DUE_DAYS)
    #[arg(long)]
    pub due_days: Option<i64>,
}

/// An invoice as listed, with the status to show today.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InvoiceView {
    #[serde(flatten)]
    invoice: InvoiceRecord,
    effective_status: InvoiceStatus,
}

pub async fn run(args: InvoiceArgs, state: &AppState) -> CliResult<serde_json::Value> {
    match args.command {
        InvoiceCommands::Next => next(state).await,
        InvoiceCommands::New(args) => create(args, state).await,
        InvoiceCommands::List => list(state).await,
        InvoiceCommands::Status { id, status } => change_status(&id, &status, state).await,
        InvoiceCommands::Delete { id } => delete(&id, state).await,
    }
}

async fn next(state: &AppState) -> CliResult<serde_json::Value> {
    let number = state
        .db
        .invoices()
        .allocate_number(state.user_id(), &state.clock)
        .await?;
    Ok(serde_json::json!({ "invoiceNumber": number }))
}

async fn create(args: NewArgs, state: &AppState) -> CliResult<serde_json::Value> {
    let check = state.db.profiles().check(state.user_id(), state.policy()).await?;
    if !check.is_valid {
        let message = check
            .message
            .unwrap_or_else(|| "Profil není kompletní.".to_string());
        return Err(CliError::new(ErrorCode::ProfileIncomplete, message));
    }

    let ico = non_blank(args.ico);
    let dic = non_blank(args.dic);
    if let Some(ico) = &ico {
        validate_ico(ico)?;
    }
    if let Some(dic) = &dic {
        validate_dic(dic)?;
    }

    let due_days = validate_due_days(args.due_days.unwrap_or(state.config.due_days))?;

    let customer = Customer {
        name: args.customer.trim().to_string(),
        ico,
        dic,
        address: non_blank(args.address),
        email: non_blank(args.email),
    };

    let invoice = state
        .db
        .invoices()
        .create_draft(state.user_id(), customer, &state.clock, due_days)
        .await?;

    info!(invoice_number = %invoice.invoice_number, "Invoice created");
    to_output(&invoice)
}

async fn list(state: &AppState) -> CliResult<serde_json::Value> {
    let today = state.clock.today();
    let views: Vec<InvoiceView> = state
        .db
        .invoices()
        .list(state.user_id())
        .await?
        .into_iter()
        .map(|invoice| InvoiceView {
            effective_status: invoice.effective_status(today),
            invoice,
        })
        .collect();
    to_output(&views)
}

async fn change_status(id: &str, status: &str, state: &AppState) -> CliResult<serde_json::Value> {
    let status: InvoiceStatus = status.parse()?;
    let invoice = state
        .db
        .invoices()
        .update_status(state.user_id(), id, status)
        .await?;
    to_output(&invoice)
}

async fn delete(id: &str, state: &AppState) -> CliResult<serde_json::Value> {
    state.db.invoices().delete(state.user_id(), id).await?;
    Ok(serde_json::json!({ "deleted": id }))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support;
    use serde_json::json;

    fn new_args(customer: &str) -> NewArgs {
        NewArgs {
            customer: customer.to_string(),
            ico: None,
            dic: None,
            address: None,
            email: None,
            due_days: None,
        }
    }

    async fn import_profile(state: &AppState, business_type: &str, vat_id: &str) {
        let document = json!({
            "personal": {
                "firstName": "Jana", "lastName": "Dvořáková", "email": "jana@example.cz",
                "phone": "+420 777 123 456", "address": "Květná 12", "city": "Brno",
                "postalCode": "602 00"
            },
            "business": {
                "companyName": "Jana Dvořáková", "vatId": vat_id, "registrationNumber": "27082440",
                "address": "Květná 12", "city": "Brno", "postalCode": "602 00",
                "businessType": business_type
            },
            "banking": {
                "accountNumber": "19-2000145399/0800", "bankName": "Česká spořitelna",
                "iban": "CZ6508000000192000145399"
            }
        });
        state.db.profiles().upsert(state.user_id(), &document).await.unwrap();
    }

    async fn invoke(state: &AppState, command: InvoiceCommands) -> CliResult<serde_json::Value> {
        run(InvoiceArgs { command }, state).await
    }

    #[tokio::test]
    async fn test_next_starts_at_one_for_clock_year() {
        let state = test_support::state().await;
        let out = invoke(&state, InvoiceCommands::Next).await.unwrap();
        assert_eq!(out, json!({ "invoiceNumber": "2025-0001" }));
    }

    #[tokio::test]
    async fn test_new_is_blocked_without_profile() {
        let state = test_support::state().await;
        let err = invoke(&state, InvoiceCommands::New(new_args("Stavby Novák s.r.o.")))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProfileIncomplete);
        assert!(state.db.invoices().list("tester").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_new_is_blocked_for_company_without_vat_id() {
        let state = test_support::state().await;
        import_profile(&state, "s.r.o.", "").await;

        let err = invoke(&state, InvoiceCommands::New(new_args("Stavby Novák s.r.o.")))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProfileIncomplete);
        assert!(err.message.contains("DIČ"));
    }

    #[tokio::test]
    async fn test_new_numbers_sequentially() {
        let state = test_support::state().await;
        import_profile(&state, "OSVČ - volná živnost", "").await;

        let first = invoke(&state, InvoiceCommands::New(new_args("Stavby Novák s.r.o.")))
            .await
            .unwrap();
        let mut args = new_args("Jan Dvořák");
        args.due_days = Some(30);
        args.ico = Some("27082440".to_string());
        let second = invoke(&state, InvoiceCommands::New(args)).await.unwrap();

        assert_eq!(first["invoiceNumber"], "2025-0001");
        assert_eq!(first["dueDate"], "2025-06-15");
        assert_eq!(second["invoiceNumber"], "2025-0002");
        assert_eq!(second["dueDate"], "2025-07-01");
        assert_eq!(second["customer"]["ico"], "27082440");
        assert_eq!(second["status"], "draft");
    }

    #[tokio::test]
    async fn test_new_rejects_bad_customer_ico() {
        let state = test_support::state().await;
        import_profile(&state, "OSVČ", "").await;

        let mut args = new_args("Jan Dvořák");
        args.ico = Some("27082441".to_string());
        let err = invoke(&state, InvoiceCommands::New(args)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_new_rejects_due_days_out_of_range() {
        let state = test_support::state().await;
        import_profile(&state, "OSVČ", "").await;

        for days in [-1, 366, 100_000_000] {
            let mut args = new_args("Jan Dvořák");
            args.due_days = Some(days);
            let err = invoke(&state, InvoiceCommands::New(args)).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::ValidationError);
        }
        assert!(state.db.invoices().list("tester").await.unwrap().is_empty());

        let mut args = new_args("Jan Dvořák");
        args.due_days = Some(0);
        let out = invoke(&state, InvoiceCommands::New(args)).await.unwrap();
        assert_eq!(out["dueDate"], "2025-06-01");
    }

    #[tokio::test]
    async fn test_status_and_list() {
        let state = test_support::state().await;
        import_profile(&state, "OSVČ", "").await;
        let created = invoke(&state, InvoiceCommands::New(new_args("Jan Dvořák")))
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let sent = invoke(
            &state,
            InvoiceCommands::Status {
                id: id.clone(),
                status: "Sent".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(sent["status"], "sent");

        let bogus = invoke(
            &state,
            InvoiceCommands::Status {
                id: id.clone(),
                status: "cancelled".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(bogus.code, ErrorCode::ValidationError);

        let listed = invoke(&state, InvoiceCommands::List).await.unwrap();
        assert_eq!(listed[0]["invoiceNumber"], "2025-0001");
        assert_eq!(listed[0]["effectiveStatus"], "sent");

        let back = invoke(
            &state,
            InvoiceCommands::Status {
                id: id.clone(),
                status: "draft".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(back.code, ErrorCode::BusinessLogic);
    }

    #[tokio::test]
    async fn test_delete_unknown_invoice() {
        let state = test_support::state().await;
        let err = invoke(&state, InvoiceCommands::Delete { id: "nope".into() })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
