//! # Profile Repository
//!
//! Stores the user's profile document and answers "may this user issue an
//! invoice?".
//!
//! The document is kept exactly as imported. Completeness is judged on read
//! by [`faktix_core::profile`], and any read failure is treated as "no
//! profile": the check fails closed.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::DbResult;
use crate::repository::from_json;
use faktix_core::profile::{check_profile_json, ProfileCheck, ProfilePolicy};
use faktix_core::{ProfileRecord, ValidationError};

/// Repository for profile documents.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pool: SqlitePool,
}

impl ProfileRepository {
    /// Creates a new ProfileRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProfileRepository { pool }
    }

    /// Stores (or replaces) the user's profile document.
    ///
    /// Only a JSON object is accepted; its content is not checked here.
    pub async fn upsert(&self, user_id: &str, document: &serde_json::Value) -> DbResult<()> {
        if !document.is_object() {
            return Err(ValidationError::InvalidFormat {
                field: "profile".to_string(),
                reason: "must be a JSON object".to_string(),
            }
            .into());
        }

        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, document, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (user_id) DO UPDATE SET
                document = excluded.document,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(document.to_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(user_id, "Profile saved");
        Ok(())
    }

    /// The stored document text, if any.
    pub async fn get_raw(&self, user_id: &str) -> DbResult<Option<String>> {
        let document = sqlx::query_scalar::<_, String>(
            "SELECT document FROM profiles WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(document)
    }

    /// The stored document read as a [`ProfileRecord`].
    ///
    /// Sections and leaves of the wrong type read as absent or empty; only a
    /// document that is not JSON at all is an error.
    pub async fn get(&self, user_id: &str) -> DbResult<Option<ProfileRecord>> {
        match self.get_raw(user_id).await? {
            Some(text) => Ok(Some(from_json(&text)?)),
            None => Ok(None),
        }
    }

    /// Completeness of the user's profile under `policy`.
    ///
    /// A missing row or an unreadable document yields
    /// [`ProfileCheck::missing_profile`], never a pass.
    pub async fn check(&self, user_id: &str, policy: &ProfilePolicy) -> DbResult<ProfileCheck> {
        let check = match self.get_raw(user_id).await? {
            Some(text) => check_profile_json(&text, policy),
            None => ProfileCheck::missing_profile(policy),
        };

        if check.profile_missing {
            warn!(user_id, "No usable profile document");
        } else {
            debug!(
                user_id,
                is_valid = check.is_valid,
                missing = check.missing_fields.len(),
                "Profile checked"
            );
        }

        Ok(check)
    }

    /// Deletes the user's profile. Returns whether a row existed.
    pub async fn delete(&self, user_id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM profiles WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use serde_json::json;

    const USER: &str = "user-1";

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn profile_document(business_type: &str, vat_id: &str) -> serde_json::Value {
        json!({
            "personal": {
                "firstName": "Jana",
                "lastName": "Dvořáková",
                "email": "jana@example.cz",
                "phone": "+420 777 123 456",
                "address": "Květná 12",
                "city": "Brno",
                "postalCode": "602 00"
            },
            "business": {
                "companyName": "Jana Dvořáková",
                "vatId": vat_id,
                "ico": "27082440",
                "address": "Květná 12",
                "city": "Brno",
                "postalCode": "602 00",
                "businessType": business_type,
                "tradeLicenseType": "undefined"
            },
            "banking": {
                "accountNumber": "19-2000145399/0800",
                "bankName": "Česká spořitelna",
                "iban": "CZ6508000000192000145399"
            }
        })
    }

    #[tokio::test]
    async fn test_missing_profile_fails_closed() {
        let db = setup().await;
        let policy = ProfilePolicy::default();

        let check = db.profiles().check(USER, &policy).await.unwrap();
        assert!(!check.is_valid);
        assert!(check.profile_missing);
        assert_eq!(check, ProfileCheck::missing_profile(&policy));
    }

    #[tokio::test]
    async fn test_sole_trader_profile_is_valid() {
        let db = setup().await;
        let repo = db.profiles();
        repo.upsert(USER, &profile_document("OSVČ - volná živnost", ""))
            .await
            .unwrap();

        let check = repo.check(USER, &ProfilePolicy::default()).await.unwrap();
        assert!(check.is_valid, "{:?}", check.missing_fields);
    }

    #[tokio::test]
    async fn test_company_needs_vat_id() {
        let db = setup().await;
        let repo = db.profiles();
        repo.upsert(USER, &profile_document("s.r.o.", "")).await.unwrap();

        let check = repo.check(USER, &ProfilePolicy::default()).await.unwrap();
        assert!(!check.is_valid);
        assert_eq!(check.missing_fields, ["DIČ"]);

        // upsert replaces the previous document
        repo.upsert(USER, &profile_document("s.r.o.", "CZ27082440"))
            .await
            .unwrap();
        assert!(repo.check(USER, &ProfilePolicy::default()).await.unwrap().is_valid);
    }

    #[tokio::test]
    async fn test_unreadable_document_fails_closed() {
        let db = setup().await;
        sqlx::query("INSERT INTO profiles (user_id, document, updated_at) VALUES (?1, ?2, ?3)")
            .bind(USER)
            .bind("{not json")
            .bind(Utc::now())
            .execute(db.pool())
            .await
            .unwrap();

        let repo = db.profiles();
        let check = repo.check(USER, &ProfilePolicy::default()).await.unwrap();
        assert!(check.profile_missing);
        assert!(matches!(repo.get(USER).await, Err(DbError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_non_object_is_rejected() {
        let db = setup().await;
        let err = db.profiles().upsert(USER, &json!([1, 2, 3])).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[tokio::test]
    async fn test_get_and_delete() {
        let db = setup().await;
        let repo = db.profiles();
        repo.upsert(USER, &profile_document("s.r.o.", "CZ27082440"))
            .await
            .unwrap();

        let record = repo.get(USER).await.unwrap().unwrap();
        assert_eq!(record.business.unwrap().ico, "27082440");
        assert!(repo.get("user-2").await.unwrap().is_none());

        assert!(repo.delete(USER).await.unwrap());
        assert!(!repo.delete(USER).await.unwrap());
        assert!(repo.check(USER, &ProfilePolicy::default()).await.unwrap().profile_missing);
    }
}
