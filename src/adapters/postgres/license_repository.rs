//! PostgreSQL implementation of LicenseRepository.
//!
//! One row per license; type-specific fields are stored as JSONB and
//! a NULL `expires_at` means the license never expires.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{
    DomainError, ErrorCode, LicenseId, OfferingId, Timestamp, UserId,
};
use crate::domain::licensing::{ExpirationPolicyRef, License, LicenseFields, LicenseRecord};
use crate::ports::LicenseRepository;

const SELECT_LICENSE: &str = r#"
    SELECT id, kind, owner_id, offering_id, expiration, state, fields,
           created_at, granted_at, expires_at, changed_at
    FROM licenses
"#;

/// PostgreSQL implementation of LicenseRepository.
#[derive(Clone)]
pub struct PostgresLicenseRepository {
    pool: PgPool,
}

impl PostgresLicenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LicenseRepository for PostgresLicenseRepository {
    async fn save(&self, license: &License) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO licenses (
                id, kind, owner_id, offering_id, expiration, state, fields,
                created_at, granted_at, expires_at, changed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(license.id().as_uuid())
        .bind(license.kind())
        .bind(license.owner().as_str())
        .bind(license.offering().as_uuid())
        .bind(license.expiration().as_str())
        .bind(license.state().as_str())
        .bind(Json(license.fields()))
        .bind(license.created().as_datetime())
        .bind(license.granted().map(|t| *t.as_datetime()))
        .bind(license.expires().map(|t| *t.as_datetime()))
        .bind(license.changed().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert license", e))?;

        Ok(())
    }

    async fn update(&self, license: &License) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE licenses SET
                owner_id = $2,
                state = $3,
                fields = $4,
                granted_at = $5,
                expires_at = $6,
                changed_at = $7
            WHERE id = $1
            "#,
        )
        .bind(license.id().as_uuid())
        .bind(license.owner().as_str())
        .bind(license.state().as_str())
        .bind(Json(license.fields()))
        .bind(license.granted().map(|t| *t.as_datetime()))
        .bind(license.expires().map(|t| *t.as_datetime()))
        .bind(license.changed().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update license", e))?;

        if result.rows_affected() == 0 {
            return Err(not_found(&license.id()));
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &LicenseId) -> Result<Option<License>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE id = $1", SELECT_LICENSE))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("fetch license", e))?;

        row.map(row_to_license).transpose()
    }

    async fn find_by_owner(&self, owner: &UserId) -> Result<Vec<License>, DomainError> {
        let rows = sqlx::query(&format!(
            "{} WHERE owner_id = $1 ORDER BY created_at, id",
            SELECT_LICENSE
        ))
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("fetch licenses by owner", e))?;

        rows.into_iter().map(row_to_license).collect()
    }

    async fn find_by_offering_and_owner(
        &self,
        offering: &OfferingId,
        owner: &UserId,
    ) -> Result<Vec<License>, DomainError> {
        let rows = sqlx::query(&format!(
            "{} WHERE offering_id = $1 AND owner_id = $2 ORDER BY created_at, id",
            SELECT_LICENSE
        ))
        .bind(offering.as_uuid())
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("fetch licenses by offering", e))?;

        rows.into_iter().map(row_to_license).collect()
    }

    async fn delete(&self, id: &LicenseId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM licenses WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete license", e))?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn db_error(action: &str, err: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Failed to {}: {}", action, err))
}

fn not_found(id: &LicenseId) -> DomainError {
    DomainError::new(ErrorCode::LicenseNotFound, format!("License not found: {}", id))
}

fn corrupt(column: &str, reason: impl std::fmt::Display) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid {} in licenses row: {}", column, reason),
    )
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| DomainError::new(ErrorCode::DatabaseError, format!("Failed to get {}: {}", name, e)))
}

fn row_to_license(row: PgRow) -> Result<License, DomainError> {
    let state: String = column(&row, "state")?;
    let owner: String = column(&row, "owner_id")?;
    let expiration: String = column(&row, "expiration")?;
    let Json(fields): Json<LicenseFields> = column(&row, "fields")?;
    let created: DateTime<Utc> = column(&row, "created_at")?;
    let granted: Option<DateTime<Utc>> = column(&row, "granted_at")?;
    let expires: Option<DateTime<Utc>> = column(&row, "expires_at")?;
    let changed: DateTime<Utc> = column(&row, "changed_at")?;

    Ok(License::reconstitute(LicenseRecord {
        id: LicenseId::from_uuid(column(&row, "id")?),
        kind: column(&row, "kind")?,
        owner: UserId::new(owner).map_err(|e| corrupt("owner_id", e))?,
        offering: OfferingId::from_uuid(column(&row, "offering_id")?),
        expiration: ExpirationPolicyRef::new(expiration),
        state: state.parse().map_err(|e| corrupt("state", e))?,
        created: Timestamp::from_datetime(created),
        granted: granted.map(Timestamp::from_datetime),
        expires: expires.map(Timestamp::from_datetime),
        changed: Timestamp::from_datetime(changed),
        fields,
    }))
}
