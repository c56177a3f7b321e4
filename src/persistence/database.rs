//! Postgres-backed valuation store.
//!
//! Receives finished results plus request metadata for the audit trail.
//! The engine knows nothing about this schema; the service calls `save_*`
//! fire-and-forget and logs failures without aborting the valuation.

use anyhow::Result;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::info;

use crate::core::types::{NormalizedRequest, ValuationResult};

#[derive(Clone)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(connection_string: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await?;

        let db = Self { pool };
        db.init().await?;
        Ok(db)
    }

    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS valuations (
                id BIGSERIAL PRIMARY KEY,
                vin TEXT NOT NULL,
                zip_code TEXT NOT NULL,
                mileage BIGINT NOT NULL,
                condition TEXT NOT NULL,
                title_status TEXT NOT NULL,
                make TEXT NOT NULL,
                model TEXT NOT NULL,
                year INT NOT NULL,
                base_value TEXT NOT NULL,   -- Decimal stored as text
                final_value TEXT NOT NULL,  -- Decimal stored as text
                price_low TEXT NOT NULL,
                price_high TEXT NOT NULL,
                confidence_score INT NOT NULL,
                outcome TEXT NOT NULL,
                listing_count INT NOT NULL,
                sources_used JSONB NOT NULL,
                adjustments JSONB NOT NULL,
                explanation TEXT NOT NULL,
                created_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Database schema ready");
        Ok(())
    }

    pub async fn save_valuation(
        &self,
        request: &NormalizedRequest,
        result: &ValuationResult,
    ) -> Result<i64> {
        let sources = serde_json::to_value(&result.sources_used)?;
        let adjustments = serde_json::to_value(&result.adjustments)?;

        let row = sqlx::query(
            r#"
            INSERT INTO valuations (
                vin, zip_code, mileage, condition, title_status,
                make, model, year,
                base_value, final_value, price_low, price_high,
                confidence_score, outcome, listing_count,
                sources_used, adjustments, explanation
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING id
            "#,
        )
        .bind(&request.vin)
        .bind(&request.zip_code)
        .bind(request.mileage)
        .bind(request.condition.as_str())
        .bind(request.title_status.as_str())
        .bind(&request.vehicle.make)
        .bind(&request.vehicle.model)
        .bind(request.vehicle.year)
        .bind(result.base_value.to_string())
        .bind(result.final_value.to_string())
        .bind(result.price_range.0.to_string())
        .bind(result.price_range.1.to_string())
        .bind(i32::from(result.confidence_score))
        .bind(result.outcome.to_string())
        .bind(result.market_listings.len() as i32)
        .bind(sources)
        .bind(adjustments)
        .bind(&result.explanation)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<i64, _>("id"))
    }

    /// Recent valuations for the same VIN, newest first. Used by callers
    /// that want to show valuation history alongside a fresh result.
    pub async fn load_recent_for_vin(&self, vin: &str, limit: i64) -> Result<Vec<StoredValuation>> {
        let rows = sqlx::query(
            r#"
            SELECT vin, final_value, confidence_score, outcome, created_at
            FROM valuations
            WHERE vin = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(vin)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| StoredValuation {
                vin: row.get("vin"),
                final_value: row.get("final_value"),
                confidence_score: row.get("confidence_score"),
                outcome: row.get("outcome"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}

#[derive(Clone, Debug)]
pub struct StoredValuation {
    pub vin: String,
    pub final_value: String,
    pub confidence_score: i32,
    pub outcome: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
