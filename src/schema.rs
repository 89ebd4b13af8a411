//! Database schema management for the PostgreSQL store.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `store::connect`.

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// One table per ledger. Record references (`dataset_id`,
/// `processing_job_id`) are deliberately plain columns without foreign-key
/// constraints: they are checked when written and never afterwards, so
/// deleting a dataset leaves its jobs, validations and maps in place.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS datasets (
            id                  UUID        PRIMARY KEY,
            filename            TEXT        NOT NULL,
            file_size           BIGINT      NOT NULL CHECK (file_size >= 0),
            upload_timestamp    TIMESTAMPTZ NOT NULL,
            data_format         TEXT        NOT NULL,
            satellite_source    TEXT        NOT NULL,
            processing_status   TEXT        NOT NULL,
            geographical_bounds JSONB,
            time_range          JSONB,
            no2_statistics      JSONB
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS processing_jobs (
            id                  UUID        PRIMARY KEY,
            dataset_id          UUID        NOT NULL,
            algorithm           TEXT        NOT NULL,
            parameters          JSONB       NOT NULL DEFAULT '{}'::jsonb,
            status              TEXT        NOT NULL,
            created_timestamp   TIMESTAMPTZ NOT NULL,
            completed_timestamp TIMESTAMPTZ,
            progress_percentage SMALLINT    NOT NULL DEFAULT 0
                CHECK (progress_percentage BETWEEN 0 AND 100),
            output_data         JSONB,
            accuracy_metrics    JSONB
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS validation_results (
            id                   UUID             PRIMARY KEY,
            dataset_id           UUID             NOT NULL,
            processing_job_id    UUID             NOT NULL,
            ground_truth_source  TEXT             NOT NULL,
            accuracy_score       DOUBLE PRECISION NOT NULL,
            rmse                 DOUBLE PRECISION NOT NULL,
            mae                  DOUBLE PRECISION NOT NULL,
            r_squared            DOUBLE PRECISION NOT NULL,
            validation_timestamp TIMESTAMPTZ      NOT NULL,
            validation_notes     TEXT
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS map_visualizations (
            id                UUID             PRIMARY KEY,
            dataset_id        UUID             NOT NULL,
            processing_job_id UUID,
            map_type          TEXT             NOT NULL,
            zoom_level        INTEGER          NOT NULL,
            center_lat        DOUBLE PRECISION NOT NULL,
            center_lon        DOUBLE PRECISION NOT NULL,
            layer_data        JSONB            NOT NULL,
            created_timestamp TIMESTAMPTZ      NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS status_checks (
            id          UUID        PRIMARY KEY,
            client_name TEXT        NOT NULL,
            timestamp   TIMESTAMPTZ NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Status breakdown for analytics
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_processing_jobs_status
            ON processing_jobs (status);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_processing_jobs_dataset_id
            ON processing_jobs (dataset_id);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
