// src/common/migrations.rs
//! Database schema management

use sqlx::SqlitePool;
use std::env;
use tracing::{info, warn};

/// Run all database migrations
///
/// Tables are created idempotently. Setting `RESET_DB=true` drops everything first.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let should_reset_db = env::var("RESET_DB").unwrap_or_else(|_| "false".to_string()) == "true";

    if should_reset_db {
        warn!("RESET_DB=true - Dropping all tables and recreating schema");
        drop_all_tables(pool).await?;
    } else {
        info!("Skipping table drop (RESET_DB not set). Tables will be created if they don't exist.");
    }

    create_core_tables(pool).await?;
    create_application_tables(pool).await?;
    create_analytics_tables(pool).await?;
    create_indexes(pool).await?;

    info!("Database migration completed successfully");

    Ok(())
}

async fn drop_all_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Children before parents
    let tables = [
        "monthly_stats",
        "platform_breakdowns",
        "analytics",
        "cold_emails",
        "applications",
        "users",
    ];

    for table in tables {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(pool)
            .await?;
    }

    Ok(())
}

async fn create_core_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            username TEXT,
            profile_title TEXT,
            linkedin_url TEXT,
            github_url TEXT,
            resume_url TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_application_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS applications (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            job_title TEXT NOT NULL,
            company_name TEXT NOT NULL,
            platform TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'applied',
            application_type TEXT NOT NULL DEFAULT 'direct',
            domain TEXT,
            employee_names TEXT,
            date_applied TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now')),
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // One row per recipient of a cold-email application
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cold_emails (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            application_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            recipient_name TEXT NOT NULL,
            resolved_address TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            probes INTEGER NOT NULL DEFAULT 0,
            detail TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now')),
            UNIQUE (application_id, recipient_name),
            FOREIGN KEY (application_id) REFERENCES applications(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Aggregate tables. The UNIQUE / composite primary keys are what make
/// concurrent first-time upserts converge on a single row.
async fn create_analytics_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS analytics (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL UNIQUE,
            total_applications INTEGER NOT NULL DEFAULT 0,
            cold_emails_sent INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS platform_breakdowns (
            analytics_id INTEGER NOT NULL,
            platform TEXT NOT NULL,
            applications INTEGER NOT NULL DEFAULT 0,
            cold_emails INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (analytics_id, platform),
            FOREIGN KEY (analytics_id) REFERENCES analytics(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS monthly_stats (
            analytics_id INTEGER NOT NULL,
            month TEXT NOT NULL,
            applications INTEGER NOT NULL DEFAULT 0,
            emails INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (analytics_id, month),
            FOREIGN KEY (analytics_id) REFERENCES analytics(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_applications_user_id ON applications(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_applications_date_applied ON applications(date_applied)",
        "CREATE INDEX IF NOT EXISTS idx_cold_emails_user_id ON cold_emails(user_id)",
    ];

    for statement in indexes {
        sqlx::query(statement).execute(pool).await?;
    }

    Ok(())
}
