//! Deterministic demo dataset for local runs and smoke checks.
//!
//! Every id and timestamp is fixed so repeated seeding is idempotent-safe to
//! reason about: the seeder refuses to run against a database that already
//! holds any of the seed rows.

use serde::Serialize;
use sqlx::Row;

use crate::repositories::RepositoryError;
use crate::DbPool;

const SEED_TIMESTAMP: &str = "2025-05-01T09:00:00+00:00";

const SEED_CLIENTS: &[(&str, &str, &str, &str)] = &[
    ("11111111-1111-4111-8111-111111111101", "Maya", "Rivera", "maya@example.com"),
    ("11111111-1111-4111-8111-111111111102", "Jordan", "Blake", "jordan@example.com"),
    ("11111111-1111-4111-8111-111111111103", "Priya", "Natarajan", "priya@example.com"),
];

const SEED_LEAD_ID: &str = "22222222-2222-4222-8222-222222222201";
const SEED_SESSION_ID: &str = "33333333-3333-4333-8333-333333333301";
const SEED_INVOICE_ID: &str = "44444444-4444-4444-8444-444444444401";
const SEED_GALLERY_ID: &str = "55555555-5555-4555-8555-555555555501";
const SEED_BLOG_POST_ID: &str = "66666666-6666-4666-8666-666666666601";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeedResult {
    pub clients: u32,
    pub leads: u32,
    pub sessions: u32,
    pub invoices: u32,
    pub galleries: u32,
    pub blog_posts: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub ok: bool,
    pub issues: Vec<String>,
}

pub async fn seed_demo_dataset(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
    let existing =
        sqlx::query("SELECT COUNT(*) AS count FROM client WHERE id = ?")
            .bind(SEED_CLIENTS[0].0)
            .fetch_one(pool)
            .await?
            .get::<i64, _>("count");
    if existing > 0 {
        return Err(RepositoryError::Decode(
            "demo dataset is already present; refusing to seed twice".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    for (id, first_name, last_name, email) in SEED_CLIENTS {
        sqlx::query(
            "INSERT INTO client (id, first_name, last_name, email, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, 'ACTIVE', ?, ?)",
        )
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(SEED_TIMESTAMP)
        .bind(SEED_TIMESTAMP)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        "INSERT INTO lead (id, name, email, source, status, created_at, updated_at)
         VALUES (?, 'Sam Okafor', 'sam@example.com', 'website', 'NEW', ?, ?)",
    )
    .bind(SEED_LEAD_ID)
    .bind(SEED_TIMESTAMP)
    .bind(SEED_TIMESTAMP)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO photography_session (
            id, client_id, session_type, title, location, start_time,
            duration_minutes, price, status, created_at, updated_at
         ) VALUES (?, ?, 'portrait', 'Golden hour portraits', 'Riverside park',
                   '2025-06-15T10:00:00+00:00', 120, '350.00', 'CONFIRMED', ?, ?)",
    )
    .bind(SEED_SESSION_ID)
    .bind(SEED_CLIENTS[0].0)
    .bind(SEED_TIMESTAMP)
    .bind(SEED_TIMESTAMP)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO invoice (
            id, client_id, session_id, amount, description, due_date, status,
            created_at, updated_at
         ) VALUES (?, ?, ?, '350.00', 'Portrait session', '2025-07-01', 'DRAFT', ?, ?)",
    )
    .bind(SEED_INVOICE_ID)
    .bind(SEED_CLIENTS[0].0)
    .bind(SEED_SESSION_ID)
    .bind(SEED_TIMESTAMP)
    .bind(SEED_TIMESTAMP)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO gallery (id, client_id, title, share_token, status, created_at, updated_at)
         VALUES (?, ?, 'June preview', 'seed-share-token-0001', 'DRAFT', ?, ?)",
    )
    .bind(SEED_GALLERY_ID)
    .bind(SEED_CLIENTS[0].0)
    .bind(SEED_TIMESTAMP)
    .bind(SEED_TIMESTAMP)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO blog_post (id, title, slug, content, status, created_at, updated_at)
         VALUES (?, 'Chasing golden hour', 'chasing-golden-hour',
                 'Light changes everything about a portrait.', 'DRAFT', ?, ?)",
    )
    .bind(SEED_BLOG_POST_ID)
    .bind(SEED_TIMESTAMP)
    .bind(SEED_TIMESTAMP)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(SeedResult {
        clients: SEED_CLIENTS.len() as u32,
        leads: 1,
        sessions: 1,
        invoices: 1,
        galleries: 1,
        blog_posts: 1,
    })
}

pub async fn verify_demo_dataset(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
    let mut issues = Vec::new();

    let checks: &[(&str, &str, i64)] = &[
        ("client", "SELECT COUNT(*) AS count FROM client", SEED_CLIENTS.len() as i64),
        ("lead", "SELECT COUNT(*) AS count FROM lead", 1),
        ("photography_session", "SELECT COUNT(*) AS count FROM photography_session", 1),
        ("invoice", "SELECT COUNT(*) AS count FROM invoice", 1),
        ("gallery", "SELECT COUNT(*) AS count FROM gallery", 1),
        ("blog_post", "SELECT COUNT(*) AS count FROM blog_post", 1),
    ];

    for (table, query, expected) in checks {
        let count = sqlx::query(query).fetch_one(pool).await?.get::<i64, _>("count");
        if count < *expected {
            issues.push(format!("table `{table}` holds {count} rows, expected at least {expected}"));
        }
    }

    let orphaned = sqlx::query(
        "SELECT COUNT(*) AS count
         FROM invoice
         WHERE session_id IS NOT NULL
           AND session_id NOT IN (SELECT id FROM photography_session)",
    )
    .fetch_one(pool)
    .await?
    .get::<i64, _>("count");
    if orphaned > 0 {
        issues.push(format!("{orphaned} invoice rows reference missing sessions"));
    }

    Ok(VerificationResult { ok: issues.is_empty(), issues })
}
