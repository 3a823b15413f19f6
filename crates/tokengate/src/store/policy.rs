//! Policy persistence: lookups for the engine, CRUD for the admin surface

use crate::config::PolicyDbConfig;
use crate::error::{LimiterError, Result};
use async_trait::async_trait;
use rand::Rng;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, info};

use super::models::{ClientPolicy, NewClientPolicy, RefillPolicy};

/// Read side of the policy table, the engine's only view of it.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Resolve a client's capacity and refill interval.
    ///
    /// A missing row is [`LimiterError::UnknownClient`]; transport
    /// failures are [`LimiterError::PolicyFetch`] so callers can tell a
    /// rejected client from a broken database.
    async fn lookup(&self, client_id: &str) -> Result<RefillPolicy>;
}

/// Outcome of a policy insert. A duplicate client id is a skip, not an
/// error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(ClientPolicy),
    DuplicateSkipped,
}

/// Tally of a bulk-generate run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct GenerateReport {
    pub created: u32,
    pub skipped: u32,
}

/// PostgreSQL-backed policy store.
#[derive(Debug, Clone)]
pub struct PgPolicyStore {
    pool: PgPool,
}

impl PgPolicyStore {
    /// Connect a pool with the configured limits.
    pub async fn connect(config: &PolicyDbConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout())
            .connect(&config.url)
            .await
            .map_err(|e| {
                LimiterError::Configuration(format!("failed to connect to policy database: {e}"))
            })?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the schema migration.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(include_str!("migrations/001_initial.sql"))
            .execute(&self.pool)
            .await
            .map_err(|e| LimiterError::Configuration(format!("migration failed: {e}")))?;
        info!("policy schema migration applied");
        Ok(())
    }

    /// Round-trip query, used by startup probes.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| LimiterError::PolicyFetch(e.to_string()))?;
        Ok(())
    }

    /// Fetch one policy row, `None` when the client has no row.
    pub async fn get(&self, client_id: &str) -> Result<Option<ClientPolicy>> {
        sqlx::query_as::<_, ClientPolicy>(
            "SELECT id, client_id, rate_limit, refill_interval FROM rate_limits \
             WHERE client_id = $1 LIMIT 1",
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LimiterError::PolicyFetch(e.to_string()))
    }

    /// Insert a new policy row; a duplicate client id is reported as a
    /// skip.
    pub async fn create(&self, new: &NewClientPolicy) -> Result<CreateOutcome> {
        validate_policy(&new.client_id, new.rate_limit, new.refill_interval)?;

        let inserted = sqlx::query_as::<_, ClientPolicy>(
            "INSERT INTO rate_limits (client_id, rate_limit, refill_interval) \
             VALUES ($1, $2, $3) \
             RETURNING id, client_id, rate_limit, refill_interval",
        )
        .bind(&new.client_id)
        .bind(new.rate_limit)
        .bind(new.refill_interval)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(policy) => Ok(CreateOutcome::Created(policy)),
            Err(e) if is_duplicate_key(&e) => {
                debug!(client_id = %new.client_id, "skipping duplicate policy row");
                Ok(CreateOutcome::DuplicateSkipped)
            }
            Err(e) => Err(LimiterError::PolicyFetch(e.to_string())),
        }
    }

    /// Update one client's limits, returning the row as stored.
    pub async fn update(
        &self,
        client_id: &str,
        rate_limit: i32,
        refill_interval: i32,
    ) -> Result<ClientPolicy> {
        validate_policy(client_id, rate_limit, refill_interval)?;

        sqlx::query_as::<_, ClientPolicy>(
            "UPDATE rate_limits SET rate_limit = $2, refill_interval = $3 \
             WHERE client_id = $1 \
             RETURNING id, client_id, rate_limit, refill_interval",
        )
        .bind(client_id)
        .bind(rate_limit)
        .bind(refill_interval)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LimiterError::PolicyFetch(e.to_string()))?
        .ok_or_else(|| LimiterError::UnknownClient(client_id.to_string()))
    }

    /// Delete one client's row; `false` when no row existed.
    pub async fn delete(&self, client_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM rate_limits WHERE client_id = $1")
            .bind(client_id)
            .execute(&self.pool)
            .await
            .map_err(|e| LimiterError::PolicyFetch(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// List policy rows ordered by client id. Non-positive `limit`
    /// defaults to 100, negative `offset` to 0.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<ClientPolicy>> {
        let limit = if limit <= 0 { 100 } else { limit };
        let offset = offset.max(0);

        sqlx::query_as::<_, ClientPolicy>(
            "SELECT id, client_id, rate_limit, refill_interval FROM rate_limits \
             ORDER BY client_id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LimiterError::PolicyFetch(e.to_string()))
    }

    /// Delete every policy row, returning how many were removed.
    pub async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM rate_limits")
            .execute(&self.pool)
            .await
            .map_err(|e| LimiterError::PolicyFetch(e.to_string()))?;
        Ok(result.rows_affected())
    }

    /// Create `count` pseudo-random policy rows, skipping ids that
    /// already exist.
    pub async fn generate_random(&self, count: u32) -> Result<GenerateReport> {
        let mut report = GenerateReport::default();

        for _ in 0..count {
            let new = {
                let mut rng = rand::rng();
                NewClientPolicy {
                    client_id: format!("Client{}", rng.random_range(0..=100)),
                    rate_limit: rng.random_range(0..=20),
                    refill_interval: rng.random_range(10..=60),
                }
            };
            match self.create(&new).await? {
                CreateOutcome::Created(_) => report.created += 1,
                CreateOutcome::DuplicateSkipped => report.skipped += 1,
            }
        }

        info!(
            created = report.created,
            skipped = report.skipped,
            "bulk policy generation finished"
        );
        Ok(report)
    }
}

#[async_trait]
impl PolicyStore for PgPolicyStore {
    async fn lookup(&self, client_id: &str) -> Result<RefillPolicy> {
        match self.get(client_id).await? {
            Some(policy) => Ok(RefillPolicy::from(&policy)),
            None => Err(LimiterError::UnknownClient(client_id.to_string())),
        }
    }
}

fn validate_policy(client_id: &str, rate_limit: i32, refill_interval: i32) -> Result<()> {
    if client_id.is_empty() {
        return Err(LimiterError::InvalidArgument(
            "client_id must not be empty".to_string(),
        ));
    }
    if rate_limit < 0 {
        return Err(LimiterError::InvalidArgument(format!(
            "rate_limit must not be negative, got {rate_limit}"
        )));
    }
    if refill_interval <= 0 {
        return Err(LimiterError::InvalidArgument(format!(
            "refill_interval must be positive, got {refill_interval}"
        )));
    }
    Ok(())
}

/// Postgres unique-violation SQLSTATE.
fn is_duplicate_key(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}
