// Persisted lane cache: route results keyed by service code so a lane can be
// reloaded without hitting the directions service again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{BusRoute, LaneSnapshot};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use std::env;

#[derive(Debug, thiserror::Error)]
pub enum LaneCacheError {
    #[error("database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("no cached lane for service code {0}")]
    NotFound(String),

    #[error("invalid lane data: {0}")]
    InvalidData(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// One cached lane row. `route_data` holds the serialized coordinate array
/// plus summary; distance/duration are denormalized for listings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CachedLane {
    pub id: i32,
    pub service_code: String,
    pub line: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub distance_m: f64,
    pub duration_s: f64,
    pub route_data: sqlx::types::JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct LaneCache {
    pool: PgPool,
}

impl LaneCache {
    /// Connects using `DATABASE_URL`.
    ///
    /// # Errors
    /// `Config` when the variable is unset, `Connection` when the pool
    /// cannot be established.
    pub async fn from_env() -> Result<Self, LaneCacheError> {
        let database_url = env::var("DATABASE_URL").map_err(|_| {
            LaneCacheError::Config("DATABASE_URL environment variable not set".to_string())
        })?;

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await?;

        tracing::info!("lane cache connection pool created");

        Ok(Self { pool })
    }

    /// Applies the embedded schema migration.
    pub async fn migrate(&self) -> Result<(), LaneCacheError> {
        let mut conn = self.pool.acquire().await?;

        let migration_sql = include_str!("../migrations/20260115_create_lane_cache.sql");

        // raw_sql so the file may contain multiple statements.
        sqlx::raw_sql(migration_sql).execute(&mut *conn).await?;

        tracing::info!("lane cache migrations completed");
        Ok(())
    }

    /// Stores a lane under its service code, replacing any previous entry
    /// for the same code.
    pub async fn save(&self, snapshot: &LaneSnapshot) -> Result<CachedLane, LaneCacheError> {
        let route_json = serde_json::to_value(&snapshot.route_data)
            .map_err(|e| LaneCacheError::InvalidData(e.to_string()))?;

        let cached = sqlx::query_as::<_, CachedLane>(
            r#"
            INSERT INTO lane_cache (
                service_code, line, origin, destination, distance_m, duration_s, route_data
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (service_code) DO UPDATE SET
                line = EXCLUDED.line,
                origin = EXCLUDED.origin,
                destination = EXCLUDED.destination,
                distance_m = EXCLUDED.distance_m,
                duration_s = EXCLUDED.duration_s,
                route_data = EXCLUDED.route_data,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(&snapshot.service_code)
        .bind(&snapshot.line)
        .bind(&snapshot.origin)
        .bind(&snapshot.destination)
        .bind(snapshot.route_data.total_distance)
        .bind(snapshot.route_data.total_time)
        .bind(route_json)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("lane cached: {} (ID: {})", cached.service_code, cached.id);
        Ok(cached)
    }

    /// All cached lanes, newest first.
    pub async fn list(&self) -> Result<Vec<CachedLane>, LaneCacheError> {
        let lanes = sqlx::query_as::<_, CachedLane>(
            "SELECT * FROM lane_cache ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        tracing::info!("retrieved {} cached lanes", lanes.len());
        Ok(lanes)
    }

    pub async fn get(&self, service_code: &str) -> Result<LaneSnapshot, LaneCacheError> {
        let cached = sqlx::query_as::<_, CachedLane>(
            "SELECT * FROM lane_cache WHERE service_code = $1",
        )
        .bind(service_code)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| LaneCacheError::NotFound(service_code.to_string()))?;

        Self::to_snapshot(&cached)
    }

    pub async fn delete(&self, service_code: &str) -> Result<(), LaneCacheError> {
        let result = sqlx::query("DELETE FROM lane_cache WHERE service_code = $1")
            .bind(service_code)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LaneCacheError::NotFound(service_code.to_string()));
        }

        tracing::info!("cached lane deleted: {service_code}");
        Ok(())
    }

    /// Rebuilds the wire-level lane shape from a cached row.
    pub fn to_snapshot(cached: &CachedLane) -> Result<LaneSnapshot, LaneCacheError> {
        let route_data: BusRoute = serde_json::from_value(cached.route_data.clone())
            .map_err(|e| LaneCacheError::InvalidData(format!("failed to deserialize route: {e}")))?;

        Ok(LaneSnapshot {
            service_code: cached.service_code.clone(),
            line: cached.line.clone(),
            origin: cached.origin.clone(),
            destination: cached.destination.clone(),
            route_data,
        })
    }
}
