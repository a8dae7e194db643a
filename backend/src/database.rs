use std::time::Duration;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{NewTrip, Trip, User};

pub async fn connect(database_url: &str) -> Result<PgPool> {
    // Small pool; the host suspends idle machines.
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .max_lifetime(Duration::from_secs(30 * 60))
        .idle_timeout(Some(Duration::from_secs(5 * 60)))
        .test_before_acquire(true)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            email VARCHAR(255) UNIQUE NOT NULL,
            name VARCHAR(255),
            image TEXT,
            email_verified TIMESTAMP WITH TIME ZONE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        )
    "#,
    )
    .execute(pool)
    .await?;

    // Generated payloads are stored exactly as the client sent them.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS trips (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            start_location TEXT NOT NULL,
            destination TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT,
            travelers TEXT NOT NULL,
            budget TEXT NOT NULL,
            transport TEXT NOT NULL,
            itinerary JSONB NOT NULL,
            weather JSONB,
            hotels JSONB,
            railways JSONB,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_trips_user_created ON trips(user_id, created_at DESC)")
        .execute(pool)
        .await?;

    tracing::info!("✅ Database migrations applied");
    Ok(())
}

/// Persistence seam for users and their saved trips.
#[async_trait]
pub trait TripStore: Send + Sync {
    async fn find_user_id(&self, email: &str) -> Result<Option<Uuid>>;

    /// Inserts the user, or refreshes name and image when the email exists.
    async fn upsert_user(&self, email: &str, name: Option<&str>, image: Option<&str>) -> Result<User>;

    /// Newest first.
    async fn list_trips(&self, user_id: Uuid) -> Result<Vec<Trip>>;

    async fn insert_trip(&self, trip: NewTrip) -> Result<Trip>;

    /// Deletes only when `user_id` owns the trip. Returns whether a row went away.
    async fn delete_trip(&self, id: Uuid, user_id: Uuid) -> Result<bool>;
}

#[derive(Debug, Clone)]
pub struct PgTripStore {
    pool: PgPool,
}

impl PgTripStore {
    pub fn new(pool: PgPool) -> Self {
        PgTripStore { pool }
    }
}

#[async_trait]
impl TripStore for PgTripStore {
    async fn find_user_id(&self, email: &str) -> Result<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn upsert_user(&self, email: &str, name: Option<&str>, image: Option<&str>) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, image)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE
                SET name = COALESCE(EXCLUDED.name, users.name),
                    image = COALESCE(EXCLUDED.image, users.image)
            RETURNING id, email, name, image, email_verified, created_at
        "#,
        )
        .bind(email)
        .bind(name)
        .bind(image)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_trips(&self, user_id: Uuid) -> Result<Vec<Trip>> {
        let trips = sqlx::query_as::<_, Trip>(
            "SELECT * FROM trips WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(trips)
    }

    async fn insert_trip(&self, trip: NewTrip) -> Result<Trip> {
        let saved = sqlx::query_as::<_, Trip>(
            r#"
            INSERT INTO trips (
                user_id, start_location, destination, start_date, end_date,
                travelers, budget, transport, itinerary, weather, hotels, railways
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
        "#,
        )
        .bind(trip.user_id)
        .bind(&trip.start_location)
        .bind(&trip.destination)
        .bind(&trip.start_date)
        .bind(&trip.end_date)
        .bind(&trip.travelers)
        .bind(&trip.budget)
        .bind(&trip.transport)
        .bind(&trip.itinerary)
        .bind(&trip.weather)
        .bind(&trip.hotels)
        .bind(&trip.railways)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn delete_trip(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM trips WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
