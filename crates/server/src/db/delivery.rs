//! Delivery route and stop repository.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgExecutor, PgPool};

use schoolmall_core::{DeliveryRouteId, DeliveryStopId, Money};

use super::RepositoryError;
use crate::models::{DeliveryRoute, DeliveryStop};

#[derive(Debug, sqlx::FromRow)]
struct RouteRow {
    id: DeliveryRouteId,
    name: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct StopRow {
    id: DeliveryStopId,
    route_id: DeliveryRouteId,
    name: String,
    price: Decimal,
}

impl From<StopRow> for DeliveryStop {
    fn from(row: StopRow) -> Self {
        Self {
            id: row.id,
            route_id: row.route_id,
            name: row.name,
            price: Money::new(row.price),
        }
    }
}

/// A stop in a create/replace request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StopInput {
    pub name: String,
    pub price: Decimal,
}

/// Repository for delivery routes and stops.
pub struct DeliveryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DeliveryRepository<'a> {
    /// Create a new delivery repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All routes with their stops, ordered by route name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_routes(&self) -> Result<Vec<DeliveryRoute>, RepositoryError> {
        let routes = sqlx::query_as::<_, RouteRow>(
            "SELECT id, name, created_at FROM shop.delivery_route ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        let stops = sqlx::query_as::<_, StopRow>(
            "SELECT id, route_id, name, price FROM shop.delivery_stop ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        let mut by_route: HashMap<DeliveryRouteId, Vec<DeliveryStop>> = HashMap::new();
        for stop in stops {
            by_route.entry(stop.route_id).or_default().push(stop.into());
        }

        Ok(routes
            .into_iter()
            .map(|route| DeliveryRoute {
                stops: by_route.remove(&route.id).unwrap_or_default(),
                id: route.id,
                name: route.name,
                created_at: route.created_at,
            })
            .collect())
    }

    /// One route with its stops.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_route(
        &self,
        id: DeliveryRouteId,
    ) -> Result<Option<DeliveryRoute>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        load_route(&mut conn, id).await
    }

    /// Stops whose name contains `name` (case-insensitive), cheapest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search_stops(&self, name: &str) -> Result<Vec<DeliveryStop>, RepositoryError> {
        let rows = sqlx::query_as::<_, StopRow>(
            "SELECT id, route_id, name, price FROM shop.delivery_stop
             WHERE name ILIKE $1
             ORDER BY price, name",
        )
        .bind(super::like_pattern(name))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a route with its stops.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` for a duplicate route name or a
    /// duplicate stop name within the route.
    pub async fn create_route(
        &self,
        name: &str,
        stops: &[StopInput],
    ) -> Result<DeliveryRoute, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: DeliveryRouteId =
            sqlx::query_scalar("INSERT INTO shop.delivery_route (name) VALUES ($1) RETURNING id")
                .bind(name)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| RepositoryError::unique(e, "Route name already exists"))?;

        insert_stops(&mut *tx, id, stops).await?;
        let route = load_route(&mut *tx, id).await?.ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;
        Ok(route)
    }

    /// Rename a route and/or replace its whole stop list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown route and
    /// `RepositoryError::Conflict` for duplicate names.
    pub async fn update_route(
        &self,
        id: DeliveryRouteId,
        name: Option<&str>,
        stops: Option<&[StopInput]>,
    ) -> Result<DeliveryRoute, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE shop.delivery_route SET name = COALESCE($2, name) WHERE id = $1",
        )
        .bind(id)
        .bind(name)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique(e, "Route name already exists"))?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        if let Some(stops) = stops {
            sqlx::query("DELETE FROM shop.delivery_stop WHERE route_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_stops(&mut *tx, id, stops).await?;
        }

        let route = load_route(&mut *tx, id).await?.ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;
        Ok(route)
    }

    /// Delete a route and its stops.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if nothing was deleted.
    pub async fn delete_route(&self, id: DeliveryRouteId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.delivery_route WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Look up a single stop, inside or outside a transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_stop<'e>(
    executor: impl PgExecutor<'e>,
    id: DeliveryStopId,
) -> Result<Option<DeliveryStop>, RepositoryError> {
    let row = sqlx::query_as::<_, StopRow>(
        "SELECT id, route_id, name, price FROM shop.delivery_stop WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(Into::into))
}

async fn load_route(
    conn: &mut sqlx::PgConnection,
    id: DeliveryRouteId,
) -> Result<Option<DeliveryRoute>, RepositoryError> {
    let Some(route) = sqlx::query_as::<_, RouteRow>(
        "SELECT id, name, created_at FROM shop.delivery_route WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    else {
        return Ok(None);
    };

    let stops = sqlx::query_as::<_, StopRow>(
        "SELECT id, route_id, name, price FROM shop.delivery_stop WHERE route_id = $1 ORDER BY id",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(DeliveryRoute {
        id: route.id,
        name: route.name,
        created_at: route.created_at,
        stops: stops.into_iter().map(Into::into).collect(),
    }))
}

async fn insert_stops(
    conn: &mut sqlx::PgConnection,
    route_id: DeliveryRouteId,
    stops: &[StopInput],
) -> Result<(), RepositoryError> {
    for stop in stops {
        sqlx::query("INSERT INTO shop.delivery_stop (route_id, name, price) VALUES ($1, $2, $3)")
            .bind(route_id)
            .bind(stop.name.trim())
            .bind(stop.price)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                RepositoryError::unique(e, &format!("Duplicate stop '{}' in route", stop.name))
            })?;
    }
    Ok(())
}
