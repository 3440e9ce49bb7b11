//! Postgres store for customers, orders, products, and inbound message logs.
//!
//! The store is an optional collaborator: connection failure at startup is a
//! warning and every feature that needs it degrades instead of failing the
//! service.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use thiserror::Error;

const MAX_CONNECTIONS: u32 = 25;
const CONN_MAX_LIFETIME: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Customer {
    pub id: i32,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub customer_type: String,
    pub line_user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub unit: String,
    pub base_price: f64,
    pub description: String,
    pub active: bool,
}

/// Fields for a customer insert; id and timestamps are generated.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub customer_type: String,
    pub line_user_id: String,
}

/// Fields for an order insert; id and timestamps are generated.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NewOrder {
    pub customer_id: i32,
    pub product_type: String,
    pub quantity: i32,
    pub total_price: f64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub notes: String,
}

/// Connection-pooled Postgres store.
#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    /// Connect and ping. Pool limits mirror the expected webhook load: small
    /// batches, one short transaction per event.
    pub async fn connect(dsn: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .max_lifetime(CONN_MAX_LIFETIME)
            .connect(dsn)
            .await?;
        let store = Self { pool };
        store.health().await?;
        Ok(store)
    }

    /// Look up a customer by LINE user id; None when absent.
    pub async fn customer_by_line_user_id(
        &self,
        line_user_id: &str,
    ) -> Result<Option<Customer>, StoreError> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, name, phone, address, customer_type, line_user_id, created_at, updated_at
             FROM customers
             WHERE line_user_id = $1 AND active = true
             LIMIT 1",
        )
        .bind(line_user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(customer)
    }

    /// Insert a customer; returns the generated id.
    pub async fn create_customer(&self, customer: &NewCustomer) -> Result<i32, StoreError> {
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO customers (name, phone, address, customer_type, line_user_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
             RETURNING id",
        )
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(&customer.customer_type)
        .bind(&customer.line_user_id)
        .fetch_one(&self.pool)
        .await?;
        log::info!("created customer {} (line user {})", id, customer.line_user_id);
        Ok(id)
    }

    /// Insert an order; returns the generated id.
    pub async fn create_order(&self, order: &NewOrder) -> Result<i32, StoreError> {
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO orders (customer_id, product_type, quantity, total_price, status, notes, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
             RETURNING id",
        )
        .bind(order.customer_id)
        .bind(&order.product_type)
        .bind(order.quantity)
        .bind(order.total_price)
        .bind(&order.status)
        .bind(&order.notes)
        .fetch_one(&self.pool)
        .await?;
        log::info!("created order {} for customer {}", id, order.customer_id);
        Ok(id)
    }

    /// Active products, ordered by id.
    pub async fn products(&self) -> Result<Vec<Product>, StoreError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name, unit, base_price, description, active
             FROM products
             WHERE active = true
             ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    /// Record one inbound message (user id, message kind, content).
    pub async fn log_message(
        &self,
        user_id: &str,
        message_type: &str,
        content: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO line_messages (user_id, message_type, content, created_at)
             VALUES ($1, $2, $3, NOW())",
        )
        .bind(user_id)
        .bind(message_type)
        .bind(content)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Trivial query to confirm the pool is usable.
    pub async fn health(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
