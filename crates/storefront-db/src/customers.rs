//! Customer read paths.
//!
//! Customers are seed data and read-only through this layer. The relation
//! filter ("customers who bought a given product") walks the
//! orders/order_lines join; the base select is `DISTINCT` so a customer
//! who ordered the same product several times appears once.

use sqlx::Row;
use sqlx::any::AnyRow;
use storefront_types::Customer;

use crate::error::DbError;
use crate::pool::StorePool;
use crate::query::{Filter, SelectQuery};

const CUSTOMERS_BASE: &str = "SELECT DISTINCT \
    customers.id, full_name, company_name, email, \
    address, postal_code, city, country \
    FROM customers";

const PRODUCT_JOIN: &str = "JOIN orders ON customers.id=orders.customer_id \
    JOIN order_lines ON orders.id=order_lines.order_id \
    WHERE order_lines.product_id=?";

/// List all customers.
///
/// # Errors
///
/// Returns [`DbError::Store`] on any driver failure.
pub async fn list_customers(pool: &StorePool) -> Result<Vec<Customer>, DbError> {
    let rows = SelectQuery::new(CUSTOMERS_BASE, "customers.id")
        .fetch_rows(pool, "querying customers")
        .await?;
    rows.iter().map(customer_from_row).collect()
}

/// Fetch a single customer by id. Zero rows is `Ok(None)`, not an error.
///
/// # Errors
///
/// Returns [`DbError::Store`] on any driver failure.
pub async fn get_customer(pool: &StorePool, id: i64) -> Result<Option<Customer>, DbError> {
    let rows = SelectQuery::new(CUSTOMERS_BASE, "customers.id")
        .filter(Filter::ById(id))
        .fetch_rows(pool, "querying customer")
        .await?;
    rows.first().map(customer_from_row).transpose()
}

/// List the customers who have at least one order line referencing
/// `product_id`, capped at `limit` rows. Each customer appears once no
/// matter how many times they ordered the product.
///
/// # Errors
///
/// Returns [`DbError::Store`] on any driver failure.
pub async fn customers_for_product(
    pool: &StorePool,
    product_id: i64,
    limit: i64,
) -> Result<Vec<Customer>, DbError> {
    let rows = SelectQuery::new(CUSTOMERS_BASE, "customers.id")
        .filter(Filter::Related {
            join: PRODUCT_JOIN,
            value: product_id,
        })
        .limit(limit)
        .fetch_rows(pool, "querying product customers")
        .await?;
    rows.iter().map(customer_from_row).collect()
}

/// Map one row of the customers select, positionally.
fn customer_from_row(row: &AnyRow) -> Result<Customer, DbError> {
    let map = |e| DbError::store("decoding customer row", e);
    Ok(Customer {
        id: row.try_get(0).map_err(map)?,
        full_name: row.try_get(1).map_err(map)?,
        company_name: row.try_get(2).map_err(map)?,
        email: row.try_get(3).map_err(map)?,
        address: row.try_get(4).map_err(map)?,
        postal_code: row.try_get(5).map_err(map)?,
        city: row.try_get(6).map_err(map)?,
        country: row.try_get(7).map_err(map)?,
    })
}
