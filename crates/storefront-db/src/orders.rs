//! Order read paths and the transactional order writer.
//!
//! Orders are the only entity this layer writes after seeding. An order
//! is a header row plus zero or more lines; the two are only ever
//! persisted together, inside one transaction, so readers never observe a
//! partial order. The header insert strictly precedes the line inserts
//! because the lines need the generated header id.
//!
//! Timestamps are selected through `CAST(... AS TEXT)` so the same query
//! works under both dialects; [`parse_store_timestamp`] accepts both the
//! `PostgreSQL` text form (with offset) and the `SQLite` form (naive UTC).

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::Row;
use storefront_types::{NewOrderLine, Order, OrderLine};

use crate::error::DbError;
use crate::pool::StorePool;
use crate::products::product_from_row;
use crate::query::{Filter, SelectQuery};

/// Fixed cap on the orders list view.
const ORDERS_LIST_LIMIT: i64 = 1000;

const ORDERS_LIST_BASE: &str = "SELECT \
    orders.id, CAST(orders.created_at AS TEXT), \
    customers.id, customers.full_name \
    FROM orders JOIN customers ON orders.customer_id=customers.id";

const ORDER_DETAIL_BASE: &str =
    "SELECT orders.id, CAST(orders.created_at AS TEXT), customer_id FROM orders";

const ORDER_LINES_BASE: &str = "SELECT \
    products.id, products.sku, products.name, products.description, \
    products.stock, products.cost, products.selling_price, \
    products.type_id, CAST(NULL AS TEXT), order_lines.amount \
    FROM products JOIN order_lines ON products.id=order_lines.product_id";

const ORDER_LINES_JOIN: &str = "WHERE order_lines.order_id=?";

const INSERT_ORDER: &str = "INSERT INTO orders (customer_id) VALUES (?)";

const INSERT_ORDER_LINE: &str =
    "INSERT INTO order_lines (order_id, product_id, amount) VALUES (?, ?, ?)";

/// List orders joined with the customer name, capped at 1000 rows.
/// Lines are not loaded on the list view.
///
/// # Errors
///
/// Returns [`DbError::Store`] on any driver failure.
pub async fn list_orders(pool: &StorePool) -> Result<Vec<Order>, DbError> {
    let rows = SelectQuery::new(ORDERS_LIST_BASE, "orders.id")
        .limit(ORDERS_LIST_LIMIT)
        .fetch_rows(pool, "querying orders")
        .await?;

    rows.iter()
        .map(|row| {
            let map = |e| DbError::store("decoding order row", e);
            let raw: String = row.try_get(1).map_err(map)?;
            Ok(Order {
                id: row.try_get(0).map_err(map)?,
                created_at: parse_store_timestamp(&raw)?,
                customer_id: row.try_get(2).map_err(map)?,
                customer_name: row.try_get(3).map_err(map)?,
                lines: Vec::new(),
            })
        })
        .collect()
}

/// Fetch one order with its lines. Zero rows is `Ok(None)`, not an error.
///
/// Each line carries the product snapshot as of read time, not order
/// time; a later price change shows up retroactively. Accepted property
/// of the demo, not a bug.
///
/// # Errors
///
/// Returns [`DbError::Store`] on any driver failure.
pub async fn get_order(pool: &StorePool, id: i64) -> Result<Option<Order>, DbError> {
    let rows = SelectQuery::new(ORDER_DETAIL_BASE, "orders.id")
        .filter(Filter::ById(id))
        .fetch_rows(pool, "querying order")
        .await?;
    let Some(row) = rows.first() else {
        return Ok(None);
    };

    let map = |e| DbError::store("decoding order row", e);
    let raw: String = row.try_get(1).map_err(map)?;
    let mut order = Order {
        id: row.try_get(0).map_err(map)?,
        created_at: parse_store_timestamp(&raw)?,
        customer_id: row.try_get(2).map_err(map)?,
        customer_name: None,
        lines: Vec::new(),
    };

    let line_rows = SelectQuery::new(ORDER_LINES_BASE, "orders.id")
        .filter(Filter::Related {
            join: ORDER_LINES_JOIN,
            value: id,
        })
        .fetch_rows(pool, "querying product order lines")
        .await?;

    order.lines = line_rows
        .iter()
        .map(|line_row| {
            let amount = line_row
                .try_get(9)
                .map_err(|e| DbError::store("decoding order line row", e))?;
            Ok(OrderLine {
                product: product_from_row(line_row)?,
                amount,
            })
        })
        .collect::<Result<Vec<_>, DbError>>()?;

    Ok(Some(order))
}

/// Atomically create one order for `customer_id` with the given lines.
///
/// The header insert, every line insert, and the commit form a single
/// transaction; any failure rolls the whole order back (sqlx rolls back
/// on drop of an uncommitted transaction), so no partial order is ever
/// visible to readers. An order with zero lines is valid.
///
/// Returns the store-generated order id.
///
/// # Errors
///
/// Returns [`DbError::Store`] if any insert or the commit fails,
/// including a constraint violation from a line referencing a product
/// that does not exist.
pub async fn create_order(
    pool: &StorePool,
    customer_id: i64,
    lines: &[NewOrderLine],
) -> Result<i64, DbError> {
    let dialect = pool.dialect();
    let mut tx = pool
        .pool()
        .begin()
        .await
        .map_err(|e| DbError::store("beginning order transaction", e))?;

    let order_id = dialect
        .insert_returning_id(&mut tx, INSERT_ORDER, &[customer_id], "inserting order")
        .await?;

    let line_sql = dialect.rebind(INSERT_ORDER_LINE);
    for line in lines {
        sqlx::query(&line_sql)
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.amount)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::store("inserting order line", e))?;
    }

    tx.commit()
        .await
        .map_err(|e| DbError::store("committing order", e))?;

    tracing::debug!(order_id, customer_id, lines = lines.len(), "created order");
    Ok(order_id)
}

/// Parse a timestamp selected via `CAST(... AS TEXT)`.
///
/// `PostgreSQL` renders `2026-08-29 10:15:00.123+00`; `SQLite`'s
/// `CURRENT_TIMESTAMP` renders `2026-08-29 10:15:00`, which is UTC by
/// definition.
fn parse_store_timestamp(raw: &str) -> Result<DateTime<Utc>, DbError> {
    if let Ok(with_offset) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Ok(with_offset.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| DbError::InvalidTimestamp(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_postgres_timestamp_text() {
        let parsed = parse_store_timestamp("2026-08-29 10:15:00.123456+00").ok();
        let rendered = parsed.map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string());
        assert_eq!(rendered.as_deref(), Some("2026-08-29 10:15:00"));
    }

    #[test]
    fn parses_sqlite_timestamp_text() {
        let parsed = parse_store_timestamp("2026-08-29 10:15:00");
        assert!(parsed.is_ok());
    }

    #[test]
    fn rejects_garbage_timestamp() {
        let parsed = parse_store_timestamp("yesterday-ish");
        assert!(matches!(parsed, Err(DbError::InvalidTimestamp(_))));
    }
}
