//! Startup seeding: schema creation, demo catalog, and bulk random orders.
//!
//! A cold store is populated once, before any request traffic: the
//! dialect-specific schema, the demo customers and catalog, and a batch
//! of random orders so the dashboard has something to show. The whole
//! order batch is one transaction; a single failed insert rolls back the
//! entire batch.
//!
//! The random source is caller-supplied so seeding is reproducible in
//! tests with a fixed-seed [`rand::rngs::StdRng`].

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::dialect::Dialect;
use crate::error::DbError;
use crate::pool::StorePool;
use crate::stats::query_stats;

/// Largest random order-line amount, inclusive.
const MAX_ORDER_AMOUNT: i64 = 3;

/// How many random orders [`init_store`] generates on a cold store.
pub const DEFAULT_SEED_ORDERS: usize = 5000;

const SCHEMA_POSTGRES: &str = include_str!("../sql/schema_postgres.sql");
const SCHEMA_SQLITE: &str = include_str!("../sql/schema_sqlite.sql");
const CUSTOMERS_SQL: &str = include_str!("../sql/customers.sql");
const PRODUCTS_SQL: &str = include_str!("../sql/products.sql");

const INSERT_ORDER: &str = "INSERT INTO orders (customer_id) VALUES (?)";
const INSERT_ORDER_LINE: &str =
    "INSERT INTO order_lines (order_id, product_id, amount) VALUES (?, ?, ?)";

/// Seed the store if, and only if, it holds no orders yet.
///
/// The guard makes startup idempotent: a store that already contains at
/// least one order is left exactly as it is. A store whose orders table
/// does not exist yet counts as cold.
///
/// # Errors
///
/// Returns [`DbError`] if schema creation or order generation fails.
pub async fn init_store<R: Rng>(
    pool: &StorePool,
    order_count: usize,
    rng: &mut R,
) -> Result<(), DbError> {
    // A failed count means the schema is missing, which also means cold.
    if let Ok(stats) = query_stats(pool).await
        && stats.orders > 0
    {
        tracing::debug!(orders = stats.orders, "store already seeded, skipping");
        return Ok(());
    }

    apply_schema(pool).await?;

    tracing::info!(order_count, "generating random orders");
    generate_orders(pool, order_count, rng).await
}

/// Create the schema for the pool's dialect and load the demo catalog
/// (customers, product types, products). Destructive: existing tables
/// are dropped first.
///
/// # Errors
///
/// Returns [`DbError::Store`] if any statement fails.
pub async fn apply_schema(pool: &StorePool) -> Result<(), DbError> {
    let schema = match pool.dialect() {
        Dialect::Postgres => SCHEMA_POSTGRES,
        Dialect::Sqlite => SCHEMA_SQLITE,
    };
    exec_commands(pool, schema, "executing schema").await?;
    exec_commands(pool, CUSTOMERS_SQL, "loading customers").await?;
    exec_commands(pool, PRODUCTS_SQL, "loading products").await?;
    tracing::info!(dialect = ?pool.dialect(), "applied schema and demo catalog");
    Ok(())
}

/// Generate `count` random orders, one line each, in a single transaction.
///
/// Products and customers are drawn uniformly from the existing rows;
/// the line amount is uniform in `[0, 3]`. The generated order id is
/// obtained through the same dialect strategy as the order writer.
///
/// # Errors
///
/// Returns [`DbError::Config`] if the catalog or customer table is
/// empty, and [`DbError::Store`] if any insert or the commit fails. Any
/// failure rolls back the whole batch.
pub async fn generate_orders<R: Rng>(
    pool: &StorePool,
    count: usize,
    rng: &mut R,
) -> Result<(), DbError> {
    let product_ids = fetch_ids(pool, "SELECT id FROM products", "listing product ids").await?;
    let customer_ids = fetch_ids(pool, "SELECT id FROM customers", "listing customer ids").await?;

    let dialect = pool.dialect();
    let mut tx = pool
        .pool()
        .begin()
        .await
        .map_err(|e| DbError::store("beginning seed transaction", e))?;

    let line_sql = dialect.rebind(INSERT_ORDER_LINE);
    for _ in 0..count {
        let product_id = pick(&product_ids, rng, "products")?;
        let customer_id = pick(&customer_ids, rng, "customers")?;

        let order_id = dialect
            .insert_returning_id(&mut tx, INSERT_ORDER, &[customer_id], "inserting seed order")
            .await?;

        let amount = rng.random_range(0..=MAX_ORDER_AMOUNT);
        sqlx::query(&line_sql)
            .bind(order_id)
            .bind(product_id)
            .bind(amount)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::store("inserting seed order line", e))?;
    }

    tx.commit()
        .await
        .map_err(|e| DbError::store("committing seed transaction", e))?;

    tracing::info!(count, "generated random orders");
    Ok(())
}

/// Execute a `;`-separated SQL script statement by statement.
///
/// The split is textual, so seed scripts must not contain semicolons
/// inside string literals. Blank fragments are skipped.
async fn exec_commands(
    pool: &StorePool,
    script: &str,
    operation: &'static str,
) -> Result<(), DbError> {
    for statement in script.split(';') {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        sqlx::query(statement)
            .execute(pool.pool())
            .await
            .map_err(|e| DbError::store(operation, e))?;
    }
    Ok(())
}

fn pick<R: Rng>(ids: &[i64], rng: &mut R, table: &str) -> Result<i64, DbError> {
    ids.choose(rng)
        .copied()
        .ok_or_else(|| DbError::Config(format!("cannot generate orders: {table} table is empty")))
}

async fn fetch_ids(
    pool: &StorePool,
    sql: &str,
    operation: &'static str,
) -> Result<Vec<i64>, DbError> {
    sqlx::query_scalar(sql)
        .fetch_all(pool.pool())
        .await
        .map_err(|e| DbError::store(operation, e))
}
