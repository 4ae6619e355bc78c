//! Product and product type read paths.

use sqlx::Row;
use sqlx::any::AnyRow;
use storefront_types::{Product, ProductType, TopProduct};

use crate::error::DbError;
use crate::pool::StorePool;
use crate::query::{Filter, SelectQuery};

const PRODUCTS_BASE: &str = "SELECT \
    products.id, products.sku, products.name, products.description, \
    products.stock, products.cost, products.selling_price, \
    products.type_id, product_types.name \
    FROM products JOIN product_types ON type_id=product_types.id";

const PRODUCT_TYPES_BASE: &str = "SELECT id, name FROM product_types";

/// How many best sellers the top-products view returns.
const TOP_PRODUCTS_LIMIT: i64 = 3;

/// List the full catalog, each product joined with its type name.
///
/// # Errors
///
/// Returns [`DbError::Store`] on any driver failure.
pub async fn list_products(pool: &StorePool) -> Result<Vec<Product>, DbError> {
    let rows = SelectQuery::new(PRODUCTS_BASE, "products.id")
        .fetch_rows(pool, "querying products")
        .await?;
    rows.iter().map(product_from_row).collect()
}

/// Fetch a single product by id. Zero rows is `Ok(None)`, not an error.
///
/// # Errors
///
/// Returns [`DbError::Store`] on any driver failure.
pub async fn get_product(pool: &StorePool, id: i64) -> Result<Option<Product>, DbError> {
    let rows = SelectQuery::new(PRODUCTS_BASE, "products.id")
        .filter(Filter::ById(id))
        .fetch_rows(pool, "querying product")
        .await?;
    rows.first().map(product_from_row).transpose()
}

/// The three best-selling products by total order-line amount.
///
/// The `CAST` keeps the summed column a plain integer under both
/// dialects (`PostgreSQL` widens `SUM(BIGINT)` to `NUMERIC` otherwise).
///
/// # Errors
///
/// Returns [`DbError::Store`] on any driver failure.
pub async fn top_products(pool: &StorePool) -> Result<Vec<TopProduct>, DbError> {
    let rows = SelectQuery::new(
        "SELECT id, sku, name, stock, CAST(SUM(order_lines.amount) AS BIGINT) AS sold \
         FROM products JOIN order_lines ON id=product_id \
         GROUP BY products.id, sku, name, stock ORDER BY sold DESC",
        "products.id",
    )
    .limit(TOP_PRODUCTS_LIMIT)
    .fetch_rows(pool, "querying top products")
    .await?;

    rows.iter()
        .map(|row| {
            let map = |e| DbError::store("decoding top product row", e);
            Ok(TopProduct {
                id: row.try_get(0).map_err(map)?,
                sku: row.try_get(1).map_err(map)?,
                name: row.try_get(2).map_err(map)?,
                stock: row.try_get(3).map_err(map)?,
                sold: row.try_get(4).map_err(map)?,
            })
        })
        .collect()
}

/// List all product types.
///
/// # Errors
///
/// Returns [`DbError::Store`] on any driver failure.
pub async fn list_product_types(pool: &StorePool) -> Result<Vec<ProductType>, DbError> {
    let rows = SelectQuery::new(PRODUCT_TYPES_BASE, "id")
        .fetch_rows(pool, "querying product types")
        .await?;
    rows.iter().map(product_type_from_row).collect()
}

/// Fetch a single product type by id. Zero rows is `Ok(None)`.
///
/// # Errors
///
/// Returns [`DbError::Store`] on any driver failure.
pub async fn get_product_type(pool: &StorePool, id: i64) -> Result<Option<ProductType>, DbError> {
    let rows = SelectQuery::new(PRODUCT_TYPES_BASE, "id")
        .filter(Filter::ById(id))
        .fetch_rows(pool, "querying product type")
        .await?;
    rows.first().map(product_type_from_row).transpose()
}

/// Map one row of the products select, positionally.
pub(crate) fn product_from_row(row: &AnyRow) -> Result<Product, DbError> {
    let map = |e| DbError::store("decoding product row", e);
    Ok(Product {
        id: row.try_get(0).map_err(map)?,
        sku: row.try_get(1).map_err(map)?,
        name: row.try_get(2).map_err(map)?,
        description: row.try_get(3).map_err(map)?,
        stock: row.try_get(4).map_err(map)?,
        cost: row.try_get(5).map_err(map)?,
        selling_price: row.try_get(6).map_err(map)?,
        type_id: row.try_get(7).map_err(map)?,
        type_name: row.try_get(8).map_err(map)?,
    })
}

fn product_type_from_row(row: &AnyRow) -> Result<ProductType, DbError> {
    let map = |e| DbError::store("decoding product type row", e);
    Ok(ProductType {
        id: row.try_get(0).map_err(map)?,
        name: row.try_get(1).map_err(map)?,
    })
}
