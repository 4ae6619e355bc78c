//! Shared type definitions for the storefront demo backend.
//!
//! This crate is the single source of truth for the entities served over
//! the shop API: customers, products, product types, orders, and the
//! aggregate shop statistics. All types are plain data with [`serde`]
//! derives; database row mapping lives in `storefront-db`.
//!
//! Money fields (`cost`, `selling_price`, revenue/cost/profit) are integer
//! amounts in the store's smallest currency unit, matching the seed data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Customer
// ---------------------------------------------------------------------------

/// A shop customer.
///
/// Customers are created by the seed data and are read-only thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Store-assigned identifier.
    pub id: i64,
    /// Customer's full name.
    pub full_name: String,
    /// Company the customer belongs to.
    pub company_name: String,
    /// Contact email address.
    pub email: String,
    /// Street address.
    pub address: String,
    /// Postal code.
    pub postal_code: String,
    /// City.
    pub city: String,
    /// Country.
    pub country: String,
}

// ---------------------------------------------------------------------------
// Product
// ---------------------------------------------------------------------------

/// A product in the catalog, joined with its type name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Store-assigned identifier.
    pub id: i64,
    /// Stock-keeping unit code.
    pub sku: String,
    /// Display name.
    pub name: String,
    /// Long-form description.
    pub description: String,
    /// Units currently in stock.
    pub stock: i64,
    /// Unit cost to the shop.
    pub cost: i64,
    /// Unit selling price.
    pub selling_price: i64,
    /// Foreign reference to the product type.
    pub type_id: i64,
    /// Product type name, present when the read path joins `product_types`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

/// A best-selling product with its derived `sold` total.
///
/// Only produced by the "top products" view; `sold` is the sum of
/// order-line amounts referencing the product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopProduct {
    /// Store-assigned identifier.
    pub id: i64,
    /// Stock-keeping unit code.
    pub sku: String,
    /// Display name.
    pub name: String,
    /// Units currently in stock.
    pub stock: i64,
    /// Total units sold across all order lines.
    pub sold: i64,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductType {
    /// Store-assigned identifier.
    pub id: i64,
    /// Category name.
    pub name: String,
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// An order header with its lines.
///
/// The list view carries the denormalized customer name (join-time only,
/// never stored) and no lines; the detail view carries the lines with the
/// product snapshot as of read time. A later price change is therefore
/// reflected retroactively in old orders, which is an accepted property of
/// this demo backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Store-generated identifier.
    pub id: i64,
    /// Store-assigned creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Foreign reference to the customer.
    pub customer_id: i64,
    /// Customer name, present on the list view only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    /// Order lines, present on the detail view only.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub lines: Vec<OrderLine>,
}

/// One line of an order: a product snapshot plus the ordered amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// The referenced product, read back at query time.
    #[serde(flatten)]
    pub product: Product,
    /// Quantity ordered.
    pub amount: i64,
}

/// Input for creating one order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    /// Product to order. Must exist in the catalog at insert time.
    pub product_id: i64,
    /// Quantity to order.
    pub amount: i64,
}

impl NewOrderLine {
    /// Create a new order line input.
    pub const fn new(product_id: i64, amount: i64) -> Self {
        Self { product_id, amount }
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Aggregate shop statistics, recomputed on demand and cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Number of products in the catalog.
    pub products: i64,
    /// Number of customers.
    pub customers: i64,
    /// Number of orders.
    pub orders: i64,
    /// Revenue/cost/profit totals.
    pub numbers: StatsNumbers,
}

/// Revenue, cost, and profit summed across all order lines joined to
/// products. A shop with no order lines reports zeros, never nulls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsNumbers {
    /// Total selling price across all order lines.
    pub revenue: i64,
    /// Total cost across all order lines.
    pub cost: i64,
    /// Revenue minus cost.
    pub profit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product() -> Product {
        Product {
            id: 7,
            sku: "ST-0007".to_string(),
            name: "Single-origin dark roast".to_string(),
            description: "A test product.".to_string(),
            stock: 12,
            cost: 211,
            selling_price: 399,
            type_id: 1,
            type_name: None,
        }
    }

    #[test]
    fn product_type_name_is_omitted_when_absent() {
        let json = serde_json::to_value(sample_product()).unwrap_or_default();
        assert!(json.get("type_name").is_none());
        assert_eq!(json.get("sku").and_then(|v| v.as_str()), Some("ST-0007"));
    }

    #[test]
    fn order_line_flattens_product_fields() {
        let line = OrderLine {
            product: sample_product(),
            amount: 2,
        };
        let json = serde_json::to_value(&line).unwrap_or_default();
        // The product fields sit at the top level next to `amount`,
        // matching the shape the API layer serves.
        assert_eq!(json.get("amount").and_then(serde_json::Value::as_i64), Some(2));
        assert_eq!(json.get("id").and_then(serde_json::Value::as_i64), Some(7));
    }

    #[test]
    fn stats_numbers_default_to_zero() {
        let numbers = StatsNumbers::default();
        assert_eq!(numbers.revenue, 0);
        assert_eq!(numbers.cost, 0);
        assert_eq!(numbers.profit, 0);
    }

    #[test]
    fn stats_round_trips_through_json() {
        let stats = Stats {
            products: 6,
            customers: 10,
            orders: 100,
            numbers: StatsNumbers {
                revenue: 1000,
                cost: 600,
                profit: 400,
            },
        };
        let encoded = serde_json::to_string(&stats).unwrap_or_default();
        let decoded: Result<Stats, _> = serde_json::from_str(&encoded);
        assert_eq!(decoded.ok(), Some(stats));
    }
}
