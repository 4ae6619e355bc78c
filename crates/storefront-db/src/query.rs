//! Dialect-aware dynamic query composition for the entity read paths.
//!
//! Every list/detail read in this crate is some variant of the same shape:
//! a base `SELECT`, at most one filter, and an optional row cap. The
//! filter is a closed enum rather than ad-hoc string concatenation, so an
//! id filter and a relation filter can never be combined in one query.
//! The two were never meaningful together, and composing both used to be
//! a latent bug in this family of demo backends.
//!
//! Clause order is fixed: id filter, then relation join filter, then
//! limit. Templates use the `?` placeholder convention and are rebound to
//! the pool's dialect at build time.

use sqlx::any::AnyRow;

use crate::dialect::Dialect;
use crate::error::DbError;
use crate::pool::StorePool;

/// Row filter applied to a list query. At most one filter per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// No filter; list everything.
    All,
    /// A single row by primary key.
    ById(i64),
    /// Rows related to another entity, expressed as a join clause ending
    /// in a `WHERE` with exactly one `?` placeholder.
    Related {
        /// Join-plus-predicate clause, e.g.
        /// `"JOIN orders ON ... WHERE order_lines.product_id=?"`.
        join: &'static str,
        /// The value bound to the clause's placeholder.
        value: i64,
    },
}

/// A composable parameterized `SELECT`.
#[derive(Debug, Clone, Copy)]
pub struct SelectQuery {
    base: &'static str,
    id_column: &'static str,
    filter: Filter,
    limit: Option<i64>,
}

impl SelectQuery {
    /// Start from a base `SELECT ... FROM ...` statement.
    ///
    /// `id_column` is the qualified primary-key column used by
    /// [`Filter::ById`] (e.g. `"products.id"` when the base joins another
    /// table with its own `id`).
    pub const fn new(base: &'static str, id_column: &'static str) -> Self {
        Self {
            base,
            id_column,
            filter: Filter::All,
            limit: None,
        }
    }

    /// Apply a filter.
    #[must_use]
    pub const fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Cap the number of returned rows.
    #[must_use]
    pub const fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Cap the number of returned rows if a cap was supplied.
    #[must_use]
    pub const fn maybe_limit(mut self, limit: Option<i64>) -> Self {
        self.limit = limit;
        self
    }

    /// Compose the final statement and its argument vector, rebound to
    /// the given dialect.
    pub fn build(&self, dialect: Dialect) -> (String, Vec<i64>) {
        let mut sql = self.base.to_string();
        let mut args = Vec::new();

        match self.filter {
            Filter::All => {}
            Filter::ById(id) => {
                sql.push_str(&format!(" WHERE {}=?", self.id_column));
                args.push(id);
            }
            Filter::Related { join, value } => {
                sql.push(' ');
                sql.push_str(join);
                args.push(value);
            }
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        (dialect.rebind(&sql), args)
    }

    /// Execute against a pool and return the raw rows.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Store`] wrapped with `operation` on any driver
    /// failure. An empty result set is not an error.
    pub async fn fetch_rows(
        &self,
        pool: &StorePool,
        operation: &'static str,
    ) -> Result<Vec<AnyRow>, DbError> {
        let (sql, args) = self.build(pool.dialect());
        let mut query = sqlx::query(&sql);
        for arg in &args {
            query = query.bind(*arg);
        }
        query
            .fetch_all(pool.pool())
            .await
            .map_err(|e| DbError::store(operation, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "SELECT id, name FROM product_types";

    #[test]
    fn unfiltered_query_is_the_bare_base() {
        let (sql, args) = SelectQuery::new(BASE, "id").build(Dialect::Sqlite);
        assert_eq!(sql, BASE);
        assert!(args.is_empty());
    }

    #[test]
    fn id_filter_appends_where_and_binds() {
        let (sql, args) = SelectQuery::new(BASE, "id")
            .filter(Filter::ById(42))
            .build(Dialect::Sqlite);
        assert_eq!(sql, "SELECT id, name FROM product_types WHERE id=?");
        assert_eq!(args, vec![42]);
    }

    #[test]
    fn id_filter_uses_qualified_column_and_postgres_placeholder() {
        let (sql, args) = SelectQuery::new("SELECT products.id FROM products", "products.id")
            .filter(Filter::ById(7))
            .build(Dialect::Postgres);
        assert_eq!(sql, "SELECT products.id FROM products WHERE products.id=$1");
        assert_eq!(args, vec![7]);
    }

    #[test]
    fn relation_filter_appends_join_clause() {
        let (sql, args) = SelectQuery::new("SELECT DISTINCT customers.id FROM customers", "customers.id")
            .filter(Filter::Related {
                join: "JOIN orders ON customers.id=orders.customer_id WHERE orders.id=?",
                value: 3,
            })
            .limit(1000)
            .build(Dialect::Postgres);
        assert_eq!(
            sql,
            "SELECT DISTINCT customers.id FROM customers \
             JOIN orders ON customers.id=orders.customer_id WHERE orders.id=$1 LIMIT 1000"
        );
        assert_eq!(args, vec![3]);
    }

    #[test]
    fn limit_is_inlined_after_filters() {
        let (sql, args) = SelectQuery::new(BASE, "id")
            .filter(Filter::ById(1))
            .maybe_limit(Some(5))
            .build(Dialect::Sqlite);
        assert_eq!(sql, "SELECT id, name FROM product_types WHERE id=? LIMIT 5");
        assert_eq!(args, vec![1]);
    }

    #[test]
    fn absent_limit_leaves_query_uncapped() {
        let (sql, _) = SelectQuery::new(BASE, "id").maybe_limit(None).build(Dialect::Sqlite);
        assert!(!sql.contains("LIMIT"));
    }
}
