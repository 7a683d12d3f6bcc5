//! Login and product search, each written twice.
//!
//! The `*_concatenated` variants splice caller input straight into SQL text
//! and are injectable on purpose. The `*_parameterized` variants bind the
//! same input as parameters. Both run against the same tables and map rows
//! identically.

use rusqlite::{Row, params};
use securescape_types::wire::{Product, UserInfo};

use crate::{DemoStore, StoreError};

const PRODUCT_COLUMNS: &str = "id, name, description, status, price, stock";

/// Statement shown to clients of the parameterized search.
pub const PARAMETERIZED_SEARCH_SQL: &str =
    "SELECT id, name, description, status, price, stock FROM products \
     WHERE status = 'Released' AND name LIKE ?1 ESCAPE '\\'";

/// Result of a login attempt, plus the exact SQL that ran.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginAttempt {
    pub sql: String,
    pub user: Option<UserInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub sql: String,
    pub products: Vec<Product>,
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserInfo> {
    Ok(UserInfo {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        role: row.get(3)?,
    })
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        price: row.get(4)?,
        stock: row.get(5)?,
    })
}

/// Escape LIKE wildcards so user input matches literally.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl DemoStore {
    /// Vulnerable: `' OR '1'='1' --` as the username logs in as the first user.
    pub fn login_concatenated(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginAttempt, StoreError> {
        let sql = format!(
            "SELECT id, username, email, role FROM users \
             WHERE username = '{username}' AND password = '{password}'"
        );
        tracing::debug!(%sql, "Executing concatenated login query");
        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let user = stmt.query_map([], user_from_row)?.next().transpose()?;
        Ok(LoginAttempt { sql, user })
    }

    pub fn login_parameterized(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserInfo>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, username, email, role FROM users WHERE username = ?1 AND password = ?2",
        )?;
        let user = stmt
            .query_map(params![username, password], user_from_row)?
            .next()
            .transpose()?;
        Ok(user)
    }

    /// Vulnerable: `x' OR 1=1 --` exposes unreleased products, and a UNION
    /// with six columns reads any other table.
    ///
    /// Both search variants only list `Released` rows, so the unreleased
    /// products are visible solely through a successful injection.
    pub fn search_concatenated(&self, query: &str) -> Result<SearchOutcome, StoreError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE status = 'Released' AND name LIKE '%{query}%'"
        );
        tracing::debug!(%sql, "Executing concatenated search query");
        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let products = stmt
            .query_map([], product_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(SearchOutcome { sql, products })
    }

    pub fn search_parameterized(&self, query: &str) -> Result<Vec<Product>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(PARAMETERIZED_SEARCH_SQL)?;
        let products = stmt
            .query_map(params![like_pattern(query)], product_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(products)
    }
}
