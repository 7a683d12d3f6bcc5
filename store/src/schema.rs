use rusqlite::params;

use crate::{DemoStore, StoreError};

pub(crate) const SCHEMA: &str = r"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        email TEXT NOT NULL,
        role TEXT NOT NULL,
        balance REAL NOT NULL
    );

    CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        status TEXT NOT NULL,
        price REAL NOT NULL,
        stock INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS comments (
        id INTEGER PRIMARY KEY,
        text TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
";

/// Initial data for an empty database.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoSeed {
    /// Balance every demo account starts with.
    pub starting_balance: f64,
}

impl Default for DemoSeed {
    fn default() -> Self {
        Self {
            starting_balance: 10_000.0,
        }
    }
}

// (username, password, email, role)
const USERS: [(&str, &str, &str, &str); 3] = [
    ("admin", "admin123", "admin@securescape.com", "ADMIN"),
    ("user1", "password123", "user1@securescape.com", "USER"),
    ("john", "john123", "john@example.com", "USER"),
];

// (name, description, status, price, stock)
const PRODUCTS: [(&str, &str, &str, f64, i64); 5] = [
    ("Laptop", "High-performance laptop", "Released", 999.99, 10),
    ("Mouse", "Wireless mouse", "Released", 29.99, 50),
    ("Keyboard", "Mechanical keyboard", "Released", 79.99, 30),
    ("Monitor", "4K monitor", "Unreleased", 299.99, 15),
    ("Webcam", "HD webcam", "Unreleased", 49.99, 25),
];

const COMMENTS: [&str; 2] = [
    "This is a great product!",
    "I love using this platform for learning!",
];

impl DemoStore {
    /// Populate each empty table. Tables that already hold rows are left alone,
    /// so reopening an on-disk database keeps its state.
    pub fn seed(&self, seed: &DemoSeed) -> Result<(), StoreError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let count = |table: &str| -> Result<i64, rusqlite::Error> {
            tx.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        };
        let empty_users = count("users")? == 0;
        let empty_products = count("products")? == 0;
        let empty_comments = count("comments")? == 0;

        if empty_users {
            for (username, password, email, role) in USERS {
                tx.execute(
                    "INSERT INTO users (username, password, email, role, balance)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![username, password, email, role, seed.starting_balance],
                )?;
            }
            tracing::info!(count = USERS.len(), "Seeded demo users");
        }

        if empty_products {
            for (name, description, status, price, stock) in PRODUCTS {
                tx.execute(
                    "INSERT INTO products (name, description, status, price, stock)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![name, description, status, price, stock],
                )?;
            }
            tracing::info!(count = PRODUCTS.len(), "Seeded demo products");
        }

        if empty_comments {
            let now = crate::comments::timestamp_now();
            for text in COMMENTS {
                tx.execute(
                    "INSERT INTO comments (text, created_at) VALUES (?1, ?2)",
                    params![text, now],
                )?;
            }
            tracing::info!(count = COMMENTS.len(), "Seeded demo comments");
        }

        tx.commit()?;
        Ok(())
    }
}
