//! Integration test suite modules

mod csrf;
mod sql;
mod xss;
