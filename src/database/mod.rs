//! # Database
//!
//! Connection pooling and embedded migrations for the `orders` schema the
//! workers read and write. Queries themselves live next to their models.

pub mod connection;

pub use connection::DatabaseConnection;
