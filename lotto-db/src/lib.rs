pub mod db;
pub mod error;
pub mod fixtures;
pub mod models;
pub mod source;
pub mod store;

pub use rusqlite;
