#[macro_use]
extern crate diesel;

pub mod aggregate;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod files;
pub mod forms;
pub mod handlers;
pub mod links;
pub mod models;
pub mod query;
pub mod schema;
pub mod state;

pub use error::ServiceError;
pub use state::AppState;
