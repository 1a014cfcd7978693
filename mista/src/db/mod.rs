//! Database layer: repositories, entity models, and error mapping.

pub mod errors;
pub mod handlers;
pub mod models;
