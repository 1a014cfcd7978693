//! HTTP request handlers for all API endpoints.
//!
//! Each handler is responsible for:
//! - Request validation and deserialization
//! - Authentication and authorization checks
//! - Business logic execution via database repositories
//! - Response serialization
//!
//! Authentication is cookie-based: the [`crate::api::models::users::CurrentUser`]
//! extractor reads the session cookie and refreshes the user from the
//! database, and [`crate::auth::AdminUser`] additionally requires the admin
//! role.

pub mod auth;
pub mod contact_requests;
pub mod partner_applications;
pub mod providers;
pub mod solutions;
pub mod users;
