//! API request/response models.

pub mod auth;
pub mod contact_requests;
pub mod pagination;
pub mod partner_applications;
pub mod providers;
pub mod solutions;
pub mod users;
