//! Database entity models and request/response types.

pub mod contact_requests;
pub mod partner_applications;
pub mod password_reset_tokens;
pub mod providers;
pub mod solutions;
pub mod users;
