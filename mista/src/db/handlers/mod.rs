//! Database repositories, one per entity.

pub mod contact_requests;
pub mod partner_applications;
pub mod password_reset_tokens;
pub mod providers;
pub mod repository;
pub mod solutions;
pub mod users;

pub use contact_requests::ContactRequests;
pub use partner_applications::PartnerApplications;
pub use password_reset_tokens::PasswordResetTokens;
pub use providers::Providers;
pub use repository::Repository;
pub use solutions::Solutions;
pub use users::Users;
