//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! Functional areas:
//!
//! - **Authentication** (`/api/register`, `/api/login`, `/api/logout`, `/api/user`,
//!   `/api/password-resets`): Registration, login, sessions, password resets
//! - **Users** (`/api/users/*`): Admin user management
//! - **Providers** (`/api/solution-providers/*`): Solution provider directory
//! - **Solutions** (`/api/solutions/*`): Solution catalog
//! - **Partner applications** (`/api/partner-applications/*`): Intake and review
//! - **Contact requests** (`/api/contact-requests/*`): Seeker-to-provider requests
//!
//! All endpoints carry OpenAPI annotations via `utoipa`; the rendered docs are
//! served at `/api/docs`.

pub mod handlers;
pub mod models;
