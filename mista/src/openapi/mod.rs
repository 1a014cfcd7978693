//! OpenAPI documentation for the marketplace API at `/api/*`.
//!
//! The rendered docs are served at `/api/docs`.

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::api;

/// Session-cookie security scheme shared by all authenticated endpoints.
struct CookieSecurityAddon;

impl Modify for CookieSecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "CookieAuth".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("mista_session"))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tech Mista API",
        description = "Marketplace API connecting technology solution providers with seekers."
    ),
    modifiers(&CookieSecurityAddon),
    paths(
        // Authentication
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::auth::current_user,
        api::handlers::auth::request_password_reset,
        api::handlers::auth::confirm_password_reset,
        // Users (admin)
        api::handlers::users::list_users,
        api::handlers::users::get_user,
        api::handlers::users::create_user,
        api::handlers::users::update_user,
        // Providers
        api::handlers::providers::list_providers,
        api::handlers::providers::get_provider,
        api::handlers::providers::create_provider,
        api::handlers::providers::update_provider,
        api::handlers::providers::delete_provider,
        // Solutions
        api::handlers::solutions::list_solutions,
        api::handlers::solutions::get_solution,
        api::handlers::solutions::create_solution,
        api::handlers::solutions::delete_solution,
        // Partner applications
        api::handlers::partner_applications::create_application,
        api::handlers::partner_applications::list_applications,
        api::handlers::partner_applications::get_application,
        api::handlers::partner_applications::review_application,
        // Contact requests
        api::handlers::contact_requests::create_contact_request,
        api::handlers::contact_requests::check_pending,
        api::handlers::contact_requests::list_contact_requests,
        api::handlers::contact_requests::unread_count,
        api::handlers::contact_requests::get_contact_request,
        api::handlers::contact_requests::update_contact_request,
        api::handlers::contact_requests::delete_contact_request,
        api::handlers::contact_requests::mark_read,
    ),
    components(
        schemas(
            api::models::auth::RegisterRequest,
            api::models::auth::LoginRequest,
            api::models::auth::PasswordResetRequest,
            api::models::auth::PasswordResetConfirmRequest,
            api::models::auth::AuthResponse,
            api::models::auth::MessageResponse,
            api::models::users::Role,
            api::models::users::UserCreate,
            api::models::users::UserUpdate,
            api::models::users::UserResponse,
            api::models::users::CurrentUser,
            api::models::providers::VerificationStatus,
            api::models::providers::ProviderCreate,
            api::models::providers::ProviderUpdate,
            api::models::providers::ProviderResponse,
            api::models::solutions::SolutionCreate,
            api::models::solutions::SolutionResponse,
            api::models::partner_applications::ApplicationStatus,
            api::models::partner_applications::ApplicationCreate,
            api::models::partner_applications::ApplicationUpdate,
            api::models::partner_applications::ApplicationResponse,
            api::models::contact_requests::RequestStatus,
            api::models::contact_requests::DocumentInfo,
            api::models::contact_requests::ContactRequestCreate,
            api::models::contact_requests::ContactRequestUpdate,
            api::models::contact_requests::ContactRequestResponse,
            api::models::contact_requests::PendingCheckResponse,
            api::models::contact_requests::UnreadCountResponse,
        )
    ),
    tags(
        (name = "authentication", description = "Registration, sessions, and password resets"),
        (name = "users", description = "Admin user management"),
        (name = "providers", description = "Solution provider directory"),
        (name = "solutions", description = "Solution catalog"),
        (name = "partner-applications", description = "Partner intake and review"),
        (name = "contact-requests", description = "Seeker-to-provider contact requests"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_builds() {
        let spec = ApiDoc::openapi();
        let json = spec.to_json().expect("spec serializes");
        assert!(json.contains("/api/contact-requests"));
        assert!(json.contains("CookieAuth"));
    }
}
