use crate::{
    api::models::users::{CurrentUser, Role},
    auth::session,
    db::errors::DbError,
    db::handlers::Users,
    errors::{Error, Result},
    AppState,
};
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use tracing::{debug, instrument, trace};

/// Extract user from JWT session cookie if present and valid
/// Returns:
/// - None: No session cookie present
/// - Some(Ok(user)): Valid JWT found and verified
/// - Some(Err(error)): Cookie header present but unreadable
#[instrument(skip(parts, config))]
fn try_jwt_session_auth(parts: &Parts, config: &crate::config::Config) -> Option<Result<CurrentUser>> {
    let cookie_header = parts.headers.get(axum::http::header::COOKIE)?;

    let cookie_str = match cookie_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid cookie header: {e}"),
            }))
        }
    };
    let cookie_name = &config.auth.native.session.cookie_name;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=') {
            if name == cookie_name {
                match session::verify_session_token(value, config) {
                    Ok(user) => return Some(Ok(user)),
                    Err(_) => {
                        // Invalid/expired token; expected for stale cookies, so not propagated
                        continue;
                    }
                }
            }
        }
    }
    None
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let claims_user = match try_jwt_session_auth(parts, &state.config) {
            Some(Ok(user)) => user,
            Some(Err(e)) => {
                trace!("Session authentication failed: {:?}", e);
                return Err(Error::Unauthenticated { message: None });
            }
            None => {
                trace!("No session credentials found in request");
                return Err(Error::Unauthenticated { message: None });
            }
        };

        // Refresh against the database so deactivation and role changes take
        // effect before the cookie expires.
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        let mut users = Users::new(&mut conn);
        let user = match users.get_user_by_username(&claims_user.username).await? {
            Some(user) if user.is_active => user,
            _ => {
                debug!("Session user {} missing or deactivated", claims_user.id);
                return Err(Error::Unauthenticated { message: None });
            }
        };

        Ok(CurrentUser {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            display_name: user.display_name,
        })
    }
}

// Public routes take Option<CurrentUser> and only fail on genuine errors,
// not on a missing session.
impl OptionalFromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Option<Self>> {
        match <CurrentUser as FromRequestParts<AppState>>::from_request_parts(parts, state).await {
            Ok(user) => Ok(Some(user)),
            Err(Error::Unauthenticated { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// A [`CurrentUser`] whose role is `admin`. Handlers that take this in their
/// signature are admin-only; everyone else gets 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user =
            <CurrentUser as FromRequestParts<AppState>>::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(Error::InsufficientRole {
                required: Role::Admin,
                resource: parts.uri.path().to_string(),
            });
        }
        Ok(AdminUser(user))
    }
}
