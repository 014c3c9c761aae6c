use axum::{
    extract::{FromRequestParts, FromRef},
    http::{header, request::Parts, StatusCode},
};
use crate::state::AppState;
use crate::domain::models::auth::{Caller, Claims};
use crate::domain::models::user::Role;
use std::sync::Arc;
use tower_cookies::Cookies;
use jsonwebtoken::{decode, DecodingKey, Validation, Algorithm};
use tracing::{debug, Span};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// The authenticated caller, taken from a bearer token or the access-token cookie.
pub struct AuthUser(pub Caller);

fn bearer_token(parts: &Parts) -> Option<String> {
    parts.headers.get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let access_token = bearer_token(parts)
            .or_else(|| {
                parts.extensions.get::<Cookies>()
                    .and_then(|cookies| cookies.get(ACCESS_TOKEN_COOKIE))
                    .map(|cookie| cookie.value().to_string())
            })
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        let decoding_key = DecodingKey::from_secret(app_state.config.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<Claims>(&access_token, &decoding_key, &validation)
            .map_err(|e| {
                debug!("Rejected access token: {}", e);
                StatusCode::UNAUTHORIZED
            })?;

        let role = Role::try_from(token_data.claims.role).map_err(|_| StatusCode::UNAUTHORIZED)?;
        let caller = Caller { id: token_data.claims.sub, role };

        Span::current().record("user_id", &caller.id);

        Ok(AuthUser(caller))
    }
}
