use axum::{
    extract::{FromRequestParts, FromRef},
    http::{header, request::Parts, StatusCode},
};
use crate::state::AppState;
use crate::domain::models::{actor::{AuthContext, Role}, auth::Claims};
use std::sync::Arc;
use tower_cookies::Cookies;
use jsonwebtoken::{decode, DecodingKey, Validation, Algorithm};
use tracing::Span;

pub const AUDIENCE: &str = "dispatch-api";

/// Identity asserted by the identity layer, taken from a Bearer header or
/// the `access_token` cookie.
pub struct AuthUser(pub AuthContext);

fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(|t| t.trim().to_string())
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let access_token = match bearer_token(parts) {
            Some(token) => token,
            None => {
                let cookies = parts.extensions.get::<Cookies>()
                    .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;
                cookies.get("access_token")
                    .ok_or(StatusCode::UNAUTHORIZED)?
                    .value()
                    .to_string()
            }
        };

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let decoding_key = DecodingKey::from_ed_pem(app_state.config.jwt_public_key.as_bytes())
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_audience(&[AUDIENCE]);
        validation.set_issuer(&[app_state.config.auth_issuer.as_str()]);

        let token_data = decode::<Claims>(&access_token, &decoding_key, &validation)
            .map_err(|_| StatusCode::UNAUTHORIZED)?;

        let role: Role = token_data.claims.role.parse()
            .map_err(|_| StatusCode::UNAUTHORIZED)?;
        let actor = AuthContext::new(token_data.claims.sub, role);

        Span::current().record("user_id", &actor.user_id);
        Span::current().record("role", tracing::field::debug(actor.role));

        Ok(AuthUser(actor))
    }
}
