use crate::api::AppState;
use crate::config::AuthConfig;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;
use subtle::ConstantTimeEq;

/// HTTP Basic guard for the report routes.
pub async fn basic_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    match basic_credentials(&headers) {
        Some((username, password)) if verify(&state.auth, &username, &password) => {
            next.run(request).await
        }
        Some((username, _)) => {
            tracing::warn!("Failed basic authentication attempt for user {:?}", username);
            unauthorized()
        }
        None => {
            tracing::warn!("Missing or malformed basic credentials");
            unauthorized()
        }
    }
}

/// Decode `Authorization: Basic <base64(user:pass)>`.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Compare both fields in constant time; both are always checked.
pub fn verify(config: &AuthConfig, username: &str, password: &str) -> bool {
    let user_ok = username.as_bytes().ct_eq(config.username.as_bytes());
    let pass_ok = password.as_bytes().ct_eq(config.password.as_bytes());
    (user_ok & pass_ok).into()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic")],
        Json(json!({ "detail": "Credenciais inválidas" })),
    )
        .into_response()
}
