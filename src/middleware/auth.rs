//! Middleware de autenticación JWT
//!
//! Gate único de autorización: autentica el token, resuelve la operación de la
//! ruta registrada y comprueba los roles antes de llegar al handler.

use axum::{
    extract::{MatchedPath, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::models::Role;
use crate::services::{Operation, TokenType};
use crate::state::AppState;
use crate::utils::errors::{forbidden_error, AppError};

/// Usuario autenticado que se inyecta en las requests
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Token del header `Authorization: Bearer` o, para el stream, del query `token`
fn extract_token(request: &Request) -> Option<String> {
    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|auth_str| auth_str.to_str().ok())
        .and_then(|auth_str| auth_str.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());

    bearer.or_else(|| {
        request
            .uri()
            .query()?
            .split('&')
            .find_map(|pair| pair.strip_prefix("token="))
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    })
}

/// Middleware de autenticación y autorización por operación
pub async fn authorize(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let operation = request
        .extensions()
        .get::<MatchedPath>()
        .and_then(|path| Operation::for_route(request.method(), path.as_str()))
        .ok_or_else(|| AppError::Forbidden("No access policy for this operation".to_string()))?;

    let token = extract_token(&request)
        .ok_or_else(|| AppError::Unauthorized("Authorization token required".to_string()))?;

    let claims = state.jwt.validate_typed(&token, TokenType::Access)?;

    let user = state
        .store
        .get_user(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    if !user.is_active {
        return Err(AppError::Forbidden("User account is inactive".to_string()));
    }

    if !operation.permits(user.role) {
        tracing::debug!("⛔ {:?} denegado para rol {}", operation, user.role);
        return Err(forbidden_error(operation.required_roles()));
    }

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http;

    #[test]
    fn test_bearer_header_wins_over_query() {
        let request = http::Request::builder()
            .uri("/ws?token=from-query")
            .header(header::AUTHORIZATION, "Bearer from-header")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_token(&request).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_query_token_used_for_stream() {
        let request = http::Request::builder()
            .uri("/ws?foo=1&token=abc.def.ghi")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_token(&request).as_deref(), Some("abc.def.ghi"));

        let request = http::Request::builder().uri("/ws?token=").body(Body::empty()).unwrap();
        assert_eq!(extract_token(&request), None);
    }
}
