use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};

use crate::controllers::auth_controller::AuthController;
use crate::dto::auth_dto::{
    ChangePasswordRequest, LoginRequest, RefreshRequest, RegisterRequest, TokenResponse, UpdateProfileRequest,
};
use crate::middleware::AuthenticatedUser;
use crate::models::user::UserResponse;
use crate::state::AppState;
use crate::utils::errors::AppResult;

/// Rutas públicas: quedan fuera del gate de autorización
pub fn public_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

/// Perfil del usuario autenticado
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(me).patch(update_profile))
        .route("/auth/me/password", patch(change_password))
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = AuthController::new(&state).register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> AppResult<Json<TokenResponse>> {
    Ok(Json(AuthController::new(&state).login(request).await?))
}

async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    Ok(Json(AuthController::new(&state).refresh(request).await?))
}

async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<UserResponse>> {
    Ok(Json(AuthController::new(&state).me(user.user_id).await?))
}

async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> AppResult<Json<UserResponse>> {
    Ok(Json(AuthController::new(&state).update_profile(user.user_id, request).await?))
}

async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> AppResult<Json<Value>> {
    AuthController::new(&state).change_password(user.user_id, request).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Password updated successfully"
    })))
}
