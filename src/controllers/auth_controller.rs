use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::dto::auth_dto::{
    ChangePasswordRequest, LoginRequest, RefreshRequest, RegisterRequest, TokenResponse, UpdateProfileRequest,
};
use crate::models::user::UserResponse;
use crate::models::{Role, User};
use crate::rules::{Change, MutationSet};
use crate::services::auth_service::{hash_password, verify_password};
use crate::services::TokenType;
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, not_found_error, AppError, AppResult};

const MIN_PASSWORD_CHARS: usize = 6;

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid email or password".to_string())
}

pub struct AuthController {
    state: AppState,
}

impl AuthController {
    pub fn new(state: &AppState) -> Self {
        Self { state: state.clone() }
    }

    async fn load_user(&self, id: Uuid) -> AppResult<User> {
        self.state
            .store
            .get_user(id)
            .await?
            .ok_or_else(|| not_found_error("User"))
    }

    fn token_response(&self, user: &User) -> AppResult<TokenResponse> {
        let (token, refresh_token) = self.state.jwt.issue_pair(user)?;
        Ok(TokenResponse {
            token,
            refresh_token,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            user_id: user.id,
        })
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<UserResponse> {
        request.validate()?;
        let role: Role = request
            .role
            .parse()
            .map_err(|e: crate::models::ParseEnumError| AppError::BadRequest(e.to_string()))?;

        let email = normalize_email(&request.email);
        if self.state.store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("User with this email already exists".to_string()));
        }

        let password_hash = hash_password(request.password, self.state.config.bcrypt_cost).await?;
        let user = User {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            email,
            password_hash,
            role,
            is_active: true,
            created_at: Utc::now(),
        };

        self.state.store.commit(MutationSet::single(Change::InsertUser(user.clone()))).await?;
        info!("👤 Usuario {} registrado como {}", user.email, user.role);
        Ok(UserResponse::from(user))
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<TokenResponse> {
        let user = self
            .state
            .store
            .find_user_by_email(&normalize_email(&request.email))
            .await?
            .ok_or_else(invalid_credentials)?;

        if !verify_password(request.password, user.password_hash.clone()).await? {
            warn!("🔐 Contraseña incorrecta para {}", user.email);
            return Err(invalid_credentials());
        }
        if !user.is_active {
            return Err(AppError::Forbidden("User account is inactive".to_string()));
        }

        info!("🔓 Login de {} ({})", user.email, user.role);
        self.token_response(&user)
    }

    /// Solo acepta tokens de tipo `refresh`
    pub async fn refresh(&self, request: RefreshRequest) -> AppResult<TokenResponse> {
        let claims = self.state.jwt.validate_typed(&request.refresh_token, TokenType::Refresh)?;
        let user = self
            .state
            .store
            .get_user(claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;
        if !user.is_active {
            return Err(AppError::Forbidden("User account is inactive".to_string()));
        }
        self.token_response(&user)
    }

    pub async fn me(&self, user_id: Uuid) -> AppResult<UserResponse> {
        Ok(UserResponse::from(self.load_user(user_id).await?))
    }

    pub async fn update_profile(&self, user_id: Uuid, request: UpdateProfileRequest) -> AppResult<UserResponse> {
        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(bad_request_error("Name cannot be empty"));
            }
            self.state
                .store
                .commit(MutationSet::single(Change::UpdateUserName { user_id, name }))
                .await?;
        }
        self.me(user_id).await
    }

    pub async fn change_password(&self, user_id: Uuid, request: ChangePasswordRequest) -> AppResult<()> {
        let user = self.load_user(user_id).await?;

        if !verify_password(request.current_password, user.password_hash).await? {
            return Err(bad_request_error("Current password is incorrect"));
        }
        if request.new_password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AppError::BadRequest(format!(
                "New password must be at least {} characters",
                MIN_PASSWORD_CHARS
            )));
        }

        let password_hash = hash_password(request.new_password, self.state.config.bcrypt_cost).await?;
        self.state
            .store
            .commit(MutationSet::single(Change::UpdateUserPassword { user_id, password_hash }))
            .await?;
        info!("🔑 Contraseña actualizada para {}", user.email);
        Ok(())
    }
}
