use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::EnvironmentConfig;
use crate::models::{Role, User};
use crate::utils::errors::{AppError, AppResult};

/// Tipo de token; solo los de acceso pasan el gate de autorización
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub email: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
}

/// Configuración JWT
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub access_token_duration: Duration,
    pub refresh_token_duration: Duration,
}

impl JwtConfig {
    pub fn from_environment(config: &EnvironmentConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            algorithm: Algorithm::HS256,
            access_token_duration: Duration::minutes(config.access_token_expire_minutes),
            refresh_token_duration: Duration::days(config.refresh_token_expire_days),
        }
    }
}

/// Servicio JWT
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_ref());
        let decoding_key = DecodingKey::from_secret(config.secret.as_ref());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    fn generate(&self, user: &User, token_type: TokenType, lifetime: Duration) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            role: user.role,
            email: user.email.clone(),
            token_type,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        };

        encode(&Header::new(self.config.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::Jwt(format!("Error generating token: {}", e)))
    }

    /// Genera un token de acceso
    pub fn generate_access_token(&self, user: &User) -> AppResult<String> {
        self.generate(user, TokenType::Access, self.config.access_token_duration)
    }

    /// Genera un token de refresh
    pub fn generate_refresh_token(&self, user: &User) -> AppResult<String> {
        self.generate(user, TokenType::Refresh, self.config.refresh_token_duration)
    }

    /// Par (acceso, refresh)
    pub fn issue_pair(&self, user: &User) -> AppResult<(String, String)> {
        Ok((self.generate_access_token(user)?, self.generate_refresh_token(user)?))
    }

    /// Valida firma y expiración
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(self.config.algorithm);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Jwt(format!("Invalid token: {}", e)))
    }

    /// Valida un token y exige el tipo indicado
    pub fn validate_typed(&self, token: &str, expected: TokenType) -> AppResult<Claims> {
        let claims = self.validate_token(token)?;
        if claims.token_type != expected {
            return Err(AppError::Unauthorized("Invalid token type".to_string()));
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new(JwtConfig::from_environment(&EnvironmentConfig::default()))
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Dispatch Desk".into(),
            email: "desk@fleetflow.io".into(),
            password_hash: String::new(),
            role: Role::Dispatcher,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_generate_and_validate_token() {
        let jwt_service = service();
        let user = user();

        let token = jwt_service.generate_access_token(&user).unwrap();
        assert!(!token.is_empty());

        let claims = jwt_service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::Dispatcher);
        assert_eq!(claims.token_type, TokenType::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let jwt_service = service();
        let (_, refresh) = jwt_service.issue_pair(&user()).unwrap();

        assert!(jwt_service.validate_typed(&refresh, TokenType::Refresh).is_ok());
        assert!(matches!(
            jwt_service.validate_typed(&refresh, TokenType::Access),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let jwt_service = service();
        let token = jwt_service.generate_access_token(&user()).unwrap();
        assert!(matches!(
            jwt_service.validate_token(&format!("{}x", token)),
            Err(AppError::Jwt(_))
        ));
    }
}
