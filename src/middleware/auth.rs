use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};

use crate::{dto::auth::Claims, error::AppError, state::AppState};

/// Caller identity taken from a verified bearer token.
///
/// `user_id` and `is_admin` come from the token claims alone; the user row is
/// not reloaded per request. Demoting, deactivating or deleting a user takes
/// effect on their next login, and tokens already issued keep their claims
/// until `exp` (`JWT_TTL_HOURS`).
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub is_admin: bool,
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    if !user.is_admin {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Non-admin callers may only act on their own records.
pub fn ensure_self_or_admin(user: &AuthUser, owner_id: i64) -> Result<(), AppError> {
    if user.is_admin || user.user_id == owner_id {
        return Ok(());
    }
    Err(AppError::Forbidden)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::BadRequest("Invalid Authorization scheme".into()))?
            .trim();

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

        let user_id = decoded
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

        Ok(AuthUser {
            user_id,
            is_admin: decoded.claims.is_admin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_or_admin() {
        let user = AuthUser { user_id: 7, is_admin: false };
        let admin = AuthUser { user_id: 1, is_admin: true };

        assert!(ensure_self_or_admin(&user, 7).is_ok());
        assert!(matches!(ensure_self_or_admin(&user, 8), Err(AppError::Forbidden)));
        assert!(ensure_self_or_admin(&admin, 8).is_ok());
        assert!(ensure_admin(&user).is_err());
        assert!(ensure_admin(&admin).is_ok());
    }

    #[tokio::test]
    async fn identity_comes_from_claims_without_a_user_lookup() {
        use std::sync::Arc;

        use axum::http::Request;
        use jsonwebtoken::{EncodingKey, Header, encode};
        use sea_orm::DatabaseConnection;

        use crate::{catalog::HttpCatalog, config::AppConfig};

        let config = AppConfig {
            database_url: "postgres://unused".into(),
            host: "127.0.0.1".into(),
            port: 0,
            jwt_secret: "claims-secret".into(),
            jwt_ttl_hours: 1,
            catalog_base_url: "http://localhost".into(),
        };
        let claims = Claims {
            sub: "999".into(),
            is_admin: true,
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .expect("token");
        let state = AppState {
            orm: DatabaseConnection::Disconnected,
            config: Arc::new(config),
            catalog: Arc::new(HttpCatalog::new("http://localhost").expect("client")),
        };

        let (mut parts, ()) = Request::builder()
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(())
            .expect("request")
            .into_parts();
        let user = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .expect("claims are enough");

        assert_eq!(user.user_id, 999);
        assert!(user.is_admin);
    }
}
