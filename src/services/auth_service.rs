use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set,
};

use crate::{
    audit,
    config::AppConfig,
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest},
    entity::users::{self, Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
    validation::{validate_email, validate_password, validate_username},
};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Issue a bearer token bound to the user id.
pub fn issue_token(config: &AppConfig, user: &users::Model) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(config.jwt_ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        is_admin: user.is_admin,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let RegisterRequest {
        username,
        email,
        password,
    } = payload;
    validate_username(&username)?;
    validate_email(&state.orm, &email).await?;
    validate_password(&password)?;

    let user = users::ActiveModel {
        id: NotSet,
        username: Set(username),
        email: Set(email),
        password_hash: Set(hash_password(&password)?),
        is_admin: Set(false),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "User created",
        User::from(user),
        Some(Meta::empty()),
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let user = authenticate(state, &payload).await?;
    if !user.is_active {
        return Err(AppError::Forbidden);
    }
    respond_with_token(state, user, "user_login", "Login successful").await
}

pub async fn login_admin(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let user = authenticate(state, &payload)
        .await
        .map_err(|err| match err {
            AppError::Unauthorized(_) => AppError::Unauthorized("Invalid admin credentials".into()),
            other => other,
        })?;
    if !user.is_admin {
        return Err(AppError::Unauthorized("Invalid admin credentials".into()));
    }
    if !user.is_active {
        return Err(AppError::Forbidden);
    }
    respond_with_token(state, user, "admin_login", "Admin login successful").await
}

async fn authenticate(state: &AppState, payload: &LoginRequest) -> AppResult<users::Model> {
    let user = Users::find()
        .filter(UserCol::Email.eq(payload.email.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }
    Ok(user)
}

async fn respond_with_token(
    state: &AppState,
    user: users::Model,
    action: &str,
    message: &str,
) -> AppResult<ApiResponse<LoginResponse>> {
    let token = issue_token(&state.config, &user)?;

    audit::record(
        &state.orm,
        Some(user.id),
        action,
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    let resp = LoginResponse {
        access_token: token,
        user_id: user.id,
        username: user.username,
        is_admin: user.is_admin,
    };
    Ok(ApiResponse::success(message, resp, Some(Meta::empty())))
}
