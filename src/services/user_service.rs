use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect, Set};

use crate::{
    audit,
    dto::users::{UpdateUserRequest, UserList},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::User,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Users::find().order_by_asc(UserCol::Id);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_user(state: &AppState, user: &AuthUser, id: i64) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let found = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(ApiResponse::success("User", User::from(found), Some(Meta::empty())))
}

pub async fn update_user(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let existing = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    let mut active: UserActive = existing.into();
    if let Some(is_admin) = payload.is_admin {
        active.is_admin = Set(is_admin);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "user_update",
        "users",
        serde_json::json!({
            "user_id": updated.id,
            "is_admin": updated.is_admin,
            "is_active": updated.is_active,
        }),
    )
    .await;

    Ok(ApiResponse::success("User updated", User::from(updated), Some(Meta::empty())))
}

/// Deletes the user. The store cascades to its cart, cart items, orders and
/// order items; payments keep their row with the user reference nulled.
pub async fn delete_user(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Users::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("User"));
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "user_delete",
        "users",
        serde_json::json!({ "user_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "User deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
