//! Account registration, sign-in and admin user management.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::AppState;
use crate::domain::user::{PublicUser, Role, User};
use crate::{Error, Result};

pub async fn list(State(s): State<AppState>) -> Result<Json<Vec<PublicUser>>> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(users.iter().map(User::public).collect()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPayload {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

pub async fn register(
    State(s): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<PublicUser>)> {
    payload.validate()?;
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (id, name, email, password, role) \
         VALUES ($1, $2, LOWER($3), $4, 'customer') RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&payload.password)
    .fetch_one(&s.db)
    .await
    .map_err(|err| match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Error::Invalid("Email already registered".into())
        }
        other => Error::Database(other),
    })?;
    Ok((StatusCode::CREATED, Json(user.public())))
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(s): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<PublicUser>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = LOWER($1)")
        .bind(&payload.email)
        .fetch_optional(&s.db)
        .await?;
    match user {
        Some(user) if user.password == payload.password => Ok(Json(user.public())),
        _ => Err(Error::Unauthorized("Invalid email or password")),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProfilePayload {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
}

pub async fn update_profile(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProfilePayload>,
) -> Result<Json<PublicUser>> {
    payload.validate()?;
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET name = $2, email = LOWER($3) WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&payload.name)
    .bind(&payload.email)
    .fetch_optional(&s.db)
    .await
    .map_err(|err| match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Error::Invalid("Email already registered".into())
        }
        other => Error::Database(other),
    })?
    .ok_or(Error::NotFound("User"))?;
    Ok(Json(user.public()))
}

#[derive(Debug, Deserialize)]
pub struct RolePayload {
    pub role: String,
    /// Id of the admin performing the change, used for self-demotion checks.
    pub acting_user_id: Option<Uuid>,
}

pub async fn update_role(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RolePayload>,
) -> Result<Json<PublicUser>> {
    let role: Role = payload
        .role
        .parse()
        .map_err(|_| Error::Invalid(format!("Unknown role '{}'", payload.role)))?;

    // An admin may not strip their own admin role; a second admin has to.
    if payload.acting_user_id == Some(id) && role != Role::Admin {
        return Err(Error::Invalid(
            "Admins cannot change their own role".into(),
        ));
    }

    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET role = $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(role.as_str())
    .fetch_optional(&s.db)
    .await?
    .ok_or(Error::NotFound("User"))?;
    Ok(Json(user.public()))
}

#[derive(Debug, Deserialize, Default)]
pub struct RemovePayload {
    pub acting_user_id: Option<Uuid>,
}

pub async fn remove(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Option<Json<RemovePayload>>,
) -> Result<Json<serde_json::Value>> {
    let acting = payload.and_then(|Json(p)| p.acting_user_id);
    if acting == Some(id) {
        return Err(Error::Invalid(
            "Admins cannot delete their own account".into(),
        ));
    }
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&s.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound("User"));
    }
    Ok(Json(serde_json::json!({ "message": "User removed" })))
}
