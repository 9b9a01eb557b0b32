use axum::{extract::State, routing::{get, post}, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthUser};
use crate::services::AuthService;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// Успешный ответ на вход
#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub access_token: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
}

/// Вход оператора по логину и паролю
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Успешный вход", body = LoginResponse),
        (status = 401, description = "Неверный логин или пароль")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<Value>> {
    let auth_service = AuthService::new(state.config.clone());

    if !auth_service.verify_credentials(&payload.login, &payload.password) {
        return Err(AppError::Unauthorized);
    }

    let access_token = auth_service.generate_access_token()?;

    Ok(Json(json!({
        "success": true,
        "access_token": access_token
    })))
}

/// Текущий оператор
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Данные оператора"),
        (status = 401, description = "Не авторизован")
    )
)]
pub async fn me(auth_user: AuthUser) -> AppResult<Json<Value>> {
    Ok(Json(json!({
        "login": auth_user.login
    })))
}
