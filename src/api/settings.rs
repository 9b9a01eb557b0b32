use axum::{extract::State, routing::get, Json, Router};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthUser};
use crate::models::{BillingSettings, UpdateBillingSettingsRequest};

pub fn routes() -> Router<AppState> {
    Router::new().route("/billing", get(get_billing_settings).put(update_billing_settings))
}

/// Текущие настройки биллинга (единственная строка)
pub async fn load_settings(pool: &PgPool) -> AppResult<BillingSettings> {
    let settings = sqlx::query_as::<_, BillingSettings>(
        "SELECT rate_per_unit, currency, updated_at FROM billing_settings WHERE id = TRUE",
    )
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::Internal("Настройки биллинга не инициализированы".to_string()))?;

    Ok(settings)
}

/// Текущий тариф
#[utoipa::path(
    get,
    path = "/api/v1/settings/billing",
    tag = "settings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Настройки биллинга", body = BillingSettings),
        (status = 401, description = "Не авторизован")
    )
)]
pub async fn get_billing_settings(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> AppResult<Json<BillingSettings>> {
    Ok(Json(load_settings(&state.pool).await?))
}

/// Изменение тарифа
///
/// Новый тариф действует только на последующие счета -
/// уже выставленные хранят тариф на момент выставления.
#[utoipa::path(
    put,
    path = "/api/v1/settings/billing",
    tag = "settings",
    security(("bearer_auth" = [])),
    request_body = UpdateBillingSettingsRequest,
    responses(
        (status = 200, description = "Настройки обновлены", body = BillingSettings),
        (status = 401, description = "Не авторизован"),
        (status = 422, description = "Ошибка валидации")
    )
)]
pub async fn update_billing_settings(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Json(payload): Json<UpdateBillingSettingsRequest>,
) -> AppResult<Json<BillingSettings>> {
    if payload.rate_per_unit <= Decimal::ZERO {
        return Err(AppError::Validation(
            "Тариф должен быть больше нуля".to_string(),
        ));
    }

    let settings = sqlx::query_as::<_, BillingSettings>(
        r#"
        UPDATE billing_settings
        SET rate_per_unit = $1,
            currency = COALESCE($2, currency),
            updated_at = NOW()
        WHERE id = TRUE
        RETURNING rate_per_unit, currency, updated_at
        "#,
    )
    .bind(payload.rate_per_unit)
    .bind(&payload.currency)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!("Billing rate updated to {}", settings.rate_per_unit);

    Ok(Json(settings))
}
