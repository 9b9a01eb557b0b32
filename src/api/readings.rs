use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthUser};
use crate::models::{AnalyzeReadingRequest, ConfirmReadingRequest, Meter, MeterReading, Shop};
use crate::services::billing_service::{
    commit_reading, compute_consumption, resolve_meter, ConsumptionInput, NewReading,
};
use crate::services::AnalyzerService;

use super::settings::load_settings;

/// Предпросмотр распознанного показания - в базу ничего не пишется
#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct AnalyzePreviewResponse {
    pub matched: bool,
    pub serial_number: String,
    pub reading_value: Decimal,
    pub confidence: i32,
    pub shop_id: Option<Uuid>,
    pub shop_name: Option<String>,
    pub meter_id: Option<Uuid>,
    pub meter_serial_number: Option<String>,
    pub previous_reading: Option<Decimal>,
    pub units: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub rate_per_unit: Decimal,
}

/// Ответ на подтверждение показания
#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ConfirmReadingResponse {
    pub success: bool,
    pub reading: MeterReading,
    pub invoice: crate::models::Invoice,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/analyze", post(analyze_reading))
        .route("/confirm", post(confirm_reading))
        .route("/history", get(get_readings_history))
}

/// Распознавание снимка счётчика
///
/// Сервис распознавания может ошибаться, поэтому результат - только
/// предпросмотр: оператор подтверждает его отдельным запросом.
#[utoipa::path(
    post,
    path = "/api/v1/readings/analyze",
    tag = "readings",
    security(("bearer_auth" = [])),
    request_body = AnalyzeReadingRequest,
    responses(
        (status = 200, description = "Предпросмотр показания", body = AnalyzePreviewResponse),
        (status = 401, description = "Не авторизован"),
        (status = 503, description = "Сервис распознавания недоступен")
    )
)]
pub async fn analyze_reading(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Json(payload): Json<AnalyzeReadingRequest>,
) -> AppResult<Json<AnalyzePreviewResponse>> {
    let meters = sqlx::query_as::<_, Meter>("SELECT * FROM meters")
        .fetch_all(&state.pool)
        .await?;

    let known_serials: Vec<String> = meters.iter().map(|m| m.serial_number.clone()).collect();

    let analyzer = AnalyzerService::new(state.config.clone());
    let analyzed = analyzer.analyze(&payload.image_base64, &known_serials).await?;

    let settings = load_settings(&state.pool).await?;

    let matched_meter = resolve_meter(&analyzed.serial_number, &meters);

    let preview = match matched_meter {
        Some(meter) => {
            let shop = sqlx::query_as::<_, Shop>("SELECT * FROM shops WHERE id = $1")
                .bind(meter.shop_id)
                .fetch_optional(&state.pool)
                .await?;

            let consumption = compute_consumption(
                &ConsumptionInput {
                    new_reading: analyzed.reading_value,
                    previous_reading: meter.last_reading,
                    units_override: None,
                    analyzer_units: analyzed.consumed_units,
                },
                settings.rate_per_unit,
            );

            AnalyzePreviewResponse {
                matched: true,
                serial_number: analyzed.serial_number,
                reading_value: analyzed.reading_value,
                confidence: analyzed.confidence,
                shop_id: Some(meter.shop_id),
                shop_name: shop.map(|s| s.name),
                meter_id: Some(meter.id),
                meter_serial_number: Some(meter.serial_number.clone()),
                previous_reading: Some(meter.last_reading),
                units: Some(consumption.units),
                amount: Some(consumption.amount),
                rate_per_unit: settings.rate_per_unit,
            }
        }
        // счётчик не распознан: точку выбирает оператор, без этого счёт не создаётся
        None => AnalyzePreviewResponse {
            matched: false,
            serial_number: analyzed.serial_number,
            reading_value: analyzed.reading_value,
            confidence: analyzed.confidence,
            shop_id: None,
            shop_name: None,
            meter_id: None,
            meter_serial_number: None,
            previous_reading: None,
            units: None,
            amount: None,
            rate_per_unit: settings.rate_per_unit,
        },
    };

    Ok(Json(preview))
}

/// Подтверждение показания и выставление счёта
///
/// Единственная операция, создающая показание и счёт: запись показания,
/// счёт и продвижение счётчика происходят в одной транзакции.
#[utoipa::path(
    post,
    path = "/api/v1/readings/confirm",
    tag = "readings",
    security(("bearer_auth" = [])),
    request_body = ConfirmReadingRequest,
    responses(
        (status = 200, description = "Показание зафиксировано, счёт выставлен", body = ConfirmReadingResponse),
        (status = 401, description = "Не авторизован"),
        (status = 404, description = "Счётчик не найден"),
        (status = 409, description = "Показание уже внесено параллельно"),
        (status = 422, description = "Ошибка валидации")
    )
)]
pub async fn confirm_reading(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Json(payload): Json<ConfirmReadingRequest>,
) -> AppResult<Json<Value>> {
    if payload.reading_value < Decimal::ZERO {
        return Err(AppError::Validation(
            "Показание не может быть отрицательным".to_string(),
        ));
    }

    if let Some(confidence) = payload.confidence {
        if !(0..=100).contains(&confidence) {
            return Err(AppError::Validation(
                "Уверенность распознавания вне диапазона 0-100".to_string(),
            ));
        }
    }

    // тариф читается в момент подтверждения и замораживается в счёте
    let settings = load_settings(&state.pool).await?;

    let (reading, invoice) = commit_reading(
        &state.pool,
        NewReading {
            meter_id: payload.meter_id,
            reading_value: payload.reading_value,
            units_override: payload.units_override,
            analyzer_units: payload.analyzer_units,
            confidence: payload.confidence,
            photo_url: payload.photo_url,
            notes: payload.notes,
            billing_period: payload.billing_period,
        },
        settings.rate_per_unit,
    )
    .await?;

    tracing::info!(
        "Reading {} confirmed for meter {}: {} units, {} {}",
        reading.id,
        reading.meter_id,
        invoice.units,
        invoice.total_amount,
        settings.currency
    );

    Ok(Json(json!({
        "success": true,
        "reading": reading,
        "invoice": invoice
    })))
}

#[derive(Debug, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
pub struct ReadingsHistoryQuery {
    pub meter_id: Uuid,
    pub limit: Option<i64>,
}

/// История показаний счётчика
#[utoipa::path(
    get,
    path = "/api/v1/readings/history",
    tag = "readings",
    security(("bearer_auth" = [])),
    params(
        ("meter_id" = Uuid, Query, description = "ID счётчика"),
        ("limit" = Option<i64>, Query, description = "Количество записей")
    ),
    responses(
        (status = 200, description = "История показаний", body = Vec<MeterReading>),
        (status = 401, description = "Не авторизован"),
        (status = 404, description = "Счётчик не найден")
    )
)]
pub async fn get_readings_history(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(params): Query<ReadingsHistoryQuery>,
) -> AppResult<Json<Vec<MeterReading>>> {
    let meter = sqlx::query_as::<_, Meter>("SELECT * FROM meters WHERE id = $1")
        .bind(params.meter_id)
        .fetch_optional(&state.pool)
        .await?;

    if meter.is_none() {
        return Err(AppError::NotFound("Счётчик не найден".to_string()));
    }

    let limit = params.limit.unwrap_or(12).clamp(1, 100);

    let readings = sqlx::query_as::<_, MeterReading>(
        r#"
        SELECT * FROM meter_readings
        WHERE meter_id = $1
        ORDER BY captured_at DESC
        LIMIT $2
        "#,
    )
    .bind(params.meter_id)
    .bind(limit)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(readings))
}
