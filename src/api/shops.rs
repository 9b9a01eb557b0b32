use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthUser};
use crate::models::{CreateShopRequest, Meter, Shop, ShopResponse, UpdateShopRequest};
use crate::services::billing_service::normalize_serial;
use crate::services::ledger_service;
use crate::utils::validators::{sanitize_string, validate_iin, validate_phone};

/// Ответ на регистрацию торговой точки
#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct CreateShopResponse {
    pub success: bool,
    pub shop_id: Uuid,
    pub meter_id: Uuid,
    pub serial_warning: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_shop).get(list_shops))
        .route("/:id", get(get_shop).put(update_shop).delete(delete_shop))
}

#[derive(Debug, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
pub struct ShopsQuery {
    pub query: Option<String>,
}

fn validate_shop_fields(
    name: &str,
    owner_name: &str,
    national_id: &str,
    phone: &str,
    shop_number: &str,
) -> AppResult<()> {
    if name.is_empty() || owner_name.is_empty() || shop_number.is_empty() {
        return Err(AppError::Validation(
            "Название, имя владельца и номер точки обязательны".to_string(),
        ));
    }

    if !validate_phone(phone) {
        return Err(AppError::Validation(
            "Неверный формат номера телефона".to_string(),
        ));
    }

    if !validate_iin(national_id) {
        return Err(AppError::Validation("Неверный формат ИИН".to_string()));
    }

    Ok(())
}

/// Поиск дубликата серийного номера среди существующих счётчиков
async fn find_serial_duplicate(state: &AppState, serial: &str) -> AppResult<Option<String>> {
    let needle = normalize_serial(serial);
    if needle.is_empty() {
        return Err(AppError::Validation(
            "Серийный номер счётчика обязателен".to_string(),
        ));
    }

    let serials: Vec<(String,)> = sqlx::query_as("SELECT serial_number FROM meters")
        .fetch_all(&state.pool)
        .await?;

    Ok(serials
        .into_iter()
        .map(|(s,)| s)
        .find(|s| normalize_serial(s) == needle))
}

/// Регистрация торговой точки вместе со счётчиком
#[utoipa::path(
    post,
    path = "/api/v1/shops",
    tag = "shops",
    security(("bearer_auth" = [])),
    request_body = CreateShopRequest,
    responses(
        (status = 200, description = "Точка зарегистрирована", body = CreateShopResponse),
        (status = 401, description = "Не авторизован"),
        (status = 422, description = "Ошибка валидации")
    )
)]
pub async fn create_shop(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Json(payload): Json<CreateShopRequest>,
) -> AppResult<Json<Value>> {
    let name = sanitize_string(&payload.name);
    let owner_name = sanitize_string(&payload.owner_name);
    let national_id = sanitize_string(&payload.national_id);
    let phone = sanitize_string(&payload.phone);
    let shop_number = sanitize_string(&payload.shop_number);
    let serial_number = sanitize_string(&payload.meter_serial_number);

    // вся валидация до первой записи в базу
    validate_shop_fields(&name, &owner_name, &national_id, &phone, &shop_number)?;

    // дубликат серийного номера - предупреждение, не отказ
    let serial_warning = find_serial_duplicate(&state, &serial_number)
        .await?
        .map(|existing| format!("Счётчик с серийным номером {} уже зарегистрирован", existing));

    // стартовое показание задаёт точку отсчёта, счёт за прошлое не выставляется
    let initial_reading = payload
        .initial_reading_after
        .or(payload.initial_reading_before)
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO);

    let mut tx = state.pool.begin().await?;

    let shop: Shop = sqlx::query_as(
        r#"
        INSERT INTO shops (name, owner_name, national_id, phone, address, shop_number, photo_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(&name)
    .bind(&owner_name)
    .bind(&national_id)
    .bind(&phone)
    .bind(&payload.address)
    .bind(&shop_number)
    .bind(&payload.photo_url)
    .fetch_one(&mut *tx)
    .await?;

    let meter: Meter = sqlx::query_as(
        r#"
        INSERT INTO meters
            (shop_id, serial_number, installed_at, last_reading,
             initial_reading_before, initial_reading_after)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(shop.id)
    .bind(&serial_number)
    .bind(payload.meter_installed_at)
    .bind(initial_reading)
    .bind(payload.initial_reading_before)
    .bind(payload.initial_reading_after)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    if let Some(warning) = &serial_warning {
        tracing::warn!("Duplicate meter serial on registration: {}", warning);
    }

    Ok(Json(json!({
        "success": true,
        "shop_id": shop.id,
        "meter_id": meter.id,
        "serial_warning": serial_warning
    })))
}

async fn shop_response(state: &AppState, shop: Shop) -> AppResult<ShopResponse> {
    let meter = sqlx::query_as::<_, Meter>("SELECT * FROM meters WHERE shop_id = $1")
        .bind(shop.id)
        .fetch_optional(&state.pool)
        .await?;

    let last_reading_date = match &meter {
        Some(m) => ledger_service::latest_reading(&state.pool, m.id)
            .await?
            .map(|r| r.captured_at),
        None => None,
    };

    Ok(ShopResponse {
        id: shop.id,
        name: shop.name,
        owner_name: shop.owner_name,
        national_id: shop.national_id,
        phone: shop.phone,
        address: shop.address,
        shop_number: shop.shop_number,
        photo_url: shop.photo_url,
        registered_at: shop.registered_at,
        meter_id: meter.as_ref().map(|m| m.id),
        meter_serial_number: meter.as_ref().map(|m| m.serial_number.clone()),
        last_reading: meter.as_ref().map(|m| m.last_reading),
        last_reading_date,
    })
}

/// Список торговых точек
#[utoipa::path(
    get,
    path = "/api/v1/shops",
    tag = "shops",
    security(("bearer_auth" = [])),
    params(
        ("query" = Option<String>, Query, description = "Поиск по названию или владельцу")
    ),
    responses(
        (status = 200, description = "Список точек", body = Vec<ShopResponse>),
        (status = 401, description = "Не авторизован")
    )
)]
pub async fn list_shops(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<ShopsQuery>,
) -> AppResult<Json<Vec<ShopResponse>>> {
    let search_pattern = query.query.as_ref().map(|q| format!("%{}%", q));

    let shops = sqlx::query_as::<_, Shop>(
        r#"
        SELECT * FROM shops
        WHERE ($1::varchar IS NULL OR name ILIKE $1 OR owner_name ILIKE $1 OR shop_number ILIKE $1)
        ORDER BY shop_number
        "#,
    )
    .bind(&search_pattern)
    .fetch_all(&state.pool)
    .await?;

    let mut response = Vec::new();
    for shop in shops {
        response.push(shop_response(&state, shop).await?);
    }

    Ok(Json(response))
}

/// Торговая точка по ID
#[utoipa::path(
    get,
    path = "/api/v1/shops/{id}",
    tag = "shops",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "ID торговой точки")
    ),
    responses(
        (status = 200, description = "Торговая точка", body = ShopResponse),
        (status = 401, description = "Не авторизован"),
        (status = 404, description = "Точка не найдена")
    )
)]
pub async fn get_shop(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ShopResponse>> {
    let shop = sqlx::query_as::<_, Shop>("SELECT * FROM shops WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Торговая точка не найдена".to_string()))?;

    Ok(Json(shop_response(&state, shop).await?))
}

/// Редактирование торговой точки
#[utoipa::path(
    put,
    path = "/api/v1/shops/{id}",
    tag = "shops",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "ID торговой точки")
    ),
    request_body = UpdateShopRequest,
    responses(
        (status = 200, description = "Точка обновлена", body = ShopResponse),
        (status = 401, description = "Не авторизован"),
        (status = 404, description = "Точка не найдена"),
        (status = 422, description = "Ошибка валидации")
    )
)]
pub async fn update_shop(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateShopRequest>,
) -> AppResult<Json<ShopResponse>> {
    if let Some(phone) = &payload.phone {
        if !validate_phone(phone) {
            return Err(AppError::Validation(
                "Неверный формат номера телефона".to_string(),
            ));
        }
    }

    if let Some(national_id) = &payload.national_id {
        if !validate_iin(national_id) {
            return Err(AppError::Validation("Неверный формат ИИН".to_string()));
        }
    }

    let shop = sqlx::query_as::<_, Shop>(
        r#"
        UPDATE shops SET
            name = COALESCE($2, name),
            owner_name = COALESCE($3, owner_name),
            national_id = COALESCE($4, national_id),
            phone = COALESCE($5, phone),
            address = COALESCE($6, address),
            shop_number = COALESCE($7, shop_number),
            photo_url = COALESCE($8, photo_url)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&payload.name)
    .bind(&payload.owner_name)
    .bind(&payload.national_id)
    .bind(&payload.phone)
    .bind(&payload.address)
    .bind(&payload.shop_number)
    .bind(&payload.photo_url)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Торговая точка не найдена".to_string()))?;

    if let Some(serial) = &payload.meter_serial_number {
        let serial = sanitize_string(serial);
        if serial.is_empty() {
            return Err(AppError::Validation(
                "Серийный номер счётчика обязателен".to_string(),
            ));
        }

        sqlx::query("UPDATE meters SET serial_number = $1 WHERE shop_id = $2")
            .bind(&serial)
            .bind(id)
            .execute(&state.pool)
            .await?;
    }

    Ok(Json(shop_response(&state, shop).await?))
}

/// Удаление торговой точки со всей историей
#[utoipa::path(
    delete,
    path = "/api/v1/shops/{id}",
    tag = "shops",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "ID торговой точки")
    ),
    responses(
        (status = 200, description = "Точка удалена"),
        (status = 401, description = "Не авторизован"),
        (status = 404, description = "Точка не найдена")
    )
)]
pub async fn delete_shop(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    // каскад: счётчик, показания и счета удаляются вместе с точкой
    let result = sqlx::query("DELETE FROM shops WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Торговая точка не найдена".to_string()));
    }

    tracing::info!("Shop {} deleted with all readings and invoices", id);

    Ok(Json(json!({
        "success": true
    })))
}
