use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Json, Router,
};
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthUser};
use crate::models::{Invoice, InvoiceResponse, InvoiceSummaryResponse};
use crate::services::ledger_service;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_invoices))
        .route("/summary", get(get_summary))
        .route("/:id", get(get_invoice))
        .route("/:id/paid", patch(toggle_paid))
}

#[derive(Debug, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
pub struct InvoicesQuery {
    pub shop_id: Option<Uuid>,
    pub is_paid: Option<bool>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

async fn invoice_response(state: &AppState, invoice: Invoice) -> AppResult<InvoiceResponse> {
    let shop: (String, String) =
        sqlx::query_as("SELECT name, shop_number FROM shops WHERE id = $1")
            .bind(invoice.shop_id)
            .fetch_one(&state.pool)
            .await?;

    Ok(InvoiceResponse {
        id: invoice.id,
        reading_id: invoice.reading_id,
        shop_id: invoice.shop_id,
        shop_name: shop.0,
        shop_number: shop.1,
        units: invoice.units,
        rate_per_unit: invoice.rate_per_unit,
        total_amount: invoice.total_amount,
        billing_period: invoice.billing_period,
        is_paid: invoice.is_paid,
        issued_at: invoice.issued_at,
    })
}

/// Список счетов
#[utoipa::path(
    get,
    path = "/api/v1/invoices",
    tag = "invoices",
    security(("bearer_auth" = [])),
    params(
        ("shop_id" = Option<Uuid>, Query, description = "ID торговой точки"),
        ("is_paid" = Option<bool>, Query, description = "Статус оплаты"),
        ("page" = Option<i64>, Query, description = "Номер страницы"),
        ("limit" = Option<i64>, Query, description = "Количество записей")
    ),
    responses(
        (status = 200, description = "Список счетов", body = Vec<InvoiceResponse>),
        (status = 401, description = "Не авторизован")
    )
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<InvoicesQuery>,
) -> AppResult<Json<Vec<InvoiceResponse>>> {
    let limit = query.limit.unwrap_or(20).min(100);
    let offset = query.page.unwrap_or(0) * limit;

    let invoices = sqlx::query_as::<_, Invoice>(
        r#"
        SELECT * FROM invoices
        WHERE ($1::uuid IS NULL OR shop_id = $1)
          AND ($2::boolean IS NULL OR is_paid = $2)
        ORDER BY issued_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(&query.shop_id)
    .bind(&query.is_paid)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let mut response = Vec::new();
    for invoice in invoices {
        response.push(invoice_response(&state, invoice).await?);
    }

    Ok(Json(response))
}

/// Сводка по всем счетам: начислено, оплачено, долг
#[utoipa::path(
    get,
    path = "/api/v1/invoices/summary",
    tag = "invoices",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Сводка по счетам", body = InvoiceSummaryResponse),
        (status = 401, description = "Не авторизован")
    )
)]
pub async fn get_summary(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> AppResult<Json<InvoiceSummaryResponse>> {
    let invoices = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices")
        .fetch_all(&state.pool)
        .await?;

    let totals = ledger_service::invoice_totals(&invoices);
    let (paid, unpaid) = ledger_service::partition_by_status(invoices);

    let collection_rate = if totals.total_billed.is_zero() {
        0.0
    } else {
        (totals.total_paid / totals.total_billed)
            .to_f64()
            .unwrap_or(0.0)
    };

    Ok(Json(InvoiceSummaryResponse {
        totals,
        paid_count: paid.len(),
        unpaid_count: unpaid.len(),
        collection_rate,
    }))
}

/// Счёт по ID
#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}",
    tag = "invoices",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "ID счёта")
    ),
    responses(
        (status = 200, description = "Счёт", body = InvoiceResponse),
        (status = 401, description = "Не авторизован"),
        (status = 404, description = "Счёт не найден")
    )
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<InvoiceResponse>> {
    let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Счёт не найден".to_string()))?;

    Ok(Json(invoice_response(&state, invoice).await?))
}

/// Переключение статуса оплаты счёта
#[utoipa::path(
    patch,
    path = "/api/v1/invoices/{id}/paid",
    tag = "invoices",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "ID счёта")
    ),
    responses(
        (status = 200, description = "Статус оплаты изменён"),
        (status = 401, description = "Не авторизован"),
        (status = 404, description = "Счёт не найден")
    )
)]
pub async fn toggle_paid(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let invoice = ledger_service::toggle_paid(&state.pool, id).await?;

    Ok(Json(json!({
        "success": true,
        "invoice": invoice
    })))
}
