use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Invoice {
    pub id: Uuid,
    pub reading_id: Uuid,
    pub shop_id: Uuid,
    pub units: Decimal,
    pub rate_per_unit: Decimal,
    pub total_amount: Decimal,
    pub billing_period: Option<String>,
    pub is_paid: bool,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub reading_id: Uuid,
    pub shop_id: Uuid,
    pub shop_name: String,
    pub shop_number: String,
    pub units: Decimal,
    pub rate_per_unit: Decimal,
    pub total_amount: Decimal,
    pub billing_period: Option<String>,
    pub is_paid: bool,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Default, PartialEq, Serialize, ToSchema)]
pub struct InvoiceTotals {
    pub total_units: Decimal,
    pub total_billed: Decimal,
    pub total_paid: Decimal,
    pub outstanding: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceSummaryResponse {
    pub totals: InvoiceTotals,
    pub paid_count: usize,
    pub unpaid_count: usize,
    pub collection_rate: f64,
}
