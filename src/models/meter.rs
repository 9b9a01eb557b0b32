use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Meter {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub serial_number: String,
    pub installed_at: Option<NaiveDate>,
    pub last_reading: Decimal,
    pub initial_reading_before: Option<Decimal>,
    pub initial_reading_after: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "reading_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    Approved,
    Pending,
    Rejected,
}

impl Default for ReadingStatus {
    fn default() -> Self {
        Self::Approved
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MeterReading {
    pub id: Uuid,
    pub meter_id: Uuid,
    pub shop_id: Uuid,
    pub reading_value: Decimal,
    pub previous_reading_value: Decimal,
    pub photo_url: Option<String>,
    pub confidence: Option<i32>,
    pub status: ReadingStatus,
    pub is_manual: bool,
    pub notes: Option<String>,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyzeReadingRequest {
    pub image_base64: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConfirmReadingRequest {
    pub meter_id: Uuid,
    pub reading_value: Decimal,
    pub units_override: Option<Decimal>,
    pub analyzer_units: Option<Decimal>,
    pub confidence: Option<i32>,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
    pub billing_period: Option<String>,
}
