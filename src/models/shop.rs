use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Shop {
    pub id: Uuid,
    pub name: String,
    pub owner_name: String,
    pub national_id: String,
    pub phone: String,
    pub address: Option<String>,
    pub shop_number: String,
    pub photo_url: Option<String>,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateShopRequest {
    pub name: String,
    pub owner_name: String,
    pub national_id: String,
    pub phone: String,
    pub address: Option<String>,
    pub shop_number: String,
    pub photo_url: Option<String>,
    pub meter_serial_number: String,
    pub meter_installed_at: Option<NaiveDate>,
    pub initial_reading_before: Option<Decimal>,
    pub initial_reading_after: Option<Decimal>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateShopRequest {
    pub name: Option<String>,
    pub owner_name: Option<String>,
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub shop_number: Option<String>,
    pub photo_url: Option<String>,
    pub meter_serial_number: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShopResponse {
    pub id: Uuid,
    pub name: String,
    pub owner_name: String,
    pub national_id: String,
    pub phone: String,
    pub address: Option<String>,
    pub shop_number: String,
    pub photo_url: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub meter_id: Option<Uuid>,
    pub meter_serial_number: Option<String>,
    pub last_reading: Option<Decimal>,
    pub last_reading_date: Option<DateTime<Utc>>,
}
