use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "TokBill API",
        version = "1.0.0",
        description = "Backend API для TokBill - учёт электросчётчиков и выставление счетов арендаторам",
        contact(
            name = "TokBill Team",
            email = "support@tokbill.kz"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    tags(
        (name = "auth", description = "Вход оператора"),
        (name = "shops", description = "Торговые точки и их счётчики"),
        (name = "readings", description = "Показания: распознавание и подтверждение"),
        (name = "invoices", description = "Счета и сводка по оплатам"),
        (name = "settings", description = "Настройки биллинга"),
        (name = "files", description = "Загрузка фото")
    ),
    paths(
        // Auth
        crate::api::auth::login,
        crate::api::auth::me,
        // Shops
        crate::api::shops::create_shop,
        crate::api::shops::list_shops,
        crate::api::shops::get_shop,
        crate::api::shops::update_shop,
        crate::api::shops::delete_shop,
        // Readings
        crate::api::readings::analyze_reading,
        crate::api::readings::confirm_reading,
        crate::api::readings::get_readings_history,
        // Invoices
        crate::api::invoices::list_invoices,
        crate::api::invoices::get_summary,
        crate::api::invoices::get_invoice,
        crate::api::invoices::toggle_paid,
        // Settings
        crate::api::settings::get_billing_settings,
        crate::api::settings::update_billing_settings,
        // Files
        crate::api::files::upload_photo,
    ),
    components(
        schemas(
            // Auth
            crate::api::auth::LoginRequest,
            crate::api::auth::LoginResponse,
            // Shops
            crate::models::Shop,
            crate::models::CreateShopRequest,
            crate::models::UpdateShopRequest,
            crate::models::ShopResponse,
            crate::api::shops::CreateShopResponse,
            // Meters & readings
            crate::models::Meter,
            crate::models::MeterReading,
            crate::models::ReadingStatus,
            crate::models::AnalyzeReadingRequest,
            crate::models::ConfirmReadingRequest,
            crate::api::readings::AnalyzePreviewResponse,
            crate::api::readings::ConfirmReadingResponse,
            // Invoices
            crate::models::Invoice,
            crate::models::InvoiceResponse,
            crate::models::InvoiceTotals,
            crate::models::InvoiceSummaryResponse,
            // Settings
            crate::models::BillingSettings,
            crate::models::UpdateBillingSettingsRequest,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}
