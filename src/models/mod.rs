pub mod invoice;
pub mod meter;
pub mod settings;
pub mod shop;

pub use invoice::{Invoice, InvoiceResponse, InvoiceSummaryResponse, InvoiceTotals};
pub use meter::{
    AnalyzeReadingRequest, ConfirmReadingRequest, Meter, MeterReading, ReadingStatus,
};
pub use settings::{BillingSettings, UpdateBillingSettingsRequest};
pub use shop::{CreateShopRequest, Shop, ShopResponse, UpdateShopRequest};
