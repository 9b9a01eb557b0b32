use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Invoice, InvoiceTotals, MeterReading};

/// Последнее принятое показание по счётчику
pub async fn latest_reading(pool: &PgPool, meter_id: Uuid) -> AppResult<Option<MeterReading>> {
    let reading = sqlx::query_as::<_, MeterReading>(
        r#"
        SELECT * FROM meter_readings
        WHERE meter_id = $1
        ORDER BY captured_at DESC
        LIMIT 1
        "#,
    )
    .bind(meter_id)
    .fetch_optional(pool)
    .await?;

    Ok(reading)
}

/// Агрегаты по набору счетов: единицы, начислено, оплачено, долг
pub fn invoice_totals(invoices: &[Invoice]) -> InvoiceTotals {
    let mut totals = InvoiceTotals::default();

    for invoice in invoices {
        totals.total_units += invoice.units;
        totals.total_billed += invoice.total_amount;
        if invoice.is_paid {
            totals.total_paid += invoice.total_amount;
        }
    }

    totals.outstanding = totals.total_billed - totals.total_paid;
    totals
}

/// Разбивка на оплаченные и неоплаченные
pub fn partition_by_status(invoices: Vec<Invoice>) -> (Vec<Invoice>, Vec<Invoice>) {
    invoices.into_iter().partition(|i| i.is_paid)
}

/// Переключение статуса оплаты - единственная разрешённая мутация счёта
pub async fn toggle_paid(pool: &PgPool, invoice_id: Uuid) -> AppResult<Invoice> {
    let invoice = sqlx::query_as::<_, Invoice>(
        "UPDATE invoices SET is_paid = NOT is_paid WHERE id = $1 RETURNING *",
    )
    .bind(invoice_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Счёт не найден".to_string()))?;

    Ok(invoice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn invoice(units: i64, rate: i64, paid: bool) -> Invoice {
        let units = Decimal::from(units);
        let rate = Decimal::from(rate);
        Invoice {
            id: Uuid::new_v4(),
            reading_id: Uuid::new_v4(),
            shop_id: Uuid::new_v4(),
            units,
            rate_per_unit: rate,
            total_amount: units * rate,
            billing_period: None,
            is_paid: paid,
            issued_at: Utc::now(),
        }
    }

    #[test]
    fn test_invoice_totals() {
        let invoices = vec![
            invoice(45, 45, true),  // 2025 оплачен
            invoice(40, 45, false), // 1800
            invoice(10, 50, false), // 500
        ];

        let totals = invoice_totals(&invoices);
        assert_eq!(totals.total_units, Decimal::from(95));
        assert_eq!(totals.total_billed, Decimal::from(4325));
        assert_eq!(totals.total_paid, Decimal::from(2025));
        assert_eq!(totals.outstanding, Decimal::from(2300));
    }

    #[test]
    fn test_invoice_totals_empty() {
        let totals = invoice_totals(&[]);
        assert_eq!(totals, InvoiceTotals::default());
    }

    #[test]
    fn test_partition_by_status() {
        let invoices = vec![
            invoice(1, 45, true),
            invoice(2, 45, false),
            invoice(3, 45, true),
        ];

        let (paid, unpaid) = partition_by_status(invoices);
        assert_eq!(paid.len(), 2);
        assert_eq!(unpaid.len(), 1);
        assert!(paid.iter().all(|i| i.is_paid));
        assert!(unpaid.iter().all(|i| !i.is_paid));
    }

    #[test]
    fn test_double_toggle_keeps_amount() {
        // двойное переключение возвращает исходный статус, сумма не меняется
        let mut inv = invoice(45, 45, false);
        let original_amount = inv.total_amount;
        let original_status = inv.is_paid;

        inv.is_paid = !inv.is_paid;
        inv.is_paid = !inv.is_paid;

        assert_eq!(inv.is_paid, original_status);
        assert_eq!(inv.total_amount, original_amount);
    }
}
