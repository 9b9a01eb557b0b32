use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Invoice, Meter, MeterReading, ReadingStatus};

/// Нормализация серийного номера: только буквы и цифры, нижний регистр.
/// Единственная стратегия нечёткого сопоставления - без расстояния Левенштейна.
pub fn normalize_serial(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

/// Поиск счётчика по распознанному серийному номеру
pub fn resolve_meter<'a>(raw_serial: &str, meters: &'a [Meter]) -> Option<&'a Meter> {
    let needle = normalize_serial(raw_serial);
    if needle.is_empty() {
        return None;
    }
    meters
        .iter()
        .find(|m| normalize_serial(&m.serial_number) == needle)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consumption {
    pub units: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsumptionInput {
    pub new_reading: Decimal,
    pub previous_reading: Decimal,
    pub units_override: Option<Decimal>,
    pub analyzer_units: Option<Decimal>,
}

/// Расчёт потреблённых единиц и суммы к оплате.
///
/// Приоритет источников (первый заполненный побеждает):
/// 1. ручная корректировка оператора
/// 2. количество единиц от распознавания
/// 3. дельта показаний, не ниже нуля
///
/// Отрицательная дельта (переполнение счётчика или ошибочное показание)
/// обнуляется: счёт с минусом не выставляется никогда.
pub fn compute_consumption(input: &ConsumptionInput, rate_per_unit: Decimal) -> Consumption {
    let units = if let Some(manual) = input.units_override {
        manual.max(Decimal::ZERO)
    } else if let Some(analyzed) = input.analyzer_units {
        analyzed.max(Decimal::ZERO)
    } else {
        (input.new_reading - input.previous_reading).max(Decimal::ZERO)
    };

    Consumption {
        units,
        amount: units * rate_per_unit,
    }
}

#[derive(Debug, Clone)]
pub struct NewReading {
    pub meter_id: Uuid,
    pub reading_value: Decimal,
    pub units_override: Option<Decimal>,
    pub analyzer_units: Option<Decimal>,
    pub confidence: Option<i32>,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
    pub billing_period: Option<String>,
}

/// Атомарная фиксация показания: запись показания, счёт 1:1 к нему
/// и продвижение `last_reading` счётчика - всё в одной транзакции.
///
/// Текущее состояние счётчика перечитывается уже внутри транзакции,
/// значение из сессии оператора не используется. UPDATE счётчика защищён
/// проверкой ожидаемого старого значения: параллельная подача показаний
/// на тот же счётчик завершается конфликтом и полным откатом.
pub async fn commit_reading(
    pool: &PgPool,
    new: NewReading,
    rate_per_unit: Decimal,
) -> AppResult<(MeterReading, Invoice)> {
    let mut tx = pool.begin().await?;

    let meter = sqlx::query_as::<_, Meter>("SELECT * FROM meters WHERE id = $1")
        .bind(new.meter_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Счётчик не найден".to_string()))?;

    let previous_value = meter.last_reading;

    let consumption = compute_consumption(
        &ConsumptionInput {
            new_reading: new.reading_value,
            previous_reading: previous_value,
            units_override: new.units_override,
            analyzer_units: new.analyzer_units,
        },
        rate_per_unit,
    );

    let is_manual = new.confidence.is_none();

    let reading = sqlx::query_as::<_, MeterReading>(
        r#"
        INSERT INTO meter_readings
            (meter_id, shop_id, reading_value, previous_reading_value,
             photo_url, confidence, status, is_manual, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(meter.id)
    .bind(meter.shop_id)
    .bind(new.reading_value)
    .bind(previous_value)
    .bind(&new.photo_url)
    .bind(new.confidence)
    .bind(ReadingStatus::Approved)
    .bind(is_manual)
    .bind(&new.notes)
    .fetch_one(&mut *tx)
    .await?;

    let invoice = sqlx::query_as::<_, Invoice>(
        r#"
        INSERT INTO invoices
            (reading_id, shop_id, units, rate_per_unit, total_amount, billing_period, is_paid)
        VALUES ($1, $2, $3, $4, $5, $6, FALSE)
        RETURNING *
        "#,
    )
    .bind(reading.id)
    .bind(meter.shop_id)
    .bind(consumption.units)
    .bind(rate_per_unit)
    .bind(consumption.amount)
    .bind(&new.billing_period)
    .fetch_one(&mut *tx)
    .await?;

    // оптимистичная блокировка: показание могли внести параллельно
    let updated = sqlx::query(
        "UPDATE meters SET last_reading = $1 WHERE id = $2 AND last_reading = $3",
    )
    .bind(new.reading_value)
    .bind(meter.id)
    .bind(previous_value)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::Conflict(
            "Показание по этому счётчику уже внесено, обновите данные".to_string(),
        ));
    }

    tx.commit().await?;

    Ok((reading, invoice))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn meter_with_serial(serial: &str) -> Meter {
        Meter {
            id: Uuid::new_v4(),
            shop_id: Uuid::new_v4(),
            serial_number: serial.to_string(),
            installed_at: None,
            last_reading: Decimal::from(1000),
            initial_reading_before: None,
            initial_reading_after: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_normalize_serial() {
        assert_eq!(normalize_serial("ABC-123"), "abc123");
        assert_eq!(normalize_serial("abc123"), "abc123");
        assert_eq!(normalize_serial("  AbC123 "), "abc123");
        assert_eq!(normalize_serial("№ 77/К"), "77");
        assert_eq!(normalize_serial("---"), "");
    }

    #[test]
    fn test_resolve_meter_fuzzy() {
        let meters = vec![meter_with_serial("XY001"), meter_with_serial("AB-777")];

        let found = resolve_meter("xy-001", &meters).expect("должен найтись");
        assert_eq!(found.serial_number, "XY001");

        let found = resolve_meter(" ab777 ", &meters).expect("должен найтись");
        assert_eq!(found.serial_number, "AB-777");

        assert!(resolve_meter("zz999", &meters).is_none());
        assert!(resolve_meter("", &meters).is_none());
        assert!(resolve_meter("-- --", &meters).is_none());
    }

    #[test]
    fn test_consumption_delta() {
        // счётчик 1000 -> 1045, тариф 45: 45 единиц на 2025
        let c = compute_consumption(
            &ConsumptionInput {
                new_reading: Decimal::from(1045),
                previous_reading: Decimal::from(1000),
                ..Default::default()
            },
            Decimal::from(45),
        );
        assert_eq!(c.units, Decimal::from(45));
        assert_eq!(c.amount, Decimal::from(2025));
    }

    #[test]
    fn test_consumption_never_negative() {
        let c = compute_consumption(
            &ConsumptionInput {
                new_reading: Decimal::from(900),
                previous_reading: Decimal::from(1000),
                ..Default::default()
            },
            Decimal::from(45),
        );
        assert_eq!(c.units, Decimal::ZERO);
        assert_eq!(c.amount, Decimal::ZERO);
    }

    #[test]
    fn test_consumption_override_wins() {
        // ручная корректировка важнее дельты
        let c = compute_consumption(
            &ConsumptionInput {
                new_reading: Decimal::from(1045),
                previous_reading: Decimal::from(1000),
                units_override: Some(Decimal::from(40)),
                analyzer_units: Some(Decimal::from(43)),
            },
            Decimal::from(45),
        );
        assert_eq!(c.units, Decimal::from(40));
        assert_eq!(c.amount, Decimal::from(1800));
    }

    #[test]
    fn test_consumption_analyzer_units_beat_delta() {
        let c = compute_consumption(
            &ConsumptionInput {
                new_reading: Decimal::from(1045),
                previous_reading: Decimal::from(1000),
                analyzer_units: Some(Decimal::from(43)),
                ..Default::default()
            },
            Decimal::from(45),
        );
        assert_eq!(c.units, Decimal::from(43));
    }

    #[test]
    fn test_consumption_first_reading() {
        // новый счётчик: предыдущее показание 0
        let c = compute_consumption(
            &ConsumptionInput {
                new_reading: Decimal::from(120),
                previous_reading: Decimal::ZERO,
                ..Default::default()
            },
            Decimal::from(45),
        );
        assert_eq!(c.units, Decimal::from(120));
    }

    #[test]
    fn test_consumption_negative_override_clamped() {
        let c = compute_consumption(
            &ConsumptionInput {
                new_reading: Decimal::from(1045),
                previous_reading: Decimal::from(1000),
                units_override: Some(Decimal::from(-5)),
                ..Default::default()
            },
            Decimal::from(45),
        );
        assert_eq!(c.units, Decimal::ZERO);
        assert_eq!(c.amount, Decimal::ZERO);
    }

    #[test]
    fn test_amount_uses_given_rate() {
        let input = ConsumptionInput {
            new_reading: Decimal::from(1045),
            previous_reading: Decimal::from(1000),
            ..Default::default()
        };

        let at_45 = compute_consumption(&input, Decimal::from(45));
        let at_50 = compute_consumption(&input, Decimal::from(50));

        assert_eq!(at_45.amount, at_45.units * Decimal::from(45));
        assert_eq!(at_50.amount, at_50.units * Decimal::from(50));
    }
}
