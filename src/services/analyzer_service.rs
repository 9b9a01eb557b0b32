use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{AppError, AppResult};

pub struct AnalyzerService {
    config: Config,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    image: &'a str,
    known_serials: &'a [String],
}

#[derive(Debug, Deserialize)]
struct AnalyzeApiResponse {
    serial_number: Option<String>,
    reading_value: Option<f64>,
    consumed_units: Option<f64>,
    confidence: Option<f64>,
}

/// Проверенный результат распознавания. Значения уже отвалидированы:
/// показание конечное и неотрицательное, уверенность приведена к шкале 0-100.
#[derive(Debug, Clone)]
pub struct AnalyzedReading {
    pub serial_number: String,
    pub reading_value: Decimal,
    pub consumed_units: Option<Decimal>,
    pub confidence: i32,
}

impl AnalyzerService {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Отправка снимка счётчика во внешний сервис распознавания.
    ///
    /// Ответ сервиса - недоверенные данные: числа проверяются и зажимаются
    /// до того, как попадут в расчёт потребления. Мусорный ответ - это
    /// повторяемая ошибка, а не паника и не молчаливый ноль в счёте.
    pub async fn analyze(
        &self,
        image_base64: &str,
        known_serials: &[String],
    ) -> AppResult<AnalyzedReading> {
        if !self.config.analyzer_enabled {
            return Err(AppError::Analyzer(
                "Распознавание отключено, внесите показание вручную".to_string(),
            ));
        }

        if BASE64.decode(image_base64).is_err() {
            return Err(AppError::Analyzer(
                "Некорректный формат изображения".to_string(),
            ));
        }

        let request = AnalyzeRequest {
            image: image_base64,
            known_serials,
        };

        let response = self
            .client
            .post(&self.config.analyzer_api_url)
            .bearer_auth(&self.config.analyzer_api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Analyzer(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Analyzer API error: {}", status);
            return Err(AppError::Analyzer(format!(
                "Сервис распознавания недоступен: {}",
                status
            )));
        }

        let body: AnalyzeApiResponse = response
            .json()
            .await
            .map_err(|e| AppError::Analyzer(e.to_string()))?;

        Self::validate(body)
    }

    fn validate(body: AnalyzeApiResponse) -> AppResult<AnalyzedReading> {
        let raw_value = body.reading_value.ok_or_else(|| {
            AppError::Analyzer("Показание не распознано, попробуйте ещё раз".to_string())
        })?;

        if !raw_value.is_finite() || raw_value < 0.0 {
            return Err(AppError::Analyzer(
                "Распознано некорректное показание".to_string(),
            ));
        }

        let reading_value = Decimal::from_f64(raw_value).ok_or_else(|| {
            AppError::Analyzer("Распознано некорректное показание".to_string())
        })?;

        let consumed_units = body
            .consumed_units
            .filter(|u| u.is_finite() && *u >= 0.0)
            .and_then(Decimal::from_f64);

        Ok(AnalyzedReading {
            serial_number: body.serial_number.unwrap_or_default(),
            reading_value,
            consumed_units,
            confidence: normalize_confidence(body.confidence.unwrap_or(0.0)),
        })
    }
}

/// Приведение уверенности к шкале 0-100: сервис отдаёт то долю (0-1),
/// то проценты - значения не выше единицы считаются долей.
pub fn normalize_confidence(raw: f64) -> i32 {
    if !raw.is_finite() {
        return 0;
    }
    let scaled = if raw <= 1.0 { raw * 100.0 } else { raw };
    scaled.clamp(0.0, 100.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_confidence() {
        assert_eq!(normalize_confidence(0.87), 87);
        assert_eq!(normalize_confidence(92.4), 92);
        assert_eq!(normalize_confidence(1.0), 100);
        assert_eq!(normalize_confidence(0.0), 0);
        assert_eq!(normalize_confidence(-0.5), 0);
        assert_eq!(normalize_confidence(450.0), 100);
        assert_eq!(normalize_confidence(f64::NAN), 0);
    }

    #[test]
    fn test_validate_rejects_missing_value() {
        let body = AnalyzeApiResponse {
            serial_number: Some("XY001".to_string()),
            reading_value: None,
            consumed_units: None,
            confidence: Some(0.9),
        };
        assert!(AnalyzerService::validate(body).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_value() {
        let body = AnalyzeApiResponse {
            serial_number: Some("XY001".to_string()),
            reading_value: Some(-10.0),
            consumed_units: None,
            confidence: Some(0.9),
        };
        assert!(AnalyzerService::validate(body).is_err());
    }

    #[test]
    fn test_validate_drops_garbage_units() {
        let body = AnalyzeApiResponse {
            serial_number: None,
            reading_value: Some(1045.0),
            consumed_units: Some(f64::INFINITY),
            confidence: Some(0.75),
        };
        let analyzed = AnalyzerService::validate(body).unwrap();
        assert_eq!(analyzed.serial_number, "");
        assert_eq!(analyzed.reading_value, Decimal::from(1045));
        assert!(analyzed.consumed_units.is_none());
        assert_eq!(analyzed.confidence, 75);
    }
}
