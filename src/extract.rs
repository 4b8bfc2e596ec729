//! Feature extraction: request body -> validated [`WeatherReading`].
//!
//! Structured bodies are read field by field. Free text goes through one of
//! two strategies:
//! - positional: the first four numbers, in order, are temperature,
//!   humidity, pressure and wind speed
//! - labeled: each field is located on its own, either by a keyword in
//!   front of the number (`pressure 1010`) or a unit behind it (`1010 hPa`)
//!
//! In the labeled patterns only separators (`:`, `=`, whitespace) and a couple
//! of connective words (`is`, `of`, `about`, ...) may sit between a keyword and
//! its number, so a keyword never reaches across another field's text.
//! Keywords are never matched after the number (`50 pressure`), only units are.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::{ExtractionStrategy, PredictionSettings};
use crate::models::{Field, PredictRequest, WeatherReading};

// ---

/// Why a request could not be turned into a feature vector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    #[error("missing field '{}'", .0.json_key())]
    MissingField(Field),

    #[error("field '{}' is not a number", .0.json_key())]
    NotNumeric(Field),

    #[error(
        "insufficient values extracted: found {found} of 4 \
         (temperature, humidity, pressure, wind speed)"
    )]
    InsufficientValues { found: usize },

    #[error("could not extract {0} from the message")]
    MissingLabel(Field),

    #[error("{field} {value} is out of range [{lo}, {hi}]")]
    OutOfRange {
        field: Field,
        value: f64,
        lo: f64,
        hi: f64,
    },
}

const NUMBER: &str = r"[-+]?(?:\d+(?:\.\d+)?|\.\d+)";

/// What may separate a keyword from its number: `temperature: 25`,
/// `pressure is about 1010`, `humidity=40`.
const GAP: &str =
    r"[\s:=]*(?:(?:is|was|of|at|about|around|approximately|roughly)\s+){0,2}[\s:=]*";

static ANY_NUMBER: Lazy<Regex> = Lazy::new(|| compile(NUMBER));

static TEMPERATURE: Lazy<Regex> = Lazy::new(|| {
    labeled(
        r"temp(?:erature)?",
        r"(?:°\s*c\b|degrees?\b(?:\s*c(?:elsius)?\b)?|celsius\b)",
    )
});

static HUMIDITY: Lazy<Regex> = Lazy::new(|| labeled(r"(?:relative\s+)?humidity", r"%"));

static PRESSURE: Lazy<Regex> =
    Lazy::new(|| labeled(r"(?:barometric\s+)?pressure", r"(?:hpa|mbar|mb)\b"));

static WIND_SPEED: Lazy<Regex> = Lazy::new(|| {
    labeled(
        r"wind(?:\s*speed)?",
        r"(?:m\s*/\s*s\b|mps\b|meters?\s+per\s+second\b)",
    )
});

/// Build a case-insensitive pattern with two capture groups: the number
/// after `label`, or the number before `unit`.
fn labeled(label: &str, unit: &str) -> Regex {
    compile(&format!(
        r"(?i)\b{label}\b{GAP}({NUMBER})|({NUMBER})\s*{unit}"
    ))
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid extraction pattern {pattern}: {e}"))
}

// ---

/// Extract and (optionally) range-check the features carried by `request`.
pub fn extract(
    request: &PredictRequest,
    settings: &PredictionSettings,
) -> Result<WeatherReading, ExtractionError> {
    // ---
    let reading = match request {
        PredictRequest::Message(text) | PredictRequest::Query(text) => {
            from_text(text, settings.strategy)?
        }
        PredictRequest::Fields(map) => from_fields(map)?,
    };

    if settings.validate_ranges {
        validate(&reading)?;
    }
    Ok(reading)
}

/// Structured path. Numbers are taken as-is, numeric strings are parsed.
pub fn from_fields(map: &Map<String, Value>) -> Result<WeatherReading, ExtractionError> {
    // ---
    let mut features = [0.0; 4];
    for (slot, field) in features.iter_mut().zip(Field::ALL) {
        let value = match field {
            Field::WindSpeed => map.get("windspeed").or_else(|| map.get("wind_speed")),
            _ => map.get(field.json_key()),
        };
        *slot = parse_value(field, value)?;
    }
    Ok(WeatherReading::from_features(features))
}

fn parse_value(field: Field, value: Option<&Value>) -> Result<f64, ExtractionError> {
    let number = match value {
        None | Some(Value::Null) => return Err(ExtractionError::MissingField(field)),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    number
        .filter(|v| v.is_finite())
        .ok_or(ExtractionError::NotNumeric(field))
}

/// Text path using the given strategy.
pub fn from_text(
    text: &str,
    strategy: ExtractionStrategy,
) -> Result<WeatherReading, ExtractionError> {
    match strategy {
        ExtractionStrategy::Positional => extract_positional(text),
        ExtractionStrategy::Labeled => extract_labeled(text),
    }
}

/// The first four numbers in `text`, in order of appearance.
pub fn extract_positional(text: &str) -> Result<WeatherReading, ExtractionError> {
    // ---
    let numbers: Vec<f64> = ANY_NUMBER
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect();

    match numbers[..] {
        [temperature, humidity, pressure, wind_speed, ..] => Ok(WeatherReading {
            temperature,
            humidity,
            pressure,
            wind_speed,
        }),
        _ => Err(ExtractionError::InsufficientValues {
            found: numbers.len(),
        }),
    }
}

/// Each field located independently by keyword or unit.
pub fn extract_labeled(text: &str) -> Result<WeatherReading, ExtractionError> {
    // ---
    let mut features = [0.0; 4];
    for (slot, field) in features.iter_mut().zip(Field::ALL) {
        *slot = find_labeled(field, text)?;
    }
    Ok(WeatherReading::from_features(features))
}

fn find_labeled(field: Field, text: &str) -> Result<f64, ExtractionError> {
    let pattern: &Regex = match field {
        Field::Temperature => &*TEMPERATURE,
        Field::Humidity => &*HUMIDITY,
        Field::Pressure => &*PRESSURE,
        Field::WindSpeed => &*WIND_SPEED,
    };

    pattern
        .captures(text)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .ok_or(ExtractionError::MissingLabel(field))
}

/// Check every field against its physical range, in feature order.
pub fn validate(reading: &WeatherReading) -> Result<(), ExtractionError> {
    // ---
    for field in Field::ALL {
        let value = reading.get(field);
        let (lo, hi) = field.range();
        if !(lo..=hi).contains(&value) {
            return Err(ExtractionError::OutOfRange {
                field,
                value,
                lo,
                hi,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_structured_numbers() {
        // ---
        let reading = from_fields(&fields(json!({
            "temperature": 25.0,
            "humidity": 40,
            "pressure": 1010.0,
            "windspeed": 3.0
        })))
        .unwrap();

        assert_eq!(reading.to_features(), [25.0, 40.0, 1010.0, 3.0]);
    }

    #[test]
    fn test_structured_numeric_strings() {
        // ---
        let reading = from_fields(&fields(json!({
            "temperature": " 25.5",
            "humidity": "40",
            "pressure": "1010",
            "wind_speed": "3.25"
        })))
        .unwrap();

        assert_eq!(reading.to_features(), [25.5, 40.0, 1010.0, 3.25]);
    }

    #[test]
    fn test_structured_missing_field() {
        // ---
        let err = from_fields(&fields(json!({
            "temperature": 25.0,
            "humidity": 40.0,
            "pressure": 1010.0
        })))
        .unwrap_err();

        assert_eq!(err, ExtractionError::MissingField(Field::WindSpeed));
        assert_eq!(err.to_string(), "missing field 'windspeed'");
    }

    #[test]
    fn test_structured_null_is_missing() {
        // ---
        let err = from_fields(&fields(json!({
            "temperature": null,
            "humidity": 40.0,
            "pressure": 1010.0,
            "windspeed": 3.0
        })))
        .unwrap_err();

        assert_eq!(err, ExtractionError::MissingField(Field::Temperature));
    }

    #[test]
    fn test_structured_not_numeric() {
        // ---
        let err = from_fields(&fields(json!({
            "temperature": 25.0,
            "humidity": "damp",
            "pressure": 1010.0,
            "windspeed": 3.0
        })))
        .unwrap_err();
        assert_eq!(err, ExtractionError::NotNumeric(Field::Humidity));

        let err = from_fields(&fields(json!({
            "temperature": 25.0,
            "humidity": 40.0,
            "pressure": [1010.0],
            "windspeed": 3.0
        })))
        .unwrap_err();
        assert_eq!(err, ExtractionError::NotNumeric(Field::Pressure));

        let err = from_fields(&fields(json!({
            "temperature": "NaN",
            "humidity": 40.0,
            "pressure": 1010.0,
            "windspeed": 3.0
        })))
        .unwrap_err();
        assert_eq!(err, ExtractionError::NotNumeric(Field::Temperature));
    }

    #[test]
    fn test_positional_in_order() {
        // ---
        let reading =
            extract_positional("Temp 30, humidity 50, pressure 1005, wind 2.5").unwrap();
        assert_eq!(reading.to_features(), [30.0, 50.0, 1005.0, 2.5]);
    }

    #[test]
    fn test_positional_ignores_words_and_extras() {
        // ---
        let reading = extract_positional(
            "It is 22.5 degrees with 61% humidity, 1012 hPa and breezes of 4 m/s, 7 clouds",
        )
        .unwrap();
        assert_eq!(reading.to_features(), [22.5, 61.0, 1012.0, 4.0]);

        let reading = extract_positional("-3 +40 990 .5").unwrap();
        assert_eq!(reading.to_features(), [-3.0, 40.0, 990.0, 0.5]);
    }

    #[test]
    fn test_positional_insufficient() {
        // ---
        let err = extract_positional("it's nice today").unwrap_err();
        assert_eq!(err, ExtractionError::InsufficientValues { found: 0 });
        assert!(err.to_string().contains("insufficient values"));

        let err = extract_positional("temp 20 humidity 30 pressure 1000").unwrap_err();
        assert_eq!(err, ExtractionError::InsufficientValues { found: 3 });
    }

    #[test]
    fn test_labeled_keywords() {
        // ---
        let reading = extract_labeled("Temp 30, humidity 50, pressure 1005, wind 2.5").unwrap();
        assert_eq!(reading.to_features(), [30.0, 50.0, 1005.0, 2.5]);
    }

    #[test]
    fn test_labeled_any_order_and_units() {
        // ---
        let reading =
            extract_labeled("Wind speed: 4.2, 1008 hPa, 65% and it is 28°C outside").unwrap();
        assert_eq!(reading.to_features(), [28.0, 65.0, 1008.0, 4.2]);

        let reading = extract_labeled(
            "pressure is 1001 mb; temperature of 31 degrees; humidity=45; 6 m/s gusts",
        )
        .unwrap();
        assert_eq!(reading.to_features(), [31.0, 45.0, 1001.0, 6.0]);
    }

    #[test]
    fn test_labeled_pressure_does_not_steal_neighbour() {
        // ---
        // "50 pressure" must not be read as a pressure of 50
        let reading =
            extract_labeled("humidity 50 pressure 1013 temperature 20 windspeed 3").unwrap();
        assert_eq!(reading.humidity, 50.0);
        assert_eq!(reading.pressure, 1013.0);
        assert_eq!(reading.wind_speed, 3.0);
    }

    #[test]
    fn test_labeled_missing_value_not_borrowed_from_neighbour() {
        // ---
        let err = extract_labeled("temperature unknown, wind 4, humidity 40, pressure 1000")
            .unwrap_err();
        assert_eq!(err, ExtractionError::MissingLabel(Field::Temperature));

        let err = extract_labeled("humidity, pressure 1013, temperature 20, wind 3").unwrap_err();
        assert_eq!(err, ExtractionError::MissingLabel(Field::Humidity));
    }

    #[test]
    fn test_labeled_connectives_and_sign() {
        // ---
        let reading =
            extract_labeled("temperature is about -5, humidity at 40, pressure 1000, wind 3")
                .unwrap();
        assert_eq!(reading.to_features(), [-5.0, 40.0, 1000.0, 3.0]);
    }

    #[test]
    fn test_labeled_validation_rejects_out_of_range() {
        // ---
        let settings = PredictionSettings {
            strategy: ExtractionStrategy::Labeled,
            ..PredictionSettings::default()
        };

        let request = PredictRequest::Message(
            "temperature is about -5, humidity at 40, pressure 1000, wind 3".to_string(),
        );
        assert_eq!(
            extract(&request, &settings),
            Err(ExtractionError::OutOfRange {
                field: Field::Temperature,
                value: -5.0,
                lo: 0.0,
                hi: 60.0,
            })
        );

        let request = PredictRequest::Message(
            "Temperature: 22, humidity: 40, pressure: 2000, wind: 3".to_string(),
        );
        assert!(matches!(
            extract(&request, &settings),
            Err(ExtractionError::OutOfRange {
                field: Field::Pressure,
                ..
            })
        ));
    }

    #[test]
    fn test_labeled_missing() {
        // ---
        let err = extract_labeled("temperature 25, humidity 40, wind 3").unwrap_err();
        assert_eq!(err, ExtractionError::MissingLabel(Field::Pressure));
        assert_eq!(err.to_string(), "could not extract pressure from the message");
    }

    #[test]
    fn test_validate_out_of_range() {
        // ---
        let reading = WeatherReading::from_features([25.0, 40.0, 2000.0, 3.0]);
        let err = validate(&reading).unwrap_err();

        assert_eq!(
            err,
            ExtractionError::OutOfRange {
                field: Field::Pressure,
                value: 2000.0,
                lo: 950.0,
                hi: 1050.0,
            }
        );
        assert_eq!(err.to_string(), "pressure 2000 is out of range [950, 1050]");
    }

    #[test]
    fn test_validate_bounds_inclusive() {
        // ---
        assert!(validate(&WeatherReading::from_features([0.0, 0.0, 950.0, 0.0])).is_ok());
        assert!(validate(&WeatherReading::from_features([60.0, 100.0, 1050.0, 30.0])).is_ok());

        let err = validate(&WeatherReading::from_features([60.0, 100.0, 1050.0, 30.5]));
        assert!(matches!(
            err,
            Err(ExtractionError::OutOfRange {
                field: Field::WindSpeed,
                ..
            })
        ));
    }

    #[test]
    fn test_extract_respects_settings() {
        // ---
        let request = PredictRequest::Fields(fields(json!({
            "temperature": 25.0,
            "humidity": 40.0,
            "pressure": 2000.0,
            "windspeed": 3.0
        })));

        let strict = PredictionSettings::default();
        assert!(matches!(
            extract(&request, &strict),
            Err(ExtractionError::OutOfRange {
                field: Field::Pressure,
                ..
            })
        ));

        let lenient = PredictionSettings {
            validate_ranges: false,
            ..PredictionSettings::default()
        };
        assert_eq!(extract(&request, &lenient).unwrap().pressure, 2000.0);

        let labeled = PredictionSettings {
            strategy: ExtractionStrategy::Labeled,
            ..PredictionSettings::default()
        };
        let request = PredictRequest::Query("wind 2, 30°C, 1000 hPa, 55%".to_string());
        assert_eq!(
            extract(&request, &labeled).unwrap().to_features(),
            [30.0, 55.0, 1000.0, 2.0]
        );
    }
}
