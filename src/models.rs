//! Simple data models for the prediction service.

use std::fmt;

use serde_json::{Map, Value};

// ---

/// One of the four weather quantities the model consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Temperature,
    Humidity,
    Pressure,
    WindSpeed,
}

impl Field {
    /// Feature order expected by the model.
    pub const ALL: [Field; 4] = [
        Field::Temperature,
        Field::Humidity,
        Field::Pressure,
        Field::WindSpeed,
    ];

    /// Human-readable name, also used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Field::Temperature => "temperature",
            Field::Humidity => "humidity",
            Field::Pressure => "pressure",
            Field::WindSpeed => "wind speed",
        }
    }

    /// Key of this field in a structured request body.
    pub fn json_key(self) -> &'static str {
        match self {
            Field::Temperature => "temperature",
            Field::Humidity => "humidity",
            Field::Pressure => "pressure",
            Field::WindSpeed => "windspeed",
        }
    }

    /// Inclusive physical range `(lo, hi)`.
    pub fn range(self) -> (f64, f64) {
        match self {
            Field::Temperature => (0.0, 60.0),
            Field::Humidity => (0.0, 100.0),
            Field::Pressure => (950.0, 1050.0),
            Field::WindSpeed => (0.0, 30.0),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Weather conditions for a single prediction.
///
/// Units: temperature in °C, humidity in %, pressure in hPa, wind speed in m/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherReading {
    // ---
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
}

impl WeatherReading {
    // ---
    pub fn from_features(features: [f64; 4]) -> Self {
        let [temperature, humidity, pressure, wind_speed] = features;
        Self {
            temperature,
            humidity,
            pressure,
            wind_speed,
        }
    }

    /// Feature vector in model order: temperature, humidity, pressure, wind speed.
    pub fn to_features(&self) -> [f64; 4] {
        [self.temperature, self.humidity, self.pressure, self.wind_speed]
    }

    pub fn get(&self, field: Field) -> f64 {
        match field {
            Field::Temperature => self.temperature,
            Field::Humidity => self.humidity,
            Field::Pressure => self.pressure,
            Field::WindSpeed => self.wind_speed,
        }
    }
}

/// Decoded `POST /predict` body.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictRequest {
    /// `{"message": "..."}`
    Message(String),
    /// `{"query": "..."}`
    Query(String),
    /// `{"temperature": .., "humidity": .., "pressure": .., "windspeed": ..}`
    Fields(Map<String, Value>),
}

impl PredictRequest {
    /// Classify a JSON body. Text keys win over structured fields.
    pub fn from_json(body: Value) -> Result<Self, String> {
        // ---
        let Value::Object(mut map) = body else {
            return Err("request body must be a JSON object".to_string());
        };

        for key in ["message", "query"] {
            match map.remove(key) {
                None | Some(Value::Null) => continue,
                Some(Value::String(text)) if key == "message" => {
                    return Ok(PredictRequest::Message(text))
                }
                Some(Value::String(text)) => return Ok(PredictRequest::Query(text)),
                Some(_) => return Err(format!("'{key}' must be a string")),
            }
        }

        Ok(PredictRequest::Fields(map))
    }
}
