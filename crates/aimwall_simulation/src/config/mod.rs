//! Configuration domain - tunable параметры тренажёра
//!
//! Содержит:
//! - AimConfig (Resource, плоский record всех параметров)
//! - ConfigField таблица (key / validator / effect) - см. field.rs
//! - Persisted record merge (default → override per field, discard on stale schema)
//! - ConfigUpdate / ConfigChanged events (host ↔ core)
//! - horizontal_to_vertical_fov (fov.rs)
//!
//! Flow:
//! UI input → ConfigUpdate → apply_config_updates → AimConfig + effect → ConfigChanged (host сохраняет)

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub mod field;
pub mod fov;
pub mod systems;

pub use field::{ApplyEffect, ConfigField, FieldKind, FieldValue, MAX_INTEGER_FIELD};
pub use fov::{horizontal_to_vertical_fov, DEFAULT_ASPECT};
pub use systems::apply_config_updates;

use crate::logger;

/// Версия схемы persisted record; несовпадение → record выбрасывается целиком
pub const CURRENT_SCHEMA_VERSION: &str = "aimwall-config-1";

/// Pointer speed look controller'а при sensitivity = 1.0
pub const BASE_POINTER_SPEED: f32 = 0.192;

/// Отклонённое внешнее значение (поле сохраняет прежнее значение)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown config field `{0}`")]
    UnknownField(String),
    #[error("`{field}`: {raw} is not a finite number")]
    NotANumber { field: &'static str, raw: String },
    #[error("`{field}`: {raw} is not a non-negative integer")]
    NotAnInteger { field: &'static str, raw: String },
    #[error("`{field}`: {raw} is not a boolean")]
    NotABool { field: &'static str, raw: String },
    #[error("`{field}`: {value} must be {expected}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
    #[error("`{0}` is read-only")]
    ReadOnly(&'static str),
}

/// Конфигурация тренажёра
///
/// Инвариант: каждое numeric поле - finite число, прошедшее валидатор своего
/// `ConfigField`. Меняется только через `set` (или целиком через `from_persisted`).
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[reflect(Resource)]
#[serde(rename_all = "camelCase")]
pub struct AimConfig {
    /// Множитель pointer → angle (см. `pointer_speed`)
    pub sensitivity: f32,
    /// Максимум trace samples в истории
    pub trace_capacity: usize,
    /// Визуальный радиус trace точки (только render)
    pub trace_radius: f32,
    /// Радиус цели (disc на стене)
    pub target_radius: f32,
    /// Размер набора целей
    pub target_count: usize,
    pub crosshair_scale: f32,
    pub horizontal_fov_deg: f32,
    /// true → trail копится после выстрела; false → сброс на каждом выстреле
    pub realtime_trace: bool,
    pub show_crosshair: bool,
    /// Respawn цели после попадания
    pub randomize_on_hit: bool,
    /// Ширина respawn области (центр - origin стены)
    pub random_width: f32,
    /// Высота respawn области
    pub random_height: f32,
    pub schema_version: String,
}

impl Default for AimConfig {
    fn default() -> Self {
        Self {
            sensitivity: 1.0,
            trace_capacity: 60,
            trace_radius: 2.0,
            target_radius: 4.0,
            target_count: 1,
            crosshair_scale: 1.0,
            horizontal_fov_deg: 106.0,
            realtime_trace: true,
            show_crosshair: true,
            randomize_on_hit: true,
            random_width: 200.0,
            random_height: 100.0,
            schema_version: CURRENT_SCHEMA_VERSION.to_string(),
        }
    }
}

impl AimConfig {
    /// Применяет одно поле. При ошибке конфиг не меняется.
    pub fn set(&mut self, field: ConfigField, raw: &Value) -> Result<ApplyEffect, ConfigError> {
        let value = field.parse(raw)?;

        match (field, value) {
            (ConfigField::Sensitivity, FieldValue::Float(v)) => self.sensitivity = v,
            (ConfigField::TraceRadius, FieldValue::Float(v)) => self.trace_radius = v,
            (ConfigField::TargetRadius, FieldValue::Float(v)) => self.target_radius = v,
            (ConfigField::CrosshairScale, FieldValue::Float(v)) => self.crosshair_scale = v,
            (ConfigField::HorizontalFovDeg, FieldValue::Float(v)) => self.horizontal_fov_deg = v,
            (ConfigField::RandomWidth, FieldValue::Float(v)) => self.random_width = v,
            (ConfigField::RandomHeight, FieldValue::Float(v)) => self.random_height = v,
            (ConfigField::TraceCapacity, FieldValue::Integer(v)) => self.trace_capacity = v,
            (ConfigField::TargetCount, FieldValue::Integer(v)) => self.target_count = v,
            (ConfigField::RealtimeTrace, FieldValue::Flag(v)) => self.realtime_trace = v,
            (ConfigField::ShowCrosshair, FieldValue::Flag(v)) => self.show_crosshair = v,
            (ConfigField::RandomizeOnHit, FieldValue::Flag(v)) => self.randomize_on_hit = v,
            // parse() гарантирует kind ↔ value, сюда попадает только SchemaVersion
            _ => return Err(ConfigError::ReadOnly(field.key())),
        }

        Ok(field.effect())
    }

    /// Текущее значение поля в форме persisted record
    pub fn get(&self, field: ConfigField) -> Value {
        match field {
            ConfigField::Sensitivity => Value::from(self.sensitivity),
            ConfigField::TraceCapacity => Value::from(self.trace_capacity),
            ConfigField::TraceRadius => Value::from(self.trace_radius),
            ConfigField::TargetRadius => Value::from(self.target_radius),
            ConfigField::TargetCount => Value::from(self.target_count),
            ConfigField::CrosshairScale => Value::from(self.crosshair_scale),
            ConfigField::HorizontalFovDeg => Value::from(self.horizontal_fov_deg),
            ConfigField::RealtimeTrace => Value::from(self.realtime_trace),
            ConfigField::ShowCrosshair => Value::from(self.show_crosshair),
            ConfigField::RandomizeOnHit => Value::from(self.randomize_on_hit),
            ConfigField::RandomWidth => Value::from(self.random_width),
            ConfigField::RandomHeight => Value::from(self.random_height),
            ConfigField::SchemaVersion => Value::from(self.schema_version.clone()),
        }
    }

    /// Persisted record (host кладёт его в storage как есть)
    pub fn to_record(&self) -> Value {
        let map: Map<String, Value> = ConfigField::ALL
            .into_iter()
            .map(|field| (field.key().to_string(), self.get(field)))
            .collect();
        Value::Object(map)
    }

    /// Default → override per field
    ///
    /// - `None` / `Stale` / не-object → defaults целиком
    /// - Невалидное поле → остаётся default, остальные поля применяются
    /// - Неизвестные ключи игнорируются
    pub fn from_persisted(record: Option<&Value>, verdict: SchemaVerdict) -> Self {
        let mut config = Self::default();

        let Some(record) = record else {
            return config;
        };

        if verdict == SchemaVerdict::Stale {
            logger::log_info("Persisted config has stale schema version, using defaults");
            return config;
        }

        let Some(map) = record.as_object() else {
            logger::log_info("Persisted config is not an object, using defaults");
            return config;
        };

        for field in ConfigField::ALL {
            if field.kind() == FieldKind::Tag {
                continue;
            }
            let Some(raw) = map.get(field.key()) else {
                continue;
            };
            if let Err(err) = config.set(field, raw) {
                logger::log_warning(&format!("Persisted config field rejected: {}", err));
            }
        }

        config
    }

    /// JSON строка из storage → конфиг. Parse failure = отсутствие record.
    pub fn load_persisted_str(stored: Option<&str>) -> Self {
        let Some(text) = stored else {
            return Self::default();
        };

        match serde_json::from_str::<Value>(text) {
            Ok(record) => {
                let verdict = SchemaVerdict::of(&record);
                Self::from_persisted(Some(&record), verdict)
            }
            Err(err) => {
                logger::log_info(&format!("Persisted config unreadable ({}), using defaults", err));
                Self::default()
            }
        }
    }

    /// Множитель для raw pointer deltas (применяется апстрим, не в core)
    pub fn pointer_speed(&self) -> f32 {
        BASE_POINTER_SPEED * self.sensitivity
    }
}

/// Вердикт о версии persisted record (считает host или `SchemaVerdict::of`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVerdict {
    Current,
    Stale,
}

impl SchemaVerdict {
    pub fn of(record: &Value) -> Self {
        match record.get(ConfigField::SchemaVersion.key()).and_then(Value::as_str) {
            Some(version) if version == CURRENT_SCHEMA_VERSION => SchemaVerdict::Current,
            _ => SchemaVerdict::Stale,
        }
    }
}

/// Event: host хочет поменять одно поле (UI input, между кадрами)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct ConfigUpdate {
    pub field: ConfigField,
    /// Сырое значение как пришло из UI (строка, число, bool)
    pub value: Value,
}

impl ConfigUpdate {
    pub fn new(field: ConfigField, value: impl Into<Value>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }

    pub fn from_key(key: &str, value: impl Into<Value>) -> Result<Self, ConfigError> {
        Ok(Self::new(ConfigField::from_key(key)?, value))
    }
}

/// Event: поле принято (core → host, для storage)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct ConfigChanged {
    pub field: ConfigField,
    pub config: AimConfig,
    pub record: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_match_record_keys() {
        let config = AimConfig::default();
        let record = config.to_record();

        assert_eq!(record["traceCapacity"], json!(60));
        assert_eq!(record["horizontalFovDeg"], json!(106.0));
        assert_eq!(record["realtimeTrace"], json!(true));
        assert_eq!(record["schemaVersion"], json!(CURRENT_SCHEMA_VERSION));

        // serde имена совпадают с таблицей
        let via_serde = serde_json::to_value(&config).ok();
        assert_eq!(via_serde, Some(record));
    }

    #[test]
    fn test_set_rejects_and_keeps_previous() {
        let mut config = AimConfig::default();

        assert!(config.set(ConfigField::Sensitivity, &json!("abc")).is_err());
        assert_eq!(config.sensitivity, 1.0);

        assert!(config.set(ConfigField::Sensitivity, &json!("2.5")).is_ok());
        assert_eq!(config.sensitivity, 2.5);

        assert!(config.set(ConfigField::TraceCapacity, &json!(-3)).is_err());
        assert_eq!(config.trace_capacity, 60);
    }

    #[test]
    fn test_overflowing_values_never_reach_live_state() {
        let mut config = AimConfig::default();

        assert!(config.set(ConfigField::Sensitivity, &json!(1e300)).is_err());
        assert!(config.set(ConfigField::RandomWidth, &json!("1e39")).is_err());
        assert_eq!(config, AimConfig::default());
        assert_eq!(config.to_record()["sensitivity"], json!(1.0));

        // Persisted record с переполнением → поле падает в default
        let record = json!({
            "schemaVersion": CURRENT_SCHEMA_VERSION,
            "randomHeight": 1e300,
        });
        let restored = AimConfig::from_persisted(Some(&record), SchemaVerdict::of(&record));
        assert_eq!(restored.random_height, 100.0);
    }

    #[test]
    fn test_stale_schema_discards_everything() {
        let record = json!({
            "schemaVersion": "fps-mouse-tester-0",
            "sensitivity": 3.0,
            "traceCapacity": 10,
        });

        assert_eq!(SchemaVerdict::of(&record), SchemaVerdict::Stale);
        let config = AimConfig::from_persisted(Some(&record), SchemaVerdict::Stale);
        assert_eq!(config, AimConfig::default());
    }

    #[test]
    fn test_current_schema_merges_per_field() {
        let record = json!({
            "schemaVersion": CURRENT_SCHEMA_VERSION,
            "sensitivity": "0.8",
            "traceCapacity": "garbage",
            "realtimeTrace": 0,
            "randomWidth": 50,
            "dotNum": 12,
        });

        let config = AimConfig::from_persisted(Some(&record), SchemaVerdict::of(&record));

        assert_eq!(config.sensitivity, 0.8);
        assert_eq!(config.trace_capacity, 60); // невалидное → default
        assert!(!config.realtime_trace);
        assert_eq!(config.random_width, 50.0);
        assert_eq!(config.random_height, 100.0); // отсутствующее → default
    }

    #[test]
    fn test_load_persisted_str_parse_failure() {
        assert_eq!(AimConfig::load_persisted_str(Some("{ not json")), AimConfig::default());
        assert_eq!(AimConfig::load_persisted_str(None), AimConfig::default());
        assert_eq!(AimConfig::load_persisted_str(Some("[1, 2]")), AimConfig::default());
    }

    #[test]
    fn test_record_roundtrips_through_storage() {
        let mut config = AimConfig::default();
        config.set(ConfigField::TargetCount, &json!(3)).ok();
        config.set(ConfigField::ShowCrosshair, &json!(false)).ok();

        let stored = config.to_record().to_string();
        assert_eq!(AimConfig::load_persisted_str(Some(&stored)), config);
    }

    #[test]
    fn test_pointer_speed_scales_with_sensitivity() {
        let mut config = AimConfig::default();
        assert_eq!(config.pointer_speed(), BASE_POINTER_SPEED);

        config.set(ConfigField::Sensitivity, &json!(2.0)).ok();
        assert_eq!(config.pointer_speed(), BASE_POINTER_SPEED * 2.0);
    }

    #[test]
    fn test_update_from_unknown_key() {
        assert!(ConfigUpdate::from_key("sensitivity", "1.2").is_ok());
        assert!(ConfigUpdate::from_key("bdotSize", 4).is_err());
    }
}
