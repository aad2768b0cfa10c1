//! Таблица полей конфигурации: {field: key, validator, effect-on-apply}
//!
//! Единственный путь изменения `AimConfig` извне - через `ConfigField`:
//! loosely-typed значение (UI строка, JSON число, 0/1 флаг) парсится
//! валидатором поля, и только после успеха пишется в конфиг.

use serde_json::Value;

use super::ConfigError;

/// Верхняя граница для integer полей (traceCapacity, targetCount)
///
/// Набор целей перебирается каждый кадр, trace буфер хранится целиком -
/// астрономические значения из битого persisted record отсекаем здесь.
pub const MAX_INTEGER_FIELD: usize = 1_000_000;

/// Поле конфигурации
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    Sensitivity,
    TraceCapacity,
    TraceRadius,
    TargetRadius,
    TargetCount,
    CrosshairScale,
    HorizontalFovDeg,
    RealtimeTrace,
    ShowCrosshair,
    RandomizeOnHit,
    RandomWidth,
    RandomHeight,
    SchemaVersion,
}

/// Валидатор поля
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// finite, > 0
    PositiveFloat,
    /// finite, ≥ 0
    NonNegativeFloat,
    /// finite, в открытом интервале (0, 180)
    FovDegrees,
    /// целое ≥ 1
    PositiveInteger,
    /// целое ≥ 0
    NonNegativeInteger,
    /// bool, 0/1 число или "true"/"false"
    Flag,
    /// opaque tag, извне не меняется
    Tag,
}

/// Что происходит с живой симуляцией после применения поля
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyEffect {
    /// Меняется только pointer speed readout (апстрим look controller)
    PointerSpeed,
    /// Действует со следующей capacity проверки trace буфера (без ретро-обрезки)
    NextCapacityCheck,
    /// Читается только при публикации RenderView
    RenderOnly,
    /// Radius всех целей обновляется in place, позиции сохраняются
    ResizeTargets,
    /// Весь набор целей пересобирается
    RebuildTargets,
    /// Vertical FOV пересчитывается при следующей публикации RenderView
    RecomputeFov,
    /// Политика следующего выстрела; замороженный trail сбрасывается
    TracePolicy,
    /// Политика следующего выстрела
    NextShot,
    /// Границы следующего respawn
    NextRespawn,
    /// Ничего (read-only поле)
    None,
}

/// Распарсенное значение (уже прошедшее валидатор)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Float(f32),
    Integer(usize),
    Flag(bool),
}

impl ConfigField {
    pub const ALL: [ConfigField; 13] = [
        ConfigField::Sensitivity,
        ConfigField::TraceCapacity,
        ConfigField::TraceRadius,
        ConfigField::TargetRadius,
        ConfigField::TargetCount,
        ConfigField::CrosshairScale,
        ConfigField::HorizontalFovDeg,
        ConfigField::RealtimeTrace,
        ConfigField::ShowCrosshair,
        ConfigField::RandomizeOnHit,
        ConfigField::RandomWidth,
        ConfigField::RandomHeight,
        ConfigField::SchemaVersion,
    ];

    /// Ключ в persisted record (совпадает с serde именем)
    pub fn key(self) -> &'static str {
        match self {
            ConfigField::Sensitivity => "sensitivity",
            ConfigField::TraceCapacity => "traceCapacity",
            ConfigField::TraceRadius => "traceRadius",
            ConfigField::TargetRadius => "targetRadius",
            ConfigField::TargetCount => "targetCount",
            ConfigField::CrosshairScale => "crosshairScale",
            ConfigField::HorizontalFovDeg => "horizontalFovDeg",
            ConfigField::RealtimeTrace => "realtimeTrace",
            ConfigField::ShowCrosshair => "showCrosshair",
            ConfigField::RandomizeOnHit => "randomizeOnHit",
            ConfigField::RandomWidth => "randomWidth",
            ConfigField::RandomHeight => "randomHeight",
            ConfigField::SchemaVersion => "schemaVersion",
        }
    }

    pub fn from_key(key: &str) -> Result<Self, ConfigError> {
        Self::ALL
            .into_iter()
            .find(|field| field.key() == key)
            .ok_or_else(|| ConfigError::UnknownField(key.to_string()))
    }

    pub fn kind(self) -> FieldKind {
        match self {
            ConfigField::Sensitivity
            | ConfigField::TraceRadius
            | ConfigField::TargetRadius
            | ConfigField::CrosshairScale => FieldKind::PositiveFloat,
            ConfigField::RandomWidth | ConfigField::RandomHeight => FieldKind::NonNegativeFloat,
            ConfigField::HorizontalFovDeg => FieldKind::FovDegrees,
            ConfigField::TraceCapacity => FieldKind::PositiveInteger,
            ConfigField::TargetCount => FieldKind::NonNegativeInteger,
            ConfigField::RealtimeTrace | ConfigField::ShowCrosshair | ConfigField::RandomizeOnHit => {
                FieldKind::Flag
            }
            ConfigField::SchemaVersion => FieldKind::Tag,
        }
    }

    pub fn effect(self) -> ApplyEffect {
        match self {
            ConfigField::Sensitivity => ApplyEffect::PointerSpeed,
            ConfigField::TraceCapacity => ApplyEffect::NextCapacityCheck,
            ConfigField::TraceRadius | ConfigField::CrosshairScale | ConfigField::ShowCrosshair => {
                ApplyEffect::RenderOnly
            }
            ConfigField::TargetRadius => ApplyEffect::ResizeTargets,
            ConfigField::TargetCount => ApplyEffect::RebuildTargets,
            ConfigField::HorizontalFovDeg => ApplyEffect::RecomputeFov,
            ConfigField::RealtimeTrace => ApplyEffect::TracePolicy,
            ConfigField::RandomizeOnHit => ApplyEffect::NextShot,
            ConfigField::RandomWidth | ConfigField::RandomHeight => ApplyEffect::NextRespawn,
            ConfigField::SchemaVersion => ApplyEffect::None,
        }
    }

    /// Прогоняет сырое значение через валидатор поля
    pub fn parse(self, raw: &Value) -> Result<FieldValue, ConfigError> {
        match self.kind() {
            FieldKind::PositiveFloat => {
                let value = self.float(raw)?;
                self.check(value > 0.0, value as f64, "> 0")?;
                Ok(FieldValue::Float(value))
            }
            FieldKind::NonNegativeFloat => {
                let value = self.float(raw)?;
                self.check(value >= 0.0, value as f64, ">= 0")?;
                Ok(FieldValue::Float(value))
            }
            FieldKind::FovDegrees => {
                let value = self.float(raw)?;
                self.check(value > 0.0 && value < 180.0, value as f64, "in (0, 180)")?;
                Ok(FieldValue::Float(value))
            }
            FieldKind::PositiveInteger => {
                let value = self.integer(raw)?;
                self.check(value >= 1, value as f64, ">= 1")?;
                Ok(FieldValue::Integer(value))
            }
            FieldKind::NonNegativeInteger => Ok(FieldValue::Integer(self.integer(raw)?)),
            FieldKind::Flag => self.flag(raw).map(FieldValue::Flag),
            FieldKind::Tag => Err(ConfigError::ReadOnly(self.key())),
        }
    }

    fn check(self, ok: bool, value: f64, expected: &'static str) -> Result<(), ConfigError> {
        if ok {
            Ok(())
        } else {
            Err(ConfigError::OutOfRange {
                field: self.key(),
                value,
                expected,
            })
        }
    }

    /// Число из JSON number или numeric строки (UI шлёт text input как есть)
    fn number(self, raw: &Value) -> Result<f64, ConfigError> {
        let parsed = match raw {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        // "NaN" / "inf" парсятся в f64 - отбрасываем как malformed
        match parsed {
            Some(value) if value.is_finite() => Ok(value),
            _ => Err(ConfigError::NotANumber {
                field: self.key(),
                raw: raw.to_string(),
            }),
        }
    }

    /// Число, представимое в f32 (live state хранит f32)
    fn float(self, raw: &Value) -> Result<f32, ConfigError> {
        let value = self.number(raw)?;
        let narrowed = value as f32;
        // 1e300 валиден как f64, но в f32 превращается в inf
        self.check(narrowed.is_finite(), value, "within f32 range")?;
        Ok(narrowed)
    }

    fn integer(self, raw: &Value) -> Result<usize, ConfigError> {
        let value = self.number(raw)?;
        if value.fract() != 0.0 || value < 0.0 {
            return Err(ConfigError::NotAnInteger {
                field: self.key(),
                raw: raw.to_string(),
            });
        }
        self.check(value <= MAX_INTEGER_FIELD as f64, value, "<= 1000000")?;
        Ok(value as usize)
    }

    fn flag(self, raw: &Value) -> Result<bool, ConfigError> {
        let parsed = match raw {
            Value::Bool(b) => Some(*b),
            // Persisted record исторически хранит флаги как 1/0
            Value::Number(n) => n.as_f64().map(|v| v != 0.0),
            Value::String(s) => match s.trim() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        };
        parsed.ok_or_else(|| ConfigError::NotABool {
            field: self.key(),
            raw: raw.to_string(),
        })
    }
}
