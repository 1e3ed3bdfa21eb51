use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 宽松的浮点数
///
/// 上游接口的数值字段有时是数字，有时是字符串，甚至是 `""` / `"N/A"`。
/// 数字和可解析的字符串按原值读取，其余字符串和 `null` 一律当作 0。
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct FlexibleFloat(pub f64);

impl FlexibleFloat {
    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<f64> for FlexibleFloat {
    fn from(v: f64) -> Self {
        FlexibleFloat(v)
    }
}

impl From<FlexibleFloat> for f64 {
    fn from(v: FlexibleFloat) -> Self {
        v.0
    }
}

impl Serialize for FlexibleFloat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0)
    }
}

struct FlexibleFloatVisitor;

impl<'de> Visitor<'de> for FlexibleFloatVisitor {
    type Value = FlexibleFloat;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number or a numeric string")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(FlexibleFloat(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(FlexibleFloat(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(FlexibleFloat(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        let v = v.trim();
        if v.is_empty() || v == "N/A" || v == "null" {
            return Ok(FlexibleFloat(0.0));
        }
        Ok(FlexibleFloat(v.parse().unwrap_or(0.0)))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(FlexibleFloat(0.0))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(FlexibleFloat(0.0))
    }
}

impl<'de> Deserialize<'de> for FlexibleFloat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FlexibleFloatVisitor)
    }
}

/// 用于 `#[serde(deserialize_with)]`，把宽松数值直接读成 `f64`
pub fn flexible_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    FlexibleFloat::deserialize(deserializer).map(f64::from)
}
