//! 参数校验工具
//!
//! 每个校验函数接收一个候选值（可能缺省）与默认值：
//! - 缺省（`None` 或 JSON `null`）时返回默认值；
//! - 类型不符时返回类型错误；
//! - 类型正确但越界时返回取值错误。
//!
//! 所有函数均无副作用。

use crate::error::{CalcError, Result};
use serde_json::{Map, Value};
use std::fmt;

/// 候选值可校验的 JSON 类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Integer,
    Float,
    String,
    Array,
    Object,
}

impl ValueKind {
    /// 值的类型；`null` 返回 `None`。
    pub fn of(value: &Value) -> Option<ValueKind> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(Self::Bool),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(Self::Integer),
            Value::Number(_) => Some(Self::Float),
            Value::String(_) => Some(Self::String),
            Value::Array(_) => Some(Self::Array),
            Value::Object(_) => Some(Self::Object),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Array => "list",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// JSON `null` 视同缺省。
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn describe(value: &Value) -> String {
    ValueKind::of(value).map_or("null", ValueKind::name).to_string()
}

fn expected_list(accepted: &[ValueKind]) -> String {
    accepted
        .iter()
        .map(|k| k.name())
        .collect::<Vec<_>>()
        .join(" or ")
}

/// 候选值属于 `accepted` 中任一类型时原样返回。
///
/// 缺省时返回 `default`；没有默认值则为类型错误。
pub fn check_instance(
    field: &str,
    value: Option<&Value>,
    accepted: &[ValueKind],
    default: Option<Value>,
) -> Result<Value> {
    let Some(v) = present(value) else {
        return default.ok_or_else(|| {
            CalcError::type_mismatch(field, expected_list(accepted), "nothing")
        });
    };
    match ValueKind::of(v) {
        Some(kind) if accepted.contains(&kind) => Ok(v.clone()),
        _ => Err(CalcError::type_mismatch(
            field,
            expected_list(accepted),
            describe(v),
        )),
    }
}

fn check_integer(field: &str, value: Option<&Value>, default: u64, min: u64) -> Result<u64> {
    let Some(v) = present(value) else {
        return Ok(default);
    };
    let Value::Number(n) = v else {
        return Err(CalcError::type_mismatch(field, "integer", describe(v)));
    };
    match (n.as_u64(), n.as_i64()) {
        (Some(u), _) if u >= min => Ok(u),
        (Some(u), _) => Err(out_of_range(field, u as i64, min)),
        // 只有负整数落在 i64 而不在 u64 中。
        (None, Some(i)) => Err(out_of_range(field, i, min)),
        (None, None) => Err(CalcError::type_mismatch(field, "integer", "float")),
    }
}

fn out_of_range(field: &str, value: i64, min: u64) -> CalcError {
    let what = if min > 0 {
        "a positive integer"
    } else {
        "a non-negative integer"
    };
    CalcError::range(field, format!("must be {what}, got {value}"))
}

/// 整数且 ≥ 1，缺省时取 `default`。
pub fn check_positive_integer(field: &str, value: Option<&Value>, default: u64) -> Result<u64> {
    check_integer(field, value, default, 1)
}

/// 整数且 ≥ 0，缺省时取 `default`。
pub fn check_non_negative_integer(
    field: &str,
    value: Option<&Value>,
    default: u64,
) -> Result<u64> {
    check_integer(field, value, default, 0)
}

pub fn check_string(field: &str, value: Option<&Value>, default: &str) -> Result<String> {
    let Some(v) = present(value) else {
        return Ok(default.to_string());
    };
    v.as_str()
        .map(str::to_owned)
        .ok_or_else(|| CalcError::type_mismatch(field, "string", describe(v)))
}

pub fn check_bool(field: &str, value: Option<&Value>, default: bool) -> Result<bool> {
    let Some(v) = present(value) else {
        return Ok(default);
    };
    v.as_bool()
        .ok_or_else(|| CalcError::type_mismatch(field, "bool", describe(v)))
}

/// 有限数值（整数或浮点），缺省时取 `default`。
pub fn check_number(field: &str, value: Option<&Value>, default: f64) -> Result<f64> {
    let Some(v) = present(value) else {
        return Ok(default);
    };
    let n = v
        .as_f64()
        .ok_or_else(|| CalcError::type_mismatch(field, "integer or float", describe(v)))?;
    if !n.is_finite() {
        return Err(CalcError::range(field, "must be a finite number"));
    }
    Ok(n)
}

/// 对象值；缺省即类型错误。
pub fn check_object(field: &str, value: Option<&Value>) -> Result<Map<String, Value>> {
    match present(value) {
        Some(Value::Object(m)) => Ok(m.clone()),
        Some(v) => Err(CalcError::type_mismatch(field, "object", describe(v))),
        None => Err(CalcError::type_mismatch(field, "object", "nothing")),
    }
}

/// 字符串列表；缺省时为空列表。
pub fn check_string_list(field: &str, value: Option<&Value>) -> Result<Vec<String>> {
    match present(value) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(CalcError::type_mismatch(
                    format!("{field}[{i}]"),
                    "string",
                    describe(other),
                )),
            })
            .collect(),
        Some(v) => Err(CalcError::type_mismatch(field, "list", describe(v))),
    }
}

/// 强类型接口的范围检查。
pub fn positive(field: &str, value: i64) -> Result<u64> {
    if value < 1 {
        return Err(out_of_range(field, value, 1));
    }
    Ok(value as u64)
}

/// 强类型接口的范围检查。
pub fn non_negative(field: &str, value: i64) -> Result<u64> {
    if value < 0 {
        return Err(out_of_range(field, value, 0));
    }
    Ok(value as u64)
}
