use serde_json::Value;
use std::cmp::Ordering;

/// Dynamic-value semantics shared by the node processors.
///
/// Workflow data is untyped JSON authored in the editor, so comparisons are
/// deliberately loose: numbers, numeric strings and booleans coerce into each
/// other, and containers compare structurally.
pub trait ValueExt {
    /// `false` for null, `false`, `0`, `NaN` and the empty string.
    fn is_truthy(&self) -> bool;

    /// Numeric view of the value. Strings are trimmed and parsed (the empty
    /// string is `0`), booleans map to `0`/`1`, null to `0`.
    fn to_number(&self) -> Option<f64>;

    /// Text used when a value is spliced into a string.
    fn to_display_string(&self) -> String;

    /// Walk a dotted path (`a.b.0.c`) through objects and arrays.
    /// An empty path returns the value itself.
    fn get_path(&self, path: &str) -> Option<&Value>;

    /// Equality with type coercion between numbers, strings and booleans.
    fn loose_eq(&self, other: &Value) -> bool;

    /// Equality without coercion; numbers compare by value regardless of
    /// their integer or float representation.
    fn strict_eq(&self, other: &Value) -> bool;

    /// Ordering used by the comparison operators. Two strings compare
    /// lexicographically, everything else numerically when both sides coerce.
    fn loose_cmp(&self, other: &Value) -> Option<Ordering>;

    /// Length of strings (in characters), arrays and objects.
    fn len(&self) -> Option<usize>;
}

impl ValueExt for Value {
    fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    fn to_number(&self) -> Option<f64> {
        match self {
            Value::Null => Some(0.0),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Number(n) => n.as_f64(),
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Some(0.0)
                } else {
                    trimmed.parse::<f64>().ok()
                }
            }
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    fn to_display_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    fn get_path(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(self);
        }

        path.split('.').try_fold(self, |current, key| match current {
            Value::Object(map) => map.get(key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Number(_), Value::Number(_)) => self.strict_eq(other),
            (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
                self.strict_eq(other)
            }
            (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => {
                false
            }
            _ => match (self.to_number(), other.to_number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.strict_eq(y))
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| b.get(k).map(|w| v.strict_eq(w)).unwrap_or(false))
            }
            _ => self == other,
        }
    }

    fn loose_cmp(&self, other: &Value) -> Option<Ordering> {
        if let (Value::String(a), Value::String(b)) = (self, other) {
            return Some(a.cmp(b));
        }
        let (a, b) = (self.to_number()?, other.to_number()?);
        a.partial_cmp(&b)
    }

    fn len(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::Array(items) => Some(items.len()),
            Value::Object(map) => Some(map.len()),
            _ => None,
        }
    }
}
