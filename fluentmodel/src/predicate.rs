//! Typed conditions over leaf attributes.
//!
//! Leaf conditions come from methods on [`Attribute`]; which methods exist
//! depends on the attribute's value type:
//!
//! - every serializable value: `equals`, `not_equals`, `is_in`, `is_null`
//! - ordered values (numbers, dates, text): `less_than`, `at_most`,
//!   `greater_than`, `at_least`, `between`
//! - text: `like`, `starts_with`, `ends_with`, `contains`
//! - flags: `is_true`, `is_false`
//!
//! ```ignore
//! let recent = Predicate::and([
//!     Book::model().author().name().starts_with("Le Guin"),
//!     Book::model().year().at_least(1970),
//! ]);
//! assert_eq!(recent.to_string(), r#"(Book.author.name like "Le Guin%" and Book.year >= 1970)"#);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::ops::Not;

use crate::accessor::Attribute;
use crate::path::Path;

/// Operator of a binary comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "<>",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        }
    }
}

/// A composable condition over attribute paths.
///
/// Values are kept in their JSON form so conditions on differently typed
/// attributes combine freely. `And` and `Or` build boolean expressions; `!`
/// negates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "condition", rename_all = "snake_case")]
pub enum Predicate {
    Compare { path: Path, op: Comparison, value: Value },
    Between { path: Path, low: Value, high: Value },
    In { path: Path, values: Vec<Value> },
    /// SQL-style pattern: `%` matches any run, `_` one character, `\` escapes.
    Like { path: Path, pattern: String },
    IsNull { path: Path },
    IsNotNull { path: Path },
    And { all: Vec<Predicate> },
    Or { any: Vec<Predicate> },
    Not { inner: Box<Predicate> },
}

impl Predicate {
    /// All of `conditions`. Empty is always true.
    #[inline]
    pub fn and(conditions: impl IntoIterator<Item = Predicate>) -> Self {
        Self::And {
            all: conditions.into_iter().collect(),
        }
    }

    /// Any of `conditions`. Empty is always false.
    #[inline]
    pub fn or(conditions: impl IntoIterator<Item = Predicate>) -> Self {
        Self::Or {
            any: conditions.into_iter().collect(),
        }
    }

    /// This condition and `other`.
    pub fn and_also(self, other: Predicate) -> Self {
        match self {
            Self::And { mut all } => {
                all.push(other);
                Self::And { all }
            }
            first => Self::and([first, other]),
        }
    }

    /// This condition or `other`.
    pub fn or_else(self, other: Predicate) -> Self {
        match self {
            Self::Or { mut any } => {
                any.push(other);
                Self::Or { any }
            }
            first => Self::or([first, other]),
        }
    }

    /// Every path the condition mentions, in order of appearance.
    pub fn paths(&self) -> Vec<&Path> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths<'a>(&'a self, paths: &mut Vec<&'a Path>) {
        match self {
            Self::Compare { path, .. }
            | Self::Between { path, .. }
            | Self::In { path, .. }
            | Self::Like { path, .. }
            | Self::IsNull { path }
            | Self::IsNotNull { path } => paths.push(path),
            Self::And { all: conditions } | Self::Or { any: conditions } => {
                for condition in conditions {
                    condition.collect_paths(paths);
                }
            }
            Self::Not { inner } => inner.collect_paths(paths),
        }
    }

    fn fmt_joined(f: &mut fmt::Formatter<'_>, conditions: &[Predicate], separator: &str, empty: &str) -> fmt::Result {
        match conditions {
            [] => f.write_str(empty),
            [only] => write!(f, "{only}"),
            _ => {
                f.write_str("(")?;
                for (index, condition) in conditions.iter().enumerate() {
                    if index > 0 {
                        f.write_str(separator)?;
                    }
                    write!(f, "{condition}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        match self {
            Predicate::Not { inner } => *inner,
            Predicate::IsNull { path } => Predicate::IsNotNull { path },
            Predicate::IsNotNull { path } => Predicate::IsNull { path },
            other => Predicate::Not { inner: Box::new(other) },
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare { path, op, value } => write!(f, "{path} {} {value}", op.as_str()),
            Self::Between { path, low, high } => write!(f, "{path} between {low} and {high}"),
            Self::In { path, values } => write!(f, "{path} in {}", Value::Array(values.clone())),
            Self::Like { path, pattern } => write!(f, "{path} like {}", Value::String(pattern.clone())),
            Self::IsNull { path } => write!(f, "{path} is null"),
            Self::IsNotNull { path } => write!(f, "{path} is not null"),
            Self::And { all } => Self::fmt_joined(f, all, " and ", "true"),
            Self::Or { any } => Self::fmt_joined(f, any, " or ", "false"),
            Self::Not { inner } => write!(f, "not {inner}"),
        }
    }
}

/// JSON form of a literal. Values with no JSON form, such as maps with
/// non-string keys, become `null`.
fn literal<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Escape `%`, `_` and `\` so `text` matches literally inside a pattern.
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

impl<T: Serialize> Attribute<T> {
    pub fn equals(&self, value: impl Into<T>) -> Predicate {
        self.compare(Comparison::Eq, value)
    }

    pub fn not_equals(&self, value: impl Into<T>) -> Predicate {
        self.compare(Comparison::Ne, value)
    }

    /// Matches any of `values`.
    pub fn is_in<V: Into<T>>(&self, values: impl IntoIterator<Item = V>) -> Predicate {
        Predicate::In {
            path: self.path().clone(),
            values: values.into_iter().map(|value| literal::<T>(&value.into())).collect(),
        }
    }

    pub fn is_null(&self) -> Predicate {
        Predicate::IsNull {
            path: self.path().clone(),
        }
    }

    pub fn is_not_null(&self) -> Predicate {
        Predicate::IsNotNull {
            path: self.path().clone(),
        }
    }

    fn compare(&self, op: Comparison, value: impl Into<T>) -> Predicate {
        Predicate::Compare {
            path: self.path().clone(),
            op,
            value: literal::<T>(&value.into()),
        }
    }
}

impl<T: Serialize + PartialOrd> Attribute<T> {
    pub fn less_than(&self, value: impl Into<T>) -> Predicate {
        self.compare(Comparison::Lt, value)
    }

    pub fn at_most(&self, value: impl Into<T>) -> Predicate {
        self.compare(Comparison::Le, value)
    }

    pub fn greater_than(&self, value: impl Into<T>) -> Predicate {
        self.compare(Comparison::Gt, value)
    }

    pub fn at_least(&self, value: impl Into<T>) -> Predicate {
        self.compare(Comparison::Ge, value)
    }

    /// Inclusive range.
    pub fn between(&self, low: impl Into<T>, high: impl Into<T>) -> Predicate {
        Predicate::Between {
            path: self.path().clone(),
            low: literal::<T>(&low.into()),
            high: literal::<T>(&high.into()),
        }
    }
}

impl Attribute<String> {
    /// Match a raw pattern, see [`Predicate::Like`].
    pub fn like(&self, pattern: impl Into<String>) -> Predicate {
        Predicate::Like {
            path: self.path().clone(),
            pattern: pattern.into(),
        }
    }

    pub fn starts_with(&self, prefix: &str) -> Predicate {
        self.like(format!("{}%", escape_like(prefix)))
    }

    pub fn ends_with(&self, suffix: &str) -> Predicate {
        self.like(format!("%{}", escape_like(suffix)))
    }

    pub fn contains(&self, text: &str) -> Predicate {
        self.like(format!("%{}%", escape_like(text)))
    }
}

impl Attribute<bool> {
    pub fn is_true(&self) -> Predicate {
        self.equals(true)
    }

    pub fn is_false(&self) -> Predicate {
        self.equals(false)
    }
}
