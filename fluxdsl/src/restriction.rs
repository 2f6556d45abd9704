//! Boolean expressions for `filter(fn: (r) => ...)` bodies.

use crate::escape;
use crate::property::Value;
use std::fmt::{Display, Formatter};

/// One boolean expression over the record `r`.
///
/// Leaves compare a column against a value; `and`/`or` group subexpressions
/// in parentheses. The rendered text is spliced verbatim into the filter
/// function body.
#[derive(Debug, Clone, PartialEq)]
pub enum Restrictions {
    Comparison {
        column: String,
        operator: String,
        value: Value,
    },
    And(Vec<Restrictions>),
    Or(Vec<Restrictions>),
}

impl Restrictions {
    pub fn and(restrictions: Vec<Restrictions>) -> Self {
        Restrictions::And(restrictions)
    }

    pub fn or(restrictions: Vec<Restrictions>) -> Self {
        Restrictions::Or(restrictions)
    }

    pub fn measurement() -> ColumnRestriction {
        Restrictions::column("_measurement")
    }

    pub fn field() -> ColumnRestriction {
        Restrictions::column("_field")
    }

    pub fn value() -> ColumnRestriction {
        Restrictions::column("_value")
    }

    pub fn start() -> ColumnRestriction {
        Restrictions::column("_start")
    }

    pub fn stop() -> ColumnRestriction {
        Restrictions::column("_stop")
    }

    pub fn time() -> ColumnRestriction {
        Restrictions::column("_time")
    }

    pub fn tag(name: impl Into<String>) -> ColumnRestriction {
        Restrictions::column(name)
    }

    pub fn column(name: impl Into<String>) -> ColumnRestriction {
        ColumnRestriction { column: name.into() }
    }
}

impl Display for Restrictions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Restrictions::Comparison { column, operator, value } => {
                write!(f, "r[{}] {} {}", escape::quoted(column), operator, value.render())
            }
            Restrictions::And(group) => write_group(f, group, " and "),
            Restrictions::Or(group) => write_group(f, group, " or "),
        }
    }
}

fn write_group(
    f: &mut Formatter<'_>,
    group: &[Restrictions],
    separator: &str,
) -> std::fmt::Result {
    write!(f, "(")?;
    for (i, restriction) in group.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", separator)?;
        }
        write!(f, "{}", restriction)?;
    }
    write!(f, ")")
}

/// Builder for comparisons against one record column.
pub struct ColumnRestriction {
    column: String,
}

impl ColumnRestriction {
    pub fn equal(self, value: impl Into<Value>) -> Restrictions {
        self.custom(value, "==")
    }

    pub fn not_equal(self, value: impl Into<Value>) -> Restrictions {
        self.custom(value, "!=")
    }

    pub fn less(self, value: impl Into<Value>) -> Restrictions {
        self.custom(value, "<")
    }

    pub fn greater(self, value: impl Into<Value>) -> Restrictions {
        self.custom(value, ">")
    }

    pub fn less_or_equal(self, value: impl Into<Value>) -> Restrictions {
        self.custom(value, "<=")
    }

    pub fn greater_or_equal(self, value: impl Into<Value>) -> Restrictions {
        self.custom(value, ">=")
    }

    /// Comparison with a caller-supplied operator, e.g. `=~` against a
    /// `Value::Raw` regex.
    pub fn custom(self, value: impl Into<Value>, operator: impl Into<String>) -> Restrictions {
        Restrictions::Comparison {
            column: self.column,
            operator: operator.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_comparison() {
        let r = Restrictions::measurement().equal("mem");
        assert_eq!(r.to_string(), "r[\"_measurement\"] == \"mem\"");
    }

    #[test]
    fn test_and_group_is_parenthesized() {
        let r = Restrictions::and(vec![
            Restrictions::measurement().equal("mem"),
            Restrictions::field().equal("used_percent"),
        ]);
        assert_eq!(
            r.to_string(),
            "(r[\"_measurement\"] == \"mem\" and r[\"_field\"] == \"used_percent\")"
        );
    }

    #[test]
    fn test_or_inside_and() {
        let r = Restrictions::and(vec![
            Restrictions::tag("host").not_equal("server-a"),
            Restrictions::or(vec![
                Restrictions::value().greater(10),
                Restrictions::value().less(-10),
            ]),
        ]);
        assert_eq!(
            r.to_string(),
            "(r[\"host\"] != \"server-a\" and (r[\"_value\"] > 10 or r[\"_value\"] < -10))"
        );
    }

    #[test]
    fn test_numeric_comparisons() {
        assert_eq!(
            Restrictions::value().greater_or_equal(99.5).to_string(),
            "r[\"_value\"] >= 99.5"
        );
        assert_eq!(
            Restrictions::column("_stop").less_or_equal(100).to_string(),
            "r[\"_stop\"] <= 100"
        );
    }

    #[test]
    fn test_custom_operator_with_raw_value() {
        let r = Restrictions::field().custom(Value::Raw("/usage_.*/".into()), "=~");
        assert_eq!(r.to_string(), "r[\"_field\"] =~ /usage_.*/");
    }
}
