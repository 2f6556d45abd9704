//! Clause parameters and their render-time substitution.

use crate::escape::{self, TimeUnit};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// A single Flux value with a fixed lexical rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Escaped, double-quoted string literal.
    Literal(String),
    /// Verbatim text for bare positions such as function bodies.
    Raw(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Duration { amount: i64, unit: TimeUnit },
    Time(DateTime<Utc>),
    /// `[v1, v2, ...]`
    List(Vec<Value>),
    /// `{k1: v1, k2: v2}`
    Record(Vec<(String, Value)>),
}

impl Value {
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    pub(crate) fn write_to(&self, out: &mut String) {
        match self {
            Value::Literal(s) => out.push_str(&escape::quoted(s)),
            Value::Raw(s) => out.push_str(s),
            Value::Int(i) => out.push_str(&i.to_string()),
            Value::Float(f) => out.push_str(&escape::format_float(*f)),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Duration { amount, unit } => {
                out.push_str(&escape::format_duration(*amount, *unit))
            }
            Value::Time(t) => out.push_str(&escape::format_time(t)),
            Value::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_to(out);
                }
                out.push(']');
            }
            Value::Record(fields) => {
                out.push('{');
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(key);
                    out.push_str(": ");
                    value.write_to(out);
                }
                out.push('}');
            }
        }
    }

    /// Builds a list of string literals, the common shape of `columns`
    /// arguments.
    pub fn columns<I, S>(columns: I) -> Value
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List(
            columns
                .into_iter()
                .map(|c| Value::Literal(c.into()))
                .collect(),
        )
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Literal(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Literal(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<(i64, TimeUnit)> for Value {
    fn from((amount, unit): (i64, TimeUnit)) -> Self {
        Value::Duration { amount, unit }
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Time(t)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Value::columns(items)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::columns(items)
    }
}

/// One clause parameter, pending substitution at render time.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// An immediate value.
    Value(Value),
    /// Bound to an external parameter looked up in [`Params`] when the
    /// pipeline is rendered.
    NamedRef(String),
    /// Declared but unset. Absent parameters never reach the output.
    Absent,
}

/// External parameter table resolved at render time.
///
/// Built by the caller immediately before rendering and discarded after.
/// Named references that the table does not satisfy are omitted from the
/// output, so one pipeline can be rendered against tables of different
/// shapes.
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: HashMap<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Params::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Ordered parameter store of one clause.
///
/// Parameters render in declaration order; overwriting a name replaces the
/// property at its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyStore {
    entries: Vec<(String, Property)>,
}

impl PropertyStore {
    pub fn new() -> Self {
        PropertyStore::default()
    }

    pub fn set(&mut self, name: impl Into<String>, prop: Property) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = prop,
            None => self.entries.push((name, prop)),
        }
    }

    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.set(name, Property::Value(value.into()));
    }

    /// Stores the value when present, otherwise declares the parameter
    /// absent so a later overwrite keeps its position.
    pub fn set_optional(&mut self, name: impl Into<String>, value: Option<Value>) {
        match value {
            Some(v) => self.set(name, Property::Value(v)),
            None => self.set(name, Property::Absent),
        }
    }

    /// Binds the parameter to an external parameter of the same name.
    pub fn set_named(&mut self, name: impl Into<String>) {
        let name = name.into();
        let parameter = name.clone();
        self.set(name, Property::NamedRef(parameter));
    }

    /// Binds the parameter to a differently named external parameter.
    pub fn set_named_as(&mut self, name: impl Into<String>, parameter: impl Into<String>) {
        self.set(name, Property::NamedRef(parameter.into()));
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p)
    }

    /// The immediate value stored under `name`, if any.
    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.get(name) {
            Some(Property::Value(v)) => Some(v),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes `name: value` pairs joined by `, `, in declaration order.
    /// Absent properties and unresolved named references are skipped.
    pub fn render(&self, params: &Params, out: &mut String) {
        let mut first = true;
        for (name, prop) in &self.entries {
            let value = match prop {
                Property::Value(v) => Some(v),
                Property::NamedRef(parameter) => params.get(parameter),
                Property::Absent => None,
            };
            if let Some(value) = value {
                if !first {
                    out.push_str(", ");
                }
                first = false;
                out.push_str(name);
                out.push_str(": ");
                value.write_to(out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rendered(store: &PropertyStore, params: &Params) -> String {
        let mut out = String::new();
        store.render(params, &mut out);
        out
    }

    #[test]
    fn test_values_render_fixed_forms() {
        assert_eq!(Value::from("mem").render(), "\"mem\"");
        assert_eq!(Value::Raw("(r) => r._value > 10".into()).render(), "(r) => r._value > 10");
        assert_eq!(Value::from(5).render(), "5");
        assert_eq!(Value::from(5.0).render(), "5.0");
        assert_eq!(Value::from(true).render(), "true");
        assert_eq!(Value::from((-1, TimeUnit::Hours)).render(), "-1h");
        assert_eq!(
            Value::from(Utc.timestamp_opt(0, 1).unwrap()).render(),
            "1970-01-01T00:00:00.000000001Z"
        );
        assert_eq!(Value::from(vec!["host", "region"]).render(), "[\"host\", \"region\"]");
        assert_eq!(
            Value::Record(vec![
                ("_value".to_string(), Value::from("water_level")),
                ("t1".to_string(), Value::Raw("t1".into())),
            ])
            .render(),
            "{_value: \"water_level\", t1: t1}"
        );
    }

    #[test]
    fn test_declaration_order_is_render_order() {
        let mut store = PropertyStore::new();
        store.set_value("start", Value::Duration { amount: -1, unit: TimeUnit::Hours });
        store.set_value("stop", Value::Duration { amount: -10, unit: TimeUnit::Minutes });
        assert_eq!(rendered(&store, &Params::new()), "start: -1h, stop: -10m");
    }

    #[test]
    fn test_overwrite_keeps_original_position() {
        let mut store = PropertyStore::new();
        store.set_value("n", 5);
        store.set_value("pos", 2);
        store.set_value("n", 10);
        assert_eq!(rendered(&store, &Params::new()), "n: 10, pos: 2");
    }

    #[test]
    fn test_absent_properties_are_omitted_entirely() {
        let mut store = PropertyStore::new();
        store.set_value("every", Value::Duration { amount: 5, unit: TimeUnit::Minutes });
        store.set_optional("period", None);
        store.set_value("offset", Value::Duration { amount: 1, unit: TimeUnit::Minutes });
        assert_eq!(rendered(&store, &Params::new()), "every: 5m, offset: 1m");
    }

    #[test]
    fn test_named_reference_resolves_from_table() {
        let mut store = PropertyStore::new();
        store.set_named("bucket");
        store.set_named_as("start", "window_start");

        let params = Params::new()
            .with("bucket", "telegraf")
            .with("window_start", (-30, TimeUnit::Minutes));
        assert_eq!(rendered(&store, &params), "bucket: \"telegraf\", start: -30m");
    }

    #[test]
    fn test_unresolved_named_reference_is_silently_omitted() {
        let mut store = PropertyStore::new();
        store.set_value("n", 5);
        store.set_named("pos");
        assert_eq!(rendered(&store, &Params::new()), "n: 5");
    }

    #[test]
    fn test_empty_store_renders_nothing() {
        assert_eq!(rendered(&PropertyStore::new(), &Params::new()), "");
    }
}
