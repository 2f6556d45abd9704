//! Explicit operator registry.
//!
//! Every operator the builder knows is registered by tag, optionally with a
//! construction-time validator. Dynamic construction goes through
//! [`OperatorRegistry::clause`], so an unknown tag fails up front instead of
//! producing a query the server rejects. Applications can keep their own
//! registry instance for custom operators.

use crate::clause::Clause;
use crate::error::FluxError;
use crate::property::{PropertyStore, Value};
use lazy_static::lazy_static;
use std::collections::HashMap;

/// Checks the structural constraints of one operator against the properties
/// supplied at construction. Constraints only fire when the properties they
/// involve are present, so partially specified clauses stay valid.
pub type Validator = fn(&PropertyStore) -> Result<(), FluxError>;

#[derive(Clone)]
struct Operator {
    name: &'static str,
    validator: Option<Validator>,
}

/// Maps operator tags to their descriptors.
#[derive(Clone, Default)]
pub struct OperatorRegistry {
    operators: HashMap<String, Operator>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        OperatorRegistry::default()
    }

    pub fn register(&mut self, name: &'static str) {
        self.operators.insert(
            name.to_string(),
            Operator {
                name,
                validator: None,
            },
        );
    }

    pub fn register_with_validator(&mut self, name: &'static str, validator: Validator) {
        self.operators.insert(
            name.to_string(),
            Operator {
                name,
                validator: Some(validator),
            },
        );
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.operators.contains_key(tag)
    }

    /// Builds an empty call clause for `tag`, failing on unknown tags.
    pub fn clause(&self, tag: &str) -> Result<Clause, FluxError> {
        let op = self
            .operators
            .get(tag)
            .ok_or_else(|| FluxError::UnknownOperator(tag.to_string()))?;
        Ok(Clause::call(op.name, PropertyStore::new()))
    }

    /// Runs the registered validator for `tag`, if any, against `props`.
    pub fn validate(&self, tag: &str, props: &PropertyStore) -> Result<(), FluxError> {
        let op = self
            .operators
            .get(tag)
            .ok_or_else(|| FluxError::UnknownOperator(tag.to_string()))?;
        match op.validator {
            Some(validator) => validator(props),
            None => Ok(()),
        }
    }
}

/// The registry holding every built-in Flux operator.
pub fn builtins() -> &'static OperatorRegistry {
    &BUILTINS
}

lazy_static! {
    static ref BUILTINS: OperatorRegistry = {
        let mut r = OperatorRegistry::new();
        r.register_with_validator("from", validate_from);
        r.register_with_validator("join", validate_join);
        r.register_with_validator("limit", validate_limit);
        r.register_with_validator("sample", validate_sample);
        r.register_with_validator("covariance", validate_covariance);
        for name in [
            "count",
            "derivative",
            "difference",
            "distinct",
            "drop",
            "filter",
            "first",
            "group",
            "integral",
            "keep",
            "last",
            "map",
            "max",
            "mean",
            "min",
            "range",
            "rename",
            "set",
            "shift",
            "skew",
            "sort",
            "spread",
            "stddev",
            "sum",
            "toBool",
            "toDuration",
            "toFloat",
            "toInt",
            "toString",
            "toTime",
            "toUInt",
            "window",
            "yield",
        ] {
            r.register(name);
        }
        r
    };
}

fn validate_from(props: &PropertyStore) -> Result<(), FluxError> {
    if let Some(Value::Literal(bucket)) = props.value("bucket") {
        if bucket.is_empty() {
            return Err(FluxError::validation("from", "bucket must not be empty"));
        }
    }
    Ok(())
}

fn validate_join(props: &PropertyStore) -> Result<(), FluxError> {
    if let Some(Value::List(tags)) = props.value("on") {
        let empty = tags.is_empty()
            || tags
                .iter()
                .any(|t| matches!(t, Value::Literal(tag) if tag.is_empty()));
        if empty {
            return Err(FluxError::validation("join", "tag to join on must not be empty"));
        }
    }
    Ok(())
}

fn validate_limit(props: &PropertyStore) -> Result<(), FluxError> {
    if let Some(Value::Int(n)) = props.value("n") {
        if *n < 1 {
            return Err(FluxError::validation("limit", "n must be at least 1"));
        }
    }
    Ok(())
}

fn validate_sample(props: &PropertyStore) -> Result<(), FluxError> {
    let n = match props.value("n") {
        Some(Value::Int(n)) => {
            if *n < 1 {
                return Err(FluxError::validation("sample", "n must be at least 1"));
            }
            Some(*n)
        }
        _ => None,
    };
    if let Some(Value::Int(pos)) = props.value("pos") {
        if *pos < 0 {
            return Err(FluxError::validation("sample", "pos must not be negative"));
        }
        if let Some(n) = n {
            if *pos >= n {
                return Err(FluxError::validation("sample", "pos must be less than n"));
            }
        }
    }
    Ok(())
}

fn validate_covariance(props: &PropertyStore) -> Result<(), FluxError> {
    if let Some(Value::List(columns)) = props.value("columns") {
        if columns.len() != 2 {
            return Err(FluxError::validation(
                "covariance",
                "requires exactly two columns",
            ));
        }
    }
    Ok(())
}
