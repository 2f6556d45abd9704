//! The pipeline builder.
//!
//! A [`Flux`] value is an ordered chain of clauses. Source functions
//! ([`from`], [`expression`], [`join`]) start a pipeline; transformation
//! methods consume `self` and hand back the extended pipeline, so chains
//! read in the same order as the rendered text. Rendering joins the clause
//! texts with ` |> ` and resolves named references against a caller
//! supplied [`Params`] table.

use crate::clause::Clause;
use crate::error::FluxError;
use crate::escape::TimeUnit;
use crate::property::{Params, PropertyStore, Value};
use crate::registry::{self, OperatorRegistry};
use crate::restriction::Restrictions;

/// An ordered chain of pipeline stages forming one query.
#[derive(Debug, Clone, Default)]
#[must_use = "pipelines do nothing until .render() is called"]
pub struct Flux {
    clauses: Vec<Clause>,
}

/// Starts a pipeline reading from `bucket`.
pub fn from(bucket: impl Into<String>) -> Result<Flux, FluxError> {
    let mut props = PropertyStore::new();
    props.set_value("bucket", bucket.into());
    Flux::new().push_validated("from", props)
}

/// Starts a pipeline reading from `bucket` on the given hosts.
pub fn from_with_hosts<I, S>(bucket: impl Into<String>, hosts: I) -> Result<Flux, FluxError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut props = PropertyStore::new();
    props.set_value("bucket", bucket.into());
    props.set_value("hosts", Value::columns(hosts));
    Flux::new().push_validated("from", props)
}

/// Starts a pipeline from verbatim Flux text.
pub fn expression(flux: impl Into<String>) -> Result<Flux, FluxError> {
    let flux = flux.into();
    if flux.trim().is_empty() {
        return Err(FluxError::validation("expression", "text must not be empty"));
    }
    Ok(Flux::new().append(Clause::Expression(flux)))
}

/// Starts a pipeline joining two upstream pipelines on a tag column.
///
/// The upstream pipelines render as named assignments ahead of the join
/// call:
///
/// ```text
/// t1 = from(bucket: "a") |> range(start: -30m)
/// t2 = from(bucket: "b") |> range(start: -30m)
/// join(tables: {t1: t1, t2: t2}, on: ["host"], method: "inner")
/// ```
pub fn join(
    left_name: impl Into<String>,
    left: Flux,
    right_name: impl Into<String>,
    right: Flux,
    tag: impl Into<String>,
    method: impl Into<String>,
) -> Result<Flux, FluxError> {
    let left_name = left_name.into();
    let right_name = right_name.into();
    if left_name.is_empty() || right_name.is_empty() {
        return Err(FluxError::validation("join", "table names must not be empty"));
    }
    if left.is_empty() || right.is_empty() {
        return Err(FluxError::validation("join", "joined pipelines must not be empty"));
    }

    let mut props = PropertyStore::new();
    props.set_value(
        "tables",
        Value::Record(vec![
            (left_name.clone(), Value::Raw(left_name.clone())),
            (right_name.clone(), Value::Raw(right_name.clone())),
        ]),
    );
    props.set_value("on", Value::List(vec![Value::Literal(tag.into())]));
    props.set_value("method", method.into());
    registry::builtins().validate("join", &props)?;

    Ok(Flux::new().append(Clause::Join {
        left_name,
        left,
        right_name,
        right,
        props,
    }))
}

impl Flux {
    /// An empty pipeline. Rendering it is an error until a clause is
    /// appended.
    pub fn new() -> Self {
        Flux::default()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Appends an already constructed clause.
    pub fn append(mut self, clause: Clause) -> Flux {
        self.clauses.push(clause);
        self
    }

    /// Appends a registered operator by tag, with no parameters bound yet.
    pub fn operator(self, tag: &str) -> Result<Flux, FluxError> {
        let clause = registry::builtins().clause(tag)?;
        Ok(self.append(clause))
    }

    /// Like [`Flux::operator`], resolving the tag in a caller supplied
    /// registry instead of the built-ins.
    pub fn operator_in(self, registry: &OperatorRegistry, tag: &str) -> Result<Flux, FluxError> {
        let clause = registry.clause(tag)?;
        Ok(self.append(clause))
    }

    /// Appends verbatim Flux text as a downstream stage.
    pub fn pipe_expression(self, flux: impl Into<String>) -> Result<Flux, FluxError> {
        let flux = flux.into();
        if flux.trim().is_empty() {
            return Err(FluxError::validation("expression", "text must not be empty"));
        }
        Ok(self.append(Clause::Expression(flux)))
    }

    // Property binding on the current (last) clause. All binders are
    // no-ops on an empty pipeline and on expression stages, which carry no
    // parameters.

    /// Binds `property` to an external parameter of the same name.
    pub fn with_named(self, property: impl Into<String>) -> Flux {
        let property = property.into();
        self.bind(move |props| props.set_named(property))
    }

    /// Binds `property` to the external parameter `parameter`.
    pub fn with_named_as(
        self,
        property: impl Into<String>,
        parameter: impl Into<String>,
    ) -> Flux {
        let property = property.into();
        let parameter = parameter.into();
        self.bind(move |props| props.set_named_as(property, parameter))
    }

    /// Stores an immediate value for `property`. Strings become escaped
    /// literals; use [`Flux::with_raw`] for bare text.
    pub fn with_value(self, property: impl Into<String>, value: impl Into<Value>) -> Flux {
        let property = property.into();
        let value = value.into();
        self.bind(move |props| props.set_value(property, value))
    }

    /// Stores a duration value for `property`.
    pub fn with_duration(
        self,
        property: impl Into<String>,
        amount: i64,
        unit: TimeUnit,
    ) -> Flux {
        self.with_value(property, Value::Duration { amount, unit })
    }

    /// Stores verbatim, unescaped text for `property`.
    pub fn with_raw(self, property: impl Into<String>, text: impl Into<String>) -> Flux {
        self.with_value(property, Value::Raw(text.into()))
    }

    /// Sets the `useStartTime` option of the current aggregate clause.
    pub fn use_start_time(self, value: bool) -> Flux {
        self.with_value("useStartTime", value)
    }

    // Transformations.

    pub fn count(self) -> Flux {
        self.push_bare("count")
    }

    /// Computes the covariance between the two given columns.
    pub fn covariance<I, S>(self, columns: I) -> Result<Flux, FluxError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut props = PropertyStore::new();
        props.set_value("columns", Value::columns(columns));
        self.push_validated("covariance", props)
    }

    pub fn covariance_with<I, S>(
        self,
        columns: I,
        pearsonr: bool,
        value_dst: impl Into<String>,
    ) -> Result<Flux, FluxError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut props = PropertyStore::new();
        props.set_value("columns", Value::columns(columns));
        props.set_value("pearsonr", pearsonr);
        props.set_value("valueDst", value_dst.into());
        self.push_validated("covariance", props)
    }

    /// Computes the rate of change per `unit` of time.
    pub fn derivative(self, amount: i64, unit: TimeUnit) -> Flux {
        let mut props = PropertyStore::new();
        props.set_value("unit", Value::Duration { amount, unit });
        self.push("derivative", props)
    }

    pub fn difference(self) -> Flux {
        self.push_bare("difference")
    }

    pub fn distinct(self, column: impl Into<String>) -> Flux {
        let mut props = PropertyStore::new();
        props.set_value("column", column.into());
        self.push("distinct", props)
    }

    /// Drops the named columns.
    pub fn drop<I, S>(self, columns: I) -> Flux
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut props = PropertyStore::new();
        props.set_value("columns", Value::columns(columns));
        self.push("drop", props)
    }

    /// Drops the columns for which `function` returns true. The predicate
    /// body receives the column name as `column`.
    pub fn drop_by(self, function: impl Into<String>) -> Flux {
        let mut props = PropertyStore::new();
        props.set_value("fn", column_fn(function));
        self.push("drop", props)
    }

    /// Filters records through the given restriction expression.
    pub fn filter(self, restrictions: Restrictions) -> Flux {
        let mut props = PropertyStore::new();
        props.set_value("fn", record_fn(restrictions.to_string()));
        self.push("filter", props)
    }

    pub fn first(self) -> Flux {
        self.push_bare("first")
    }

    pub fn group(self) -> Flux {
        self.push_bare("group")
    }

    /// Groups by the named columns.
    pub fn group_by<I, S>(self, columns: I) -> Flux
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut props = PropertyStore::new();
        props.set_value("by", Value::columns(columns));
        self.push("group", props)
    }

    /// Groups by everything except the named columns.
    pub fn group_except<I, S>(self, columns: I) -> Flux
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut props = PropertyStore::new();
        props.set_value("except", Value::columns(columns));
        self.push("group", props)
    }

    pub fn integral(self, amount: i64, unit: TimeUnit) -> Flux {
        let mut props = PropertyStore::new();
        props.set_value("unit", Value::Duration { amount, unit });
        self.push("integral", props)
    }

    /// Keeps only the named columns.
    pub fn keep<I, S>(self, columns: I) -> Flux
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut props = PropertyStore::new();
        props.set_value("columns", Value::columns(columns));
        self.push("keep", props)
    }

    /// Keeps the columns for which `function` returns true.
    pub fn keep_by(self, function: impl Into<String>) -> Flux {
        let mut props = PropertyStore::new();
        props.set_value("fn", column_fn(function));
        self.push("keep", props)
    }

    pub fn last(self) -> Flux {
        self.push_bare("last")
    }

    /// Restricts output to the first `n` records. `n` must be at least 1.
    pub fn limit(self, n: i64) -> Result<Flux, FluxError> {
        let mut props = PropertyStore::new();
        props.set_value("n", n);
        self.push_validated("limit", props)
    }

    /// Applies `function` to each record. The body receives the record as
    /// `r`.
    pub fn map(self, function: impl Into<String>) -> Flux {
        let mut props = PropertyStore::new();
        props.set_value("fn", record_fn(function.into()));
        self.push("map", props)
    }

    pub fn max(self) -> Flux {
        self.push_bare("max")
    }

    pub fn mean(self) -> Flux {
        self.push_bare("mean")
    }

    pub fn min(self) -> Flux {
        self.push_bare("min")
    }

    /// Filters records to the time window starting `start` ago.
    pub fn range(self, start: i64, unit: TimeUnit) -> Flux {
        let mut props = PropertyStore::new();
        props.set_value("start", Value::Duration { amount: start, unit });
        self.push("range", props)
    }

    pub fn range_stop(self, start: i64, stop: i64, unit: TimeUnit) -> Flux {
        let mut props = PropertyStore::new();
        props.set_value("start", Value::Duration { amount: start, unit });
        props.set_value("stop", Value::Duration { amount: stop, unit });
        self.push("range", props)
    }

    pub fn range_time(self, start: chrono::DateTime<chrono::Utc>) -> Flux {
        let mut props = PropertyStore::new();
        props.set_value("start", start);
        self.push("range", props)
    }

    pub fn range_time_stop(
        self,
        start: chrono::DateTime<chrono::Utc>,
        stop: chrono::DateTime<chrono::Utc>,
    ) -> Flux {
        let mut props = PropertyStore::new();
        props.set_value("start", start);
        props.set_value("stop", stop);
        self.push("range", props)
    }

    /// Renames columns by the given old name to new name pairs.
    pub fn rename<I, S, T>(self, columns: I) -> Flux
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let record = Value::Record(
            columns
                .into_iter()
                .map(|(old, new)| (old.into(), Value::Literal(new.into())))
                .collect(),
        );
        let mut props = PropertyStore::new();
        props.set_value("columns", record);
        self.push("rename", props)
    }

    /// Renames columns through a function of the column name.
    pub fn rename_by(self, function: impl Into<String>) -> Flux {
        let mut props = PropertyStore::new();
        props.set_value("fn", column_fn(function));
        self.push("rename", props)
    }

    /// Samples every `n`th record. `n` must be at least 1.
    pub fn sample(self, n: i64) -> Result<Flux, FluxError> {
        let mut props = PropertyStore::new();
        props.set_value("n", n);
        self.push_validated("sample", props)
    }

    /// Samples every `n`th record starting at offset `pos`, which must lie
    /// in `0..n`.
    pub fn sample_with_pos(self, n: i64, pos: i64) -> Result<Flux, FluxError> {
        let mut props = PropertyStore::new();
        props.set_value("n", n);
        props.set_value("pos", pos);
        self.push_validated("sample", props)
    }

    /// Assigns `value` to the column `key` on every record.
    pub fn set(self, key: impl Into<String>, value: impl Into<String>) -> Flux {
        let mut props = PropertyStore::new();
        props.set_value("key", key.into());
        props.set_value("value", value.into());
        self.push("set", props)
    }

    /// Shifts every record's time forward by the given duration.
    pub fn shift(self, amount: i64, unit: TimeUnit) -> Flux {
        let mut props = PropertyStore::new();
        props.set_value("shift", Value::Duration { amount, unit });
        self.push("shift", props)
    }

    pub fn shift_columns<I, S>(self, amount: i64, unit: TimeUnit, columns: I) -> Flux
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut props = PropertyStore::new();
        props.set_value("shift", Value::Duration { amount, unit });
        props.set_value("columns", Value::columns(columns));
        self.push("shift", props)
    }

    pub fn skew(self) -> Flux {
        self.push_bare("skew")
    }

    pub fn sort(self) -> Flux {
        self.push_bare("sort")
    }

    pub fn sort_desc(self, desc: bool) -> Flux {
        let mut props = PropertyStore::new();
        props.set_value("desc", desc);
        self.push("sort", props)
    }

    pub fn sort_by<I, S>(self, columns: I) -> Flux
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut props = PropertyStore::new();
        props.set_value("cols", Value::columns(columns));
        self.push("sort", props)
    }

    pub fn sort_by_desc<I, S>(self, columns: I, desc: bool) -> Flux
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut props = PropertyStore::new();
        props.set_value("cols", Value::columns(columns));
        props.set_value("desc", desc);
        self.push("sort", props)
    }

    pub fn spread(self) -> Flux {
        self.push_bare("spread")
    }

    pub fn stddev(self) -> Flux {
        self.push_bare("stddev")
    }

    pub fn sum(self) -> Flux {
        self.push_bare("sum")
    }

    pub fn to_bool(self) -> Flux {
        self.push_bare("toBool")
    }

    pub fn to_duration(self) -> Flux {
        self.push_bare("toDuration")
    }

    pub fn to_float(self) -> Flux {
        self.push_bare("toFloat")
    }

    pub fn to_int(self) -> Flux {
        self.push_bare("toInt")
    }

    /// Converts values to strings. Renders `toString()`; the method name
    /// avoids shadowing [`ToString::to_string`].
    pub fn to_string_values(self) -> Flux {
        self.push_bare("toString")
    }

    pub fn to_time(self) -> Flux {
        self.push_bare("toTime")
    }

    pub fn to_uint(self) -> Flux {
        self.push_bare("toUInt")
    }

    /// Partitions records into fixed windows of the given duration.
    pub fn window(self, every: i64, unit: TimeUnit) -> Flux {
        let mut props = PropertyStore::new();
        props.set_value("every", Value::Duration { amount: every, unit });
        self.push("window", props)
    }

    pub fn window_period(
        self,
        every: i64,
        every_unit: TimeUnit,
        period: i64,
        period_unit: TimeUnit,
    ) -> Flux {
        let mut props = PropertyStore::new();
        props.set_value("every", Value::Duration { amount: every, unit: every_unit });
        props.set_value("period", Value::Duration { amount: period, unit: period_unit });
        self.push("window", props)
    }

    /// Names the result of this pipeline. Renders the `yield` operator.
    pub fn yield_name(self, name: impl Into<String>) -> Flux {
        let mut props = PropertyStore::new();
        props.set_value("name", name.into());
        self.push("yield", props)
    }

    // Rendering.

    /// Renders the pipeline against the given parameter table.
    pub fn render(&self, params: &Params) -> Result<String, FluxError> {
        if self.clauses.is_empty() {
            return Err(FluxError::EmptyPipeline);
        }
        let mut preamble = String::new();
        let mut chain = String::new();
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                chain.push_str(" |> ");
            }
            clause.render(params, &mut preamble, &mut chain)?;
        }
        preamble.push_str(&chain);
        Ok(preamble)
    }

    /// Renders with an empty parameter table; every named reference is
    /// omitted.
    pub fn render_default(&self) -> Result<String, FluxError> {
        self.render(&Params::new())
    }

    fn bind(mut self, f: impl FnOnce(&mut PropertyStore)) -> Flux {
        if let Some(props) = self.clauses.last_mut().and_then(Clause::props_mut) {
            f(props);
        }
        self
    }

    fn push(mut self, name: &'static str, props: PropertyStore) -> Flux {
        self.clauses.push(Clause::call(name, props));
        self
    }

    fn push_bare(self, name: &'static str) -> Flux {
        self.push(name, PropertyStore::new())
    }

    fn push_validated(
        self,
        name: &'static str,
        props: PropertyStore,
    ) -> Result<Flux, FluxError> {
        registry::builtins().validate(name, &props)?;
        Ok(self.push(name, props))
    }
}

/// Wraps a predicate body in the record lambda head, `(r) => body`.
fn record_fn(body: String) -> Value {
    Value::Raw(format!("(r) => {}", body))
}

/// Wraps a predicate body in the column lambda head, `(column) => body`.
fn column_fn(body: impl Into<String>) -> Value {
    Value::Raw(format!("(column) => {}", body.into()))
}
