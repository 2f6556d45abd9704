/*!
# fluxdsl: a fluent builder for Flux query text

Flux is the functional query language of InfluxDB 2.x. A query is a chain of
operator calls piped left to right:

```text
from(bucket: "telegraf") |> range(start: -1h) |> last()
```

This crate assembles such chains programmatically. It is a pure text
builder: no I/O, no async, no parsing of the language. Structural
constraints (an empty bucket, a sample offset past the sample size) fail
when the clause is constructed, never when the finished pipeline is
rendered.

## Building a query

```rust
use fluxdsl::{from, Params, Restrictions, TimeUnit};

fn main() -> Result<(), fluxdsl::FluxError> {
    let mem = from("telegraf")?
        .filter(Restrictions::and(vec![
            Restrictions::measurement().equal("mem"),
            Restrictions::field().equal("used_percent"),
        ]))
        .range(-1, TimeUnit::Hours)
        .last();

    assert_eq!(
        mem.render(&Params::new())?,
        "from(bucket: \"telegraf\") |> filter(fn: (r) => (r[\"_measurement\"] == \"mem\" and r[\"_field\"] == \"used_percent\")) |> range(start: -1h) |> last()"
    );
    Ok(())
}
```

## Late-bound parameters

Clause parameters can reference an external table resolved at render time.
References the table does not satisfy are omitted from the output, keeping
optional keyword semantics:

```rust
use fluxdsl::{from, Params, TimeUnit};

fn main() -> Result<(), fluxdsl::FluxError> {
    let flux = from("telegraf")?
        .operator("range")?
        .with_named("start");

    let last_hour = Params::new().with("start", (-1, TimeUnit::Hours));
    assert_eq!(
        flux.render(&last_hour)?,
        "from(bucket: \"telegraf\") |> range(start: -1h)"
    );
    assert_eq!(flux.render(&Params::new())?, "from(bucket: \"telegraf\") |> range()");
    Ok(())
}
```

## Custom operators

Operators outside the built-in vocabulary go through an
[`OperatorRegistry`](crate::OperatorRegistry) instance, so unknown tags fail
up front instead of producing a query the server rejects.

A rendered pipeline is plain text; executing it against a server belongs to
a transport client, not to this crate.
*/

pub mod clause;
pub mod error;
pub mod escape;
pub mod pipeline;
pub mod property;
pub mod registry;
pub mod restriction;

pub use clause::Clause;
pub use error::FluxError;
pub use escape::TimeUnit;
pub use pipeline::{expression, from, from_with_hosts, join, Flux};
pub use property::{Params, Property, PropertyStore, Value};
pub use registry::{builtins, OperatorRegistry, Validator};
pub use restriction::{ColumnRestriction, Restrictions};
