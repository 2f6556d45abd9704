//! Pipeline stages and their text templates.

use crate::error::FluxError;
use crate::pipeline::Flux;
use crate::property::{Params, PropertyStore};

/// One pipeline stage.
///
/// `Call` covers every ordinary operator: a fixed name followed by the
/// rendered parameter list. `Expression` is verbatim caller-supplied text
/// with no parameter syntax. `Join` is the one structurally special
/// operator; it owns two upstream pipelines and renders them as named
/// assignments ahead of the call site.
#[derive(Debug, Clone)]
pub enum Clause {
    Call {
        name: String,
        props: PropertyStore,
    },
    Expression(String),
    Join {
        left_name: String,
        left: Flux,
        right_name: String,
        right: Flux,
        props: PropertyStore,
    },
}

impl Clause {
    pub fn call(name: impl Into<String>, props: PropertyStore) -> Clause {
        Clause::Call {
            name: name.into(),
            props,
        }
    }

    /// Parameter store of this stage, or `None` for expression stages,
    /// which carry no parameters.
    pub(crate) fn props_mut(&mut self) -> Option<&mut PropertyStore> {
        match self {
            Clause::Call { props, .. } | Clause::Join { props, .. } => Some(props),
            Clause::Expression(_) => None,
        }
    }

    /// Renders this stage. `preamble` collects text that must precede the
    /// whole pipeline (join table assignments); `out` receives the stage
    /// text itself.
    pub(crate) fn render(
        &self,
        params: &Params,
        preamble: &mut String,
        out: &mut String,
    ) -> Result<(), FluxError> {
        match self {
            Clause::Call { name, props } => {
                out.push_str(name);
                out.push('(');
                props.render(params, out);
                out.push(')');
            }
            Clause::Expression(text) => out.push_str(text),
            Clause::Join {
                left_name,
                left,
                right_name,
                right,
                props,
            } => {
                preamble.push_str(left_name);
                preamble.push_str(" = ");
                preamble.push_str(&left.render(params)?);
                preamble.push('\n');
                preamble.push_str(right_name);
                preamble.push_str(" = ");
                preamble.push_str(&right.render(params)?);
                preamble.push('\n');

                out.push_str("join(");
                props.render(params, out);
                out.push(')');
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::Value;

    fn rendered(clause: &Clause) -> String {
        let mut preamble = String::new();
        let mut out = String::new();
        clause
            .render(&Params::new(), &mut preamble, &mut out)
            .unwrap();
        format!("{}{}", preamble, out)
    }

    #[test]
    fn test_call_with_parameters() {
        let mut props = PropertyStore::new();
        props.set_value("bucket", "telegraf");
        assert_eq!(rendered(&Clause::call("from", props)), "from(bucket: \"telegraf\")");
    }

    #[test]
    fn test_call_without_parameters_renders_empty_parens() {
        assert_eq!(rendered(&Clause::call("last", PropertyStore::new())), "last()");
    }

    #[test]
    fn test_unresolved_references_leave_empty_parens() {
        let mut props = PropertyStore::new();
        props.set_named("n");
        assert_eq!(rendered(&Clause::call("limit", props)), "limit()");
    }

    #[test]
    fn test_expression_renders_verbatim() {
        let clause = Clause::Expression("map(fn: (r) => r._value * 10)".to_string());
        assert_eq!(rendered(&clause), "map(fn: (r) => r._value * 10)");
    }

    #[test]
    fn test_expression_has_no_parameter_store() {
        let mut clause = Clause::Expression("last()".to_string());
        assert!(clause.props_mut().is_none());

        let mut props = PropertyStore::new();
        props.set_value("x", Value::Int(1));
        let mut call = Clause::call("limit", props);
        assert!(call.props_mut().is_some());
    }
}
