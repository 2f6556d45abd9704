/// Errors raised while assembling or rendering a query.
///
/// Structural constraints are checked when a clause is constructed, never
/// when the pipeline is rendered. The only render-time failure is asking an
/// empty pipeline for its text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FluxError {
    #[error("cannot render an empty pipeline")]
    EmptyPipeline,

    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    #[error("{operator}: {message}")]
    Validation { operator: String, message: String },
}

impl FluxError {
    pub(crate) fn validation(operator: &str, message: impl Into<String>) -> Self {
        FluxError::Validation {
            operator: operator.to_string(),
            message: message.into(),
        }
    }
}
