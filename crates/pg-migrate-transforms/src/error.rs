//! Error types for the transform layer.

use thiserror::Error;

/// Main error type for transform resolution and value encoding.
#[derive(Error, Debug)]
pub enum TransformError {
    /// Configuration error (bad typmod, bad predicate, unknown transform, etc.)
    ///
    /// Raised while loading configuration, never during row processing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A value outside the declared domain of a transform.
    #[error("Transform {transform} rejected value: {message}")]
    Value { transform: String, message: String },

    /// A transform called with the wrong number of arguments
    #[error("Transform {transform} expects {expected} argument(s), got {got}")]
    Arity {
        transform: String,
        expected: usize,
        got: usize,
    },

    /// A user-namespace identifier invoked before any function was bound to it
    #[error("Transform {0} is not bound to a function")]
    Unbound(String),

    /// A value error with the row/column identity of the failing field.
    #[error("Column {column} (row {row}): {source}")]
    Column {
        column: String,
        row: u64,
        #[source]
        source: Box<TransformError>,
    },

    /// IO error (config file reading)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl TransformError {
    /// Create a Value error for the named transform.
    pub fn value(transform: impl Into<String>, message: impl Into<String>) -> Self {
        TransformError::Value {
            transform: transform.into(),
            message: message.into(),
        }
    }

    /// Attach row/column identity to this error.
    pub fn in_column(self, column: impl Into<String>, row: u64) -> Self {
        TransformError::Column {
            column: column.into(),
            row,
            source: Box::new(self),
        }
    }

    /// True for errors that must abort the run at configuration load.
    pub fn is_config(&self) -> bool {
        match self {
            TransformError::Config(_) | TransformError::Io(_) | TransformError::Yaml(_) => true,
            TransformError::Column { source, .. } => source.is_config(),
            _ => false,
        }
    }

    /// Process exit code for the CLI.
    ///
    /// 1 for configuration errors, 2 for transform errors, 7 for IO errors.
    pub fn exit_code(&self) -> u8 {
        match self {
            TransformError::Config(_) | TransformError::Yaml(_) => 1,
            TransformError::Io(_) => 7,
            TransformError::Column { source, .. } => source.exit_code(),
            TransformError::Value { .. }
            | TransformError::Arity { .. }
            | TransformError::Unbound(_) => 2,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;
