//! Error types for the journal.

use thiserror::Error;

/// Reasons a call fails to bind against a declared [`Signature`](crate::Signature).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("takes {expected} positional arguments but {given} were given")]
    TooManyPositional { expected: usize, given: usize },

    #[error("missing required arguments: {}", .0.join(", "))]
    MissingArguments(Vec<String>),

    #[error("got an unexpected keyword argument `{0}`")]
    UnexpectedKeyword(String),

    #[error("got multiple values for argument `{0}`")]
    MultipleValues(String),

    #[error("positional-only argument `{0}` passed as keyword")]
    PositionalOnlyAsKeyword(String),
}

#[derive(Debug, Error)]
pub enum JournalError {
    /// The call does not satisfy the callable's signature.
    #[error("cannot bind arguments for `{callable}`: {source}")]
    ArgumentBinding {
        callable: String,
        #[source]
        source: BindingError,
    },

    /// Result names and results differ in count.
    #[error("{names} result names supplied for {results} results")]
    ResultNameMapping { names: usize, results: usize },

    #[error("unable to serialize journal record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid format mode `{0}`, expected JSON or STRINGY")]
    FormatMode(String),

    #[error("journal already initialized")]
    AlreadyInitialized,

    #[error("unable to read journal settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid journal settings: {0}")]
    Settings(#[from] toml::de::Error),

    #[error("unable to install log subscriber: {0}")]
    Subscriber(String),
}

pub type Result<T> = std::result::Result<T, JournalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_error_lists_every_missing_name() {
        let err = BindingError::MissingArguments(vec!["a".into(), "kw1".into()]);
        assert_eq!(err.to_string(), "missing required arguments: a, kw1");
    }

    #[test]
    fn argument_binding_names_the_callable() {
        let err = JournalError::ArgumentBinding {
            callable: "add".into(),
            source: BindingError::UnexpectedKeyword("z".into()),
        };
        assert_eq!(
            err.to_string(),
            "cannot bind arguments for `add`: got an unexpected keyword argument `z`"
        );
    }
}
