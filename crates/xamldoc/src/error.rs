use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// High-level error type shared across xamldoc components.
#[derive(Debug, Error)]
pub enum XamldocError {
    #[error("usage error: {0}")]
    Usage(String),
    #[error("malformed document {}: {message}", path.display())]
    MalformedDocument { path: PathBuf, message: String },
    #[error("malformed type descriptor '{token}': {reason}")]
    MalformedDescriptor { token: String, reason: String },
    #[error("invalid argument direction '{value}'; expected one of In, Out, InOut")]
    InvalidDirection { value: String },
    #[error("field '{0}' was read before it was set")]
    UnsetField(&'static str),
    #[error("xml error: {0}")]
    Xml(String),
    #[error("project error: {0}")]
    Project(String),
    #[error("output error: {0}")]
    Output(String),
    #[error("template error: {0}")]
    Template(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for XamldocError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for XamldocError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<roxmltree::Error> for XamldocError {
    fn from(err: roxmltree::Error) -> Self {
        Self::Xml(err.to_string())
    }
}

impl XamldocError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True for every failure caused by the content of a source document rather than
    /// by the caller or the environment.
    pub fn is_malformed_document(&self) -> bool {
        matches!(
            self,
            XamldocError::MalformedDocument { .. }
                | XamldocError::MalformedDescriptor { .. }
                | XamldocError::InvalidDirection { .. }
                | XamldocError::Xml(_)
        )
    }

    pub fn context<T: fmt::Display>(self, ctx: T) -> Self {
        match self {
            XamldocError::Usage(msg) => XamldocError::Usage(format!("{ctx}: {msg}")),
            XamldocError::MalformedDocument { path, message } => XamldocError::MalformedDocument {
                path,
                message: format!("{ctx}: {message}"),
            },
            XamldocError::MalformedDescriptor { token, reason } => {
                XamldocError::MalformedDescriptor {
                    token,
                    reason: format!("{ctx}: {reason}"),
                }
            }
            XamldocError::InvalidDirection { value } => XamldocError::InvalidDirection { value },
            XamldocError::UnsetField(field) => XamldocError::UnsetField(field),
            XamldocError::Xml(msg) => XamldocError::Xml(format!("{ctx}: {msg}")),
            XamldocError::Project(msg) => XamldocError::Project(format!("{ctx}: {msg}")),
            XamldocError::Output(msg) => XamldocError::Output(format!("{ctx}: {msg}")),
            XamldocError::Template(msg) => XamldocError::Template(format!("{ctx}: {msg}")),
            XamldocError::Serialization(msg) => {
                XamldocError::Serialization(format!("{ctx}: {msg}"))
            }
            XamldocError::Io(err) => XamldocError::Io(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_direction_message_names_legal_set() {
        let err = XamldocError::InvalidDirection {
            value: "Sideways".into(),
        };
        let message = err.to_string();
        assert!(message.contains("Sideways"));
        assert!(message.contains("In, Out, InOut"));
    }

    #[test]
    fn context_prefixes_message_and_keeps_variant() {
        let err = XamldocError::Xml("unexpected end of stream".into()).context("Main.xaml");
        assert!(err.is_malformed_document());
        assert_eq!(err.to_string(), "xml error: Main.xaml: unexpected end of stream");
    }
}
