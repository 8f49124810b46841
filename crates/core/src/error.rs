use serde::Serialize;

/// Everything that can go wrong while turning a command into work.
///
/// None of these abort the host: the Director turns each one into a
/// [`Diagnostic`], logs it, and drops the offending command or clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DirectorError {
    /// The raw command could not be split into tokens at all.
    #[error("malformed command at column {column}: {message} (in `{source_text}`)")]
    Malformed {
        column: usize,
        message: String,
        source_text: String,
    },

    /// A word matched no grammar role in its context.
    #[error("unknown word '{word}' (in `{source_text}`)")]
    Unknown { word: String, source_text: String },

    /// A direction lost its verb or its actor and was discarded.
    #[error("{message} (in `{source_text}`)")]
    Binding {
        message: String,
        source_text: String,
    },

    /// The grammar referenced something it never registered.
    #[error("grammar misconfiguration: {message} (in `{source_text}`)")]
    Grammar {
        message: String,
        source_text: String,
    },
}

impl DirectorError {
    pub fn malformed(column: usize, message: impl Into<String>, source_text: &str) -> Self {
        DirectorError::Malformed {
            column,
            message: message.into(),
            source_text: source_text.to_owned(),
        }
    }

    pub fn unknown(word: impl Into<String>, source_text: &str) -> Self {
        DirectorError::Unknown {
            word: word.into(),
            source_text: source_text.to_owned(),
        }
    }

    pub fn binding(message: impl Into<String>, source_text: &str) -> Self {
        DirectorError::Binding {
            message: message.into(),
            source_text: source_text.to_owned(),
        }
    }

    pub fn grammar(message: impl Into<String>, source_text: &str) -> Self {
        DirectorError::Grammar {
            message: message.into(),
            source_text: source_text.to_owned(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            DirectorError::Unknown { .. } => Severity::Info,
            DirectorError::Malformed { .. }
            | DirectorError::Binding { .. }
            | DirectorError::Grammar { .. } => Severity::Warning,
        }
    }
}

/// How loudly a diagnostic was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

/// A non-fatal failure recorded by the Director.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub error: DirectorError,
}

impl From<DirectorError> for Diagnostic {
    fn from(error: DirectorError) -> Self {
        Diagnostic {
            severity: error.severity(),
            error,
        }
    }
}

/// Log a diagnostic through `tracing` at the level its severity calls for.
pub(crate) fn report(diagnostic: &Diagnostic) {
    match diagnostic.severity {
        Severity::Info => tracing::info!(error = %diagnostic.error, "ignored word"),
        Severity::Warning => tracing::warn!(error = %diagnostic.error, "dropped command"),
    }
}
