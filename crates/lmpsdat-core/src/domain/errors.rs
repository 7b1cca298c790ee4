use super::{Name, Value, ValueShape};

pub type KeyResult<T> = Result<T, KeyError>;
pub type CodecResult<T> = Result<T, CodecError>;

/// Stable classification of every failure the codec can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedLine,
    MissingDependency,
    DependencyArity,
    CountMismatch,
    RangeViolation,
    InconsistentOptionalField,
    Unsupported,
    TypeMismatch,
    UnknownName,
    Serialization,
    Io,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MalformedLine => "DATA.MALFORMED_LINE",
            Self::MissingDependency => "KEY.MISSING_DEPENDENCY",
            Self::DependencyArity => "KEY.DEPENDENCY_ARITY",
            Self::CountMismatch => "CHECK.COUNT_MISMATCH",
            Self::RangeViolation => "CHECK.RANGE_VIOLATION",
            Self::InconsistentOptionalField => "CHECK.INCONSISTENT_OPTIONAL_FIELD",
            Self::Unsupported => "KEY.UNSUPPORTED",
            Self::TypeMismatch => "BINDING.TYPE_MISMATCH",
            Self::UnknownName => "BINDING.UNKNOWN_NAME",
            Self::Serialization => "IO.SERIALIZATION",
            Self::Io => "IO.STREAM",
        }
    }

    /// Kinds that only the explicit validation pass produces.
    pub const fn is_validation(self) -> bool {
        matches!(
            self,
            Self::CountMismatch | Self::RangeViolation | Self::InconsistentOptionalField
        )
    }

    /// `Unsupported` is a sentinel callers are expected to skip.
    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("line {line}: {detail}")]
    MalformedLine { line: usize, detail: String },
    #[error("dependency '{0}' has not been wired")]
    MissingDependency(Name),
    #[error("invalid dependencies for '{key}': {detail}")]
    DependencyArity { key: Name, detail: String },
    #[error("{found} rows present but {expected} declared")]
    CountMismatch { expected: i64, found: usize },
    #[error("{field} {value} of record {id} is outside [1, {max}]")]
    RangeViolation {
        field: &'static str,
        id: i64,
        value: i64,
        max: i64,
    },
    #[error("count {0} is negative")]
    NegativeCount(i64),
    #[error("mass {mass} of atom type {atom_type} is not a non-negative number")]
    NegativeMass { atom_type: i64, mass: f64 },
    #[error("bounds {lo} {hi} do not satisfy lo <= hi")]
    InvertedBounds { lo: f64, hi: f64 },
    #[error("coefficient row {id} holds no values")]
    EmptyCoefficients { id: i64 },
    #[error("title contains a line break")]
    LineBreakInTitle,
    #[error("record {id} lists {found} atoms, expected {expected}")]
    LinkArity {
        id: i64,
        expected: usize,
        found: usize,
    },
    #[error("atom {id} disagrees with the table on image flags (table carries them: {expected})")]
    InconsistentOptionalField { id: i64, expected: bool },
    #[error("{0} is not supported by this key")]
    Unsupported(&'static str),
    #[error("expected {expected} value, got {found}")]
    TypeMismatch {
        expected: ValueShape,
        found: ValueShape,
    },
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

impl KeyError {
    pub fn malformed(line: usize, detail: impl Into<String>) -> Self {
        Self::MalformedLine {
            line,
            detail: detail.into(),
        }
    }

    pub fn arity(key: Name, detail: impl Into<String>) -> Self {
        Self::DependencyArity {
            key,
            detail: detail.into(),
        }
    }

    pub fn type_mismatch(expected: ValueShape, found: &Value) -> Self {
        Self::TypeMismatch {
            expected,
            found: found.shape(),
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedLine { .. } => ErrorKind::MalformedLine,
            Self::MissingDependency(_) => ErrorKind::MissingDependency,
            Self::DependencyArity { .. } => ErrorKind::DependencyArity,
            Self::CountMismatch { .. } => ErrorKind::CountMismatch,
            Self::RangeViolation { .. }
            | Self::NegativeCount(_)
            | Self::NegativeMass { .. }
            | Self::InvertedBounds { .. }
            | Self::EmptyCoefficients { .. }
            | Self::LineBreakInTitle
            | Self::LinkArity { .. } => ErrorKind::RangeViolation,
            Self::InconsistentOptionalField { .. } => ErrorKind::InconsistentOptionalField,
            Self::Unsupported(_) => ErrorKind::Unsupported,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("'{name}' holds {expected} values but the binding exchanges {found}")]
    ShapeMismatch {
        name: Name,
        expected: ValueShape,
        found: ValueShape,
    },
    #[error("'{0}' is bound more than once")]
    DuplicateName(Name),
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("key '{name}': {source}")]
    Key {
        name: Name,
        #[source]
        source: KeyError,
    },
    #[error("'{0}' is not part of this registry")]
    NotRegistered(Name),
    #[error(transparent)]
    Binding(#[from] BindingError),
    #[error("JSON (de)serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    pub fn key(name: Name, source: KeyError) -> Self {
        Self::Key { name, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Key { source, .. } => source.kind(),
            Self::NotRegistered(_) => ErrorKind::UnknownName,
            Self::Binding(_) => ErrorKind::TypeMismatch,
            Self::Json(_) => ErrorKind::Serialization,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// The Name of the Key that failed, when the failure belongs to one.
    pub fn name(&self) -> Option<Name> {
        match self {
            Self::Key { name, .. } | Self::NotRegistered(name) => Some(*name),
            Self::Binding(BindingError::ShapeMismatch { name, .. })
            | Self::Binding(BindingError::DuplicateName(name)) => Some(*name),
            Self::Json(_) | Self::Io(_) => None,
        }
    }

    pub fn key_error(&self) -> Option<&KeyError> {
        match self {
            Self::Key { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.kind().as_str(), self)
    }
}
