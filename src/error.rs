// Outcome vocabulary shared by both engines.

use std::fmt;

use thiserror::Error;

use crate::convert::ConvertError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Where in the instance a failure happened, outermost segment first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<Segment>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize),
    Key(String),
}

impl FieldPath {
    fn prepend(&mut self, segment: Segment) {
        self.0.insert(0, segment);
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (ix, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Field(name) if ix == 0 => f.write_str(name)?,
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
                Segment::Key(key) => write!(f, "[{key:?}]")?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("content is empty")]
    EmptyContent,

    #[error("failed to load content: {source}")]
    LoadContent {
        #[source]
        source: BoxError,
    },

    #[error("{backend} document is ill-formed: {message}")]
    IllFormed { backend: &'static str, message: String },

    #[error("missing field `{path}`")]
    MissingField { path: FieldPath },

    #[error("cannot extract field `{path}`: {source}")]
    ExtractingField {
        path: FieldPath,
        #[source]
        source: ConvertError,
    },

    #[error("type mismatch at `{path}`: {reason}")]
    Type { path: FieldPath, reason: String },

    #[error("document nesting exceeds {limit} levels at `{path}`")]
    DepthExceeded { limit: usize, path: FieldPath },

    #[error("{backend} backend is not available in this build")]
    Unsupported { backend: &'static str },
}

impl Error {
    pub(crate) fn missing() -> Self {
        Error::MissingField { path: FieldPath::default() }
    }

    pub(crate) fn extracting(source: ConvertError) -> Self {
        Error::ExtractingField { path: FieldPath::default(), source }
    }

    pub(crate) fn type_mismatch(reason: impl Into<String>) -> Self {
        Error::Type { path: FieldPath::default(), reason: reason.into() }
    }

    pub(crate) fn too_deep(limit: usize) -> Self {
        Error::DepthExceeded { limit, path: FieldPath::default() }
    }

    pub(crate) fn load(source: impl Into<BoxError>) -> Self {
        Error::LoadContent { source: source.into() }
    }

    /// Record that the failure happened inside `segment`.
    pub(crate) fn within(mut self, segment: Segment) -> Self {
        if let Some(path) = self.path_mut() {
            path.prepend(segment);
        }
        self
    }

    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            Error::MissingField { path }
            | Error::ExtractingField { path, .. }
            | Error::Type { path, .. }
            | Error::DepthExceeded { path, .. } => Some(path),
            _ => None,
        }
    }

    fn path_mut(&mut self) -> Option<&mut FieldPath> {
        match self {
            Error::MissingField { path }
            | Error::ExtractingField { path, .. }
            | Error::Type { path, .. }
            | Error::DepthExceeded { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Error::EmptyContent => Status::ErrEmptyContent,
            Error::LoadContent { .. } => Status::ErrLoadContent,
            Error::IllFormed { .. } | Error::DepthExceeded { .. } | Error::Unsupported { .. } => {
                Status::ErrIllFormed
            }
            Error::MissingField { .. } => Status::ErrMissingField,
            Error::ExtractingField { .. } => Status::ErrExtractingField,
            Error::Type { .. } => Status::ErrType,
        }
    }
}

/// Stable, wire-visible outcome codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    ErrEmptyContent,
    ErrLoadContent,
    ErrIllFormed,
    ErrMissingField,
    ErrExtractingField,
    ErrType,
}

impl Status {
    pub fn of<T>(result: &Result<T, Error>) -> Self {
        match result {
            Ok(_) => Status::Success,
            Err(error) => error.status(),
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::ErrEmptyContent => "ERR_EMPTY_CONTENT",
            Status::ErrLoadContent => "ERR_LOAD_CONTENT",
            Status::ErrIllFormed => "ERR_ILL_FORMED",
            Status::ErrMissingField => "ERR_MISSING_FIELD",
            Status::ErrExtractingField => "ERR_EXTRACTING_FIELD",
            Status::ErrType => "ERR_TYPE",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
