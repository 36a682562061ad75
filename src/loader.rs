//! Top-level load/save operations.

use std::path::Path;

use tracing::debug;

use crate::error::{BoxError, Error};
use crate::parser::Backend;
use crate::record::Instance;
use crate::{de, ser};

/// Deepest node nesting a document may have before loading is refused.
pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Deepest field nesting accepted, counting the root's fields as level 1.
    ///
    /// XML documents are scanned against this limit before they are parsed.
    /// JSON documents are also bound by serde_json's own recursion limit of
    /// 128 levels: anything nested deeper is `ERR_ILL_FORMED` even when
    /// `max_depth` is larger.
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

/// A backend plus the options every load through it uses.
///
/// Each call parses its own document, so one loader may serve any number of
/// instances, from any number of threads if the backend is `Sync`.
#[derive(Debug, Clone, Default)]
pub struct Loader<B> {
    backend: B,
    options: Options,
}

impl<B: Backend> Loader<B> {
    pub fn new(backend: B) -> Self {
        Self { backend, options: Options::default() }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = max_depth;
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Fill `instance` from `content`.
    ///
    /// On failure the instance keeps every field decoded before the failing
    /// one; later fields are untouched.
    pub fn load_from_text(&self, instance: &mut dyn Instance, content: &str) -> Result<(), Error> {
        let schema = instance.schema();
        let schema = schema.get().name();
        debug!(backend = self.backend.name(), schema, bytes = content.len(), "loading");
        let result = de::deserialize(&self.backend, &self.options, instance, content);
        match &result {
            Ok(()) => debug!(backend = self.backend.name(), schema, "loaded"),
            Err(error) => debug!(
                backend = self.backend.name(),
                schema,
                status = %error.status(),
                %error,
                "load failed"
            ),
        }
        result
    }

    /// Fill `instance` from whatever `source` produces; a failing source is
    /// reported as `ERR_LOAD_CONTENT`.
    pub fn load_from_source<F, E>(
        &self,
        instance: &mut dyn Instance,
        source: F,
    ) -> Result<(), Error>
    where
        F: FnOnce() -> Result<String, E>,
        E: Into<BoxError>,
    {
        let content = source().map_err(Error::load)?;
        self.load_from_text(instance, &content)
    }

    pub fn load_file(
        &self,
        instance: &mut dyn Instance,
        path: impl AsRef<Path>,
    ) -> Result<(), Error> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading");
        self.load_from_source(instance, || std::fs::read_to_string(path))
    }

    pub fn save_to_text(&self, instance: &dyn Instance) -> Result<String, Error> {
        let schema = instance.schema();
        debug!(backend = self.backend.name(), schema = schema.get().name(), "saving");
        ser::serialize(&self.backend, instance)
    }
}

pub fn load_from_text<B: Backend>(
    backend: B,
    instance: &mut dyn Instance,
    content: &str,
) -> Result<(), Error> {
    Loader::new(backend).load_from_text(instance, content)
}

pub fn load_from_source<B, F, E>(
    backend: B,
    instance: &mut dyn Instance,
    source: F,
) -> Result<(), Error>
where
    B: Backend,
    F: FnOnce() -> Result<String, E>,
    E: Into<BoxError>,
{
    Loader::new(backend).load_from_source(instance, source)
}

pub fn save_to_text<B: Backend>(backend: B, instance: &dyn Instance) -> Result<String, Error> {
    Loader::new(backend).save_to_text(instance)
}
