// Backend that was left out of this build. Every operation fails the same way.

use std::borrow::Cow;

use super::{Backend, Document, Emit, Group, Node};
use crate::error::Error;
use crate::loader::Options;
use crate::value::Value;

#[derive(Debug, Clone, Copy)]
pub struct Unsupported {
    backend: &'static str,
}

impl Unsupported {
    pub const fn new(backend: &'static str) -> Self {
        Self { backend }
    }

    fn fail<T>(&self) -> Result<T, Error> {
        Err(Error::Unsupported { backend: self.backend })
    }
}

/// Never constructed: parsing always fails first.
#[derive(Debug, Clone, Copy)]
pub enum Nothing {}

impl Document for Nothing {
    type Node<'a> = Nothing;

    fn root(&self) -> Nothing {
        match *self {}
    }
}

impl Node for Nothing {
    fn is_valid(&self) -> bool {
        match *self {}
    }
    fn child(&self, _name: &str) -> Self {
        match *self {}
    }
    fn text(&self) -> Option<Cow<'_, str>> {
        match *self {}
    }
    fn label(&self) -> Option<&str> {
        match *self {}
    }
    fn has_children(&self) -> bool {
        match *self {}
    }
    fn for_each_child<F>(&self, _visit: F) -> Result<(), Error>
    where
        F: FnMut(Self) -> Result<(), Error>,
    {
        match *self {}
    }
}

impl Backend for Unsupported {
    type Document<'src> = Nothing;
    type Emitter = Unsupported;

    fn name(&self) -> &'static str {
        self.backend
    }

    fn parse<'src>(&self, _content: &'src str, _options: &Options) -> Result<Nothing, Error> {
        self.fail()
    }

    fn emitter(&self) -> Unsupported {
        *self
    }
}

impl Emit for Unsupported {
    fn open(&mut self, _name: &str, _label: Option<&str>, _group: Group) -> Result<(), Error> {
        self.fail()
    }
    fn scalar(&mut self, _name: &str, _label: Option<&str>, _value: &Value) -> Result<(), Error> {
        self.fail()
    }
    fn close(&mut self) -> Result<(), Error> {
        self.fail()
    }
    fn finish(self) -> Result<String, Error> {
        self.fail()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_operation_reports_unsupported() {
        let backend = Unsupported::new("yaml");
        let result = backend.parse("a: 1", &Options::default());
        assert!(matches!(result, Err(Error::Unsupported { backend: "yaml" })));
        let mut emitter = backend.emitter();
        assert!(emitter.open("root", None, Group::Record).is_err());
        assert!(emitter.scalar("x", None, &Value::Int(1)).is_err());
        assert!(emitter.close().is_err());
        assert!(matches!(emitter.finish(), Err(Error::Unsupported { backend: "yaml" })));
    }
}
