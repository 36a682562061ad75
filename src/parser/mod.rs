//! Parser capability: the only view the engines have of a document format.
//!
//! A backend parses text into a [`Document`] whose nodes can be navigated by
//! name, read as text or label, and iterated; the same backend hands out an
//! [`Emit`] sink for the build side.

use std::borrow::Cow;

use crate::error::Error;
use crate::loader::Options;
use crate::value::Value;

pub mod json;
pub mod unsupported;
#[cfg(feature = "xml")]
pub mod xml;

pub use json::Json;
pub use unsupported::Unsupported;
#[cfg(feature = "xml")]
pub use xml::Xml;

#[cfg(not(feature = "xml"))]
pub type Xml = Unsupported;

/// Stand-in value for the XML backend when the crate is built without it.
#[cfg(not(feature = "xml"))]
#[allow(non_upper_case_globals)]
pub const Xml: Unsupported = Unsupported::new("xml");

/// Handle to a node of a parsed document, or to the absence of one.
pub trait Node: Copy {
    /// `false` for "no such node", as returned by [`Node::child`] on a miss.
    fn is_valid(&self) -> bool;
    fn child(&self, name: &str) -> Self;
    /// Scalar text content, if the node carries any.
    fn text(&self) -> Option<Cow<'_, str>>;
    /// Key/discriminator string attached to the node.
    fn label(&self) -> Option<&str>;
    fn has_children(&self) -> bool;
    /// Visit immediate children in document order; stops at the first error.
    fn for_each_child<F>(&self, visit: F) -> Result<(), Error>
    where
        F: FnMut(Self) -> Result<(), Error>;
}

pub trait Document {
    type Node<'a>: Node
    where
        Self: 'a;

    fn root(&self) -> Self::Node<'_>;
}

/// How a group of children is laid out by formats that distinguish them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Record,
    Sequence,
    Map,
}

/// Build side: receives nodes in document order.
pub trait Emit {
    fn open(&mut self, name: &str, label: Option<&str>, group: Group) -> Result<(), Error>;
    fn scalar(&mut self, name: &str, label: Option<&str>, value: &Value) -> Result<(), Error>;
    fn close(&mut self) -> Result<(), Error>;
    fn finish(self) -> Result<String, Error>;
}

pub trait Backend {
    type Document<'src>: Document;
    type Emitter: Emit;

    fn name(&self) -> &'static str;
    /// Parse `content`; a backend may refuse documents nested deeper than
    /// `options.max_depth` before building them.
    fn parse<'src>(
        &self,
        content: &'src str,
        options: &Options,
    ) -> Result<Self::Document<'src>, Error>;
    fn emitter(&self) -> Self::Emitter;
}
