// XML backend: roxmltree for reading, quick-xml for writing.

use std::borrow::Cow;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tracing::warn;

use super::{Backend, Document, Emit, Group, Node};
use crate::error::Error;
use crate::loader::Options;
use crate::value::Value;

const NAME: &str = "xml";

/// Attribute carrying a map entry's key on output. Any first attribute is
/// accepted as the label on input.
pub const KEY_ATTRIBUTE: &str = "key";

#[derive(Debug, Clone, Copy, Default)]
pub struct Xml;

impl Backend for Xml {
    type Document<'src> = XmlDocument<'src>;
    type Emitter = XmlEmitter;

    fn name(&self) -> &'static str {
        NAME
    }

    fn parse<'src>(
        &self,
        content: &'src str,
        options: &Options,
    ) -> Result<XmlDocument<'src>, Error> {
        // leading blank lines before the declaration are tolerated
        let content = content.trim_start();
        check_nesting(content, options.max_depth)?;
        roxmltree::Document::parse(content)
            .map(XmlDocument)
            .map_err(|error| Error::IllFormed { backend: NAME, message: error.to_string() })
    }

    fn emitter(&self) -> XmlEmitter {
        XmlEmitter::default()
    }
}

/// Flat scan over the element events. roxmltree builds the tree
/// recursively, so nesting is bounded here, before it runs.
///
/// The root element sits at depth 0 of the decoder, hence the extra level.
fn check_nesting(content: &str, max_depth: usize) -> Result<(), Error> {
    let limit = max_depth.saturating_add(1);
    let mut reader = Reader::from_str(content);
    let mut depth = 0usize;
    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => {
                depth += 1;
                if depth > limit {
                    warn!(limit = max_depth, "xml nesting exceeds the depth limit");
                    return Err(Error::too_deep(max_depth));
                }
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) => return Ok(()),
            Ok(_) => {}
            Err(error) => {
                return Err(Error::IllFormed {
                    backend: NAME,
                    message: format!("{error} at byte {}", reader.buffer_position()),
                });
            }
        }
    }
}

pub struct XmlDocument<'src>(roxmltree::Document<'src>);

impl<'src> Document for XmlDocument<'src> {
    type Node<'a> = XmlNode<'a, 'src> where Self: 'a;

    fn root(&self) -> XmlNode<'_, 'src> {
        XmlNode(Some(self.0.root_element()))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct XmlNode<'a, 'src>(Option<roxmltree::Node<'a, 'src>>);

impl<'a, 'src> XmlNode<'a, 'src> {
    fn elements(&self) -> impl Iterator<Item = roxmltree::Node<'a, 'src>> + use<'a, 'src> {
        self.0.into_iter().flat_map(|node| node.children()).filter(|child| child.is_element())
    }
}

impl Node for XmlNode<'_, '_> {
    fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    fn child(&self, name: &str) -> Self {
        XmlNode(self.elements().find(|child| child.tag_name().name() == name))
    }

    // whitespace-only text is absent; anything else is kept verbatim
    fn text(&self) -> Option<Cow<'_, str>> {
        let text = self.0?.text()?;
        (!text.trim().is_empty()).then_some(Cow::Borrowed(text))
    }

    fn label(&self) -> Option<&str> {
        self.0?.attributes().next().map(|attribute| attribute.value())
    }

    fn has_children(&self) -> bool {
        self.elements().next().is_some()
    }

    fn for_each_child<F>(&self, mut visit: F) -> Result<(), Error>
    where
        F: FnMut(Self) -> Result<(), Error>,
    {
        for child in self.elements() {
            visit(XmlNode(Some(child)))?;
        }
        Ok(())
    }
}

pub struct XmlEmitter {
    writer: Writer<Vec<u8>>,
    open: Vec<String>,
}

impl Default for XmlEmitter {
    fn default() -> Self {
        Self { writer: Writer::new_with_indent(Vec::new(), b' ', 2), open: Vec::new() }
    }
}

impl XmlEmitter {
    fn write(&mut self, event: Event<'_>) -> Result<(), Error> {
        self.writer
            .write_event(event)
            .map_err(|error| Error::IllFormed { backend: NAME, message: error.to_string() })
    }

    fn start<'n>(name: &'n str, label: Option<&'n str>) -> BytesStart<'n> {
        let mut start = BytesStart::new(name);
        if let Some(label) = label {
            start.push_attribute((KEY_ATTRIBUTE, label));
        }
        start
    }
}

impl Emit for XmlEmitter {
    fn open(&mut self, name: &str, label: Option<&str>, _group: Group) -> Result<(), Error> {
        if self.open.is_empty() && self.writer.get_ref().is_empty() {
            self.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        }
        self.write(Event::Start(Self::start(name, label)))?;
        self.open.push(name.to_owned());
        Ok(())
    }

    fn scalar(&mut self, name: &str, label: Option<&str>, value: &Value) -> Result<(), Error> {
        let text = value.as_text().unwrap_or_default();
        self.write(Event::Start(Self::start(name, label)))?;
        self.write(Event::Text(BytesText::new(&text)))?;
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn close(&mut self) -> Result<(), Error> {
        let Some(name) = self.open.pop() else {
            return Err(Error::IllFormed {
                backend: NAME,
                message: "close without open element".into(),
            });
        };
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn finish(self) -> Result<String, Error> {
        if let Some(name) = self.open.last() {
            return Err(Error::IllFormed {
                backend: NAME,
                message: format!("element <{name}> left open"),
            });
        }
        String::from_utf8(self.writer.into_inner())
            .map_err(|error| Error::IllFormed { backend: NAME, message: error.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_root<T>(content: &str, f: impl FnOnce(XmlNode<'_, '_>) -> T) -> T {
        let document = Xml.parse(content, &Options::default()).unwrap();
        f(document.root())
    }

    #[test]
    fn ill_formed_text_is_rejected() {
        let error = Xml.parse("<eeeeeeeeeeeeee", &Options::default()).err().unwrap();
        assert!(matches!(error, Error::IllFormed { backend: "xml", .. }));
    }

    #[test]
    fn declaration_after_blank_lines_is_accepted() {
        let content = "\n   <?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<point><x>1.2</x></point>";
        with_root(content, |root| {
            assert_eq!(root.child("x").text().as_deref(), Some("1.2"));
            assert!(!root.child("y").is_valid());
        });
    }

    #[test]
    fn nesting_beyond_the_limit_is_refused_before_parsing() {
        let nested = |levels: usize| format!("{}{}", "<a>".repeat(levels), "</a>".repeat(levels));
        let options = Options { max_depth: 4 };
        assert!(Xml.parse(&nested(5), &options).is_ok());
        let error = Xml.parse(&nested(6), &options).err().unwrap();
        assert!(matches!(error, Error::DepthExceeded { limit: 4, .. }));

        let error = Xml.parse(&nested(10_000), &Options::default()).err().unwrap();
        assert!(matches!(error, Error::DepthExceeded { limit: 256, .. }));
    }

    #[test]
    fn whitespace_only_text_is_absent() {
        with_root("<r><a>\n   </a><b> padded </b></r>", |root| {
            assert!(root.child("a").is_valid());
            assert_eq!(root.child("a").text(), None);
            assert_eq!(root.child("b").text().as_deref(), Some(" padded "));
        });
    }

    #[test]
    fn children_are_elements_in_order() {
        with_root(r#"<r><m><value key="a">1</value>text<value name="b">2</value></m></r>"#, |root| {
            let m = root.child("m");
            assert!(m.has_children());
            let mut seen = Vec::new();
            m.for_each_child(|child| {
                seen.push((child.label().map(str::to_owned), child.text().map(Cow::into_owned)));
                Ok(())
            })
            .unwrap();
            assert_eq!(
                seen,
                [
                    (Some("a".to_owned()), Some("1".to_owned())),
                    (Some("b".to_owned()), Some("2".to_owned())),
                ]
            );
        });
    }

    #[test]
    fn emitter_writes_nested_elements() {
        let mut emitter = Xml.emitter();
        emitter.open("STLObj", None, Group::Record).unwrap();
        emitter.open("m2", None, Group::Map).unwrap();
        emitter.scalar("value", Some("a&b"), &Value::Str("<1>".into())).unwrap();
        emitter.close().unwrap();
        emitter.close().unwrap();
        let text = emitter.finish().unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(text.contains(r#"<value key="a&amp;b">&lt;1&gt;</value>"#));
        assert!(text.trim_end().ends_with("</STLObj>"));
    }

    #[test]
    fn unbalanced_emitter_fails() {
        let mut emitter = Xml.emitter();
        assert!(emitter.close().is_err());
        emitter.open("a", None, Group::Record).unwrap();
        assert!(emitter.finish().is_err());
    }
}
