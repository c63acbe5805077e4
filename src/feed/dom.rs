//! Minimal typed XML tree built from `quick-xml` events.
//!
//! Feed extraction needs to look at an element's children in order and at the
//! first child of a field element, which is awkward on a streaming reader.
//! The tree keeps exactly that: element names (qualified, prefix included)
//! and their child nodes. Attributes, comments and processing instructions
//! are dropped.
use quick_xml::encoding::Decoder;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Maximum element nesting accepted before the document is rejected.
/// Guards the recursive item search against maliciously deep documents.
const MAX_DEPTH: usize = 256;

/// Errors that can occur while building a document tree.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The reader rejected the markup (mismatched tags, bad entity, ...).
    #[error("XML parse error: {0}")]
    Xml(String),

    /// The input ended while an element was still open.
    #[error("Element <{0}> is never closed")]
    UnclosedElement(String),

    /// The input contains no element at all.
    #[error("Document has no root element")]
    NoRootElement,

    /// Nesting depth exceeds `MAX_DEPTH`.
    #[error("Nesting depth exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),
}

/// A child of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Character data with entities resolved. Adjacent text and CDATA runs
    /// are merged into a single node.
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified tag name, e.g. `item` or `content:encoded`.
    pub name: String,
    pub children: Vec<Node>,
}

impl Element {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Vec::new(),
        }
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.children.first()
    }

    /// Iterates over child elements, skipping text.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }
}

/// A parsed document. Holds every top-level element in document order;
/// declarations, stylesheet instructions and comments around them are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub roots: Vec<Element>,
}

/// Parses raw document bytes into a [`Document`].
///
/// Text is decoded with the encoding named in the XML declaration, or UTF-8
/// when there is none. Bytes that are invalid in that encoding are an error.
///
/// Only the five predefined entities and character references are resolved.
/// An unknown entity is an error, unless the document has a document type
/// declaration: its definitions are never loaded, so the reference is
/// dropped and the surrounding text kept.
///
/// # Errors
///
/// Returns [`ParseError`] when the markup is malformed, truncated, nested
/// deeper than `MAX_DEPTH`, or contains no element.
///
/// # Security
///
/// `quick-xml` (0.37) never parses `<!ENTITY>` declarations, so a declared
/// external entity can never pull in local files or remote content.
pub fn parse_document(bytes: &[u8]) -> Result<Document, ParseError> {
    let mut reader = Reader::from_reader(bytes);

    let mut stack: Vec<Element> = Vec::new();
    let mut roots = Vec::new();
    let mut has_doctype = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(ParseError::MaxDepthExceeded(MAX_DEPTH));
                }
                let name = element_name(reader.decoder(), &e)?;
                stack.push(Element::new(name));
            }
            Ok(Event::Empty(e)) => {
                let name = element_name(reader.decoder(), &e)?;
                attach(&mut stack, &mut roots, Element::new(name));
            }
            Ok(Event::End(_)) => {
                // quick-xml verifies the end name matches the open element
                let done = stack
                    .pop()
                    .ok_or_else(|| ParseError::Xml("Unexpected closing tag".to_string()))?;
                attach(&mut stack, &mut roots, done);
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape_with(|name| resolve_entity(name, has_doctype))
                    .map_err(|e| ParseError::Xml(e.to_string()))?;
                push_text(&mut stack, &text);
            }
            Ok(Event::CData(e)) => {
                let text = e.decode().map_err(|e| ParseError::Xml(e.to_string()))?;
                push_text(&mut stack, &text);
            }
            Ok(Event::DocType(_)) => has_doctype = true,
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e.to_string())),
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(ParseError::UnclosedElement(open.name));
    }
    if roots.is_empty() {
        return Err(ParseError::NoRootElement);
    }

    Ok(Document { roots })
}

fn element_name(decoder: Decoder, e: &BytesStart<'_>) -> Result<String, ParseError> {
    decoder
        .decode(e.name().as_ref())
        .map(|name| name.into_owned())
        .map_err(|e| ParseError::Xml(e.to_string()))
}

/// Entities declared in a DTD are never expanded, so under a document type
/// declaration any non-predefined reference resolves to nothing.
fn resolve_entity(name: &str, has_doctype: bool) -> Option<&'static str> {
    resolve_predefined_entity(name).or_else(|| has_doctype.then_some(""))
}

fn attach(stack: &mut [Element], roots: &mut Vec<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => roots.push(element),
    }
}

fn push_text(stack: &mut [Element], text: &str) {
    // Text outside the root element is whitespace between prolog nodes
    let Some(parent) = stack.last_mut() else {
        return;
    };
    if text.is_empty() {
        return;
    }
    match parent.children.last_mut() {
        Some(Node::Text(existing)) => existing.push_str(text),
        _ => parent.children.push(Node::Text(text.to_string())),
    }
}
