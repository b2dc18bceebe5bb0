//! Level document tree
//!
//! Codecs build a plain [`XmlNode`] tree and the tree is serialized once at
//! the end, so nothing ever mutates a live document while walking it.
//! Parsing and printing go through `quick-xml`.

use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::{Deserialize, Serialize};

/// Error types for document parsing and printing
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("XML syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),

    #[error("Invalid attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("Document is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unbalanced document: {0}")]
    Unbalanced(String),

    #[error("Document has no root element")]
    Empty,
}

/// One element of a level document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XmlNode {
    pub name: String,
    /// Attributes in write order
    #[serde(default)]
    pub attributes: Vec<(String, String)>,
    #[serde(default)]
    pub children: Vec<XmlNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl XmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder form of [`XmlNode::set_attr`]
    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder form of [`XmlNode::push_child`]
    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    /// Set an attribute. An existing key keeps its position.
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, key: &str) -> bool {
        self.attr(key).is_some()
    }

    pub fn push_child(&mut self, child: XmlNode) -> &mut XmlNode {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// First child with the given element name
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First child with the given name, created at the end when absent
    pub fn get_or_create_child(&mut self, name: &str) -> &mut XmlNode {
        let index = match self.children.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                self.children.push(XmlNode::new(name));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    /// Follow a path of first-match child names, e.g. `["Properties", "Static"]`
    pub fn descend(&self, path: &[&str]) -> Option<&XmlNode> {
        path.iter().try_fold(self, |node, name| node.child(name))
    }

    /// True when the element carries nothing at all
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
            && self.children.is_empty()
            && self.text.as_deref().map_or(true, |t| t.trim().is_empty())
    }

    /// Recursively drop descendants with no attributes, children or text
    pub fn prune_empty(&mut self) {
        for child in &mut self.children {
            child.prune_empty();
        }
        self.children.retain(|c| !c.is_empty());
    }
}

/// Parse a complete document and return its root element
pub fn parse_document(source: &str) -> Result<XmlNode, XmlError> {
    let mut nodes = parse_nodes(source)?;
    if nodes.is_empty() {
        return Err(XmlError::Empty);
    }
    Ok(nodes.remove(0))
}

/// Parse a sequence of sibling elements (no single root required)
pub fn parse_fragment(source: &str) -> Result<Vec<XmlNode>, XmlError> {
    parse_nodes(source)
}

fn parse_nodes(source: &str) -> Result<Vec<XmlNode>, XmlError> {
    let mut reader = Reader::from_str(source);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut top: Vec<XmlNode> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                stack.push(start_node(&e)?);
            }
            Event::Empty(e) => {
                let node = start_node(&e)?;
                attach(&mut stack, &mut top, node);
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let node = stack
                    .pop()
                    .ok_or_else(|| XmlError::Unbalanced(format!("unexpected </{}>", name)))?;
                if node.name != name {
                    return Err(XmlError::Unbalanced(format!(
                        "<{}> closed by </{}>",
                        node.name, name
                    )));
                }
                attach(&mut stack, &mut top, node);
            }
            Event::Text(e) => {
                let text = e.unescape()?.into_owned();
                if let Some(node) = stack.last_mut() {
                    match node.text.as_mut() {
                        Some(existing) => existing.push_str(&text),
                        None => node.text = Some(text),
                    }
                }
            }
            Event::CData(e) => {
                let text = String::from_utf8(e.into_inner().into_owned())?;
                if let Some(node) = stack.last_mut() {
                    node.text.get_or_insert_with(String::new).push_str(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::Unbalanced(format!("<{}> is never closed", open.name)));
    }

    Ok(top)
}

fn start_node(e: &BytesStart<'_>) -> Result<XmlNode, XmlError> {
    let mut node = XmlNode::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        node.attributes.push((key, value));
    }
    Ok(node)
}

fn attach(stack: &mut [XmlNode], top: &mut Vec<XmlNode>, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => top.push(node),
    }
}

/// Print a document with an XML declaration and 2-space indentation
pub fn to_pretty_string(root: &XmlNode) -> Result<String, XmlError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    write_node(&mut writer, root)?;
    let mut out = String::from_utf8(writer.into_inner().into_inner())?;
    out.push('\n');
    Ok(out)
}

/// Print sibling elements without a declaration
pub fn fragment_to_string(nodes: &[XmlNode]) -> Result<String, XmlError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    for node in nodes {
        write_node(&mut writer, node)?;
    }
    let out = String::from_utf8(writer.into_inner().into_inner())?;
    Ok(out.trim_start_matches('\n').to_string())
}

fn write_node(writer: &mut Writer<Cursor<Vec<u8>>>, node: &XmlNode) -> Result<(), XmlError> {
    let mut start = BytesStart::new(node.name.as_str());
    for (key, value) in &node.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    let text = node.text.as_deref().filter(|t| !t.trim().is_empty());
    if node.children.is_empty() && text.is_none() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = text {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for child in &node.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(node.name.as_str())))?;
    Ok(())
}
