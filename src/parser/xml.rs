//! A small XML element tree with namespace-tolerant lookup.
//!
//! Feeds disagree on namespace usage: one publisher writes `<title>`, another
//! `<atom:title>`, a third `<dc:date>` where others write `<date>`. Every
//! lookup here therefore runs twice: first on the exact qualified name, then,
//! only if that found nothing, on the local name with any prefix.
//!
//! The tree is built with `quick_xml` and is deliberately strict about
//! structure: mismatched or unclosed tags make the whole document invalid.

use crate::errors::{IngestError, IngestResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    /// Qualified name as written, e.g. `content:encoded`.
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// The part of a qualified name after the last `:`.
fn local_part(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

impl Element {
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// Attribute value by name; falls back to the attribute's local name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .or_else(|| {
                let wanted = local_part(name);
                self.attributes.iter().find(|(k, _)| local_part(k) == wanted)
            })
            .map(|(_, v)| v.as_str())
    }

    /// Concatenated text of this element and all its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
            }
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Direct children named `name`, plain query first, then wildcard.
    pub fn children_named(&self, name: &str) -> Vec<&Element> {
        let plain: Vec<&Element> = self.elements().filter(|e| e.name == name).collect();
        if !plain.is_empty() {
            return plain;
        }
        let wanted = local_part(name);
        self.elements().filter(|e| e.local_name() == wanted).collect()
    }

    /// First direct child named `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children_named(name).into_iter().next()
    }

    /// Text of the first direct child named `name` whose text is non-blank.
    ///
    /// Blank plain matches do not shadow the wildcard lookup.
    pub fn child_text(&self, name: &str) -> Option<String> {
        let non_blank = |e: &Element| Some(e.text()).filter(|t| !t.trim().is_empty());
        let wanted = local_part(name);
        self.elements()
            .filter(|e| e.name == name)
            .find_map(non_blank)
            .or_else(|| {
                self.elements()
                    .filter(|e| e.local_name() == wanted)
                    .find_map(non_blank)
            })
    }

    /// All descendants named `name` in document order, plain then wildcard.
    pub fn descendants_named(&self, name: &str) -> Vec<&Element> {
        let mut plain = Vec::new();
        self.walk(&mut |e: &Element| e.name == name, &mut plain);
        if !plain.is_empty() {
            return plain;
        }
        let wanted = local_part(name);
        let mut wild = Vec::new();
        self.walk(&mut |e: &Element| e.local_name() == wanted, &mut wild);
        wild
    }

    fn walk<'a>(&'a self, pred: &mut dyn FnMut(&Element) -> bool, out: &mut Vec<&'a Element>) {
        for child in self.elements() {
            if pred(child) {
                out.push(child);
            }
            child.walk(pred, out);
        }
    }
}

/// Parse `xml` into its root element.
///
/// Fails on malformed markup, on tags left open at end of input, and on
/// documents without a root element.
pub fn parse_document(xml: &str) -> IngestResult<Element> {
    let xml = xml.trim_start_matches('\u{feff}').trim_start();
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(start_element(&e)),
            Event::Empty(e) => {
                let element = start_element(&e);
                close_element(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| IngestError::Xml("unexpected closing tag".into()))?;
                close_element(element, &mut stack, &mut root)?;
            }
            Event::Text(e) => {
                let text = e.decode().unwrap_or_default();
                push_text(&mut stack, &text);
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e);
                push_text(&mut stack, &text);
            }
            Event::GeneralRef(e) => {
                let name = e.decode().unwrap_or_default();
                push_text(&mut stack, &resolve_reference(&name));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(IngestError::Xml(format!("unclosed element <{}>", open.name)));
    }
    root.ok_or_else(|| IngestError::Xml("document has no root element".into()))
}

fn start_element(e: &BytesStart<'_>) -> Element {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let attributes = e
        .attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
            (key, value)
        })
        .collect();

    Element {
        name,
        attributes,
        children: Vec::new(),
    }
}

fn close_element(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> IngestResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(IngestError::Xml("multiple root elements".into())),
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) {
    // Text outside the root element is whitespace or junk; drop it.
    let Some(current) = stack.last_mut() else {
        return;
    };
    if let Some(Node::Text(prev)) = current.children.last_mut() {
        prev.push_str(text);
    } else {
        current.children.push(Node::Text(text.to_string()));
    }
}

/// Resolve a `&name;` reference to text.
///
/// Character references and the five XML entities are decoded; anything
/// else (HTML entities feeds sometimes leak) is kept verbatim for the HTML
/// cleanup stage.
fn resolve_reference(name: &str) -> String {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => num.parse::<u32>().ok(),
        };
        if let Some(c) = code.and_then(char::from_u32) {
            return c.to_string();
        }
    }
    match name {
        "lt" => "<".into(),
        "gt" => ">".into(),
        "amp" => "&".into(),
        "apos" => "'".into(),
        "quot" => "\"".into(),
        other => format!("&{};", other),
    }
}
