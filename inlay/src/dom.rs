//! Arena-backed host document.
//!
//! All nodes live in an `indextree` [`Arena`]; handles are [`NodeId`]s. This
//! is the shipped [`HostDocument`] implementation - enough of a DOM for
//! headless embedding and for tests: element creation, id lookup, checked
//! attachment, attributes and inline styles, fragment parsing, HTML
//! serialization, and simulated iframe load delivery.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use indextree::{Arena, NodeId};
use tendril::StrTendril;
use tracing::debug;

use crate::host::{Error, EventRegistration, HostDocument, LoadCallback};
use crate::parser;

/// What goes in each arena slot.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    pub ns: Namespace,
}

/// Node types.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Document root (invisible, parent of `<html>`)
    Document,
    /// Element with tag, attributes, and inline styles
    Element(ElementData),
    /// Text content (StrTendril is refcounted - cheap to clone)
    Text(StrTendril),
    /// HTML comment
    Comment(StrTendril),
}

impl NodeKind {
    fn name(&self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Element(_) => "element",
            NodeKind::Text(_) => "text",
            NodeKind::Comment(_) => "comment",
        }
    }
}

/// Element data (tag + attributes + inline styles).
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Tag name
    pub tag: StrTendril,

    /// Attributes - IndexMap preserves insertion order for consistent
    /// serialization. The `style` attribute never lives here; it routes into
    /// `style` below.
    pub attrs: IndexMap<String, StrTendril>,

    /// Inline style declarations, round-tripped through the `style` attribute
    pub style: IndexMap<String, String>,
}

impl ElementData {
    /// Element data with no attributes or styles.
    pub fn new(tag: &str) -> Self {
        Self {
            tag: StrTendril::from(tag),
            attrs: IndexMap::new(),
            style: IndexMap::new(),
        }
    }
}

/// XML namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Html,
    Svg,
    MathMl,
}

impl Namespace {
    pub fn from_url(url: &str) -> Self {
        match url {
            "http://www.w3.org/1999/xhtml" => Namespace::Html,
            "http://www.w3.org/2000/svg" => Namespace::Svg,
            "http://www.w3.org/1998/Math/MathML" => Namespace::MathMl,
            _ => Namespace::Html, // default
        }
    }

    pub fn url(&self) -> &'static str {
        match self {
            Namespace::Html => "http://www.w3.org/1999/xhtml",
            Namespace::Svg => "http://www.w3.org/2000/svg",
            Namespace::MathMl => "http://www.w3.org/1998/Math/MathML",
        }
    }
}

/// Document = Arena (strings are StrTendrils with refcounted sharing)
pub struct Document {
    /// THE tree - all nodes live here
    pub arena: Arena<NodeData>,

    /// Invisible document node, parent of `root`
    document: NodeId,

    /// Root element (usually `<html>`)
    pub root: NodeId,

    /// DOCTYPE if present (usually "html")
    pub doctype: Option<StrTendril>,

    /// Which event-registration mechanism this host exposes
    registration: EventRegistration,

    /// Pending load callbacks, keyed by the node they were registered on
    load_handlers: HashMap<NodeId, LoadCallback>,
}

impl Document {
    /// An empty html/head/body skeleton exposing the modern capability.
    pub fn new() -> Self {
        Self::with_registration(EventRegistration::Modern)
    }

    /// An empty html/head/body skeleton exposing the given capability.
    pub fn with_registration(registration: EventRegistration) -> Self {
        let mut arena = Arena::new();
        let document = arena.new_node(NodeData {
            kind: NodeKind::Document,
            ns: Namespace::Html,
        });
        let root = arena.new_node(NodeData {
            kind: NodeKind::Element(ElementData::new("html")),
            ns: Namespace::Html,
        });
        document.append(root, &mut arena);
        for tag in ["head", "body"] {
            let child = arena.new_node(NodeData {
                kind: NodeKind::Element(ElementData::new(tag)),
                ns: Namespace::Html,
            });
            root.append(child, &mut arena);
        }

        Self {
            arena,
            document,
            root,
            doctype: Some(StrTendril::from("html")),
            registration,
            load_handlers: HashMap::new(),
        }
    }

    /// Parse a host page. Exposes the modern capability.
    pub fn from_html(html: &str) -> Self {
        parser::parse(html)
    }

    pub(crate) fn from_parts(
        arena: Arena<NodeData>,
        document: NodeId,
        root: NodeId,
        doctype: Option<StrTendril>,
    ) -> Self {
        Self {
            arena,
            document,
            root,
            doctype,
            registration: EventRegistration::Modern,
            load_handlers: HashMap::new(),
        }
    }

    /// Get immutable reference to node data
    pub fn get(&self, id: NodeId) -> &NodeData {
        self.arena[id].get()
    }

    /// Get mutable reference to node data
    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        self.arena[id].get_mut()
    }

    /// Iterate children of a node
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    /// Parent of a node, if attached
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].parent()
    }

    /// Get the `<body>` element if present
    pub fn body(&self) -> Option<NodeId> {
        self.root_child("body")
    }

    /// Get the `<head>` element if present
    pub fn head(&self) -> Option<NodeId> {
        self.root_child("head")
    }

    fn root_child(&self, tag: &str) -> Option<NodeId> {
        self.root.children(&self.arena).find(|&id| {
            if let NodeKind::Element(elem) = &self.arena[id].get().kind {
                elem.tag.as_ref() == tag
            } else {
                false
            }
        })
    }

    /// Create a detached element in the HTML namespace.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.arena.new_node(NodeData {
            kind: NodeKind::Element(ElementData::new(tag)),
            ns: Namespace::Html,
        })
    }

    /// Find an attached element by its `id` attribute, in document order.
    ///
    /// Detached nodes are not searched.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.document.descendants(&self.arena).find(|&node| {
            if let NodeKind::Element(elem) = &self.arena[node].get().kind {
                elem.attrs.get("id").map(|v| v.as_ref()) == Some(id)
            } else {
                false
            }
        })
    }

    /// Attach `child` under `parent`, returning the attached handle.
    ///
    /// Rejects targets that cannot hold children and structural cycles; no
    /// cloning, the child keeps its identity.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, Error> {
        match &self.get(parent).kind {
            NodeKind::Element(_) | NodeKind::Document => {}
            other => {
                return Err(Error::NotAnElement { kind: other.name() });
            }
        }
        parent.checked_append(child, &mut self.arena)?;
        Ok(child)
    }

    /// Set an attribute. The `style` attribute routes into the style map.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let NodeKind::Element(elem) = &mut self.get_mut(node).kind else {
            debug!(name, "set_attribute on a non-element node ignored");
            return;
        };
        if name == "style" {
            elem.style = parser::parse_style_decls(value);
        } else {
            elem.attrs.insert(name.to_string(), StrTendril::from(value));
        }
    }

    /// Get an attribute value. Inline styles are read via [`Self::style`].
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        if let NodeKind::Element(elem) = &self.get(node).kind {
            elem.attrs.get(name).map(|v| v.as_ref())
        } else {
            None
        }
    }

    /// Set one inline style declaration.
    pub fn set_style(&mut self, node: NodeId, name: &str, value: &str) {
        let NodeKind::Element(elem) = &mut self.get_mut(node).kind else {
            debug!(name, "set_style on a non-element node ignored");
            return;
        };
        elem.style.insert(name.to_string(), value.to_string());
    }

    /// Get one inline style declaration.
    pub fn style(&self, node: NodeId, name: &str) -> Option<&str> {
        if let NodeKind::Element(elem) = &self.get(node).kind {
            elem.style.get(name).map(String::as_str)
        } else {
            None
        }
    }

    /// Replace an element's children by parsing `markup`.
    pub fn set_inner_markup(&mut self, node: NodeId, markup: &str) -> Result<(), Error> {
        match &self.get(node).kind {
            NodeKind::Element(_) | NodeKind::Document => {}
            other => {
                return Err(Error::NotAnElement { kind: other.name() });
            }
        }

        let existing: Vec<NodeId> = node.children(&self.arena).collect();
        for child in existing {
            child.remove_subtree(&mut self.arena);
        }

        // Fragment markup goes through the same html5ever tree construction
        // as full pages; whatever lands in the parsed body is grafted in.
        let fragment = parser::parse(markup);
        if let Some(body) = fragment.body() {
            let children: Vec<NodeId> = body.children(&fragment.arena).collect();
            for child in children {
                self.import(&fragment, child, node);
            }
        }
        Ok(())
    }

    /// Deep-copy a node from another document's arena under `parent`.
    fn import(&mut self, src: &Document, src_id: NodeId, parent: NodeId) {
        let data = src.get(src_id).clone();
        let new_id = self.arena.new_node(data);
        parent.append(new_id, &mut self.arena);
        for child in src_id.children(&src.arena) {
            self.import(src, child, new_id);
        }
    }

    /// Deliver the load event for `node`, consuming its callback.
    ///
    /// Returns whether a callback ran. A second delivery for the same node
    /// finds nothing to run.
    pub fn complete_load(&mut self, node: NodeId) -> bool {
        match self.load_handlers.remove(&node) {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    /// Number of registered load callbacks not yet delivered.
    pub fn pending_loads(&self) -> usize {
        self.load_handlers.len()
    }

    /// Serialize to HTML string (body content only, no doctype)
    pub fn to_html(&self) -> String {
        let mut output = String::new();
        if let Some(body_id) = self.body() {
            for child_id in body_id.children(&self.arena) {
                self.serialize_node(&mut output, child_id);
            }
        }
        output
    }

    /// Serialize the children of `node`.
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut output = String::new();
        for child_id in node.children(&self.arena) {
            self.serialize_node(&mut output, child_id);
        }
        output
    }

    fn serialize_node(&self, out: &mut String, node_id: NodeId) {
        let node = self.get(node_id);
        match &node.kind {
            NodeKind::Document => {
                // Document nodes are invisible
            }
            NodeKind::Element(elem) => {
                self.serialize_element(out, node_id, elem);
            }
            NodeKind::Text(text) => {
                for c in text.as_ref().chars() {
                    match c {
                        '&' => out.push_str("&amp;"),
                        '<' => out.push_str("&lt;"),
                        '>' => out.push_str("&gt;"),
                        _ => out.push(c),
                    }
                }
            }
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text.as_ref());
                out.push_str("-->");
            }
        }
    }

    fn serialize_element(&self, out: &mut String, node_id: NodeId, elem: &ElementData) {
        let tag = elem.tag.as_ref();

        out.push('<');
        out.push_str(tag);

        for (name, value) in &elem.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            for c in value.as_ref().chars() {
                match c {
                    '&' => out.push_str("&amp;"),
                    '"' => out.push_str("&quot;"),
                    '<' => out.push_str("&lt;"),
                    '>' => out.push_str("&gt;"),
                    _ => out.push(c),
                }
            }
            out.push('"');
        }

        if !elem.style.is_empty() {
            out.push_str(" style=\"");
            for (i, (name, value)) in elem.style.iter().enumerate() {
                if i > 0 {
                    out.push_str("; ");
                }
                out.push_str(name);
                out.push_str(": ");
                out.push_str(value);
            }
            out.push('"');
        }

        if is_void_element(tag) {
            out.push('>');
            return;
        }

        out.push('>');

        for child_id in node_id.children(&self.arena) {
            self.serialize_node(out, child_id);
        }

        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.arena.count())
            .field("root", &self.root)
            .field("doctype", &self.doctype)
            .field("registration", &self.registration)
            .field("pending_loads", &self.load_handlers.len())
            .finish()
    }
}

impl HostDocument for Document {
    type Handle = NodeId;

    fn event_registration(&self) -> EventRegistration {
        self.registration
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        Document::create_element(self, tag)
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        Document::element_by_id(self, id)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, Error> {
        Document::append_child(self, parent, child)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        Document::set_attribute(self, node, name, value);
    }

    fn set_style(&mut self, node: NodeId, name: &str, value: &str) {
        Document::set_style(self, node, name, value);
    }

    fn set_inner_markup(&mut self, node: NodeId, markup: &str) -> Result<(), Error> {
        Document::set_inner_markup(self, node, markup)
    }

    fn attach_event(&mut self, node: NodeId, event: &str, callback: LoadCallback) {
        if event == "onload" {
            self.load_handlers.insert(node, callback);
        } else {
            debug!(event, "attach_event for an unsupported event ignored");
        }
    }

    fn set_onload(&mut self, node: NodeId, callback: LoadCallback) {
        self.load_handlers.insert(node, callback);
    }
}

/// HTML5 void elements that never have closing tags
fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}
