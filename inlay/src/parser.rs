//! HTML parsing via html5ever's TreeSink, building directly into the arena.
//!
//! Tree construction runs with full browser-compatible error recovery, so
//! any markup a browser accepts lands somewhere sensible in the tree. The
//! same path serves whole host pages ([`Document::from_html`]) and the
//! fragments handed to `set_inner_markup`.

use std::borrow::Cow;
use std::cell::RefCell;

use html5ever::tree_builder::{ElemName, ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute, LocalName, QualName, local_name, namespace_url, ns, parse_document};
use indexmap::IndexMap;
use indextree::{Arena, NodeId};
use tendril::{StrTendril, TendrilSink};

use crate::dom::{Document, ElementData, Namespace, NodeData, NodeKind};

/// Parse HTML into an arena-backed [`Document`].
pub fn parse(html: &str) -> Document {
    let sink = ArenaSink::new();
    // html5ever creates subtendrils sharing this buffer via refcounting
    let tendril = StrTendril::from(html);
    parse_document(sink, Default::default()).one(tendril)
}

/// Split `"a: b; c: d"` into ordered style declarations.
pub(crate) fn parse_style_decls(value: &str) -> IndexMap<String, String> {
    let mut style = IndexMap::new();
    for decl in value.split(';') {
        if let Some((name, val)) = decl.split_once(':') {
            let name = name.trim();
            if !name.is_empty() {
                style.insert(name.to_string(), val.trim().to_string());
            }
        }
    }
    style
}

/// Owned element name wrapper
#[derive(Debug, Clone)]
struct OwnedElemName(QualName);

impl ElemName for OwnedElemName {
    fn ns(&self) -> &html5ever::Namespace {
        &self.0.ns
    }

    fn local_name(&self) -> &LocalName {
        &self.0.local
    }
}

/// TreeSink implementation for building the arena-based DOM
struct ArenaSink {
    /// The arena under construction - RefCell for interior mutability
    arena: RefCell<Arena<NodeData>>,

    /// Document node (parent of `<html>`)
    document: NodeId,

    /// DOCTYPE encountered during parse
    doctype: RefCell<Option<StrTendril>>,
}

impl ArenaSink {
    fn new() -> Self {
        let mut arena = Arena::new();
        let document = arena.new_node(NodeData {
            kind: NodeKind::Document,
            ns: Namespace::Html,
        });

        ArenaSink {
            arena: RefCell::new(arena),
            document,
            doctype: RefCell::new(None),
        }
    }
}

impl TreeSink for ArenaSink {
    type Handle = NodeId;
    type Output = Document;
    type ElemName<'a>
        = OwnedElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        let arena = self.arena.into_inner();

        // Root element is the first child of the document node (usually <html>)
        let root = self
            .document
            .children(&arena)
            .next()
            .unwrap_or(self.document);

        Document::from_parts(arena, self.document, root, self.doctype.into_inner())
    }

    fn parse_error(&self, _msg: Cow<'static, str>) {
        // html5ever recovers automatically; nothing to report
    }

    fn get_document(&self) -> Self::Handle {
        self.document
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn same_node(&self, a: &Self::Handle, b: &Self::Handle) -> bool {
        a == b
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> OwnedElemName {
        let arena = self.arena.borrow();
        let node = arena[*target].get();

        if let NodeKind::Element(elem) = &node.kind {
            let local = LocalName::from(elem.tag.as_ref());
            let ns = match node.ns {
                Namespace::Html => ns!(html),
                Namespace::Svg => ns!(svg),
                Namespace::MathMl => ns!(mathml),
            };

            OwnedElemName(QualName {
                prefix: None,
                ns,
                local,
            })
        } else {
            // Not an element - return placeholder
            OwnedElemName(QualName {
                prefix: None,
                ns: ns!(html),
                local: local_name!(""),
            })
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let mut data = ElementData::new(name.local.as_ref());
        let ns = Namespace::from_url(name.ns.as_ref());

        for attr in attrs {
            let key = attr.name.local.to_string();
            if key == "style" {
                // The style attribute lives in the style map, not attrs
                data.style = parse_style_decls(attr.value.as_ref());
            } else {
                // StrTendril clone is cheap (refcounted)
                data.attrs.insert(key, attr.value.clone());
            }
        }

        self.arena.borrow_mut().new_node(NodeData {
            kind: NodeKind::Element(data),
            ns,
        })
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        self.arena.borrow_mut().new_node(NodeData {
            kind: NodeKind::Comment(text),
            ns: Namespace::Html,
        })
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        // Processing instructions - create empty comment
        self.arena.borrow_mut().new_node(NodeData {
            kind: NodeKind::Comment(StrTendril::new()),
            ns: Namespace::Html,
        })
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => {
                parent.append(node, &mut arena);
            }
            NodeOrText::AppendText(text) => {
                // Merge with a trailing text node (html5ever behavior)
                let last_child = arena[*parent].last_child();
                if let Some(last_child) = last_child
                    && let NodeKind::Text(existing) = &mut arena[last_child].get_mut().kind
                {
                    existing.push_tendril(&text);
                    return;
                }

                let text_node = arena.new_node(NodeData {
                    kind: NodeKind::Text(text),
                    ns: Namespace::Html,
                });
                parent.append(text_node, &mut arena);
            }
        }
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        match new_node {
            NodeOrText::AppendNode(node) => {
                sibling.insert_before(node, &mut arena);
            }
            NodeOrText::AppendText(text) => {
                let text_node = arena.new_node(NodeData {
                    kind: NodeKind::Text(text),
                    ns: Namespace::Html,
                });
                sibling.insert_before(text_node, &mut arena);
            }
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        _prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        self.append(element, child);
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        *self.doctype.borrow_mut() = Some(name);
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        // For <template>, return the element itself
        *target
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut arena = self.arena.borrow_mut();
        let node = arena[*target].get_mut();
        if let NodeKind::Element(elem) = &mut node.kind {
            for attr in attrs {
                let key = attr.name.local.to_string();
                if key == "style" {
                    if elem.style.is_empty() {
                        elem.style = parse_style_decls(attr.value.as_ref());
                    }
                } else {
                    elem.attrs.entry(key).or_insert_with(|| attr.value.clone());
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        target.detach(&mut self.arena.borrow_mut());
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut arena = self.arena.borrow_mut();
        let children: Vec<NodeId> = node.children(&arena).collect();
        for child in children {
            child.detach(&mut arena);
            new_parent.append(child, &mut arena);
        }
    }
}
