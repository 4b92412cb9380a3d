//! Content injection: markup strings, detached nodes, and iframes.
//!
//! [`Injector`] is the context object that owns the two memoized insertion
//! roots (the default visible root, resolved from a well-known anchor
//! element, and the single off-screen hidden root) plus the
//! [`EventRegistration`] capability captured from the host at construction.
//! It is created once at application start and lives for the page lifetime;
//! [`Injector::reset`] exists for tests and full teardowns.
//!
//! Iframe insertion is the delicate part: the two engine families disagree
//! about when `src` may be set relative to DOM attachment, and expose
//! incompatible load-event registration. See [`Injector::iframe`].

use tracing::warn;

use crate::host::{Error, EventRegistration, HostDocument, LoadCallback};

/// Default id of the well-known anchor element used as the insertion root.
///
/// The embedding page is expected to provide `<div id="inlay-root"></div>`;
/// [`Injector::with_anchor`] overrides the id.
pub const DEFAULT_ANCHOR_ID: &str = "inlay-root";

/// Content accepted by [`Injector::append`]: markup or an existing node,
/// never both.
#[derive(Debug)]
pub enum Content<H> {
    /// Markup, parsed into a freshly created wrapper element.
    Markup(String),
    /// An already-constructed node, re-parented as-is (no cloning).
    Node(H),
}

impl<H> From<&str> for Content<H> {
    fn from(markup: &str) -> Self {
        Content::Markup(markup.to_string())
    }
}

impl<H> From<String> for Content<H> {
    fn from(markup: String) -> Self {
        Content::Markup(markup)
    }
}

/// Outcome of an append: the attached node, or an unresolved root.
///
/// `RootUnresolved` is the configuration-absence outcome; it is not an
/// [`Error`] and callers handle it themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion<H> {
    /// Content is attached; the handle is the attached node.
    Inserted(H),
    /// No explicit root, no memoized root, and the anchor element is missing.
    RootUnresolved,
}

impl<H> Insertion<H> {
    /// The attached node, if any.
    pub fn node(self) -> Option<H> {
        match self {
            Insertion::Inserted(node) => Some(node),
            Insertion::RootUnresolved => None,
        }
    }

    /// Whether content was attached.
    pub fn is_inserted(&self) -> bool {
        matches!(self, Insertion::Inserted(_))
    }
}

/// Injection context for one host document.
///
/// Memoized state is idempotent and expected to run in a single execution
/// context at a time, matching the host's event-loop model; no locking.
pub struct Injector<D: HostDocument> {
    anchor_id: String,
    registration: EventRegistration,
    default_root: Option<D::Handle>,
    hidden_root: Option<D::Handle>,
}

impl<D: HostDocument> Injector<D> {
    /// Injector for `doc`, looking up [`DEFAULT_ANCHOR_ID`].
    ///
    /// Captures the host's event-registration capability once, here.
    pub fn new(doc: &D) -> Self {
        Self::with_anchor(doc, DEFAULT_ANCHOR_ID)
    }

    /// Injector with an application-reserved anchor id.
    pub fn with_anchor(doc: &D, anchor_id: impl Into<String>) -> Self {
        Self {
            anchor_id: anchor_id.into(),
            registration: doc.event_registration(),
            default_root: None,
            hidden_root: None,
        }
    }

    /// Forget both memoized roots. They re-resolve on the next call.
    pub fn reset(&mut self) {
        self.default_root = None;
        self.hidden_root = None;
    }

    /// Append content under `root`, or under the default root when `root`
    /// is `None`.
    ///
    /// Markup content is parsed into a freshly created wrapper element and
    /// the wrapper is reported; node content is re-parented and reported
    /// as-is, so the caller's handle stays valid. One attach attempt per
    /// call; platform failures surface as `Err`.
    pub fn append(
        &mut self,
        doc: &mut D,
        content: impl Into<Content<D::Handle>>,
        root: Option<D::Handle>,
    ) -> Result<Insertion<D::Handle>, Error> {
        let Some(root) = self.resolve_root(doc, root) else {
            return Ok(Insertion::RootUnresolved);
        };

        let attached = match content.into() {
            Content::Markup(markup) => {
                let wrapper = doc.create_element("div");
                // The markup lands on the handle the attach call returned
                let wrapper = doc.append_child(root, wrapper)?;
                doc.set_inner_markup(wrapper, &markup)?;
                wrapper
            }
            Content::Node(node) => doc.append_child(root, node)?,
        };

        Ok(Insertion::Inserted(attached))
    }

    /// Append content under the single off-screen hidden root, creating it
    /// on first use.
    ///
    /// The hidden container sits outside the visible flow with a collapsed
    /// box; it is memoized for the injector's lifetime. If its own insertion
    /// reports [`Insertion::RootUnresolved`], nothing is memoized and the
    /// outcome propagates on this and every later call until the anchor
    /// becomes resolvable.
    pub fn hidden(
        &mut self,
        doc: &mut D,
        content: impl Into<Content<D::Handle>>,
    ) -> Result<Insertion<D::Handle>, Error> {
        if self.hidden_root.is_none() {
            let container = doc.create_element("div");
            doc.set_style(container, "position", "absolute");
            doc.set_style(container, "top", "-10000px");
            doc.set_style(container, "width", "0");
            doc.set_style(container, "height", "0");

            match self.append(doc, Content::Node(container), None)? {
                Insertion::Inserted(attached) => self.hidden_root = Some(attached),
                Insertion::RootUnresolved => return Ok(Insertion::RootUnresolved),
            }
        }

        self.append(doc, content, self.hidden_root)
    }

    /// Insert an iframe for `url` under `root` (required; the anchor lookup
    /// does not apply here), optionally with a load callback.
    ///
    /// The capability captured at construction drives both wiring decisions:
    ///
    /// - `Legacy`: the callback goes through attach-style registration, and
    ///   `src` is set *before* attachment - legacy engines emit an audible
    ///   click when a live frame's source changes.
    /// - `Modern`: the callback is assigned to the load property, and `src`
    ///   is set *after* attachment - the modern family serves a stale cache
    ///   entry when a detached frame gets its source first.
    ///
    /// Exactly one registration path runs, never both. Everything after the
    /// attach call uses the handle it returned; hosts may hand back a
    /// distinct one. Malformed URLs and attach failures are not intercepted.
    pub fn iframe(
        &self,
        doc: &mut D,
        url: &str,
        root: D::Handle,
        onload: Option<LoadCallback>,
    ) -> Result<D::Handle, Error> {
        let mut node = doc.create_element("iframe");

        // Borderless, transparent frame in every case
        doc.set_attribute(node, "frameborder", "0");
        doc.set_attribute(node, "allowtransparency", "true");
        doc.set_style(node, "border", "none");

        if let Some(callback) = onload {
            match self.registration {
                EventRegistration::Legacy => doc.attach_event(node, "onload", callback),
                EventRegistration::Modern => doc.set_onload(node, callback),
            }
        }

        match self.registration {
            EventRegistration::Legacy => {
                doc.set_attribute(node, "src", url);
                node = doc.append_child(root, node)?;
            }
            EventRegistration::Modern => {
                node = doc.append_child(root, node)?;
                doc.set_attribute(node, "src", url);
            }
        }

        Ok(node)
    }

    /// Resolve the destination root: explicit wins, then the memoized
    /// default, then the anchor lookup (memoized on first success).
    fn resolve_root(&mut self, doc: &D, explicit: Option<D::Handle>) -> Option<D::Handle> {
        if let Some(root) = explicit.or(self.default_root) {
            return Some(root);
        }

        match doc.element_by_id(&self.anchor_id) {
            Some(anchor) => {
                self.default_root = Some(anchor);
                Some(anchor)
            }
            None => {
                // One event per failed call; resolution is retried every time
                warn!(
                    anchor = %self.anchor_id,
                    "insertion anchor element not found; content dropped"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn host_page() -> Document {
        Document::from_html(r#"<html><body><div id="inlay-root"></div></body></html>"#)
    }

    #[test]
    fn test_append_markup_under_anchor() {
        let mut doc = host_page();
        let anchor = doc.element_by_id("inlay-root").expect("anchor exists");

        let mut injector = Injector::new(&doc);
        let wrapper = injector
            .append(&mut doc, "<p>Hello!</p>", None)
            .expect("append should work")
            .node()
            .expect("root should resolve");

        assert_eq!(doc.parent(wrapper), Some(anchor));
        assert_eq!(doc.inner_html(wrapper), "<p>Hello!</p>");
    }

    #[test]
    fn test_append_node_preserves_identity() {
        let mut doc = host_page();
        let anchor = doc.element_by_id("inlay-root").expect("anchor exists");

        let span = doc.create_element("span");
        let mut injector = Injector::new(&doc);
        let attached = injector
            .append(&mut doc, Content::Node(span), None)
            .expect("append should work")
            .node()
            .expect("root should resolve");

        assert_eq!(attached, span);
        assert_eq!(doc.parent(span), Some(anchor));
    }

    #[test]
    fn test_explicit_root_skips_anchor_lookup() {
        // No anchor anywhere; the explicit root is used as-is
        let mut doc = Document::new();
        let body = doc.body().expect("should have body");

        let mut injector = Injector::new(&doc);
        let inserted = injector
            .append(&mut doc, "<em>x</em>", Some(body))
            .expect("append should work");
        assert!(inserted.is_inserted());
    }

    #[test]
    fn test_hidden_root_memoized() {
        let mut doc = host_page();
        let mut injector = Injector::new(&doc);

        let first = injector
            .hidden(&mut doc, "<p>a</p>")
            .expect("hidden should work")
            .node()
            .expect("root should resolve");
        let second = injector
            .hidden(&mut doc, "<p>b</p>")
            .expect("hidden should work")
            .node()
            .expect("root should resolve");

        assert_eq!(doc.parent(first), doc.parent(second));
    }

    #[test]
    fn test_reset_forgets_roots() {
        let mut doc = host_page();
        let mut injector = Injector::new(&doc);
        injector
            .hidden(&mut doc, "<p>a</p>")
            .expect("hidden should work");

        injector.reset();

        // A fresh hidden container is built after reset
        let anchor = doc.element_by_id("inlay-root").expect("anchor exists");
        let before = doc.children(anchor).count();
        injector
            .hidden(&mut doc, "<p>b</p>")
            .expect("hidden should work");
        assert_eq!(doc.children(anchor).count(), before + 1);
    }
}
