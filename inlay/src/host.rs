//! The host-document seam: what the injector needs from whatever document
//! implementation it is driving.
//!
//! The trait is shaped like `html5ever`'s `TreeSink` - an opaque copyable
//! handle type plus a narrow set of mutation methods. The crate ships an
//! arena-backed implementation in [`crate::dom`]; the ordering tests drive
//! the injector through a recording mock instead.

use std::fmt;

/// Callback delivered when an iframe's underlying resource load completes.
///
/// The host consumes it on delivery, so it fires at most once.
pub type LoadCallback = Box<dyn FnOnce()>;

/// Which event-registration mechanism the host exposes on elements.
///
/// Reported once by the host adapter via
/// [`HostDocument::event_registration`] and captured at
/// [`Injector`](crate::Injector) construction - never re-sniffed per call.
/// The same capability decides the iframe attach/`src` ordering (see
/// [`Injector::iframe`](crate::Injector::iframe)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventRegistration {
    /// Attach-style registration: `attach_event("onload", callback)`.
    Legacy,
    /// Direct property assignment: `node.onload = callback`.
    Modern,
}

/// Platform-level failure surfaced by a host document.
///
/// A missing insertion anchor is not an error: that outcome is reported as
/// [`Insertion::RootUnresolved`](crate::Insertion::RootUnresolved), so
/// callers cannot mistake it for one of these.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The attach target cannot hold children.
    #[error("cannot append children to a {kind} node")]
    NotAnElement {
        /// Kind of the rejected target node.
        kind: &'static str,
    },
    /// Structural attach failure (self-append, ancestor cycle, removed node).
    #[error("node attachment failed: {0}")]
    Attach(#[from] indextree::NodeError),
}

/// The document surface the injector drives.
///
/// Handles are copyable and compare by node identity, so callers keep a
/// usable reference to content they hand over for attachment.
pub trait HostDocument {
    /// Opaque node handle.
    type Handle: Copy + PartialEq + fmt::Debug;

    /// The event-registration capability this host exposes.
    fn event_registration(&self) -> EventRegistration;

    /// Create a detached element.
    fn create_element(&mut self, tag: &str) -> Self::Handle;

    /// Look up an attached element by its `id` attribute.
    fn element_by_id(&self, id: &str) -> Option<Self::Handle>;

    /// Attach `child` under `parent` and return the attached handle.
    ///
    /// Hosts may hand back a handle distinct from `child`; callers must use
    /// the returned one for anything that happens after attachment.
    fn append_child(
        &mut self,
        parent: Self::Handle,
        child: Self::Handle,
    ) -> Result<Self::Handle, Error>;

    /// Set an attribute on an element. No-op on non-elements.
    fn set_attribute(&mut self, node: Self::Handle, name: &str, value: &str);

    /// Set an inline style declaration on an element. No-op on non-elements.
    fn set_style(&mut self, node: Self::Handle, name: &str, value: &str);

    /// Replace an element's children by parsing `markup`.
    fn set_inner_markup(&mut self, node: Self::Handle, markup: &str) -> Result<(), Error>;

    /// Attach-style load registration (the legacy capability).
    fn attach_event(&mut self, node: Self::Handle, event: &str, callback: LoadCallback);

    /// Property-style load registration (the modern capability).
    fn set_onload(&mut self, node: Self::Handle, callback: LoadCallback);
}
