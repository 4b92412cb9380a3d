//! Injection behavior over the shipped arena document.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use inlay::{Content, Document, Error, EventRegistration, Injector, Insertion};
use tracing::Level;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

fn host_page() -> Document {
    Document::from_html(r#"<html><body><div id="inlay-root"></div></body></html>"#)
}

#[test]
fn append_markup_attaches_wrapper_with_content() {
    let mut doc = host_page();
    let anchor = doc.element_by_id("inlay-root").expect("anchor exists");

    let mut injector = Injector::new(&doc);
    let markup = "<ul><li>one</li><li>two</li></ul>";
    let wrapper = injector
        .append(&mut doc, markup, None)
        .expect("append should work")
        .node()
        .expect("root should resolve");

    assert_eq!(doc.parent(wrapper), Some(anchor));
    assert_eq!(doc.inner_html(wrapper), markup);
}

#[test]
fn append_node_returns_same_handle() {
    let mut doc = host_page();
    let anchor = doc.element_by_id("inlay-root").expect("anchor exists");

    let span = doc.create_element("span");
    doc.set_attribute(span, "class", "badge");

    let mut injector = Injector::new(&doc);
    let attached = injector
        .append(&mut doc, Content::Node(span), None)
        .expect("append should work")
        .node()
        .expect("root should resolve");

    assert_eq!(attached, span);
    assert_eq!(doc.parent(span), Some(anchor));
    assert_eq!(doc.attribute(span, "class"), Some("badge"));
}

#[test]
fn default_root_memoized_after_first_resolution() {
    let mut doc = host_page();
    let anchor = doc.element_by_id("inlay-root").expect("anchor exists");

    let mut injector = Injector::new(&doc);
    injector
        .append(&mut doc, "<p>first</p>", None)
        .expect("append should work");

    // Renaming the anchor defeats any further lookup; the memoized root
    // keeps resolving.
    doc.set_attribute(anchor, "id", "renamed");
    let second = injector
        .append(&mut doc, "<p>second</p>", None)
        .expect("append should work")
        .node()
        .expect("memoized root should resolve");
    assert_eq!(doc.parent(second), Some(anchor));
}

#[test]
fn missing_anchor_emits_one_diagnostic_per_call() {
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::WARN {
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    let warnings = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(WarnCounter(warnings.clone()));

    tracing::subscriber::with_default(subscriber, || {
        let mut doc = Document::new(); // no anchor anywhere
        let mut injector = Injector::new(&doc);

        let first = injector
            .append(&mut doc, "<p>a</p>", None)
            .expect("no platform failure");
        assert_eq!(first, Insertion::RootUnresolved);
        assert_eq!(warnings.load(Ordering::Relaxed), 1);

        // No suppression: the second failed call reports again.
        let second = injector
            .append(&mut doc, "<p>b</p>", None)
            .expect("no platform failure");
        assert_eq!(second, Insertion::RootUnresolved);
        assert_eq!(warnings.load(Ordering::Relaxed), 2);
    });
}

#[test]
fn hidden_content_shares_one_styled_container() {
    let mut doc = host_page();
    let anchor = doc.element_by_id("inlay-root").expect("anchor exists");

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

    let container = doc.parent(first).expect("hidden content is attached");
    assert_eq!(doc.parent(second), Some(container));
    assert_eq!(doc.parent(container), Some(anchor));

    // Out of the visible flow, box collapsed to nothing
    assert_eq!(doc.style(container, "position"), Some("absolute"));
    assert_eq!(doc.style(container, "top"), Some("-10000px"));
    assert_eq!(doc.style(container, "width"), Some("0"));
    assert_eq!(doc.style(container, "height"), Some("0"));
}

#[test]
fn hidden_recovers_once_anchor_appears() {
    let mut doc = Document::new(); // anchor missing
    let mut injector = Injector::new(&doc);

    let first = injector.hidden(&mut doc, "<p>a</p>").expect("no platform failure");
    assert_eq!(first, Insertion::RootUnresolved);

    // The embedding page creates the anchor late; nothing was memoized, so
    // the next call resolves and builds the container.
    let body = doc.body().expect("should have body");
    let anchor = doc.create_element("div");
    doc.set_attribute(anchor, "id", "inlay-root");
    doc.append_child(body, anchor).expect("attach should work");

    let second = injector
        .hidden(&mut doc, "<p>b</p>")
        .expect("hidden should work");
    assert!(second.is_inserted());
}

#[test]
fn custom_anchor_id() {
    let mut doc = Document::from_html(r#"<html><body><div id="app-slot"></div></body></html>"#);
    let slot = doc.element_by_id("app-slot").expect("anchor exists");

    let mut injector = Injector::with_anchor(&doc, "app-slot");
    let wrapper = injector
        .append(&mut doc, "<p>x</p>", None)
        .expect("append should work")
        .node()
        .expect("root should resolve");
    assert_eq!(doc.parent(wrapper), Some(slot));
}

#[test]
fn append_under_text_node_is_a_platform_failure() {
    let mut doc = Document::from_html("<html><body><p>hi</p></body></html>");
    let body = doc.body().expect("should have body");
    let p = doc.children(body).next().expect("body should have p");
    let text = doc.children(p).next().expect("p should have text");

    let span = doc.create_element("span");
    let mut injector = Injector::new(&doc);
    let err = injector
        .append(&mut doc, Content::Node(span), Some(text))
        .unwrap_err();
    assert!(matches!(err, Error::NotAnElement { kind: "text" }));
}

#[test]
fn iframe_end_state_matches_on_both_capabilities() {
    for registration in [EventRegistration::Legacy, EventRegistration::Modern] {
        let mut doc = Document::with_registration(registration);
        let body = doc.body().expect("should have body");

        let injector = Injector::new(&doc);
        let frame = injector
            .iframe(&mut doc, "https://example.com/frame.html", body, None)
            .expect("iframe should insert");

        assert_eq!(doc.parent(frame), Some(body));
        assert_eq!(
            doc.attribute(frame, "src"),
            Some("https://example.com/frame.html")
        );
        assert_eq!(doc.attribute(frame, "frameborder"), Some("0"));
        assert_eq!(doc.attribute(frame, "allowtransparency"), Some("true"));
        assert_eq!(doc.style(frame, "border"), Some("none"));
    }
}

#[test]
fn iframe_load_fires_once_per_registration_style() {
    for registration in [EventRegistration::Legacy, EventRegistration::Modern] {
        let mut doc = Document::with_registration(registration);
        let body = doc.body().expect("should have body");

        let fired = Rc::new(Cell::new(0u32));
        let seen = fired.clone();
        let injector = Injector::new(&doc);
        let frame = injector
            .iframe(
                &mut doc,
                "https://example.com/frame.html",
                body,
                Some(Box::new(move || seen.set(seen.get() + 1))),
            )
            .expect("iframe should insert");

        // Nothing fires before the load completes
        assert_eq!(fired.get(), 0);

        assert!(doc.complete_load(frame));
        assert_eq!(fired.get(), 1);

        // At most once
        assert!(!doc.complete_load(frame));
        assert_eq!(fired.get(), 1);
    }
}

#[test]
fn iframe_without_callback_registers_nothing() {
    let mut doc = Document::new();
    let body = doc.body().expect("should have body");

    let injector = Injector::new(&doc);
    let frame = injector
        .iframe(&mut doc, "https://example.com/frame.html", body, None)
        .expect("iframe should insert");

    assert_eq!(doc.pending_loads(), 0);
    assert!(!doc.complete_load(frame));
}
