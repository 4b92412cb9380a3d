use divan::{Bencher, black_box};
use inlay::{Document, Injector};

fn main() {
    divan::main();
}

const SNIPPET: &str = "<ul><li>alpha</li><li>beta</li><li>gamma</li></ul>";

fn host() -> (Document, Injector<Document>) {
    let doc = Document::from_html(r#"<html><body><div id="inlay-root"></div></body></html>"#);
    let injector = Injector::new(&doc);
    (doc, injector)
}

#[divan::bench]
fn append_markup(bencher: Bencher) {
    bencher.with_inputs(host).bench_local_refs(|(doc, injector)| {
        let inserted = injector.append(doc, black_box(SNIPPET), None).unwrap();
        black_box(inserted);
    });
}

#[divan::bench]
fn append_hidden(bencher: Bencher) {
    bencher.with_inputs(host).bench_local_refs(|(doc, injector)| {
        let inserted = injector.hidden(doc, black_box(SNIPPET)).unwrap();
        black_box(inserted);
    });
}

#[divan::bench]
fn insert_iframe(bencher: Bencher) {
    bencher.with_inputs(host).bench_local_refs(|(doc, injector)| {
        let body = doc.body().unwrap();
        let frame = injector
            .iframe(doc, black_box("https://example.com/frame.html"), body, None)
            .unwrap();
        black_box(frame);
    });
}
