mod common;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::ZipBuilder;
use sketchfile::model::FillType;
use sketchfile::plist::Value;
use sketchfile::{Archive, LoadError, LoadOptions, MemoryReader, Package, ReadAt};

const DOCUMENT: &str = r#"{
    "_class": "document",
    "do_objectID": "DOC",
    "currentPageIndex": 0,
    "pages": [
        {"_class": "MSJSONFileReference", "_ref_class": "MSImmutablePage", "_ref": "pages/P2"},
        {"_class": "MSJSONFileReference", "_ref_class": "MSImmutablePage", "_ref": "pages/P1"}
    ]
}"#;

const META: &str = r#"{"app": "com.bohemiancoding.sketch3", "appVersion": "52.6", "build": 67491}"#;

const PAGE_ONE: &str = r#"{
    "_class": "page",
    "do_objectID": "P1",
    "name": "Icons",
    "layers": [{
        "_class": "artboard",
        "name": "Board",
        "frame": {"_class": "rect", "x": 0, "y": 0, "width": 64, "height": 64},
        "layers": [{
            "_class": "shapePath",
            "name": "Triangle",
            "style": {"_class": "style", "fills": [{
                "_class": "fill", "fillType": 1, "isEnabled": true,
                "gradient": {"_class": "gradient", "from": "{0.5, 0}", "to": "{0.5, 1}"}
            }]},
            "points": [
                {"_class": "curvePoint", "point": "{0.5, 0.67135115527602085}"},
                {"_class": "curvePoint", "point": "{1, 1}"}
            ]
        }]
    }]
}"#;

const PAGE_TWO: &str = r#"{"_class": "page", "do_objectID": "P2", "name": "Cover", "layers": []}"#;

fn options(concurrency: usize) -> LoadOptions {
    LoadOptions {
        concurrency,
        verify_crc: true,
    }
}

fn package_bytes() -> Vec<u8> {
    ZipBuilder::new()
        .deflated("document.json", DOCUMENT.as_bytes())
        .stored("meta.json", META.as_bytes())
        .directory("pages/")
        .deflated("pages/P1.json", PAGE_ONE.as_bytes())
        .deflated("pages/P2.json", PAGE_TWO.as_bytes())
        .stored("images/9f3c.png", b"\x89PNG\r\n\x1a\nnot really a png")
        .stored("previews/preview.png", b"\x89PNG")
        .build()
}

/// A keyed archive whose root is a plain string.
fn archived_text(text: &str) -> String {
    let mut root = BTreeMap::new();
    root.insert("NSString".to_owned(), Value::Uid(2));
    root.insert("$class".to_owned(), Value::Uid(3));

    let mut class = BTreeMap::new();
    class.insert("$classname".to_owned(), Value::from("NSAttributedString"));

    let mut top = BTreeMap::new();
    top.insert("root".to_owned(), Value::Uid(1));

    let mut entries = BTreeMap::new();
    entries.insert("$archiver".to_owned(), Value::from("NSKeyedArchiver"));
    entries.insert("$version".to_owned(), Value::from(100000i64));
    entries.insert("$top".to_owned(), Value::from(top));
    entries.insert(
        "$objects".to_owned(),
        Value::from(vec![
            Value::from("$null"),
            Value::from(root),
            Value::from(text),
            Value::from(class),
        ]),
    );
    Archive::new(entries).to_base64()
}

#[tokio::test]
async fn test_load_complete_package() {
    let package = Package::from_bytes(package_bytes(), &options(4)).await.unwrap();

    let document = package.document.as_ref().unwrap();
    assert_eq!(document.object_id.as_deref(), Some("DOC"));
    assert_eq!(package.meta.as_ref().unwrap().app_version.as_deref(), Some("52.6"));

    assert_eq!(package.pages.len(), 2);
    let icons = package.page("Icons").unwrap();
    assert_eq!(icons.layer_count(), 2);
    assert!(package.page("Cover").is_some());

    let triangle = &icons.layers()[0].children()[0];
    assert_eq!(triangle.curve_points()[0].point.as_ref().unwrap().to_string(), "{0.5, 0.67135115527602085}");
    let fill = &triangle.style.as_ref().unwrap().fills.as_ref().unwrap()[0];
    assert_eq!(fill.kind(), Some(FillType::Gradient));

    let order: Vec<_> = package
        .ordered_pages()
        .iter()
        .filter_map(|page| page.name.as_deref())
        .collect();
    assert_eq!(order, ["Cover", "Icons"]);
}

#[tokio::test]
async fn test_truncated_page_aborts_load() {
    let bytes = ZipBuilder::new()
        .deflated("document.json", DOCUMENT.as_bytes())
        .deflated("pages/P1.json", PAGE_ONE.as_bytes())
        .deflated("pages/P2.json", br#"{"_class": "page", "name": "Co"#)
        .build();

    let err = Package::from_bytes(bytes, &options(4)).await.unwrap_err();
    assert!(matches!(err, LoadError::Decode { .. }), "{err}");
    assert_eq!(err.entry(), Some("pages/P2.json"));
}

#[tokio::test]
async fn test_codec_error_names_the_field() {
    let page = PAGE_ONE.replace(r#""from": "{0.5, 0}""#, r#""from": "{0.5, 0, 1}""#);
    let bytes = ZipBuilder::new()
        .deflated("document.json", DOCUMENT.as_bytes())
        .deflated("pages/P1.json", page.as_bytes())
        .build();

    match Package::from_bytes(bytes, &options(1)).await.unwrap_err() {
        LoadError::Decode { entry, path, source } => {
            assert_eq!(entry, "pages/P1.json");
            assert_eq!(path, "layers[0].layers[0].style.fills[0].gradient.from");
            assert!(source.to_string().contains("3 components"), "{source}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_not_a_zip() {
    let err = Package::from_bytes(DOCUMENT.as_bytes().to_vec(), &options(1))
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::Open(_)), "{err}");
    assert_eq!(err.entry(), None);
}

#[tokio::test]
async fn test_missing_document() {
    let bytes = ZipBuilder::new()
        .deflated("pages/P2.json", PAGE_TWO.as_bytes())
        .build();

    let package = Package::from_bytes(bytes, &options(2)).await.unwrap();
    assert!(package.document.is_none());
    assert!(package.meta.is_none());
    assert_eq!(package.pages.len(), 1);
    assert_eq!(package.ordered_pages()[0].name.as_deref(), Some("Cover"));
}

#[tokio::test]
async fn test_duplicate_page_names_last_wins() {
    let bytes = ZipBuilder::new()
        .deflated("pages/A.json", br#"{"do_objectID": "A", "name": "Same"}"#)
        .deflated("pages/B.json", br#"{"do_objectID": "B", "name": "Same"}"#)
        .deflated("pages/C.json", br#"{"do_objectID": "C"}"#)
        .build();

    for concurrency in [1, 8] {
        let package = Package::from_bytes(bytes.clone(), &options(concurrency)).await.unwrap();
        assert_eq!(package.pages.len(), 2);
        assert_eq!(package.page("Same").unwrap().object_id.as_deref(), Some("B"));
        assert_eq!(package.page("").unwrap().object_id.as_deref(), Some("C"));
    }
}

#[tokio::test]
async fn test_crc_mismatch() {
    let bytes = ZipBuilder::new()
        .deflated("document.json", DOCUMENT.as_bytes())
        .deflated("pages/P2.json", PAGE_TWO.as_bytes())
        .corrupt_last_crc()
        .build();

    let err = Package::from_bytes(bytes.clone(), &options(1)).await.unwrap_err();
    assert!(matches!(err, LoadError::Extract { .. }), "{err}");
    assert_eq!(err.entry(), Some("pages/P2.json"));

    let unchecked = LoadOptions {
        concurrency: 1,
        verify_crc: false,
    };
    let package = Package::from_bytes(bytes, &unchecked).await.unwrap();
    assert!(package.page("Cover").is_some());
}

#[tokio::test]
async fn test_sequential_and_concurrent_agree() {
    let sequential = Package::from_bytes(package_bytes(), &options(1)).await.unwrap();
    let concurrent = Package::from_bytes(package_bytes(), &options(16)).await.unwrap();
    assert_eq!(sequential, concurrent);
}

#[tokio::test]
async fn test_archived_text_layer() {
    let page = format!(
        r#"{{"_class": "page", "name": "Copy", "layers": [{{
            "_class": "text",
            "name": "Title",
            "attributedString": {{
                "_class": "MSAttributedString",
                "archivedAttributedString": {{"_archive": "{}"}}
            }}
        }}]}}"#,
        archived_text("Hello, package")
    );
    let bytes = ZipBuilder::new()
        .deflated("pages/T.json", page.as_bytes())
        .build();

    let package = Package::from_bytes(bytes, &options(1)).await.unwrap();
    let title = &package.page("Copy").unwrap().layers()[0];
    assert_eq!(title.text(), Some("Hello, package"));
}

#[tokio::test]
async fn test_open_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&package_bytes()).unwrap();
    file.flush().unwrap();

    let package = Package::open(file.path()).await.unwrap();
    assert_eq!(package.pages.len(), 2);

    let missing = file.path().with_extension("missing");
    let err = Package::open(&missing).await.unwrap_err();
    assert!(matches!(err, LoadError::Open(_)), "{err}");
}

/// Records how many reads are in flight at once.
struct TrackingReader {
    inner: MemoryReader,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl TrackingReader {
    fn new(data: Vec<u8>) -> Self {
        Self {
            inner: MemoryReader::new(data),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ReadAt for TrackingReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> anyhow::Result<usize> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(2)).await;
        let result = self.inner.read_at(offset, buf).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn size(&self) -> u64 {
        self.inner.size()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_page_decoding_respects_concurrency() {
    let mut builder = ZipBuilder::new();
    for i in 0..8 {
        let page = format!(r#"{{"do_objectID": "P{i}", "name": "Page {i}"}}"#);
        builder = builder.deflated(&format!("pages/P{i}.json"), page.as_bytes());
    }
    let bytes = builder.build();

    for concurrency in [1, 2] {
        let reader = Arc::new(TrackingReader::new(bytes.clone()));
        let package = Package::from_reader(Arc::clone(&reader), &options(concurrency))
            .await
            .unwrap();
        assert_eq!(package.pages.len(), 8);

        let peak = reader.peak.load(Ordering::SeqCst);
        assert!(peak >= 1 && peak <= concurrency, "peak {peak} with limit {concurrency}");
    }
}
