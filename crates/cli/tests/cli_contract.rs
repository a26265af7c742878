use assert_cmd::cargo::cargo_bin_cmd;
use lopdf::{dictionary, Document, Object};
use pdf_drawer_core::{DocumentIdentity, PageAnnotations, Point, Rgb, Stroke};
use pdf_drawer_storage::{storage_key, AnnotationPersistence, CodecConfig, FsBlobStore};
use predicates::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("temp dir should be created"),
        }
    }

    fn store_dir(&self) -> PathBuf {
        self.dir.path().join("store")
    }

    /// Write a two-page PDF named `name` and return its path
    fn pdf(&self, name: &str) -> PathBuf {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (0..2)
            .map(|_| {
                Object::Reference(doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                }))
            })
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => 2i64,
                "Kids" => kids,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let path = self.dir.path().join(name);
        doc.save(&path).expect("fixture PDF should be written");
        path
    }

    fn identity(path: &Path) -> DocumentIdentity {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        DocumentIdentity::new(name, std::fs::metadata(path).unwrap().len())
    }

    /// Save one opaque and one translucent stroke on page 1 for `path`
    fn annotate(&self, path: &Path) -> String {
        let mut annotations = PageAnnotations::new();
        annotations.insert(
            1,
            vec![
                Arc::new(
                    Stroke::new(
                        vec![Point::new(100.0, 50.0), Point::new(100.0, 150.0)],
                        Rgb::BLACK,
                        2.0,
                        1.0,
                    )
                    .unwrap(),
                ),
                Arc::new(
                    Stroke::new(
                        vec![Point::new(10.0, 10.0), Point::new(200.0, 10.0)],
                        Rgb::YELLOW,
                        20.0,
                        0.5,
                    )
                    .unwrap(),
                ),
            ],
        );

        let identity = Self::identity(path);
        let store = FsBlobStore::with_root(self.store_dir());
        let mut persistence = AnnotationPersistence::new(store, &identity, CodecConfig::default());
        persistence.save(&annotations).expect("save should succeed");
        storage_key(&identity)
    }

    fn run(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        cargo_bin_cmd!("pdf-drawer-cli")
            .arg("--store-dir")
            .arg(self.store_dir())
            .args(args)
            .assert()
    }

    fn run_json(&self, args: &[&str]) -> Value {
        let output = self.run(args).success().get_output().stdout.clone();
        serde_json::from_slice(&output).expect("stdout should contain valid json")
    }
}

fn arg(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

#[test]
fn list_reports_saved_documents() {
    let ws = Workspace::new();
    assert_eq!(ws.run_json(&["list"]), Value::Array(Vec::new()));

    let pdf = ws.pdf("notes.pdf");
    let key = ws.annotate(&pdf);

    let value = ws.run_json(&["list"]);
    let entries = value.as_array().expect("list prints an array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["key"], Value::String(key));
    assert_eq!(entries[0]["file_name"], "notes.pdf");
    assert_eq!(entries[0]["page_count"], 1);
    assert_eq!(entries[0]["stroke_count"], 2);
}

#[test]
fn dump_and_stats_describe_saved_annotations() {
    let ws = Workspace::new();
    let pdf = ws.pdf("notes.pdf");
    ws.annotate(&pdf);

    let dump = ws.run_json(&["dump", arg(&pdf)]);
    let strokes = dump["annotations"]["1"].as_array().expect("page 1 strokes");
    assert_eq!(strokes.len(), 2);
    assert_eq!(strokes[0]["color"], "#000000");
    assert_eq!(strokes[1]["lineWidth"], 20.0);

    let stats = ws.run_json(&["stats", arg(&pdf)]);
    assert!(stats["compressed_len"].as_u64().unwrap() > 0);
    assert!(stats["decompressed_len"].as_u64().is_some());
}

#[test]
fn stats_is_null_without_saved_data() {
    let ws = Workspace::new();
    let pdf = ws.pdf("blank.pdf");
    assert_eq!(ws.run_json(&["stats", arg(&pdf)]), Value::Null);
}

#[test]
fn clear_and_delete_remove_entries() {
    let ws = Workspace::new();
    let first = ws.pdf("first.pdf");
    let second = ws.pdf("second.pdf");
    ws.annotate(&first);
    let second_key = ws.annotate(&second);

    let cleared = ws.run_json(&["clear", arg(&first)]);
    assert_eq!(cleared["deleted"], true);
    let cleared = ws.run_json(&["clear", arg(&first)]);
    assert_eq!(cleared["deleted"], false);

    let deleted = ws.run_json(&["delete", &second_key]);
    assert_eq!(deleted["deleted"], true);
    assert_eq!(ws.run_json(&["list"]), Value::Array(Vec::new()));
}

#[test]
fn preview_writes_png_file() {
    let ws = Workspace::new();
    let pdf = ws.pdf("notes.pdf");
    let key = ws.annotate(&pdf);
    let output = ws.dir.path().join("out").join("preview.png");

    ws.run(&["preview", &key, "--width", "120", "--height", "90", "--output", arg(&output)])
        .success()
        .stdout(predicate::str::contains("preview.png"));

    let png = std::fs::read(&output).expect("preview should be written");
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn preview_fails_for_unknown_key() {
    let ws = Workspace::new();
    let output = ws.dir.path().join("preview.png");
    ws.run(&["preview", "pdf-annotations-none.pdf-1", "--output", arg(&output)])
        .failure()
        .stderr(predicate::str::contains("no saved entry"));
}

#[test]
fn export_writes_annotated_copy() {
    let ws = Workspace::new();
    let pdf = ws.pdf("report.pdf");
    ws.annotate(&pdf);

    let summary = ws.run_json(&["export", arg(&pdf)]);
    assert_eq!(summary["strokes_written"], 2);
    assert_eq!(summary["pages_written"], 1);

    let output = ws.dir.path().join("report-annotated.pdf");
    assert_eq!(summary["output"], output.display().to_string());

    let doc = Document::load(&output).expect("export should be a readable PDF");
    assert_eq!(doc.get_pages().len(), 2);
}

#[test]
fn export_fails_without_saved_annotations() {
    let ws = Workspace::new();
    let pdf = ws.pdf("blank.pdf");
    ws.run(&["export", arg(&pdf)])
        .failure()
        .stderr(predicate::str::contains("no saved annotations"));
}

#[test]
fn export_fails_for_invalid_pdf() {
    let ws = Workspace::new();
    let pdf = ws.pdf("report.pdf");
    ws.annotate(&pdf);

    // same name and size, different bytes
    let size = std::fs::metadata(&pdf).unwrap().len() as usize;
    std::fs::write(&pdf, vec![b'x'; size]).unwrap();

    ws.run(&["export", arg(&pdf)])
        .failure()
        .stderr(predicate::str::contains("failed to export PDF"))
        .stderr(predicate::str::contains("not a PDF"));
}

#[test]
fn commands_fail_for_missing_file() {
    let ws = Workspace::new();
    let missing = ws.dir.path().join("missing.pdf");
    ws.run(&["dump", arg(&missing)])
        .failure()
        .stderr(predicate::str::contains("file does not exist"));
}
