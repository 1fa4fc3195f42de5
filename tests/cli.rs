use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn bin_path() -> String {
    std::env::var("CARGO_BIN_EXE_docshell").expect("CARGO_BIN_EXE_docshell is set by cargo test")
}

fn run(args: &[&Path]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .expect("run docshell")
}

fn fixture() -> (TempDir, PathBuf) {
    let tmp = tempfile::tempdir().expect("create tempdir");
    let entry = tmp.path().join("guide.md");
    fs::write(
        &entry,
        "# Guide\n\n## Install {#install}\n\n```sh\ncargo install docshell\n```\n\n### Linux\n\n## Usage\n",
    )
    .expect("write guide");
    fs::write(tmp.path().join("faq.md"), "# FAQ\n").expect("write faq");
    (tmp, entry)
}

#[test]
fn test_render_prints_enhanced_page() {
    let (_tmp, entry) = fixture();
    let output = run(&[Path::new("render"), &entry]);
    assert!(output.status.success(), "render failed: {output:?}");

    let html = String::from_utf8_lossy(&output.stdout);
    assert!(html.starts_with("<!DOCTYPE html>"), "{html}");
    assert!(html.contains("<title>Guide</title>"), "{html}");
    assert!(html.contains("<h2 id=\"install\">Install</h2>"), "{html}");
    assert!(html.contains("<a class=\"toc-link\" href=\"#install\">Install</a>"), "{html}");
    assert!(html.contains("class=\"copy-button\""), "{html}");
    assert!(html.contains("class=\"skip-link\""), "{html}");
    assert!(html.contains("href=\"faq.md\""), "sibling page missing from nav\n{html}");
}

#[test]
fn test_render_writes_output_file() {
    let (tmp, entry) = fixture();
    let out = tmp.path().join("guide.html");
    let output = run(&[Path::new("render"), &entry, Path::new("--output"), &out]);
    assert!(output.status.success(), "render failed: {output:?}");
    assert!(output.stdout.is_empty());

    let html = fs::read_to_string(&out).expect("read rendered page");
    assert!(html.contains("id=\"main-content\""));
}

#[test]
fn test_toc_prints_nested_json() {
    let (_tmp, entry) = fixture();
    let output = run(&[Path::new("toc"), &entry]);
    assert!(output.status.success(), "toc failed: {output:?}");

    let tree: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("toc output is JSON");
    let roots = tree.as_array().expect("toc is an array");
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0]["label"], "Guide");
    let sections = roots[0]["children"].as_array().expect("children array");
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0]["anchor_id"], "install");
    assert_eq!(sections[0]["children"][0]["label"], "Linux");
}

#[test]
fn test_config_overrides_article_class() {
    let (tmp, entry) = fixture();
    let config = tmp.path().join("docshell.json");
    fs::write(&config, r#"{ "article_class": "post" }"#).expect("write config");

    let output = run(&[Path::new("render"), &entry, Path::new("--config"), &config]);
    assert!(output.status.success(), "render failed: {output:?}");
    let html = String::from_utf8_lossy(&output.stdout);
    assert!(html.contains("<article class=\"post\">"), "{html}");
}

#[test]
fn test_bad_config_is_reported() {
    let (tmp, entry) = fixture();
    let config = tmp.path().join("broken.json");
    fs::write(&config, "{ not json").expect("write config");

    let output = run(&[Path::new("render"), &entry, Path::new("--config"), &config]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("Error: "));
}

#[test]
fn test_non_markdown_extension_rejected() {
    let tmp = tempfile::tempdir().expect("create tempdir");
    let file = tmp.path().join("notes.txt");
    fs::write(&file, "# Notes\n").expect("write notes");

    let output = run(&[Path::new("render"), &file]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("'txt' is not a recognized markdown extension"),
        "{stderr}"
    );
}

#[test]
fn test_missing_file_reported() {
    let tmp = tempfile::tempdir().expect("create tempdir");
    let output = run(&[Path::new("toc"), &tmp.path().join("absent.md")]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("file not found"));
}
