use std::path::{Path, PathBuf};

use assert_cmd::Command;

fn data(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../catalog/tests/data").join(name)
}

fn catalog() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("catalog"));
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

fn stdout(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().clone();
    String::from_utf8(output.stdout).expect("stdout is not UTF-8")
}

#[test]
fn query_prints_numbered_listing() {
    let out = stdout(
        catalog()
            .arg("query")
            .arg(data("books.xml"))
            .args(["--where", "author=corets", "--where", "yearFrom=2001"]),
    );
    assert!(out.starts_with("Book No.1\nAuthor: Corets, Eva\nTitle: Oberon's Legacy\n"));
    assert!(out.contains("Book No.2\nAuthor: Corets, Eva\nTitle: The Sundered Grail\n"));
    assert!(!out.contains("Book No.3"));
}

#[test]
fn every_strategy_prints_the_same_listing() {
    let run = |strategy: &str| {
        stdout(
            catalog()
                .arg("query")
                .arg(data("books.xml"))
                .args(["--strategy", strategy, "--where", "genre=computer", "--suggestions"]),
        )
    };
    let declarative = run("declarative");
    assert_eq!(run("tree"), declarative);
    assert_eq!(run("streaming"), declarative);
    assert!(declarative.contains("Author (3)\n  Gambardella, Matthew\n  O'Brien, Tim\n  Galos, Mike\n"));
}

#[test]
fn empty_result_prints_placeholder() {
    let out = stdout(
        catalog()
            .arg("query")
            .arg(data("books.xml"))
            .args(["--where", "yearFrom=abc"]),
    );
    assert_eq!(out, "No records found\n");
}

#[test]
fn json_output() {
    let out = stdout(
        catalog()
            .arg("query")
            .arg(data("discs.xml"))
            .args(["--preset", "discs", "--format", "json", "--where", "priceTo=10"]),
    );
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["matches"], 2);
    assert_eq!(json["distinct"][1]["field"], "artist");
    assert_eq!(
        json["distinct"][1]["values"],
        serde_json::json!(["Bonnie Tyler", "Dolly Parton"])
    );
}

#[test]
fn custom_schema_file() {
    let dir = tempfile::tempdir().unwrap();
    let schema = dir.path().join("schema.toml");
    std::fs::write(
        &schema,
        "record = \"disc\"\n\n[[fields]]\nname = \"artist\"\n\n[[fields]]\nname = \"year\"\nkind = \"number\"\n",
    )
    .unwrap();

    let out = stdout(
        catalog()
            .arg("query")
            .arg(data("discs.xml"))
            .arg("--schema")
            .arg(&schema)
            .args(["--where", "yearTo=1982"]),
    );
    assert_eq!(
        out,
        "Disc No.1\nArtist: Dolly Parton\nYear: 1982\n\nDisc No.2\nArtist: Bob Dylan\nYear: 1975\n\n"
    );
}

#[test]
fn unknown_filter_key_fails() {
    let output = catalog()
        .arg("query")
        .arg(data("books.xml"))
        .args(["--where", "isbn=1"])
        .assert()
        .failure()
        .get_output()
        .clone();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("isbn"), "{}", stderr);
}

#[test]
fn malformed_assignment_is_a_usage_error() {
    catalog()
        .arg("query")
        .arg(data("books.xml"))
        .args(["--where", "author"])
        .assert()
        .code(2);
}

#[test]
fn missing_catalog_fails() {
    let output = catalog()
        .arg("query")
        .arg(data("nope.xml"))
        .assert()
        .failure()
        .get_output()
        .clone();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load catalog"), "{}", stderr);
}

#[test]
fn info_summarizes_catalog() {
    let out = stdout(catalog().arg("info").arg(data("books.xml")).args(["--format", "json"]));
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["records"], 12);
    assert_eq!(json["fields"][0]["name"], "author");
    assert_eq!(json["fields"][5]["element"], "publishYear");
    assert_eq!(json["fields"][5]["filter_keys"], serde_json::json!(["yearFrom", "yearTo"]));

    let text = stdout(catalog().arg("info").arg(data("books.xml")));
    assert!(text.contains("Catalog Summary"));
    assert!(text.contains("publishYear"));
}

#[test]
fn compare_reports_agreement() {
    let out = stdout(
        catalog()
            .arg("compare")
            .arg(data("discs.xml"))
            .args(["--preset", "discs", "--where", "genre=pop"]),
    );
    assert!(out.contains("All strategies agree"));
    assert!(out.contains("streaming"));
}

#[test]
fn compare_fails_when_nothing_loads() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.xml");
    std::fs::write(&broken, "<catalog><book>").unwrap();
    catalog().arg("compare").arg(&broken).assert().failure();
}

#[test]
fn html_export_writes_page() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("discs.html");

    let out = stdout(
        catalog()
            .arg("html")
            .arg(data("discs.xml"))
            .args(["--preset", "discs", "-o"])
            .arg(&output),
    );
    assert!(out.contains("HTML exported"));

    let html = std::fs::read_to_string(&output).unwrap();
    assert!(html.contains("5 Discs"));
    assert!(html.contains("Live at the MGM Grand &lt;1997&gt;"));
    assert!(html.contains("RCA compilation &amp; reissue."));
}
