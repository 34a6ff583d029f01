// ABOUTME: Integration tests for the socd-catalog CLI binary.
// ABOUTME: Tests feed and cheapest subcommands against a mocked feed server and settings files.

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::cargo::CommandCargoExt;
use httpmock::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

const FEED: &str = r#"<rss><channel>
    <item><g:id>1</g:id><g:title>Panela Inox</g:title><g:price>89.90 BRL</g:price></item>
    <item><g:id>2</g:id><g:title>Panela de Barro</g:title><g:price>45.00 BRL</g:price></item>
</channel></rss>"#;

fn catalog_cmd() -> Command {
    Command::cargo_bin("socd-catalog").unwrap()
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn cheapest_from_url() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/feed.xml");
        then.status(200).body(FEED);
    });

    catalog_cmd()
        .arg("--url")
        .arg(server.url("/feed.xml"))
        .arg("--compact")
        .arg("cheapest")
        .arg("panela")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""title":"Panela de Barro""#))
        .stdout(predicate::str::contains(r#""totalMatches":2"#));

    mock.assert();
}

#[test]
fn feed_from_settings_file() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/feed.xml");
        then.status(200).body(FEED);
    });

    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("settings.json");
    fs::write(
        &settings_path,
        format!(r#"{{"xmlFeedUrls": ["{}"], "enableXmlCache": false}}"#, server.url("/feed.xml")),
    )
    .unwrap();

    let json = stdout_json(catalog_cmd().arg("--settings").arg(&settings_path).arg("feed"));
    assert_eq!(json["rss"]["channel"]["item"][1]["g:id"], 2);
}

#[test]
fn no_sources_is_an_error() {
    catalog_cmd()
        .arg("feed")
        .assert()
        .failure()
        .stdout(predicate::str::contains("no feed source URLs configured"));
}

#[test]
fn unreadable_settings_fall_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let json = stdout_json(
        catalog_cmd()
            .arg("--settings")
            .arg(temp_dir.path().join("missing.json"))
            .arg("feed"),
    );
    assert_eq!(json["status"], 400);
}

#[test]
fn not_found_reports_query() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/feed.xml");
        then.status(200).body(FEED);
    });

    let json = stdout_json(
        catalog_cmd()
            .arg("--url")
            .arg(server.url("/feed.xml"))
            .arg("cheapest")
            .arg("chaleira"),
    );
    assert_eq!(json["status"], 404);
    assert_eq!(json["query"], "chaleira");
}

#[test]
fn all_sources_down() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/down.xml");
        then.status(503);
    });

    let json = stdout_json(
        catalog_cmd()
            .arg("--retries")
            .arg("0")
            .arg("--url")
            .arg(server.url("/down.xml"))
            .arg("feed"),
    );
    assert_eq!(json["status"], 502);
    assert_eq!(json["sources"].as_array().map(|a| a.len()), Some(1));
}

#[test]
fn settings_with_odd_values_keep_their_urls() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/feed.xml");
        then.status(200).body(FEED);
    });

    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("settings.json");
    fs::write(
        &settings_path,
        format!(
            r#"{{"xmlFeedUrls": ["{}"], "xmlCacheSeconds": 1.5, "enableXmlCache": null}}"#,
            server.url("/feed.xml")
        ),
    )
    .unwrap();

    let json = stdout_json(
        catalog_cmd()
            .arg("--settings")
            .arg(&settings_path)
            .arg("cheapest")
            .arg("barro"),
    );
    assert_eq!(json["cheapest"]["id"], "2");
}
