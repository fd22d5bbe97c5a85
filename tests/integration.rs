use std::path::Path;
use std::process::{Command, Output};

fn linkedsrc_cmd(fixture: &str) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_linkedsrc"));
    cmd.current_dir(Path::new("tests/fixtures").join(fixture));
    cmd.env_remove("LINKEDSRC_LOG");
    cmd
}

fn run(fixture: &str, args: &[&str]) -> Output {
    linkedsrc_cmd(fixture).args(args).output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ── check ─────────────────────────────────────────────────────────────

#[test]
fn check_clean_site_passes() {
    let out = run("site", &["check"]);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("All 2 documents clean"), "stdout: {}", stdout(&out));
}

#[test]
fn check_reports_dead_links_with_exit_one() {
    let out = run("dead", &["check"]);
    assert_eq!(out.status.code(), Some(1), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("UNRESOLVED  index.html  `ghost`"), "stdout: {text}");
    assert!(text.contains("MALFORMED   index.html  `#`"), "stdout: {text}");
    assert!(text.contains("1 unresolved, 1 malformed"), "stdout: {text}");
}

#[test]
fn check_reports_duplicates_with_exit_two() {
    // The fixture's config asks for `reject`, but check still reports everything.
    let out = run("dupes", &["check"]);
    assert_eq!(out.status.code(), Some(2), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("DUPLICATE   index.html  `twice`"));
}

#[test]
fn check_json_lists_anomalies_by_kind() {
    let out = run("dead", &["check", "--format", "json"]);
    assert_eq!(out.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let audits = json.as_array().unwrap();
    assert_eq!(audits.len(), 1);
    let kinds: Vec<&str> = audits[0]["anomalies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["kind"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"unresolved_identifier"));
    assert!(kinds.contains(&"malformed_link_target"));
}

#[test]
fn check_missing_root_fails() {
    let out = run("site", &["check", "no-such-dir"]);
    assert_eq!(out.status.code(), Some(3));
    assert!(stderr(&out).contains("File Not Found"));
}

// ── index ─────────────────────────────────────────────────────────────

#[test]
fn index_lists_definitions_and_references() {
    let out = run("site", &["index", "src/page.html"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("definitions (2):"), "stdout: {text}");
    assert!(text.contains("references (2):"), "stdout: {text}");
    assert!(text.contains("anomalies (1):"), "stdout: {text}");
}

#[test]
fn index_json_has_sorted_tables() {
    let out = run("site", &["index", "src/page.html", "--json"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["document"], "src/page.html");
    let names: Vec<&str> = json["definitions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["identifier"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["helper", "main"]);
    // `other.html#shared` names another document and is only recorded.
    assert_eq!(json["anomalies"][0]["kind"], "foreign_link_target");
}

#[test]
fn index_under_reject_policy_fails_with_diagnostic() {
    let out = run("dupes", &["index", "index.html"]);
    assert_eq!(out.status.code(), Some(3));
    assert!(stderr(&out).contains("Duplicate Identifier"), "stderr: {}", stderr(&out));
}

#[test]
fn index_missing_file_fails() {
    let out = run("site", &["index", "src/missing.html"]);
    assert_eq!(out.status.code(), Some(3));
    assert!(stderr(&out).contains("File Not Found"));
}

#[test]
fn index_rejects_non_html() {
    let out = run("site", &["index", "framed.toml"]);
    assert_eq!(out.status.code(), Some(3));
    assert!(stderr(&out).contains("Unsupported Document"));
}

// ── replay ────────────────────────────────────────────────────────────

#[test]
fn replay_framed_race_settles_on_last_click() {
    let out = run("site", &["replay", "src/page.html", "framed.toml", "--json"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();

    let label = json["exclusive"]["label"].as_str().unwrap();
    assert!(label.ends_with("<span> #main"), "exclusive: {label}");
    assert_eq!(json["highlighted"].as_array().unwrap().len(), 1);
    assert!(json["pending"].as_array().unwrap().is_empty());
    assert!(json["export"].is_null());

    let events: Vec<&str> = json["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e.as_str().unwrap())
        .collect();
    assert!(events[0].starts_with("load: navigating"));
    assert_eq!(events.iter().filter(|e| e.ends_with("superseded")).count(), 2);
}

#[test]
fn replay_direct_click_sets_fragment_and_clears_hover() {
    let out = run("site", &["replay", "src/page.html", "direct.toml"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("highlighted: (none)"), "stdout: {text}");
    assert!(text.contains("location:    src/page.html#helper"), "stdout: {text}");
    assert!(text.contains("export:      <iframe"), "stdout: {text}");
}

#[test]
fn replay_unknown_selector_fails() {
    let out = run("site", &["replay", "src/page.html", "bad-selector.toml"]);
    assert_eq!(out.status.code(), Some(3));
    assert!(stderr(&out).contains("Unknown Selector"));
}
