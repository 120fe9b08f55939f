use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};
use vinotheca_store::catalog_lock_path;

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "vinotheca-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Run `vinotheca` against a catalog and config inside `dir`.
fn run_vinotheca<I, S>(dir: &Path, args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_vinotheca");
    Command::new(bin)
        .arg("--catalog")
        .arg(dir.join("catalog.jsonl"))
        .arg("--config")
        .arg(dir.join("config.toml"))
        .args(args)
        .env_remove("VINOTHECA_LOG")
        .output()
        .expect("vinotheca command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn assert_failure(output: &Output) {
    if output.status.success() {
        panic!(
            "command unexpectedly succeeded\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "expected valid JSON stdout, got error: {e}\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn read_catalog_lines(dir: &Path) -> Vec<Value> {
    fs::read_to_string(dir.join("catalog.jsonl"))
        .expect("catalog should exist")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("catalog line should be json"))
        .collect()
}

fn seed_geography(dir: &Path) {
    for args in [
        vec!["place", "add-country", "France", "--id", "C1", "--code", "FR"],
        vec!["place", "add-region", "Burgundy", "--country", "C1", "--id", "R1"],
        vec!["place", "add-appellation", "Chablis", "--region", "R1", "--id", "AP1"],
        vec!["grape", "add", "Chardonnay", "--id", "G1", "--color", "white"],
        vec!["grape", "add", "Pinot Noir", "--id", "G2", "--color", "red"],
    ] {
        assert_success(&run_vinotheca(dir, args));
    }
}

#[test]
fn definition_add_stores_most_specific_owner_and_shows_full_chain() {
    let tmp = TempDirGuard::new("definition-add");
    seed_geography(tmp.path());

    let output = run_vinotheca(
        tmp.path(),
        [
            "definition",
            "add",
            "Chablis Village",
            "--id",
            "wd-1",
            "--country",
            "C1",
            "--appellation",
            "AP1",
            "--json",
        ],
    );
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["action"], "definition.add");
    assert_eq!(payload["definition"]["scope"]["level"], "appellation");
    assert_eq!(payload["definition"]["scope"]["id"], "AP1");
    assert_eq!(payload["definition"]["region_id"], "R1");
    assert_eq!(payload["definition"]["country_id"], "C1");
    assert_eq!(payload["definition"]["version"], 1);

    let stored = read_catalog_lines(tmp.path())
        .into_iter()
        .find(|line| line["table"] == "wine_definition")
        .expect("definition line should be persisted");
    assert_eq!(stored["appellation_id"], "AP1");
    assert!(stored["country_id"].is_null());
    assert!(stored["region_id"].is_null());

    let shown = run_vinotheca(tmp.path(), ["definition", "show", "wd-1"]);
    assert_success(&shown);
    let text = stdout_text(&shown);
    assert!(text.contains("Owner: appellation:AP1"));
    assert!(text.contains("Region: R1"));
}

#[test]
fn definition_add_rejects_unknown_owner() {
    let tmp = TempDirGuard::new("definition-missing");
    seed_geography(tmp.path());

    let output = run_vinotheca(
        tmp.path(),
        ["definition", "add", "Ghost", "--region", "R404"],
    );
    assert_failure(&output);
    assert!(stderr_text(&output).contains("error: region_id references missing wine_regions row: R404"));
}

#[test]
fn rejected_rule_update_leaves_catalog_untouched() {
    let tmp = TempDirGuard::new("rule-update");
    seed_geography(tmp.path());

    assert_success(&run_vinotheca(
        tmp.path(),
        [
            "rule", "add", "--appellation", "AP1", "--grape", "G1", "--kind", "allowed", "--min",
            "10", "--max", "60", "--id", "ga-1",
        ],
    ));
    let before = fs::read_to_string(tmp.path().join("catalog.jsonl")).expect("catalog should exist");

    let output = run_vinotheca(tmp.path(), ["rule", "update", "ga-1", "--kind", "forbidden"]);
    assert_failure(&output);
    assert!(stderr_text(&output).contains("error: forbidden rules may not define percentage ranges"));
    assert_eq!(
        fs::read_to_string(tmp.path().join("catalog.jsonl")).expect("catalog should exist"),
        before
    );

    let cleared = run_vinotheca(
        tmp.path(),
        [
            "rule",
            "update",
            "ga-1",
            "--kind",
            "forbidden",
            "--clear-min",
            "--clear-max",
            "--json",
        ],
    );
    assert_success(&cleared);
    let payload = parse_json_stdout(&cleared);
    assert_eq!(payload["rule"]["rule"], "forbidden");
    assert!(payload["rule"]["min_pct"].is_null());
}

#[test]
fn required_rule_without_minimum_is_rejected() {
    let tmp = TempDirGuard::new("rule-required");
    seed_geography(tmp.path());

    let output = run_vinotheca(
        tmp.path(),
        ["rule", "add", "--appellation", "AP1", "--grape", "G1", "--kind", "required"],
    );
    assert_failure(&output);
    assert!(stderr_text(&output).contains("required rules must include a minimum percentage"));
}

#[test]
fn definition_check_reports_conflicting_rules_under_strict_policy() {
    let tmp = TempDirGuard::new("definition-check");
    seed_geography(tmp.path());
    assert_success(&run_vinotheca(
        tmp.path(),
        ["definition", "add", "Chablis", "--id", "wd-1", "--appellation", "AP1"],
    ));
    for (id, kind) in [("ga-1", "allowed"), ("ga-2", "forbidden")] {
        assert_success(&run_vinotheca(
            tmp.path(),
            [
                "rule", "add", "--appellation", "AP1", "--grape", "G2", "--kind", kind, "--id", id,
            ],
        ));
    }

    let permissive = run_vinotheca(tmp.path(), ["definition", "check", "wd-1"]);
    assert_success(&permissive);
    assert!(stdout_text(&permissive).contains("Result: accepted"));

    let strict = run_vinotheca(
        tmp.path(),
        ["definition", "check", "wd-1", "--policy", "reject-conflicting", "--json"],
    );
    assert_failure(&strict);
    let report = parse_json_stdout(&strict);
    assert_eq!(report["checkKind"], "vinotheca.wine_definition.check.v1");
    assert_eq!(report["result"], "rejected");
    assert_eq!(
        report["failureClasses"],
        serde_json::json!(["grape_rule_set.grape.conflicting_kinds"])
    );
}

#[test]
fn config_policy_applies_to_rule_writes() {
    let tmp = TempDirGuard::new("config-policy");
    fs::write(
        tmp.path().join("config.toml"),
        "[rules]\nduplicate_grape_policy = \"reject_duplicates\"\n",
    )
    .expect("config should be written");
    seed_geography(tmp.path());

    assert_success(&run_vinotheca(
        tmp.path(),
        ["rule", "add", "--appellation", "AP1", "--grape", "G1", "--kind", "allowed"],
    ));
    let duplicate = run_vinotheca(
        tmp.path(),
        ["rule", "add", "--appellation", "AP1", "--grape", "G1", "--kind", "allowed"],
    );
    assert_failure(&duplicate);
    assert!(stderr_text(&duplicate).contains("duplicate rule for grape G1 in AP1"));

    let overridden = run_vinotheca(
        tmp.path(),
        [
            "rule",
            "add",
            "--appellation",
            "AP1",
            "--grape",
            "G1",
            "--kind",
            "allowed",
            "--policy",
            "permissive",
        ],
    );
    assert_success(&overridden);

    let listed = run_vinotheca(tmp.path(), ["rule", "list", "--grape", "G1", "--json"]);
    assert_success(&listed);
    assert_eq!(parse_json_stdout(&listed)["count"], 2);
}

#[test]
fn definition_delete_removes_composition_rows() {
    let tmp = TempDirGuard::new("definition-delete");
    seed_geography(tmp.path());
    assert_success(&run_vinotheca(
        tmp.path(),
        ["definition", "add", "Bourgogne Rouge", "--id", "wd-1", "--region", "R1"],
    ));
    assert_success(&run_vinotheca(
        tmp.path(),
        [
            "composition", "add", "--definition", "wd-1", "--grape", "G2", "--min", "85",
            "--required", "--id", "dg-1",
        ],
    ));

    let listed = run_vinotheca(tmp.path(), ["composition", "list", "--definition", "wd-1", "--json"]);
    assert_success(&listed);
    assert_eq!(parse_json_stdout(&listed)["count"], 1);

    assert_success(&run_vinotheca(tmp.path(), ["definition", "delete", "wd-1"]));
    let lines = read_catalog_lines(tmp.path());
    assert!(lines.iter().all(|line| line["table"] != "definition_grape"));
    assert!(lines.iter().all(|line| line["table"] != "wine_definition"));
}

#[test]
fn ownership_normalize_keeps_only_most_specific_owner() {
    let tmp = TempDirGuard::new("ownership");
    let output = run_vinotheca(
        tmp.path(),
        ["ownership", "normalize", "--country", "C1", "--region", "R1", "--json"],
    );
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["scope"]["level"], "region");
    assert_eq!(payload["stored"]["region_id"], "R1");
    assert!(payload["stored"]["country_id"].is_null());
    assert!(!tmp.path().join("catalog.jsonl").exists());
}

#[test]
fn held_lock_fails_fast() {
    let tmp = TempDirGuard::new("lock-busy");
    let lock = catalog_lock_path(&tmp.path().join("catalog.jsonl"));
    fs::write(&lock, "held").expect("lock should be written");

    let output = run_vinotheca(tmp.path(), ["place", "add-country", "Italy"]);
    assert_failure(&output);
    assert!(stderr_text(&output).contains("catalog lock busy"));
    assert!(!tmp.path().join("catalog.jsonl").exists());
}
