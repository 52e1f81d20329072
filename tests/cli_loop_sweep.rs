use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "loopsim-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(dir: &PathBuf, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

#[test]
fn csv_sweep_prints_header_and_rows() {
    let output = Command::new(env!("CARGO_BIN_EXE_loop_sweep"))
        .args(["--runs", "20", "--csv"])
        .output()
        .expect("run loop_sweep");
    assert!(
        output.status.success(),
        "loop_sweep failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let header = stdout
        .lines()
        .find(|l| l.starts_with("Class,"))
        .expect("csv header");
    assert!(header.contains("FP%"));
    assert!(header.contains("AvgTime"));
    assert_eq!(
        stdout.lines().filter(|l| l.starts_with("MinSketch,")).count(),
        1,
        "default sweep has a single min-sketch combination"
    );
}

#[test]
fn table_sweep_prints_labeled_blocks() {
    let output = Command::new(env!("CARGO_BIN_EXE_loop_sweep"))
        .args(["--runs", "10"])
        .output()
        .expect("run loop_sweep");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Class: MinSketch"));
    assert!(stdout.contains("Runs: 20")); // 10 loops + 10 length-matched paths
    assert!(stdout.contains("FP%:"));
}

#[test]
fn config_file_selects_variants_and_parameters() {
    let dir = unique_temp_dir("config");
    let config = write_file(
        &dir,
        "sweep.json",
        r#"
{
    "runs": 15,
    "entry_hops": [2],
    "cycle_lengths": [3],
    "detections": [1],
    "min_sketch": { "reset_factors": [2], "chunk_hash": [[1, 1]], "id_bits": [32] },
    "prime_product": true
}
        "#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_loop_sweep"))
        .args(["--config", config.to_str().unwrap(), "--csv"])
        .output()
        .expect("run loop_sweep");
    assert!(
        output.status.success(),
        "loop_sweep failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().any(|l| l.starts_with("MinSketch,")));
    let prime_row = stdout
        .lines()
        .find(|l| l.starts_with("PrimeProduct,"))
        .expect("prime product row");
    // Class,Mem,Runs,Th,FP%,...: exact baseline reports zero false positives.
    let fields: Vec<&str> = prime_row.split(',').collect();
    assert_eq!(fields[2], "30"); // 15 loops + 15 paths
    assert_eq!(fields[4], "0.0"); // FP%

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn topology_trace_file_feeds_external_loops() {
    let dir = unique_temp_dir("traces");
    let config = write_file(
        &dir,
        "sweep.json",
        r#"
{
    "runs": 5,
    "gen_loops": false,
    "gen_paths": false,
    "min_sketch": {}
}
        "#,
    );
    let traces = write_file(
        &dir,
        "traces.json",
        r#"{ "loops": [[3, 6], [2, 4]], "paths": [9] }"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_loop_sweep"))
        .args([
            "--config",
            config.to_str().unwrap(),
            "--traces",
            traces.to_str().unwrap(),
            "--csv",
        ])
        .output()
        .expect("run loop_sweep");
    assert!(
        output.status.success(),
        "loop_sweep failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let row = stdout
        .lines()
        .find(|l| l.starts_with("MinSketch,"))
        .expect("min-sketch row");
    let fields: Vec<&str> = row.split(',').collect();
    assert_eq!(fields[6], "10"); // 5 loops + 5 paths from the trace file

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn invalid_config_is_a_hard_failure() {
    let dir = unique_temp_dir("bad-config");
    let config = write_file(
        &dir,
        "sweep.json",
        r#"{ "min_sketch": { "reset_factors": [1] } }"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_loop_sweep"))
        .args(["--config", config.to_str().unwrap(), "--runs", "1"])
        .output()
        .expect("run loop_sweep");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("reset factor"), "stderr: {stderr}");

    let _ = fs::remove_dir_all(&dir);
}
