//! CLI integration tests for the demo and bench modes.

use std::process::Command;

fn summary_value<'a>(stdout: &'a str, key: &str) -> &'a str {
    let prefix = format!("{key}=");
    stdout
        .lines()
        .find_map(|line| line.strip_prefix(prefix.as_str()))
        .unwrap_or_else(|| panic!("{key} line missing"))
        .trim()
}

#[test]
fn demo_cli_delivers_without_duplicate_claims() {
    let bin = env!("CARGO_BIN_EXE_agv_line");
    // Run the demo binary with default settings.
    let output = Command::new(bin)
        .output()
        .expect("failed to run demo binary");

    assert!(
        output.status.success(),
        "demo exited with non-zero status: {:?}",
        output.status
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("DEMO SUMMARY"),
        "demo summary missing from output"
    );
    assert!(stdout.contains("ROUND STORAGE"));
    assert!(stdout.contains("Picking point is at (3, 2)"));

    assert_eq!(summary_value(&stdout, "duplicate_claims"), "false");
    // Every piece is either in a storage, lost with a vehicle, or still on the line.
    assert_eq!(summary_value(&stdout, "conserved"), "true");
    let delivered: usize = summary_value(&stdout, "delivered")
        .parse()
        .expect("delivered is a number");
    assert!(delivered > 0);
}

#[test]
fn bench_cli_prints_one_csv_row() {
    let bin = env!("CARGO_BIN_EXE_agv_line");
    let output = Command::new(bin)
        .args(["bench", "3", "30", "100000", "0", "validate"])
        .output()
        .expect("failed to run bench");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("vehicles,pieces,max_battery,policy"));
    let row: Vec<_> = lines[1].split(',').collect();
    assert_eq!(&row[..4], &["3", "30", "100000", "until_closed"]);
    // delivered, lost, leftover
    assert_eq!(&row[6..9], &["30", "0", "0"]);
    assert_eq!(row[12], "false");
}

#[test]
fn unknown_command_exits_with_usage() {
    let bin = env!("CARGO_BIN_EXE_agv_line");
    let output = Command::new(bin)
        .arg("fly")
        .output()
        .expect("failed to run binary");
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Usage:"));
}
