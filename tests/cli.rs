use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_quantum_linapx"))
        .args(args)
        .output()
        .expect("failed to run quantum_linapx")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn report_lines(stdout: &str) -> Vec<&str> {
    stdout.lines().filter(|line| line.starts_with("0x")).collect()
}

fn final_count(stdout: &str, prefix: &str) -> usize {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix(prefix))
        .expect("missing final count")
        .trim()
        .parse()
        .unwrap()
}

const TRIVIAL: &str = "Number of times trivial solution measured is ";
const BAD: &str = "Number of times bad linear approximation measured is ";

#[test]
fn test_missing_argument_prints_usage() {
    let output = run(&[]);
    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("Replace <times> by a positive integer"));
    assert!(report_lines(&stdout).is_empty());
    assert!(!stdout.contains(TRIVIAL));
}

#[test]
fn test_too_many_arguments_prints_usage() {
    let output = run(&["3", "4"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Usage:"));
    assert!(report_lines(&stdout(&output)).is_empty());
}

#[test]
fn test_zero_trials() {
    let output = run(&["0"]);
    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(report_lines(&stdout).is_empty());
    assert_eq!(final_count(&stdout, TRIVIAL), 0);
    assert_eq!(final_count(&stdout, BAD), 0);
}

#[test]
fn test_single_trial() {
    let output = run(&["1"]);
    assert!(output.status.success());
    let stdout = stdout(&output);
    let lines = report_lines(&stdout);
    assert_eq!(lines.len(), 1);
    let fields: Vec<&str> = lines[0].split('\t').collect();
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[0].len(), 4);
    assert!(u32::from_str_radix(&fields[0][2..], 16).is_ok());
    assert!(fields[1].parse::<f64>().is_ok());
    assert!(fields[2].parse::<u32>().unwrap() <= 16);
    assert!(final_count(&stdout, TRIVIAL) <= 1);
    assert!(final_count(&stdout, BAD) <= 1);
}

#[test]
fn test_trivial_count_matches_report() {
    let output = run(&["200", "--seed", "17"]);
    assert!(output.status.success());
    let stdout = stdout(&output);
    let lines = report_lines(&stdout);
    assert_eq!(lines.len(), 200);
    let trivial = lines.iter().filter(|line| line.starts_with("0x00\t")).count();
    assert_eq!(final_count(&stdout, TRIVIAL), trivial);
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let first = stdout(&run(&["30", "--seed", "99"]));
    let second = stdout(&run(&["30", "--seed", "99"]));
    assert_eq!(first, second);
}

#[test]
fn test_summary() {
    let output = run(&["50", "--seed", "3", "--summary"]);
    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("Total variation distance over 50 trials"));
}
