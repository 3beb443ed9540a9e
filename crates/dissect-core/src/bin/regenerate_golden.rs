use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use dissect_core::{Selection, analyze_file};

fn main() -> ExitCode {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

/// Rewrites `tests/golden/*/expected_report.json` from each `input.bin`.
/// Run from the workspace root.
fn run() -> Result<(), String> {
    let root = PathBuf::from("tests").join("golden");
    let entries =
        fs::read_dir(&root).map_err(|err| format!("failed to read {}: {}", root.display(), err))?;

    let mut cases = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| format!("failed to read entry: {}", err))?;
        let path = entry.path();
        if path.is_dir() && path.join("input.bin").is_file() {
            cases.push(path);
        }
    }
    cases.sort();

    for case in &cases {
        regenerate_one(&case.join("input.bin"), &case.join("expected_report.json"))?;
    }
    println!("regenerated {} golden reports", cases.len());
    Ok(())
}

fn regenerate_one(input: &Path, output: &Path) -> Result<(), String> {
    let report = analyze_file(input, &Selection::All)
        .map_err(|err| format!("analysis failed for {}: {}", input.display(), err))?;
    let json = serde_json::to_string(&report)
        .map_err(|err| format!("JSON serialization failed: {}", err))?;
    fs::write(output, json)
        .map_err(|err| format!("failed to write {}: {}", output.display(), err))?;
    Ok(())
}
