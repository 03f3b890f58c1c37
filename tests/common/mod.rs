use std::path::Path;
use std::process::{Command, Output};

pub fn run_vmemh(args: &[String]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vmemh"))
        .args(args)
        .env_remove("VMEMH_CONFIG")
        .env_remove("VMEMH_WIDTH")
        .env_remove("VMEMH_STEP")
        .env_remove("VMEMH_BACKDOOR")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

pub fn assert_success(output: &Output) {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("vmemh failed: {stderr}");
    }
}

pub fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

pub fn read_nonempty_lines(path: &Path) -> Vec<String> {
    let text = std::fs::read_to_string(path).unwrap();
    text.lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}
