use std::process::Command;

use tempfile::TempDir;

pub fn base_cmd(data_dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_healzy"));
    cmd.env("DOTENV_PATH", data_dir.path().join("missing.env"))
        .env_remove("HEALZY_DATA_DIR")
        .env("RUST_LOG", "warn")
        .arg("--data-dir")
        .arg(data_dir.path())
        .arg("--bcrypt-cost")
        .arg("4");
    cmd
}

pub fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().expect("run healzy");
    assert!(output.status.success(), "{:?}", output);
    String::from_utf8(output.stdout).expect("utf8 stdout")
}
