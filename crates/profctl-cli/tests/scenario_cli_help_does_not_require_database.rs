use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn help_text_lists_all_subcommands() {
    Command::cargo_bin("profctl")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("submit"))
        .stdout(contains("heartbeat"))
        .stdout(contains("complete"))
        .stdout(contains("hosts"));
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    Command::cargo_bin("profctl").unwrap().assert().failure();
}
