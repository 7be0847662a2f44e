use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("circle")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("feed"))
        .stdout(predicate::str::contains("profile"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_feed_help_lists_sort_flag() {
    cargo_bin_cmd!("circle")
        .args(["feed", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--sort"))
        .stdout(predicate::str::contains("--query"));
}

#[test]
fn test_profile_help_shows_subcommands() {
    cargo_bin_cmd!("circle")
        .args(["profile", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("edit"));
}

#[test]
fn test_unknown_sort_mode_is_rejected() {
    cargo_bin_cmd!("circle")
        .args(["feed", "--sort", "loudest"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown sort mode"));
}

#[test]
fn test_sorts_lists_modes_with_default() {
    let dir = tempfile::tempdir().unwrap();

    cargo_bin_cmd!("circle")
        .env("CIRCLE_HOME", dir.path())
        .arg("sorts")
        .assert()
        .success()
        .stdout(predicate::str::contains("recent (default)"))
        .stdout(predicate::str::contains("trending"))
        .stdout(predicate::str::contains("Most engagement"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("circle")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
