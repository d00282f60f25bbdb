use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

mod test {

    use super::*;

    #[test]
    fn cli_version_flag() {
        Command::cargo_bin("iam-user-report")
            .unwrap()
            .arg("--version")
            .assert()
            .success()
            .stdout(contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn cli_help_lists_subcommands() {
        Command::cargo_bin("iam-user-report")
            .unwrap()
            .arg("--help")
            .assert()
            .success()
            .stdout(contains("report").and(contains("list")));
    }

    #[test]
    fn cli_report_help_documents_export_and_threshold() {
        Command::cargo_bin("iam-user-report")
            .unwrap()
            .args(["report", "--help"])
            .assert()
            .success()
            .stdout(
                contains("--xlsx-out")
                    .and(contains("--inactivity-days"))
                    .and(contains("--credential-path")),
            );
    }
}
