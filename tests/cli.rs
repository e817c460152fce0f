//! Integration test suite for the `jps` CLI
use assert_cmd::Command;

/// Helper function to run the `main` binary with the given arguments and return a
/// [`assert_cmd::assert::Assert`].
fn run_main(args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("jps").expect("Failed to find main binary");
    cmd.args(args);
    cmd.assert()
}

/// Like [`run_main`], feeding `stdin` to the process.
fn run_with_stdin(args: &[&str], stdin: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("jps").expect("Failed to find main binary");
    cmd.args(args).write_stdin(stdin);
    cmd.assert()
}

fn stdout_of(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone())
        .expect("Invalid UTF-8 output")
}

fn stderr_of(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stderr.clone())
        .expect("Invalid UTF-8 output")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_query() {
        let assert =
            run_main(&["$.age", "tests/data/simple.json"]).success().code(0);
        assert_eq!(stdout_of(&assert), "32\n");
    }

    #[test]
    fn string_value_is_verbatim() {
        let assert = run_main(&["$.name", "tests/data/simple.json"]).success();
        assert_eq!(stdout_of(&assert), "\"John Doe\"\n");
    }

    #[test]
    fn container_keeps_original_formatting() {
        let assert =
            run_main(&["$.address", "tests/data/simple.json"]).success();
        assert_eq!(
            stdout_of(&assert),
            "{\n    \"city\": \"Springfield\",\n    \"zip\": \"49007\"\n  }\n"
        );
    }

    #[test]
    fn multiple_matches_are_an_array() {
        let assert =
            run_main(&["$.tags[*]", "tests/data/simple.json"]).success();
        assert_eq!(stdout_of(&assert), "[\"admin\",\"ops\",\"dev\"]\n");
    }

    #[test]
    fn nonexistent_field_simple_query() {
        let assert =
            run_main(&["$.does.not.exist", "tests/data/simple.json"])
                .success()
                .code(0);
        let output_str = stdout_of(&assert);
        assert!(
            output_str.is_empty(),
            "Expected no output for nonexistent field, got: {output_str:?}"
        );
    }

    #[test]
    fn nonexistent_file() {
        let assert = run_main(&["$", "tests/data/missing.json"]);
        assert.failure().code(1);
    }

    #[test]
    fn invalid_query() {
        let assert = run_main(&["$[", "tests/data/simple.json"]).failure().code(1);
        assert!(stderr_of(&assert).contains("Failed to parse query"));
    }

    #[test]
    fn invalid_field_name() {
        run_main(&["$.key-with-dash", "tests/data/simple.json"])
            .failure()
            .code(1);
        let assert =
            run_main(&["$[\"key-with-dash\"]", "tests/data/simple.json"]);
        assert.success();
    }

    #[test]
    fn reads_stdin() {
        let assert = run_with_stdin(&["$.a[-1]"], r#"{"a": [1, 2]}"#).success();
        assert_eq!(stdout_of(&assert), "2\n");
    }

    #[test]
    fn malformed_document() {
        let assert =
            run_with_stdin(&["$.a"], r#"{"a": [1, 2}"#).failure().code(1);
        assert!(stderr_of(&assert).contains("Invalid byte"));
    }

    #[test]
    fn empty_document() {
        let assert = run_main(&["$", "tests/data/empty.json"]).failure().code(1);
        assert!(stderr_of(&assert).contains("Unexpected end of input"));
    }

    #[test]
    fn count_matches() {
        let assert = run_main(&[
            "--count",
            "-n",
            "$..name",
            "tests/data/request.json",
        ])
        .success();
        assert_eq!(stdout_of(&assert), "Found matches: 4\n");
    }

    #[test]
    fn filter_query() {
        let assert = run_main(&[
            r#"$.requestedItemsStatus[?(@.operation == "Add")].approvalInfo[0].approvalDecision"#,
            "tests/data/request.json",
        ])
        .success();
        assert_eq!(stdout_of(&assert), "\"APPROVED\"\n");
    }

    #[test]
    fn regex_filter_query() {
        let assert = run_main(&[
            "$..approvalInfo[?(@.approverName =~ /^stephen/i)].approver.name",
            "tests/data/request.json",
        ])
        .success();
        assert_eq!(stdout_of(&assert), "\"William Wilson\"\n");
    }

    #[test]
    fn print_spans() {
        let assert =
            run_with_stdin(&["--spans", "$.age"], r#"{"age": 32}"#).success();
        assert_eq!(stdout_of(&assert), "[{\"start\":8,\"end\":10}]\n");
    }

    #[test]
    fn repl_reads_queries_from_stdin() {
        let assert = run_with_stdin(
            &["repl", "tests/data/simple.json"],
            "$.age\n$.nope\n$[\n$.tags[0]\n",
        )
        .success();
        let output = stdout_of(&assert);
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "32");
        assert_eq!(lines[1], "(no match)");
        assert!(lines[2].starts_with("error: "));
        assert_eq!(lines[3], "\"admin\"");
    }

    #[test]
    fn generate_man_pages() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let out = dir.path().to_str().expect("Non UTF-8 temp dir");
        run_main(&["generate", "man", "-o", out]).success();
        assert!(dir.path().join("jps.1").exists());
        assert!(dir.path().join("jps-repl.1").exists());
        assert!(dir.path().join("jps-generate-man.1").exists());
    }

    #[test]
    fn generate_shell_completions() {
        let assert = run_main(&["generate", "shell", "bash"]).success();
        assert!(stdout_of(&assert).contains("jps"));
    }
}
