#![cfg(unix)]

mod common;

use common::{calls, link_target, CommandOutput, TestContext, RECORDING_HOOK};
use std::fs;

#[test]
fn test_help_and_version() {
    let ctx = TestContext::new();

    let output: CommandOutput = ctx
        .cmd()
        .arg("--help")
        .output()
        .expect("Failed to run toolshelf")
        .into();

    output
        .assert_success()
        .assert_stdout_contains("side-by-side versions")
        .assert_stdout_contains("Usage: toolshelf");

    let output: CommandOutput = ctx
        .cmd()
        .arg("version")
        .output()
        .expect("Failed to run toolshelf")
        .into();

    output.assert_success().assert_stdout_contains("toolshelf");
}

#[test]
fn test_install_without_tool_dirs_is_a_usage_error() {
    let ctx = TestContext::new();

    let output: CommandOutput = ctx
        .cmd()
        .arg("install")
        .output()
        .expect("Failed to run toolshelf")
        .into();

    output.assert_code(2);
}

#[test]
fn test_install_links_aliases_and_latest() {
    let ctx = TestContext::new();
    let jdk = ctx.tool(
        "jdk",
        Some("# JDKs\n11.0.20.1 https://example.com/jdk-{version}.tgz\n8u382 https://example.com/jdk8.tgz\n11.0.20.0 https://example.com/jdk-{version}.tgz\n"),
        Some(RECORDING_HOOK),
    );

    let output: CommandOutput = ctx
        .cmd()
        .arg("install")
        .arg(&jdk)
        .output()
        .expect("Failed to run toolshelf")
        .into();

    output
        .assert_success()
        .assert_stderr_contains("Installing jdk 8u382");

    assert_eq!(
        calls(&jdk),
        vec![
            "8u382 https://example.com/jdk8.tgz",
            "11.0.20.0 https://example.com/jdk-11.0.20.0.tgz",
            "11.0.20.1 https://example.com/jdk-11.0.20.1.tgz",
        ]
    );
    assert_eq!(link_target(&jdk.join("11.0.20")), "11.0.20.1");
    assert_eq!(link_target(&jdk.join("11.0")), "11.0.20");
    assert_eq!(link_target(&jdk.join("11")), "11.0");
    assert_eq!(link_target(&jdk.join("latest")), "11.0.20.1");
    assert!(fs::symlink_metadata(jdk.join("8u382")).unwrap().is_dir());
}

#[test]
fn test_batch_continues_past_missing_manifest() {
    let ctx = TestContext::new();
    let first = ctx.tool("first", Some("1.0 a\n"), Some(RECORDING_HOOK));
    let second = ctx.tool("second", None, Some(RECORDING_HOOK));
    let third = ctx.tool("third", Some("3.0 c\n"), Some(RECORDING_HOOK));
    let report = ctx.root.join("report.json");

    let output: CommandOutput = ctx
        .cmd()
        .arg("install")
        .arg("--report")
        .arg(&report)
        .args([&first, &second, &third])
        .output()
        .expect("Failed to run toolshelf")
        .into();

    output
        .assert_success()
        .assert_stderr_contains("Skipping second");

    assert_eq!(link_target(&first.join("latest")), "1.0");
    assert_eq!(link_target(&third.join("latest")), "3.0");

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    let statuses: Vec<&str> = report["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, vec!["completed", "skipped", "completed"]);
}

#[test]
fn test_hook_failure_aborts_only_that_tool() {
    let ctx = TestContext::new();
    let broken = ctx.tool("broken", Some("1.0 a\n2.0 b\n3.0 c\n"), Some(RECORDING_HOOK));
    fs::write(broken.join("fail"), "2.0\n").unwrap();
    let healthy = ctx.tool("healthy", Some("4.2 d\n"), Some(RECORDING_HOOK));

    let output: CommandOutput = ctx
        .cmd()
        .arg("install")
        .args([&broken, &healthy])
        .output()
        .expect("Failed to run toolshelf")
        .into();

    // Per-tool failures do not change the exit status by default
    output
        .assert_success()
        .assert_stderr_contains("broken 2.0")
        .assert_stderr_contains("refusing to install 2.0");

    assert_eq!(calls(&broken), vec!["1.0 a", "2.0 b"]);
    assert!(fs::symlink_metadata(broken.join("latest")).is_err());
    assert_eq!(link_target(&healthy.join("latest")), "4.2");
}

#[test]
fn test_strict_mode_propagates_failures() {
    let ctx = TestContext::new();
    let ok = ctx.tool("ok", Some("1.0 a\n"), Some(RECORDING_HOOK));
    let missing = ctx.root.join("missing");

    let output: CommandOutput = ctx
        .cmd()
        .args(["install", "--strict"])
        .args([&ok, &missing])
        .output()
        .expect("Failed to run toolshelf")
        .into();
    output.assert_code(1);

    // Same through the environment
    let output: CommandOutput = ctx
        .cmd()
        .env("TOOLSHELF_STRICT", "1")
        .arg("install")
        .args([&ok, &missing])
        .output()
        .expect("Failed to run toolshelf")
        .into();
    output.assert_code(1);
}

#[test]
fn test_config_file_changes_names() {
    let ctx = TestContext::new();
    fs::write(
        &ctx.config_path,
        r#"{ "manifest_name": "MANIFEST", "hook_name": "fetch.sh", "version_placeholder": "@V@" }"#,
    )
    .unwrap();
    let go = ctx.root.join("go");
    fs::create_dir_all(&go).unwrap();
    fs::write(go.join("MANIFEST"), "1.21.0 https://go.dev/dl/go@V@.tgz\n").unwrap();
    common::write_executable(&go.join("fetch.sh"), RECORDING_HOOK);

    let output: CommandOutput = ctx
        .cmd()
        .arg("install")
        .arg(&go)
        .output()
        .expect("Failed to run toolshelf")
        .into();
    output.assert_success();
    assert_eq!(calls(&go), vec!["1.21.0 https://go.dev/dl/go1.21.0.tgz"]);

    let output: CommandOutput = ctx
        .cmd()
        .args(["config", "show", "--format", "yaml"])
        .output()
        .expect("Failed to run toolshelf")
        .into();
    output.assert_success();
    let _: serde_yaml::Value =
        serde_yaml::from_str(&output.stdout).expect("Output was not valid YAML");
    output.assert_stdout_contains("manifest_name: MANIFEST");

    let output: CommandOutput = ctx
        .cmd()
        .args(["config", "get", "hook-name"])
        .output()
        .expect("Failed to run toolshelf")
        .into();
    output.assert_success().assert_stdout_contains("fetch.sh");
}

#[test]
fn test_resolve_and_list() {
    let ctx = TestContext::new();
    let node = ctx.tool(
        "node",
        Some("18.17.1 a\n20.5.0 b\n"),
        Some(RECORDING_HOOK),
    );
    ctx.cmd()
        .arg("install")
        .arg(&node)
        .output()
        .expect("Failed to run toolshelf");

    let canonical = |v: &str| fs::canonicalize(node.join(v)).unwrap().display().to_string();

    let output: CommandOutput = ctx
        .cmd()
        .arg("resolve")
        .arg(&node)
        .output()
        .expect("Failed to run toolshelf")
        .into();
    output
        .assert_success()
        .assert_stdout_contains(&canonical("20.5.0"));

    let output: CommandOutput = ctx
        .cmd()
        .env("NODE_VERSION", "18")
        .arg("resolve")
        .arg(&node)
        .output()
        .expect("Failed to run toolshelf")
        .into();
    output
        .assert_success()
        .assert_stdout_contains(&canonical("18.17.1"));

    fs::write(node.join(".ignore"), "").unwrap();
    let output: CommandOutput = ctx
        .cmd()
        .arg("resolve")
        .arg(&node)
        .output()
        .expect("Failed to run toolshelf")
        .into();
    output.assert_code(1).assert_stderr_contains("disabled");

    let output: CommandOutput = ctx
        .cmd()
        .arg("list")
        .arg(&node)
        .output()
        .expect("Failed to run toolshelf")
        .into();
    output
        .assert_success()
        .assert_stdout_contains("18.17.1")
        .assert_stdout_contains("latest -> 20.5.0")
        .assert_stdout_contains("20.5 -> 20.5.0");
}

#[test]
fn test_link_command() {
    let ctx = TestContext::new();
    let python = ctx.tool("python", None, None);
    fs::create_dir_all(python.join("3.11.4")).unwrap();
    fs::create_dir_all(python.join("3.12.0")).unwrap();
    // Scratch space a hook left behind
    fs::create_dir_all(python.join("build")).unwrap();

    let output: CommandOutput = ctx
        .cmd()
        .arg("link")
        .arg(&python)
        .arg("3.11.4")
        .output()
        .expect("Failed to run toolshelf")
        .into();
    output.assert_success();
    assert_eq!(link_target(&python.join("3.11")), "3.11.4");
    assert_eq!(link_target(&python.join("3")), "3.11");

    let output: CommandOutput = ctx
        .cmd()
        .args(["link", "--latest"])
        .arg(&python)
        .output()
        .expect("Failed to run toolshelf")
        .into();
    output.assert_success();
    assert_eq!(link_target(&python.join("latest")), "3.12.0");

    let output: CommandOutput = ctx
        .cmd()
        .arg("link")
        .arg(&python)
        .arg("9.9")
        .output()
        .expect("Failed to run toolshelf")
        .into();
    output.assert_code(1);
}
