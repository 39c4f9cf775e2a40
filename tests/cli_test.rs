//! End-to-end CLI workflows.

mod support;
use support::{assert_failure, assert_success, stderr, stdout, TestEnv};

#[test]
fn init_scaffolds_the_project() {
    let env = TestEnv::new();

    let output = env.init();
    assert_success(&output);
    assert!(stdout(&output).contains("initialized"));

    assert!(env.dir.path().join("satchel.toml").exists());
    let pointer =
        std::fs::read_to_string(env.dir.path().join(".satchel/environment")).unwrap();
    assert_eq!(pointer.trim(), "default");

    let gitignore = std::fs::read_to_string(env.dir.path().join(".gitignore")).unwrap();
    assert!(gitignore.contains(".satchel"));
}

#[test]
fn init_twice_fails() {
    let env = TestEnv::new();
    assert_success(&env.init());

    let output = env.init();
    assert_failure(&output);
    assert!(stderr(&output).contains("already"));
}

#[test]
fn commands_outside_a_project_point_at_init() {
    let env = TestEnv::new();

    let output = env.satchel(&["secret", "list"]);
    assert_failure(&output);
    assert!(stderr(&output).contains("satchel.toml"));
    assert!(stdout(&output).contains("satchel init"));
}

#[test]
fn secret_lifecycle() {
    let env = TestEnv::new();
    assert_success(&env.init());

    assert_success(&env.satchel(&["secret", "set", "PORT", "8080"]));
    assert_success(&env.satchel(&["secret", "set", "TOKEN", "abc", "--required"]));

    let output = env.satchel(&["secret", "show", "PORT"]);
    assert_success(&output);
    assert!(stdout(&output).contains("8080"));

    let output = env.satchel(&["secret", "list"]);
    assert_success(&output);
    let out = stdout(&output);
    assert!(out.contains("PORT"));
    assert!(out.contains("TOKEN"));
    assert!(out.contains("required"));

    assert_success(&env.satchel(&["secret", "rm", "PORT"]));
    assert_failure(&env.satchel(&["secret", "show", "PORT"]));
}

#[test]
fn environment_lifecycle() {
    let env = TestEnv::new();
    assert_success(&env.init());

    assert_success(&env.satchel(&["env", "new", "dev"]));
    assert_success(&env.satchel(&["secret", "set", "PORT", "8080"]));
    assert_success(&env.satchel(&["secret", "set", "PORT", "9090", "--env", "dev"]));

    let output = env.satchel(&["env", "list"]);
    assert_success(&output);
    assert!(stdout(&output).contains("* default"));

    assert_success(&env.satchel(&["env", "switch", "dev"]));
    let output = env.satchel(&["env", "list"]);
    assert!(stdout(&output).contains("* dev"));

    // The current environment refuses removal.
    let output = env.satchel(&["env", "rm", "dev"]);
    assert_failure(&output);
    assert!(stderr(&output).contains("current"));
}

#[cfg(unix)]
#[test]
fn run_injects_the_current_environments_secrets() {
    let env = TestEnv::new();
    assert_success(&env.init());
    assert_success(&env.satchel(&["secret", "set", "GREETING", "hello"]));

    let output = env.satchel(&["run", "--", "sh", "-c", "echo $GREETING"]);
    assert_success(&output);
    assert!(stdout(&output).contains("hello"));
}

#[cfg(unix)]
#[test]
fn run_respects_the_local_override() {
    let env = TestEnv::new();
    assert_success(&env.init());
    assert_success(&env.satchel(&["secret", "set", "PORT", "8080"]));
    std::fs::write(env.dir.path().join(".env"), "PORT=9999\n").unwrap();

    let output = env.satchel(&["run", "--", "sh", "-c", "echo $PORT"]);
    assert_success(&output);
    assert!(stdout(&output).contains("9999"));
}

#[cfg(unix)]
#[test]
fn run_propagates_the_child_exit_code() {
    let env = TestEnv::new();
    assert_success(&env.init());

    let output = env.satchel(&["run", "--", "sh", "-c", "exit 3"]);
    assert_eq!(output.status.code(), Some(3));
}

#[cfg(unix)]
#[test]
fn file_lifecycle() {
    let env = TestEnv::new();
    assert_success(&env.init());

    let working = env.dir.path().join("config.json");
    std::fs::write(&working, b"{}").unwrap();

    assert_success(&env.satchel(&["file", "add", "config.json"]));
    assert!(working.is_symlink());

    let output = env.satchel(&["file", "list"]);
    assert_success(&output);
    assert!(stdout(&output).contains("config.json"));

    assert_success(&env.satchel(&["file", "rm", "config.json"]));
    assert!(!working.is_symlink());
    assert!(working.exists());
}

#[test]
fn version_flag_prints_the_binary_name() {
    use predicates::prelude::*;

    let env = TestEnv::new();
    env.cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("satchel"));
}

#[test]
fn fetch_without_login_points_at_login() {
    let env = TestEnv::new();
    assert_success(&env.init());

    let output = env.satchel(&["fetch"]);
    assert_failure(&output);
    assert!(stderr(&output).contains("not logged in"));
    assert!(stdout(&output).contains("satchel login"));
}
