//! End-to-end tests for `JvmLauncher` against a stand-in `java`
//!
//! A shell script named `java` in a temporary runtime home prints each
//! argument it receives, so the tests observe the exact argv a real
//! interpreter would get.
//!
//! Serial: writing and then executing a script while another test thread
//! forks can fail with ETXTBSY.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use clyze::{
    CLASSPATH_SEPARATOR, Classpath, ConfigError, Echo, FixedHomeLocator, JvmLauncher, LaunchError,
    NativeRunner,
};
use serial_test::serial;
use tempfile::TempDir;

const FAKE_JAVA: &str = r#"#!/bin/sh
for a in "$@"; do echo "arg:$a"; done
echo "exiting" >&2
exit ${FAKE_JAVA_EXIT:-0}
"#;

/// Create `<home>/bin/java` running [`FAKE_JAVA`].
fn fake_runtime_home() -> (TempDir, PathBuf) {
    let home = TempDir::new().unwrap();
    let bin = home.path().join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    let java = bin.join("java");
    std::fs::write(&java, FAKE_JAVA).unwrap();
    std::fs::set_permissions(&java, std::fs::Permissions::from_mode(0o755)).unwrap();
    (home, java)
}

fn launcher(home: &Path, output: Echo, diagnostics: Echo) -> JvmLauncher<NativeRunner> {
    JvmLauncher::with_runner(NativeRunner::with_echo(output))
        .with_locator(FixedHomeLocator::new(home))
        .with_diagnostics(diagnostics)
}

const NONE: &[&str] = &[];

#[test]
#[serial]
fn test_run_class_passes_full_argv() {
    let (home, _java) = fake_runtime_home();
    let (output, tagged) = Echo::buffer();
    let launcher = launcher(home.path(), output, Echo::silent());
    let classpath = Classpath::new().entry("lib/a.jar").entry("lib/b.jar");

    let mut lines = Vec::new();
    let outcome = launcher
        .run_class(
            &classpath,
            &["-Xmx1g", "-Dfile.encoding=UTF-8"],
            "org.example.Main",
            &["input.jar", "--out", "facts"],
            "DOOP",
            false,
            Some(&mut |line: &str| lines.push(line.to_owned())),
        )
        .unwrap();

    assert!(outcome.success());
    assert_eq!(
        lines,
        vec![
            "arg:-cp".to_string(),
            format!("arg:lib/a.jar{CLASSPATH_SEPARATOR}lib/b.jar"),
            "arg:-Xmx1g".to_string(),
            "arg:-Dfile.encoding=UTF-8".to_string(),
            "arg:org.example.Main".to_string(),
            "arg:input.jar".to_string(),
            "arg:--out".to_string(),
            "arg:facts".to_string(),
            "exiting".to_string(),
        ]
    );
    assert!(tagged.lines().iter().all(|l| l.starts_with("DOOP: ")));
    assert_eq!(tagged.lines().len(), lines.len());
}

#[test]
#[serial]
fn test_run_archive_without_classpath() {
    let (home, _java) = fake_runtime_home();
    let launcher = launcher(home.path(), Echo::silent(), Echo::silent());

    let mut lines = Vec::new();
    launcher
        .run_archive(
            &Classpath::new(),
            NONE,
            "tools/soot.jar",
            &["-version"],
            "SOOT",
            false,
            Some(&mut |line: &str| lines.push(line.to_owned())),
        )
        .unwrap();

    assert_eq!(
        lines,
        vec!["arg:-jar", "arg:tools/soot.jar", "arg:-version", "exiting"]
    );
}

#[test]
#[serial]
fn test_debug_prints_command_line_to_diagnostics() {
    let (home, java) = fake_runtime_home();
    let (diagnostics, debug_out) = Echo::buffer();
    let launcher = launcher(home.path(), Echo::silent(), diagnostics);

    launcher
        .run_runtime(
            &Classpath::new().entry("x.jar"),
            &["Main"],
            &["a b"],
            "T",
            true,
            None,
        )
        .unwrap();

    assert_eq!(
        debug_out.lines(),
        vec![format!("Running program: {} -cp x.jar Main a b", java.display())]
    );
}

#[test]
#[serial]
fn test_nonzero_exit_is_reported_not_raised() {
    let (home, java) = fake_runtime_home();
    std::fs::write(
        &java,
        FAKE_JAVA.replace("${FAKE_JAVA_EXIT:-0}", "5"),
    )
    .unwrap();
    let launcher = launcher(home.path(), Echo::silent(), Echo::silent());

    let outcome = launcher
        .run_class(&Classpath::new(), NONE, "Main", NONE, "T", false, None)
        .unwrap();

    assert_eq!(outcome.exit_code, Some(5));
    assert!(!outcome.success());
}

#[test]
fn test_missing_interpreter_spawns_nothing() {
    let empty_home = TempDir::new().unwrap();
    let (output, tagged) = Echo::buffer();
    let launcher = launcher(empty_home.path(), output, Echo::silent());

    let err = launcher
        .run_class(&Classpath::new(), NONE, "Main", NONE, "T", false, None)
        .unwrap_err();

    assert!(matches!(
        err,
        LaunchError::Config(ConfigError::InterpreterNotFound { .. })
    ));
    assert!(err.to_string().contains("cannot run: Main"));
    assert!(tagged.contents().is_empty());
}

#[test]
#[serial]
fn test_configured_launcher_uses_java_home_override() {
    let (home, _java) = fake_runtime_home();
    let overrides = clyze::ConfigOverrides {
        java_home: Some(home.path().to_path_buf()),
        jvm_args: Some(vec!["-Xss8m".to_string()]),
        echo: Some(clyze::EchoMode::Silent),
        ..clyze::ConfigOverrides::default()
    };
    let config = clyze::Config::discover_from(home.path(), &overrides).unwrap();

    let mut lines = Vec::new();
    config
        .launcher()
        .run_class(
            &Classpath::new(),
            NONE,
            "Main",
            NONE,
            "CFG",
            false,
            Some(&mut |line: &str| lines.push(line.to_owned())),
        )
        .unwrap();

    assert_eq!(lines, vec!["arg:-Xss8m", "arg:Main", "exiting"]);
}
