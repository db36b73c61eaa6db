//! Run the `qmvc` binary against project trees in temporary directories.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_qmvc"))
}

fn qmvc(args: &[&str]) -> Output {
    Command::new(binary())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run qmvc")
}

fn write(dir: &Path, rel: &str, contents: &str) -> String {
    let path = dir.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

/// Copy testdata/demo into `dir`.
fn copy_demo(dir: &Path) {
    let src = Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata/demo");
    for rel in ["demo.pro", "common.pri", "core/core.pro", "viewer/viewer.pro"] {
        let contents = std::fs::read_to_string(src.join(rel)).unwrap();
        write(dir, rel, &contents);
    }
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

// ── generate ──────────────────────────────────────────────────────────────────

#[test]
fn generate_single_app() {
    let dir = tempfile::tempdir().unwrap();
    let pro = write(dir.path(), "app.pro", "TEMPLATE = app\nSOURCES = main.cpp\nCONFIG += debug win32\n");

    let out = qmvc(&["generate", &pro, "--seed", "3"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let written = stdout(&out);
    assert!(written.trim_end().ends_with("app.vcxproj"), "{written}");

    let project = std::fs::read_to_string(dir.path().join("app.vcxproj")).unwrap();
    assert_eq!(project.matches("<ClCompile Include=").count(), 1);
    let filters = std::fs::read_to_string(dir.path().join("app.vcxproj.filters")).unwrap();
    assert!(!filters.contains("<Filter Include="));
}

#[test]
fn generate_is_reproducible_with_seed() {
    let dir = tempfile::tempdir().unwrap();
    let pro = write(dir.path(), "app.pro", "TEMPLATE = app\nSOURCES = main.cpp\n");
    let vcxproj = dir.path().join("app.vcxproj");

    assert!(qmvc(&["generate", &pro, "--seed", "99"]).status.success());
    let first = std::fs::read_to_string(&vcxproj).unwrap();
    assert!(qmvc(&["generate", &pro, "--seed", "99"]).status.success());
    let second = std::fs::read_to_string(&vcxproj).unwrap();
    assert_eq!(first, second);
}

#[test]
fn generate_demo_tree() {
    let dir = tempfile::tempdir().unwrap();
    copy_demo(dir.path());
    let root = dir.path().join("demo.pro").to_string_lossy().into_owned();

    let out = qmvc(&["generate", &root]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(stdout(&out).lines().count(), 1);

    assert!(!dir.path().join("core/core.vcxproj").exists());
    let project = std::fs::read_to_string(dir.path().join("viewer/viewer.vcxproj")).unwrap();
    assert!(project.contains("<ProjectGuid>{3F2504E0-4F89-11D3-9A0C-0305E82C3301}</ProjectGuid>"));
    assert!(project.contains("<TargetName>demo_viewer</TargetName>"));
    assert!(project.contains("<OutDir>bin</OutDir>"));
    assert!(project.contains("<ClCompile Include=\"src\\view.cpp\" />"));
    assert!(project.contains("<ClCompile Include=\"build\\moc\\moc_view.cpp\" />"));
    assert!(project.contains("<QtUICompile Include=\"ui\\view.ui\" />"));
    assert!(project.contains("DEMO_DEBUG;WIN32;_DEBUG"));
    assert!(project.contains("QtCored4.lib;QtGuid4.lib;version.lib"));

    let filters = std::fs::read_to_string(dir.path().join("viewer/viewer.vcxproj.filters")).unwrap();
    assert!(filters.contains("<Filter Include=\"src\" />"));
    assert!(filters.contains("<Filter Include=\"build\\moc\" />"));
}

#[test]
fn config_flag_switches_branches() {
    let dir = tempfile::tempdir().unwrap();
    copy_demo(dir.path());
    let root = dir.path().join("demo.pro").to_string_lossy().into_owned();

    assert!(qmvc(&["generate", &root, "-c", "release"]).status.success());
    let project = std::fs::read_to_string(dir.path().join("viewer/viewer.vcxproj")).unwrap();
    assert!(project.contains("DEMO_RELEASE;WIN32"));
    assert!(!project.contains("DEMO_DEBUG"));
}

#[test]
fn missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("none.pro").to_string_lossy().into_owned();
    let out = qmvc(&["generate", &missing]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Cannot open file"), "{stderr}");
}

#[test]
fn unknown_directive_fails() {
    let dir = tempfile::tempdir().unwrap();
    let pro = write(dir.path(), "app.pro", "TEMPLATE = app\nmessage(hi)\n");
    let out = qmvc(&["generate", &pro]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Unknown function call: message"));
    assert!(!dir.path().join("app.vcxproj").exists());
}

#[test]
fn settings_file_changes_extension() {
    let dir = tempfile::tempdir().unwrap();
    let pro = write(dir.path(), "app.pro", "TEMPLATE = app\nSOURCES = main.cpp\n");
    let settings = write(dir.path(), "qmvc.conf", "output_extension = vcproj\nbogus = 1\n");

    let out = qmvc(&["generate", &pro, "--settings", &settings]);
    assert!(out.status.success());
    assert!(dir.path().join("app.vcproj").exists());
    assert!(dir.path().join("app.vcproj.filters").exists());
    // Unknown settings are reported and skipped.
    assert!(String::from_utf8_lossy(&out.stderr).contains("unknown setting"));
}

// ── dump ──────────────────────────────────────────────────────────────────────

#[test]
fn dump_prints_sorted_variables() {
    let dir = tempfile::tempdir().unwrap();
    let pro = write(dir.path(), "app.pro", "TEMPLATE = app\nSOURCES = b.cpp a.cpp\n");

    let out = qmvc(&["dump", &pro, "-c", "extra"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("SOURCES:\n    b.cpp\n    a.cpp\n"), "{text}");
    assert!(text.contains("CONFIG:\n    debug\n    win32\n    win32-msvc*\n    extra\n"), "{text}");

    let names: Vec<&str> = text.lines().filter(|l| !l.starts_with(' ')).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}
