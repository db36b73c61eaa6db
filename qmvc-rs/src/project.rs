//! Project traversal: evaluate a root file and act on its `TEMPLATE`.
//!
//! * `app`: synthesize `<root dir>/<root name>.<output extension>`
//! * `lib`: skipped
//! * `subdirs`: every `SUBDIRS` entry is processed as its own root session,
//!   in declaration order

use rand::RngCore;
use tracing::info;

use crate::error::{Error, Result};
use crate::relpath;
use crate::script::Evaluator;
use crate::var::Environment;
use crate::vcxproj::{synthesize, write_project};

/// Process `root` and everything it references.  Returns the paths of the
/// project documents written, in the order they were produced.
pub fn process_project(eval: &mut Evaluator<'_>, root: &str, rng: &mut dyn RngCore) -> Result<Vec<String>> {
    let root = relpath::absolutize(root, "");
    let env = eval.process_root_file(&root)?;
    let mut written = Vec::new();

    match env.get_one("TEMPLATE")? {
        "app" => {
            let settings = eval.settings();
            let proj_file = relpath::absolutize(
                &format!("{}.{}", relpath::file_stem(&root), settings.output_extension),
                relpath::parent(&root),
            );
            let docs = synthesize(&env, settings, &proj_file, rng);
            write_project(eval.host(), &docs)?;
            info!(project = %proj_file, "generated");
            written.push(proj_file);
        }
        "lib" => {
            info!(file = %root, "skipping lib project");
        }
        "subdirs" => {
            for sub in subproject_files(&env, &root, &eval.settings().project_extension) {
                info!(file = %sub, "entering subproject");
                eval.enter(&sub)?;
                let result = process_project(eval, &sub, rng);
                eval.leave();
                written.extend(result?);
            }
        }
        other => return Err(Error::UnknownTemplate(other.to_owned())),
    }

    Ok(written)
}

/// Project files named by `SUBDIRS`, resolved against the root's directory.
///
/// An entry `name` maps to `name/name.<ext>` unless `name.file` or
/// `name.subdir` says otherwise, or the entry itself names a project file.
pub fn subproject_files(env: &Environment, root: &str, extension: &str) -> Vec<String> {
    let base = relpath::parent(root);
    let suffix = format!(".{extension}");

    env.values("SUBDIRS")
        .iter()
        .map(|entry| {
            let file = env.joined(&format!("{entry}.file"));
            if !file.is_empty() {
                return relpath::absolutize(&file, base);
            }
            if entry.ends_with(&suffix) {
                return relpath::absolutize(entry, base);
            }
            let subdir = env.joined(&format!("{entry}.subdir"));
            let dir = if subdir.is_empty() { entry.as_str() } else { subdir.as_str() };
            let dir = dir.trim_end_matches(['/', '\\']);
            relpath::absolutize(&format!("{dir}/{}{suffix}", relpath::file_name(dir)), base)
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::host::MemHost;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn run(host: &MemHost, root: &str) -> Result<Vec<String>> {
        let settings = Settings::default();
        let mut eval = Evaluator::new(host, &settings);
        let mut rng = StdRng::seed_from_u64(1);
        process_project(&mut eval, root, &mut rng)
    }

    #[test]
    fn app_project_is_synthesized() {
        let host = MemHost::new();
        host.add_file("/w/app.pro", "TEMPLATE = app\nSOURCES = main.cpp\nCONFIG += debug win32\n");
        let written = run(&host, "/w/app.pro").unwrap();
        assert_eq!(written, vec!["/w/app.vcxproj"]);

        let project = host.file("/w/app.vcxproj").unwrap();
        assert_eq!(project.matches("<ClCompile Include=").count(), 1);
        assert!(project.contains("<ClCompile Include=\"main.cpp\" />"));
        let filters = host.file("/w/app.vcxproj.filters").unwrap();
        assert!(!filters.contains("<Filter Include="));
    }

    #[test]
    fn lib_project_writes_nothing() {
        let host = MemHost::new();
        host.add_file("/w/core.pro", "TEMPLATE = lib\nSOURCES = core.cpp\n");
        assert!(run(&host, "/w/core.pro").unwrap().is_empty());
        assert!(host.file("/w/core.vcxproj").is_none());
    }

    #[test]
    fn unknown_template() {
        let host = MemHost::new();
        host.add_file("/w/x.pro", "TEMPLATE = vcapp\n");
        let err = run(&host, "/w/x.pro").unwrap_err();
        assert!(matches!(err, Error::UnknownTemplate(ref t) if t == "vcapp"));
    }

    #[test]
    fn template_needs_exactly_one_value() {
        let host = MemHost::new();
        host.add_file("/w/x.pro", "TEMPLATE = app lib\n");
        let err = run(&host, "/w/x.pro").unwrap_err();
        assert!(matches!(err, Error::Arity { count: 2, .. }));

        host.add_file("/w/y.pro", "SOURCES = a.cpp\n");
        let err = run(&host, "/w/y.pro").unwrap_err();
        assert!(matches!(err, Error::Arity { count: 0, .. }));
    }

    #[test]
    fn subdirs_in_declaration_order() {
        let host = MemHost::new();
        host.add_file("/w/all.pro", "TEMPLATE = subdirs\nSUBDIRS = gui core tools\ngui.depends = core\n");
        host.add_file("/w/gui/gui.pro", "TEMPLATE = app\nSOURCES = gui.cpp\n");
        host.add_file("/w/core/core.pro", "TEMPLATE = lib\n");
        host.add_file("/w/tools/tools.pro", "TEMPLATE = app\nSOURCES = tool.cpp\n");
        let written = run(&host, "/w/all.pro").unwrap();
        assert_eq!(written, vec!["/w/gui/gui.vcxproj", "/w/tools/tools.vcxproj"]);
    }

    #[test]
    fn subprojects_start_from_fresh_environment() {
        let host = MemHost::new();
        host.add_file("/w/all.pro", "TEMPLATE = subdirs\nSUBDIRS = a\nSOURCES = leaked.cpp\n");
        host.add_file("/w/a/a.pro", "TEMPLATE = app\nSOURCES += a.cpp\n");
        run(&host, "/w/all.pro").unwrap();
        let project = host.file("/w/a/a.vcxproj").unwrap();
        assert!(!project.contains("leaked.cpp"));
        assert!(project.contains("<RootNamespace>a</RootNamespace>"));
    }

    #[test]
    fn missing_subproject_is_fatal() {
        let host = MemHost::new();
        host.add_file("/w/all.pro", "TEMPLATE = subdirs\nSUBDIRS = ghost\n");
        let err = run(&host, "/w/all.pro").unwrap_err();
        assert!(matches!(err, Error::MissingFile { ref path, .. } if path == "/w/ghost/ghost.pro"));
    }

    #[test]
    fn subdir_entry_overrides() {
        let mut env = Environment::new();
        env.set("SUBDIRS", ["plain", "custom", "moved", "direct.pro", "libs/core/"].map(String::from).to_vec());
        env.set("custom.file", vec!["other/custom_main.pro".into()]);
        env.set("moved.subdir", vec!["src/moved".into()]);
        let files = subproject_files(&env, "/w/all.pro", "pro");
        assert_eq!(
            files,
            vec![
                "/w/plain/plain.pro",
                "/w/other/custom_main.pro",
                "/w/src/moved/moved.pro",
                "/w/direct.pro",
                "/w/libs/core/core.pro",
            ]
        );
    }

    #[test]
    fn self_referencing_subdirs_hit_depth_limit() {
        let host = MemHost::new();
        host.add_file("/w/loop/loop.pro", "TEMPLATE = subdirs\nSUBDIRS = ../loop\n");
        let settings = Settings { max_depth: 6, ..Settings::default() };
        let mut eval = Evaluator::new(&host, &settings);
        let mut rng = StdRng::seed_from_u64(1);
        let err = process_project(&mut eval, "/w/loop/loop.pro", &mut rng).unwrap_err();
        assert!(matches!(err, Error::RecursionLimit { limit: 6, .. }));
    }
}
