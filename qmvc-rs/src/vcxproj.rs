//! MSBuild project synthesis.
//!
//! Turns one evaluated environment into a `.vcxproj` document and its
//! `.vcxproj.filters` companion.  Synthesis is pure: the documents and any
//! generated helper sources are returned, and [`write_project`] stores them
//! through a [`Host`].
//!
//! Variables consulted:
//!
//! | Variable             | Effect                                                |
//! |----------------------|-------------------------------------------------------|
//! | `SOURCES`            | `ClCompile` items; non-`.cpp` files skip the PCH      |
//! | `HEADERS`            | `QtMoc` items, plus `moc_<name>.cpp` when `MOC_DIR`   |
//! | `FORMS`              | `QtUICompile` items                                   |
//! | `RC_FILE`            | `ResourceCompile` item                                |
//! | `RESOURCES`          | `QtRcCompile` items, plus `qrc_<name>.cpp` when `RCC_DIR` |
//! | `OTHER_FILES`        | `None` items                                          |
//! | `TRANSLATIONS`       | `QtTsCompile` items                                   |
//! | `INCLUDEPATH`        | include directories, verbatim                         |
//! | `DEFINES`            | preprocessor definitions                              |
//! | `QT`                 | per-module include directory and import libraries     |
//! | `LIBS`               | `-L<dir>`, `-l<name>` or a library file               |
//! | `MOC_DIR` `RCC_DIR` `UI_DIR` | generator output directories                  |
//! | `PRECOMPILED_HEADER` | generated `<pch>.cpp` and PCH compile settings        |
//! | `DESTDIR` `OBJECTS_DIR` | `OutDir` / `IntDir`                                |
//! | `TARGET`             | `TargetName`                                          |
//! | `GUID`               | project GUID; random when unset                       |

use std::collections::BTreeSet;

use rand::RngCore;
use tracing::debug;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::host::Host;
use crate::relpath;
use crate::script::interp::ROOT_FILE;
use crate::var::Environment;
use crate::xml::{render_document, Element};

const MSBUILD_NS: &str = "http://schemas.microsoft.com/developer/msbuild/2003";
const GUID_TEMPLATE: &str = "{????????-????-????-????-????????????}";
const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";
const USER_PROPS: &str = "$(UserRootDir)\\Microsoft.Cpp.$(Platform).user.props";

/// Companion build steps imported at the end of every project.
const EXTENSION_TARGETS: [&str; 4] = ["QtMoc", "QtRcCompile", "QtTsCompile", "QtUICompile"];

/// File roles after the C/C++ sources, in emission order.
const FILE_ROLES: [(&str, &str); 6] = [
    ("HEADERS", "QtMoc"),
    ("FORMS", "QtUICompile"),
    ("RC_FILE", "ResourceCompile"),
    ("RESOURCES", "QtRcCompile"),
    ("OTHER_FILES", "None"),
    ("TRANSLATIONS", "QtTsCompile"),
];

/// Output of [`synthesize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDocuments {
    pub project_path: String,
    pub project: String,
    pub filters_path: String,
    pub filters: String,
    /// Generated sources as `(path, contents)`.
    pub helper_files: Vec<(String, String)>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Config {
    Debug,
    Release,
}

impl Config {
    const ALL: [Config; 2] = [Config::Debug, Config::Release];

    fn name(self) -> &'static str {
        match self {
            Config::Debug => "Debug",
            Config::Release => "Release",
        }
    }

    fn condition(self) -> String {
        format!("'$(Configuration)|$(Platform)'=='{}|Win32'", self.name())
    }
}

// ── File items ────────────────────────────────────────────────────────────────

/// Item entries for both documents plus the set of filter directories.
#[derive(Default)]
struct FileItems {
    files: Vec<Element>,
    filter_items: Vec<Element>,
    filters: BTreeSet<String>,
}

impl FileItems {
    /// Sort, deduplicate and relativize `sources`, then emit one `tag` item
    /// per file.  `props` become child elements of each project item.
    fn add(&mut self, proj_dir: &str, sources: &[String], tag: &str, props: &[Element]) {
        let mut sources = sources.to_vec();
        sources.sort();
        sources.dedup();

        for src in &sources {
            let rel = windows_path(&relpath::relative(src, proj_dir));
            let dir = relpath::parent(&rel).to_owned();

            let item = if props.is_empty() {
                Element::empty(tag)
            } else {
                Element::new(tag).children(props.iter().cloned())
            };
            self.files.push(item.attr("Include", rel.as_str()));
            self.filter_items.push(
                Element::new(tag)
                    .attr("Include", rel.as_str())
                    .child(Element::text("Filter", dir.as_str())),
            );

            let mut d = dir.as_str();
            while !d.is_empty() {
                self.filters.insert(d.to_owned());
                let up = relpath::parent(d);
                if up == d {
                    break;
                }
                d = up;
            }
        }
    }
}

fn windows_path(path: &str) -> String {
    path.replace('/', "\\")
}

/// Uppercase the first character of a `QT` module name.
fn capitalize(module: &str) -> String {
    let mut chars = module.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn generate_guid(rng: &mut dyn RngCore) -> String {
    GUID_TEMPLATE
        .chars()
        .map(|c| match c {
            '?' => char::from(HEX_DIGITS[(rng.next_u32() % 16) as usize]),
            c => c,
        })
        .collect()
}

// ── Synthesis ─────────────────────────────────────────────────────────────────

/// Build the project documents for `env`, to be stored at `proj_file`.
pub fn synthesize(
    env: &Environment,
    settings: &Settings,
    proj_file: &str,
    rng: &mut dyn RngCore,
) -> ProjectDocuments {
    let proj_dir = relpath::parent(proj_file);
    let rel_dir = |name: &str| -> Option<String> {
        let dir = env.joined(name);
        (!dir.is_empty()).then(|| windows_path(&relpath::relative(&dir, proj_dir)))
    };

    let mut items = FileItems::default();
    let mut include_paths: Vec<String> = env.values("INCLUDEPATH").to_vec();
    let mut lib_paths: Vec<String> = Vec::new();
    let mut debug_libs: Vec<String> = Vec::new();
    let mut release_libs: Vec<String> = Vec::new();
    let mut generator_settings: Vec<Element> = Vec::new();
    let mut helper_files = Vec::new();

    let (mut cpp_sources, c_sources): (Vec<String>, Vec<String>) = env
        .values("SOURCES")
        .iter()
        .cloned()
        .partition(|s| relpath::extension(s) == ".cpp");

    let moc_dir = rel_dir("MOC_DIR");
    if let Some(moc_dir) = &moc_dir {
        let defines: Vec<String> = env.values("DEFINES").iter().map(|d| format!("-D{d}")).collect();
        generator_settings.push(
            Element::new("QtMoc")
                .child(Element::text("OutDir", format!("{moc_dir}\\")))
                .child(Element::text(
                    "PreprocessorDefines2",
                    format!("{} -DWIN32 %(PreprocessorDefines2)", defines.join(" ")),
                )),
        );
        include_paths.push(moc_dir.clone());
        for header in env.values("HEADERS") {
            cpp_sources.push(format!("{moc_dir}\\moc_{}.cpp", relpath::file_stem(header)));
        }
    }

    if let Some(rcc_dir) = rel_dir("RCC_DIR") {
        generator_settings.push(
            Element::new("QtRcCompile").child(Element::text("OutDir", format!("{rcc_dir}\\"))),
        );
        for resource in env.values("RESOURCES") {
            cpp_sources.push(format!("{rcc_dir}\\qrc_{}.cpp", relpath::file_stem(resource)));
        }
    }

    items.add(proj_dir, &cpp_sources, "ClCompile", &[]);
    items.add(
        proj_dir,
        &c_sources,
        "ClCompile",
        &[
            Element::text("PrecompiledHeader", "NotUsing"),
            Element::text("ForcedIncludeFiles", ""),
        ],
    );
    for (var, tag) in FILE_ROLES {
        items.add(proj_dir, env.values(var), tag, &[]);
    }

    for module in env.values("QT").iter().filter(|m| !m.is_empty()) {
        let module = capitalize(module);
        include_paths.push(format!("{}/Qt{module}", settings.property("QT_INSTALL_HEADER")));
        debug_libs.push(format!("Qt{module}d4.lib"));
        release_libs.push(format!("Qt{module}4.lib"));
    }
    include_paths.push(settings.property("QT_INSTALL_HEADER").to_owned());
    lib_paths.push(settings.property("QT_INSTALL_LIB").to_owned());

    for lib in env.values("LIBS") {
        if let Some(dir) = lib.strip_prefix("-L") {
            lib_paths.push(dir.to_owned());
        } else if let Some(name) = lib.strip_prefix("-l") {
            debug_libs.push(format!("{name}.lib"));
            release_libs.push(format!("{name}.lib"));
        } else {
            debug_libs.push(lib.clone());
            release_libs.push(lib.clone());
        }
    }

    if let Some(ui_dir) = rel_dir("UI_DIR") {
        // UI settings come first in each ItemDefinitionGroup.
        generator_settings.insert(
            0,
            Element::new("QtUICompile").child(Element::text("OutDir", format!("{ui_dir}\\"))),
        );
        include_paths.push(ui_dir);
    }

    let pch = env.joined("PRECOMPILED_HEADER");
    let pch = (!pch.is_empty()).then_some(pch);
    if let Some(pch) = &pch {
        helper_files.push((
            relpath::absolutize(&format!("{pch}.cpp"), proj_dir),
            format!("#include \"{pch}\"\n"),
        ));
        items.files.push(
            Element::new("ClCompile")
                .attr("Include", format!("{pch}.cpp"))
                .child(Element::text("PrecompiledHeader", "Create"))
                .child(Element::text("ForcedIncludeFiles", "")),
        );
    }

    let shared = Shared {
        include_paths: include_paths.join(";"),
        lib_paths: lib_paths.join(";"),
        pp_defs: env.values("DEFINES").join(";"),
        pch: pch.as_deref(),
        generator_settings: &generator_settings,
    };

    let guid = match env.joined("GUID") {
        g if g.is_empty() => generate_guid(rng),
        g => g,
    };
    let target = env.joined("TARGET");
    let out_dir = windows_path(&relpath::relative(&env.joined("DESTDIR"), proj_dir));
    let int_dir = windows_path(&relpath::relative(&env.joined("OBJECTS_DIR"), proj_dir));

    let mut project = Element::new("Project")
        .attr("DefaultTargets", "Build")
        .attr("ToolsVersion", "4.0")
        .attr("xmlns", MSBUILD_NS)
        .child(Element::new("ItemGroup").attr("Label", "ProjectConfigurations").children(
            Config::ALL.map(|c| {
                Element::new("ProjectConfiguration")
                    .attr("Include", format!("{}|Win32", c.name()))
                    .child(Element::text("Configuration", c.name()))
                    .child(Element::text("Platform", "Win32"))
            }),
        ))
        .child(
            Element::new("PropertyGroup")
                .attr("Label", "Globals")
                .child(Element::text("ProjectGuid", guid))
                .child(Element::text("Keyword", "Win32Proj"))
                .child(Element::text("RootNamespace", relpath::file_stem(&env.joined(ROOT_FILE)))),
        )
        .child(import("$(VCTargetsPath)\\Microsoft.Cpp.Default.props"))
        .children(Config::ALL.map(configuration_group))
        .child(import("$(VCTargetsPath)\\Microsoft.Cpp.props"))
        .child(Element::new("ImportGroup").attr("Label", "ExtensionSettings"))
        .children(Config::ALL.map(|c| {
            Element::new("ImportGroup")
                .attr("Label", "PropertySheets")
                .attr("Condition", c.condition())
                .child(
                    import(USER_PROPS)
                        .attr("Condition", format!("exists('{USER_PROPS}')"))
                        .attr("Label", "LocalAppDataPlatform"),
                )
        }))
        .child(Element::empty("PropertyGroup").attr("Label", "UserMacros"));

    for c in Config::ALL {
        let mut group = Element::new("PropertyGroup")
            .attr("Condition", c.condition())
            .child(Element::text("LinkIncremental", (c == Config::Debug).to_string()))
            .child(Element::text("OutDir", out_dir.as_str()))
            .child(Element::text("IntDir", int_dir.as_str()));
        if !target.is_empty() {
            group.push(Element::text("TargetName", target.as_str()));
        }
        project.push(group);
    }

    let project = project
        .children(Config::ALL.map(|c| shared.item_definition_group(c, &debug_libs, &release_libs)))
        .child(Element::new("ItemGroup").children(items.files))
        .child(import("$(VCTargetsPath)\\Microsoft.Cpp.targets"))
        .child(
            Element::new("ImportGroup").attr("Label", "ExtensionTargets").children(
                EXTENSION_TARGETS
                    .iter()
                    .map(|t| import(format!("{}\\{t}.targets", settings.targets_dir))),
            ),
        );

    let filters = Element::new("Project")
        .attr("ToolsVersion", "4.0")
        .attr("xmlns", MSBUILD_NS)
        .child(
            Element::new("ItemGroup")
                .children(items.filter_items)
                .children(items.filters.iter().map(|f| Element::empty("Filter").attr("Include", f.as_str()))),
        );

    debug!(
        project = proj_file,
        filters = items.filters.len(),
        helpers = helper_files.len(),
        "synthesized"
    );

    ProjectDocuments {
        project_path: proj_file.to_owned(),
        project: render_document(&project),
        filters_path: format!("{proj_file}{}", settings.filters_suffix),
        filters: render_document(&filters),
        helper_files,
    }
}

fn import(project: impl Into<String>) -> Element {
    Element::empty("Import").attr("Project", project)
}

fn configuration_group(c: Config) -> Element {
    let mut group = Element::new("PropertyGroup")
        .attr("Condition", c.condition())
        .attr("Label", "Configuration")
        .child(Element::text("ConfigurationType", "Application"))
        .child(Element::text("UseDebugLibraries", (c == Config::Debug).to_string()))
        .child(Element::text("PlatformToolset", "v100"));
    if c == Config::Release {
        group.push(Element::text("WholeProgramOptimization", "true"));
    }
    group.child(Element::text("CharacterSet", "Unicode"))
}

/// Settings repeated in both `ItemDefinitionGroup`s.
struct Shared<'a> {
    include_paths: String,
    lib_paths: String,
    pp_defs: String,
    pch: Option<&'a str>,
    generator_settings: &'a [Element],
}

impl Shared<'_> {
    fn pch_settings(&self) -> Vec<Element> {
        match self.pch {
            Some(pch) => vec![
                Element::text("PrecompiledHeader", "Use"),
                Element::text("PrecompiledHeaderFile", pch),
                Element::text("ForcedIncludeFiles", pch),
            ],
            None => Vec::new(),
        }
    }

    fn item_definition_group(&self, c: Config, debug_libs: &[String], release_libs: &[String]) -> Element {
        let include = Element::text("AdditionalIncludeDirectories", self.include_paths.as_str());
        let warning = Element::text("WarningLevel", "Level3");

        let (compile, link) = match c {
            Config::Debug => (
                Element::new("ClCompile")
                    .child(include)
                    .children(self.pch_settings())
                    .child(warning)
                    .child(Element::text("Optimization", "Disabled"))
                    .child(self.defines("_DEBUG")),
                Element::new("Link")
                    .child(Element::text("AdditionalDependencies", debug_libs.join(";")))
                    .child(Element::text("AdditionalLibraryDirectories", self.lib_paths.as_str()))
                    .child(Element::text("SubSystem", "Console"))
                    .child(Element::text("GenerateDebugInformation", "true")),
            ),
            Config::Release => (
                Element::new("ClCompile")
                    .child(include)
                    .child(warning)
                    .children(self.pch_settings())
                    .child(Element::text("Optimization", "MaxSpeed"))
                    .child(Element::text("FunctionLevelLinking", "true"))
                    .child(Element::text("IntrinsicFunctions", "true"))
                    .child(self.defines("NDEBUG")),
                Element::new("Link")
                    .child(Element::text("AdditionalDependencies", release_libs.join(";")))
                    .child(Element::text("AdditionalLibraryDirectories", self.lib_paths.as_str()))
                    .child(Element::text("SubSystem", "Console"))
                    .child(Element::text("GenerateDebugInformation", "true"))
                    .child(Element::text("EnableCOMDATFolding", "true"))
                    .child(Element::text("OptimizeReferences", "true")),
            ),
        };

        Element::new("ItemDefinitionGroup")
            .attr("Condition", c.condition())
            .child(compile)
            .child(link)
            .children(self.generator_settings.iter().cloned())
    }

    fn defines(&self, build: &str) -> Element {
        Element::text(
            "PreprocessorDefinitions",
            format!("{};WIN32;{build};_CONSOLE;%(PreprocessorDefinitions)", self.pp_defs),
        )
    }
}

/// Store the documents and helper files produced by [`synthesize`].
pub fn write_project(host: &dyn Host, docs: &ProjectDocuments) -> Result<()> {
    let files = [(&docs.project_path, &docs.project), (&docs.filters_path, &docs.filters)];
    let helpers = docs.helper_files.iter().map(|(p, c)| (p, c));
    for (path, contents) in helpers.chain(files) {
        host.write(path, contents).map_err(|source| Error::Io { path: path.clone(), source })?;
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
