//! Build plan generation.
//!
//! A [`ProjectPlan`] is the decide phase of a project build: every
//! compilable unit with its verdict, plus what the link or archive step
//! would consume. Nothing is compiled or written while planning; the only
//! mutation is the include scan filling in node header sets.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::context::BuildContext;
use crate::builder::generated::data_source_path;
use crate::builder::staleness::{
    cheap_verdict, data_needs_regen, needs_link, pch_wrapper_needs_regen, unit_verdict, Reason,
    Verdict,
};
use crate::builder::toolchain::{CompileInput, Language, PchLayout, PchMode, PchUsage};
use crate::core::node::{is_c_source, Node, NodeKind};
use crate::core::project::{AppKind, BuildType, Define, Project, SubsystemKind};
use crate::core::workspace::{ProjectId, Workspace};
use crate::util::fs::relative_path;

/// What a compile unit was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// The generated wrapper that creates the precompiled header
    Pch,
    /// A source file from `src/` or `test/`
    Source,
    /// Generated source embedding a file from `data/`
    Data,
}

/// One translation unit and the decision about it.
#[derive(Debug, Clone)]
pub struct CompileUnit {
    pub kind: UnitKind,
    /// The scanned leaf: source file, raw data file or PCH header
    pub origin: PathBuf,
    /// File handed to the compiler
    pub source: PathBuf,
    /// Output of compiling `source`
    pub object: PathBuf,
    pub lang: Language,
    pub verdict: Verdict,
    /// `source` is generated and must be rewritten before compiling
    pub regenerate: bool,
    /// Compile with the project's precompiled header
    pub uses_pch: bool,
    /// `object` goes into the link or archive step
    pub linkable: bool,
}

impl CompileUnit {
    pub fn is_stale(&self) -> bool {
        self.verdict.is_build()
    }

    /// Path relative to the project root, for status lines.
    pub fn display_name(&self, root: &Path) -> String {
        relative_path(root, &self.origin)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

/// How the project's objects are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Archive,
    Shared,
    Executable,
}

impl LinkKind {
    fn for_app(kind: AppKind) -> Self {
        match kind {
            AppKind::Executable => LinkKind::Executable,
            AppKind::StaticLibrary => LinkKind::Archive,
            AppKind::DynamicLibrary => LinkKind::Shared,
        }
    }
}

/// Inputs of the link or archive step.
#[derive(Debug, Clone)]
pub struct LinkPlan {
    pub kind: LinkKind,
    pub output: PathBuf,
    pub objects: Vec<PathBuf>,
    /// Dependency libraries, dependents first
    pub lib_files: Vec<PathBuf>,
    /// `build.libs` of this project and its dependencies
    pub libs: Vec<String>,
    pub ldflags: Vec<String>,
    pub subsystem: SubsystemKind,
    pub driver: Language,
    /// Shared libraries copied next to the output so it can run
    pub runtime_files: Vec<PathBuf>,
}

impl LinkPlan {
    /// Whether the step must run after `compiled` units were rebuilt.
    pub fn is_needed(&self, compiled: usize) -> bool {
        needs_link(&self.output, compiled, &self.lib_files)
    }
}

/// Decide phase result for one project (or its test executable).
#[derive(Debug, Clone)]
pub struct ProjectPlan {
    pub id: ProjectId,
    pub name: String,
    pub root: PathBuf,
    pub include_dirs: Vec<PathBuf>,
    pub defines: Vec<Define>,
    /// Compile position-independent code (library projects)
    pub pic: bool,
    /// Precompiled header settings shared by the units that use it
    pub pch: Option<PchUsage>,
    /// Units in compile order; the PCH unit, if any, is first
    pub units: Vec<CompileUnit>,
    pub link: LinkPlan,
}

impl ProjectPlan {
    /// Plan the main artifact of project `id`.
    pub fn for_project(ws: &mut Workspace, id: ProjectId, ctx: &BuildContext) -> Result<Self> {
        let include_dirs = ws.include_dirs(id)?;
        let link = link_plan(ws, id, ctx, false)?;
        let project = ws.project_mut(id);
        let defines = defines_for(project, ctx.build_type);
        let pic = project.kind.is_library();

        let mut units = Vec::new();

        let pch = match project.pch_header().map(str::to_string) {
            Some(header) => {
                let layout = ctx
                    .toolchain()
                    .pch_layout(&project.obj_dir(ctx.build_type), &project.name);
                units.push(pch_unit(project, &header, &layout, &include_dirs));
                Some(PchUsage {
                    mode: PchMode::Use,
                    header,
                    wrapper: layout.wrapper,
                    pch_file: layout.pch_file,
                })
            }
            None => None,
        };
        let pch_rebuilt = units.first().is_some_and(CompileUnit::is_stale);

        let root = project.root.clone();
        let obj_dir = project.obj_dir(ctx.build_type);
        let obj_ext = ctx.toolchain().object_extension().to_string();
        let build_type = ctx.build_type;
        let has_pch = pch.is_some();

        for folder in project
            .root_node
            .children
            .iter_mut()
            .filter(|f| matches!(f.kind, NodeKind::SourceFolder | NodeKind::DataFolder))
        {
            folder.visit_leaves_mut(|leaf| match leaf.kind {
                NodeKind::SourceFile => {
                    let object = object_path(&obj_dir, &root, &leaf.path, &obj_ext);
                    let mut unit = source_unit(leaf, object, &include_dirs);
                    if has_pch && unit.lang == Language::Cxx {
                        unit.uses_pch = true;
                        if pch_rebuilt && !unit.is_stale() {
                            unit.verdict = Verdict::Build(Reason::PrecompiledHeader);
                        }
                    }
                    units.push(unit);
                }
                NodeKind::DataFile => {
                    units.push(data_unit(leaf, &root, build_type, &obj_ext));
                }
                _ => {}
            });
        }

        let mut link = link;
        link.objects = units
            .iter()
            .filter(|u| u.linkable)
            .map(|u| u.object.clone())
            .collect();

        Ok(ProjectPlan {
            id,
            name: ws.project(id).name.clone(),
            root,
            include_dirs,
            defines,
            pic,
            pch,
            units,
            link,
        })
    }

    /// Plan the test executable of library project `id` from its `test/`
    /// sources. Returns `None` when there are none.
    pub fn for_tests(ws: &mut Workspace, id: ProjectId, ctx: &BuildContext) -> Result<Option<Self>> {
        let include_dirs = ws.include_dirs(id)?;
        let mut link = link_plan(ws, id, ctx, true)?;
        let project = ws.project_mut(id);
        let defines = defines_for(project, ctx.build_type);

        let root = project.root.clone();
        let obj_dir = project.obj_dir(ctx.build_type);
        let obj_ext = ctx.toolchain().object_extension().to_string();

        let mut units = Vec::new();
        for folder in project
            .root_node
            .children
            .iter_mut()
            .filter(|f| f.kind == NodeKind::TestFolder)
        {
            folder.visit_leaves_mut(|leaf| {
                if leaf.kind == NodeKind::SourceFile {
                    let object = object_path(&obj_dir, &root, &leaf.path, &obj_ext);
                    units.push(source_unit(leaf, object, &include_dirs));
                }
            });
        }

        if units.is_empty() {
            return Ok(None);
        }

        link.objects = units.iter().map(|u| u.object.clone()).collect();

        Ok(Some(ProjectPlan {
            id,
            name: format!("{}_test", ws.project(id).name),
            root,
            include_dirs,
            defines,
            pic: false,
            pch: None,
            units,
            link,
        }))
    }

    /// Units that will be compiled, in order.
    pub fn stale_units(&self) -> impl Iterator<Item = &CompileUnit> {
        self.units.iter().filter(|u| u.is_stale())
    }

    pub fn stale_count(&self) -> usize {
        self.stale_units().count()
    }

    /// Compiler input for `unit`.
    pub fn compile_input(&self, unit: &CompileUnit) -> CompileInput {
        let pch = match (&self.pch, unit.kind) {
            (Some(usage), UnitKind::Pch) => Some(PchUsage {
                mode: PchMode::Create,
                ..usage.clone()
            }),
            (Some(usage), _) if unit.uses_pch => Some(usage.clone()),
            _ => None,
        };

        CompileInput {
            source: unit.source.clone(),
            output: unit.object.clone(),
            include_dirs: self.include_dirs.clone(),
            defines: self.defines.clone(),
            pic: self.pic,
            pch,
        }
    }
}

/// `_obj/<type>/<path relative to root>.<ext>`
pub fn object_path(obj_dir: &Path, root: &Path, source: &Path, ext: &str) -> PathBuf {
    let mut name = relative_path(root, source).into_os_string();
    name.push(".");
    name.push(ext);
    obj_dir.join(name)
}

fn source_unit(leaf: &mut Node, object: PathBuf, include_dirs: &[PathBuf]) -> CompileUnit {
    let verdict = unit_verdict(leaf, &object, include_dirs);
    CompileUnit {
        kind: UnitKind::Source,
        origin: leaf.path.clone(),
        source: leaf.path.clone(),
        object,
        lang: if is_c_source(&leaf.path) {
            Language::C
        } else {
            Language::Cxx
        },
        verdict,
        regenerate: false,
        uses_pch: false,
        linkable: true,
    }
}

fn data_unit(leaf: &Node, root: &Path, build_type: BuildType, obj_ext: &str) -> CompileUnit {
    let rel = relative_path(root, &leaf.path);
    let generated = data_source_path(root, build_type, &rel);
    let mut object = generated.clone().into_os_string();
    object.push(".");
    object.push(obj_ext);
    let object = PathBuf::from(object);

    let regenerate = data_needs_regen(&leaf.path, &generated);
    let verdict = if regenerate {
        Verdict::Build(Reason::Regenerated)
    } else {
        cheap_verdict(&generated, &object).unwrap_or(Verdict::Skip)
    };

    CompileUnit {
        kind: UnitKind::Data,
        origin: leaf.path.clone(),
        source: generated,
        object,
        lang: Language::Cxx,
        verdict,
        regenerate,
        uses_pch: false,
        linkable: true,
    }
}

fn pch_unit(
    project: &Project,
    header: &str,
    layout: &PchLayout,
    include_dirs: &[PathBuf],
) -> CompileUnit {
    let regenerate = pch_wrapper_needs_regen(&layout.wrapper, &project.manifest_path());
    let mut wrapper = Node::new(NodeKind::PchFile, &layout.wrapper);
    let verdict = if regenerate {
        Verdict::Build(Reason::Regenerated)
    } else {
        unit_verdict(&mut wrapper, &layout.output, include_dirs)
    };

    CompileUnit {
        kind: UnitKind::Pch,
        origin: project.src_dir().join(header),
        source: layout.wrapper.clone(),
        object: layout.output.clone(),
        lang: Language::Cxx,
        verdict,
        regenerate,
        uses_pch: false,
        linkable: layout.linkable,
    }
}

fn defines_for(project: &Project, build_type: BuildType) -> Vec<Define> {
    let mut defines = vec![match build_type {
        BuildType::Debug => ("_DEBUG".to_string(), None),
        BuildType::Release => ("NDEBUG".to_string(), None),
    }];
    defines.extend(project.defines.for_build(build_type));
    defines
}

/// Whether a project compiles any C++.
fn has_cxx(project: &Project) -> bool {
    project.pch_header().is_some()
        || project.root_node.leaves().any(|leaf| match leaf.kind {
            NodeKind::SourceFile => !is_c_source(&leaf.path),
            NodeKind::DataFile => true,
            _ => false,
        })
}

/// Link inputs for project `id`. With `tests` the output is the test
/// executable and the project's own library comes first on the link line.
fn link_plan(ws: &Workspace, id: ProjectId, ctx: &BuildContext, tests: bool) -> Result<LinkPlan> {
    let project = ws.project(id);
    let tc = ctx.toolchain();

    let mut linked: Vec<&Project> = Vec::new();
    if tests {
        linked.push(project);
    }
    // Dependents before their dependencies on the link line
    for dep in ws.transitive_deps(id)?.into_iter().rev() {
        let dep = ws.project(dep);
        if dep.kind.is_library() {
            linked.push(dep);
        } else {
            tracing::warn!(
                "`{}` depends on executable `{}`, which is not linked",
                project.name,
                dep.name
            );
        }
    }

    let (kind, output, subsystem) = if tests {
        (
            LinkKind::Executable,
            ctx.test_artifact_path(project),
            SubsystemKind::Console,
        )
    } else {
        (
            LinkKind::for_app(project.kind),
            ctx.artifact_path(project),
            project.subsystem,
        )
    };

    let mut lib_files = Vec::new();
    let mut libs = Vec::new();
    let mut runtime_files = Vec::new();
    let mut runtime_dirs = Vec::new();
    let mut seen_libs = HashSet::new();

    for extra in project.extra_libs() {
        if seen_libs.insert(extra.clone()) {
            libs.push(extra);
        }
    }

    // An archive does not carry its dependencies; they are linked into the
    // final executable or shared library instead.
    if kind != LinkKind::Archive {
        for lib in &linked {
            lib_files.push(ctx.link_file(lib));
            for extra in lib.extra_libs() {
                if seen_libs.insert(extra.clone()) {
                    libs.push(extra);
                }
            }
            if lib.kind == AppKind::DynamicLibrary {
                runtime_files.push(ctx.artifact_path(lib));
                runtime_dirs.push(lib.bin_dir(ctx.build_type));
            }
        }
    }

    let driver = if has_cxx(project) || linked.iter().any(|p| has_cxx(p)) {
        Language::Cxx
    } else {
        Language::C
    };

    Ok(LinkPlan {
        kind,
        output,
        objects: Vec::new(),
        lib_files,
        libs,
        ldflags: tc.runtime_search_flags(&runtime_dirs),
        subsystem,
        driver,
        runtime_files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        build_context, dll_manifest, exe_manifest, lib_manifest, set_mtime, TestDir,
    };

    #[test]
    fn test_first_build_compiles_everything() {
        let dir = TestDir::new();
        let root = dir.project("app", &exe_manifest("app", &[]));
        dir.file("app/src/main.cc", "int main() {}\n");
        dir.file("app/src/util.c", "");
        dir.file("app/data/logo.png", "png");

        let mut ws = Workspace::load(&root).unwrap();
        let ctx = build_context(BuildType::Debug);
        let id = ws.requested_id();
        let plan = ProjectPlan::for_project(&mut ws, id, &ctx).unwrap();

        assert_eq!(plan.units.len(), 3);
        assert_eq!(plan.stale_count(), 3);
        let kinds: Vec<_> = plan.units.iter().map(|u| u.kind).collect();
        assert_eq!(kinds, vec![UnitKind::Source, UnitKind::Source, UnitKind::Data]);

        let ws_root = ws.root().to_path_buf();
        assert_eq!(
            plan.units[0].object,
            ws_root.join("_obj/debug/src/main.cc.obj")
        );
        assert_eq!(plan.units[1].lang, Language::C);
        assert_eq!(
            plan.units[2].source,
            ws_root.join("_obj/debug/data/logo.png.cc")
        );
        assert!(plan.units[2].regenerate);
        assert_eq!(plan.link.kind, LinkKind::Executable);
        assert_eq!(plan.link.objects.len(), 3);
        assert!(plan.link.is_needed(0));
    }

    #[test]
    fn test_up_to_date_units_are_skipped() {
        let dir = TestDir::new();
        let root = dir.project("app", &exe_manifest("app", &[]));
        let src = dir.file("app/src/main.cc", "");
        let obj = dir.file("app/_obj/release/src/main.cc.obj", "");
        let exe = dir.file("app/_bin/release/app.exe", "");
        set_mtime(&src, 100);
        set_mtime(&obj, 200);
        set_mtime(&exe, 300);

        let mut ws = Workspace::load(&root).unwrap();
        let ctx = build_context(BuildType::Release);
        let id = ws.requested_id();
        let plan = ProjectPlan::for_project(&mut ws, id, &ctx).unwrap();

        assert_eq!(plan.stale_count(), 0);
        assert!(!plan.link.is_needed(0));
        assert!(plan.defines.contains(&("NDEBUG".to_string(), None)));
    }

    #[test]
    fn test_link_line_lists_dependents_first() {
        let dir = TestDir::new();
        let root = dir.project("app", &exe_manifest("app", &[("gfx", "../gfx")]));
        dir.project(
            "gfx",
            "[info]\nname = gfx\ntype = lib\n\n[build]\nlibs = opengl32\n\n[dependencies]\nlocal:base = ../base\n",
        );
        dir.project("base", &lib_manifest("base", &[]));
        dir.file("app/src/main.c", "");

        let mut ws = Workspace::load(&root).unwrap();
        let ctx = build_context(BuildType::Debug);
        let id = ws.requested_id();
        let plan = ProjectPlan::for_project(&mut ws, id, &ctx).unwrap();

        let names: Vec<_> = plan
            .link
            .lib_files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["gfx.lib", "base.lib"]);
        assert_eq!(plan.link.libs, vec!["opengl32".to_string()]);
        assert_eq!(plan.link.driver, Language::C);
    }

    #[test]
    fn test_library_units_compile_position_independent() {
        let dir = TestDir::new();
        let root = dir.project("app", &exe_manifest("app", &[("gfx", "../gfx")]));
        dir.project("gfx", &dll_manifest("gfx", &[]));
        dir.file("app/src/main.cc", "");
        dir.file("gfx/src/gfx.cc", "int counter;\n");

        let mut ws = Workspace::load(&root).unwrap();
        let ctx = build_context(BuildType::Debug);
        let app = ws.requested_id();
        let gfx = ws.build_order(app).unwrap()[0];

        let dll = ProjectPlan::for_project(&mut ws, gfx, &ctx).unwrap();
        assert_eq!(dll.link.kind, LinkKind::Shared);
        assert!(dll.compile_input(&dll.units[0]).pic);

        let exe = ProjectPlan::for_project(&mut ws, app, &ctx).unwrap();
        assert!(!exe.compile_input(&exe.units[0]).pic);
    }

    #[test]
    fn test_archive_does_not_link_dependencies() {
        let dir = TestDir::new();
        let root = dir.project("gfx", &lib_manifest("gfx", &[("base", "../base")]));
        dir.project("base", &lib_manifest("base", &[]));
        dir.file("gfx/src/gfx.cc", "");

        let mut ws = Workspace::load(&root).unwrap();
        let ctx = build_context(BuildType::Debug);
        let id = ws.requested_id();
        let plan = ProjectPlan::for_project(&mut ws, id, &ctx).unwrap();
        assert_eq!(plan.link.kind, LinkKind::Archive);
        assert!(plan.link.lib_files.is_empty());
    }

    #[test]
    fn test_pch_unit_comes_first_and_forces_users() {
        let dir = TestDir::new();
        let root = dir.project(
            "app",
            "[info]\nname = app\ntype = exe\n\n[build]\npch = pch.h\n",
        );
        let header = dir.file("app/src/pch.h", "#pragma once\n");
        let src = dir.file("app/src/main.cc", "#include \"pch.h\"\n");
        let c_src = dir.file("app/src/legacy.c", "");
        let obj = dir.file("app/_obj/debug/src/main.cc.obj", "");
        let c_obj = dir.file("app/_obj/debug/src/legacy.c.obj", "");
        for path in [&header, &src, &c_src] {
            set_mtime(path, 100);
        }
        set_mtime(&obj, 200);
        set_mtime(&c_obj, 200);

        let mut ws = Workspace::load(&root).unwrap();
        let ctx = build_context(BuildType::Debug);
        let id = ws.requested_id();
        let plan = ProjectPlan::for_project(&mut ws, id, &ctx).unwrap();

        assert_eq!(plan.units[0].kind, UnitKind::Pch);
        assert!(plan.units[0].regenerate);
        let src = src.canonicalize().unwrap();
        let main = plan.units.iter().find(|u| u.source == src).unwrap();
        assert!(main.uses_pch);
        assert_eq!(main.verdict, Verdict::Build(Reason::PrecompiledHeader));
        let legacy = plan.units.iter().find(|u| u.lang == Language::C).unwrap();
        assert!(!legacy.uses_pch);
        assert!(!legacy.is_stale());

        let input = plan.compile_input(&plan.units[0]);
        assert_eq!(input.pch.unwrap().mode, PchMode::Create);
        let input = plan.compile_input(main);
        assert_eq!(input.pch.unwrap().mode, PchMode::Use);
    }

    #[test]
    fn test_test_plan_links_the_library_first() {
        let dir = TestDir::new();
        let root = dir.project("core", &lib_manifest("core", &[("base", "../base")]));
        dir.project("base", &lib_manifest("base", &[]));
        dir.file("core/src/core.cc", "");
        dir.file("core/test/test_main.cc", "");

        let mut ws = Workspace::load(&root).unwrap();
        let ctx = build_context(BuildType::Debug);
        let id = ws.requested_id();
        let plan = ProjectPlan::for_tests(&mut ws, id, &ctx)
            .unwrap()
            .unwrap();

        assert_eq!(plan.name, "core_test");
        assert_eq!(plan.units.len(), 1);
        assert!(plan.units[0].object.ends_with("_obj/debug/test/test_main.cc.obj"));
        assert!(plan.link.output.ends_with("_bin/debug/core_test.exe"));
        let names: Vec<_> = plan
            .link
            .lib_files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["core.lib", "base.lib"]);
    }

    #[test]
    fn test_no_test_sources() {
        let dir = TestDir::new();
        let root = dir.project("core", &lib_manifest("core", &[]));
        dir.file("core/src/core.cc", "");

        let mut ws = Workspace::load(&root).unwrap();
        let ctx = build_context(BuildType::Debug);
        let id = ws.requested_id();
        assert!(ProjectPlan::for_tests(&mut ws, id, &ctx)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_object_path_mirrors_source_tree() {
        let obj = object_path(
            Path::new("/p/_obj/debug"),
            Path::new("/p"),
            Path::new("/p/src/gfx/draw.cc"),
            "o",
        );
        assert_eq!(obj, PathBuf::from("/p/_obj/debug/src/gfx/draw.cc.o"));
    }
}
