//! GCC-style drivers: gcc, clang and MinGW.

use std::path::{Path, PathBuf};

use crate::core::project::{BuildType, SubsystemKind};

use super::{
    ArchiveInput, CommandSpec, CompileInput, Language, LinkInput, PchLayout, PchMode, Toolchain,
    ToolchainInfo,
};

/// GCC/Clang toolchain (Unix-like systems and MinGW).
#[derive(Debug, Clone)]
pub struct GccToolchain {
    info: ToolchainInfo,
}

impl GccToolchain {
    pub fn new(info: ToolchainInfo) -> Self {
        GccToolchain { info }
    }

    /// The C++ driver that pairs with a C driver: `gcc` becomes `g++`,
    /// `cc` becomes `c++`, anything else gets `++` appended.
    pub fn infer_cxx(cc: &Path) -> PathBuf {
        let Some(name) = cc.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            return cc.to_path_buf();
        };

        let cxx = if let Some(prefix) = name.strip_suffix("gcc") {
            format!("{}g++", prefix)
        } else if name == "cc" || name.ends_with("-cc") {
            format!("{}++", &name[..name.len() - 1])
        } else {
            format!("{}++", name)
        };
        cc.with_file_name(cxx)
    }

    fn driver(&self, lang: Language) -> &Path {
        match lang {
            Language::C => &self.info.cc,
            Language::Cxx => &self.info.linker,
        }
    }

    fn build_type_flags(build_type: BuildType) -> &'static [&'static str] {
        match build_type {
            BuildType::Debug => &["-g", "-O0"],
            BuildType::Release => &["-O2"],
        }
    }

    /// Shared tail of both link commands: objects, then dependency
    /// libraries, then search paths and named libraries.
    fn link_inputs(&self, cmd: CommandSpec, input: &LinkInput) -> CommandSpec {
        cmd.arg("-o")
            .arg(input.output.display().to_string())
            .args(input.objects.iter().chain(&input.lib_files).map(|p| p.display().to_string()))
            .args(self.info.system_lib_dirs.iter().map(|d| format!("-L{}", d.display())))
            .args(input.libs.iter().map(|lib| {
                format!("-l{}", lib.strip_suffix(".lib").unwrap_or(lib))
            }))
            .args(input.ldflags.iter().cloned())
            .produces(&input.output)
    }
}

impl Toolchain for GccToolchain {
    fn info(&self) -> &ToolchainInfo {
        &self.info
    }

    fn compile_command(
        &self,
        input: &CompileInput,
        lang: Language,
        build_type: BuildType,
    ) -> CommandSpec {
        let (compiler, std_flag) = match lang {
            Language::C => (&self.info.cc, None),
            Language::Cxx => (&self.info.cxx, Some("-std=c++17")),
        };

        let mut cmd = CommandSpec::new(compiler)
            .arg("-c")
            .args(Self::build_type_flags(build_type).iter().copied())
            .args(std_flag)
            .args((input.pic && !cfg!(windows)).then_some("-fPIC"));

        // The wrapper header sits next to its .gch, so -include picks up the
        // precompiled form.
        let pch_mode = input.pch.as_ref().map(|pch| pch.mode);
        if let Some(pch) = input.pch.as_ref().filter(|p| p.mode == PchMode::Use) {
            cmd = cmd.arg("-include").arg(pch.wrapper.display().to_string());
        }

        cmd = cmd
            .args(
                input
                    .include_dirs
                    .iter()
                    .chain(&self.info.system_include_dirs)
                    .map(|dir| format!("-I{}", dir.display())),
            )
            .args(input.defines.iter().map(|(name, value)| match value {
                Some(v) => format!("-D{}={}", name, v),
                None => format!("-D{}", name),
            }));

        if pch_mode == Some(PchMode::Create) {
            cmd = cmd.args(["-x", "c++-header"]);
        }

        cmd.arg(input.source.display().to_string())
            .arg("-o")
            .arg(input.output.display().to_string())
            .produces(&input.output)
    }

    fn archive_command(&self, input: &ArchiveInput) -> CommandSpec {
        // r: insert or replace, c: create silently, s: write the symbol index
        CommandSpec::new(&self.info.archiver)
            .arg("rcs")
            .arg(input.output.display().to_string())
            .args(input.objects.iter().map(|o| o.display().to_string()))
            .produces(&input.output)
    }

    fn link_shared_command(&self, input: &LinkInput, build_type: BuildType) -> CommandSpec {
        let mut cmd = CommandSpec::new(self.driver(input.driver));

        cmd = cmd.arg("-shared");
        if build_type == BuildType::Debug {
            cmd = cmd.arg("-g");
        }

        self.link_inputs(cmd, input)
    }

    fn link_exe_command(&self, input: &LinkInput, build_type: BuildType) -> CommandSpec {
        let mut cmd = CommandSpec::new(self.driver(input.driver));

        if build_type == BuildType::Debug {
            cmd = cmd.arg("-g");
        }
        if cfg!(windows) && input.subsystem == SubsystemKind::Windowed {
            cmd = cmd.arg("-mwindows");
        }

        self.link_inputs(cmd, input)
    }

    fn pch_layout(&self, obj_dir: &Path, _project_name: &str) -> PchLayout {
        let wrapper = obj_dir.join("pch.h");
        let gch = obj_dir.join("pch.h.gch");
        PchLayout {
            wrapper,
            output: gch.clone(),
            pch_file: gch,
            linkable: false,
        }
    }

    fn runtime_search_flags(&self, dirs: &[PathBuf]) -> Vec<String> {
        if cfg!(windows) {
            return Vec::new();
        }
        dirs.iter()
            .map(|dir| format!("-Wl,-rpath,{}", dir.display()))
            .collect()
    }

    fn object_extension(&self) -> &str {
        "o"
    }

    fn static_lib_extension(&self) -> &str {
        "a"
    }

    fn shared_lib_extension(&self) -> &str {
        if cfg!(target_os = "macos") {
            "dylib"
        } else if cfg!(windows) {
            "dll"
        } else {
            "so"
        }
    }

    fn exe_extension(&self) -> &str {
        if cfg!(windows) {
            "exe"
        } else {
            ""
        }
    }

    fn lib_prefix(&self) -> &str {
        "lib"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::toolchain::{PchUsage, ToolchainPlatform};

    fn toolchain() -> GccToolchain {
        GccToolchain::new(ToolchainInfo {
            platform: ToolchainPlatform::Gcc,
            cc: PathBuf::from("gcc"),
            cxx: PathBuf::from("g++"),
            linker: PathBuf::from("g++"),
            archiver: PathBuf::from("ar"),
            system_include_dirs: vec![PathBuf::from("/opt/sdk/include")],
            system_lib_dirs: Vec::new(),
        })
    }

    fn compile_input() -> CompileInput {
        CompileInput {
            source: PathBuf::from("src/main.cc"),
            output: PathBuf::from("_obj/debug/src/main.cc.o"),
            include_dirs: vec![PathBuf::from("src"), PathBuf::from("../base/inc")],
            defines: vec![("DEBUG".into(), None), ("LEVEL".into(), Some("2".into()))],
            pic: false,
            pch: None,
        }
    }

    #[test]
    fn test_infer_cxx() {
        assert_eq!(GccToolchain::infer_cxx(Path::new("gcc")), PathBuf::from("g++"));
        assert_eq!(
            GccToolchain::infer_cxx(Path::new("x86_64-linux-gnu-gcc")),
            PathBuf::from("x86_64-linux-gnu-g++")
        );
        assert_eq!(GccToolchain::infer_cxx(Path::new("clang")), PathBuf::from("clang++"));
        assert_eq!(
            GccToolchain::infer_cxx(Path::new("/usr/bin/cc")),
            PathBuf::from("/usr/bin/c++")
        );
    }

    #[test]
    fn test_compile_command_orders_include_paths() {
        let cmd = toolchain().compile_command(&compile_input(), Language::Cxx, BuildType::Debug);

        assert_eq!(cmd.program, PathBuf::from("g++"));
        assert_eq!(cmd.output, Some(PathBuf::from("_obj/debug/src/main.cc.o")));
        let includes: Vec<_> = cmd.args.iter().filter(|a| a.starts_with("-I")).collect();
        assert_eq!(includes, ["-Isrc", "-I../base/inc", "-I/opt/sdk/include"]);
        assert!(cmd.args.contains(&"-DDEBUG".to_string()));
        assert!(cmd.args.contains(&"-DLEVEL=2".to_string()));
        assert!(cmd.args.contains(&"-std=c++17".to_string()));
        assert!(cmd.args.contains(&"-O0".to_string()));
    }

    #[test]
    #[cfg(not(windows))]
    fn test_library_objects_are_position_independent() {
        let tc = toolchain();
        let plain = tc.compile_command(&compile_input(), Language::Cxx, BuildType::Debug);
        assert!(!plain.args.contains(&"-fPIC".to_string()));

        let mut input = compile_input();
        input.pic = true;
        let cmd = tc.compile_command(&input, Language::Cxx, BuildType::Debug);
        let pic = cmd.args.iter().position(|a| a == "-fPIC").unwrap();
        let source = cmd.args.iter().position(|a| a == "src/main.cc").unwrap();
        assert!(pic < source);
    }

    #[test]
    fn test_c_sources_use_c_compiler() {
        let mut input = compile_input();
        input.source = PathBuf::from("src/legacy.c");
        let cmd = toolchain().compile_command(&input, Language::C, BuildType::Release);

        assert_eq!(cmd.program, PathBuf::from("gcc"));
        assert!(!cmd.args.contains(&"-std=c++17".to_string()));
        assert!(cmd.args.contains(&"-O2".to_string()));
    }

    #[test]
    fn test_pch_create_and_use() {
        let tc = toolchain();
        let layout = tc.pch_layout(Path::new("_obj/debug"), "app");
        let usage = |mode| PchUsage {
            mode,
            header: "pch.h".into(),
            wrapper: layout.wrapper.clone(),
            pch_file: layout.pch_file.clone(),
        };

        let mut create = compile_input();
        create.source = layout.wrapper.clone();
        create.output = layout.output.clone();
        create.pch = Some(usage(PchMode::Create));
        let cmd = tc.compile_command(&create, Language::Cxx, BuildType::Debug);
        let x = cmd.args.iter().position(|a| a == "-x").unwrap();
        assert_eq!(cmd.args[x + 1], "c++-header");
        assert_eq!(cmd.output, Some(PathBuf::from("_obj/debug/pch.h.gch")));

        let mut use_pch = compile_input();
        use_pch.pch = Some(usage(PchMode::Use));
        let cmd = tc.compile_command(&use_pch, Language::Cxx, BuildType::Debug);
        let inc = cmd.args.iter().position(|a| a == "-include").unwrap();
        assert_eq!(cmd.args[inc + 1], "_obj/debug/pch.h");
        assert!(!layout.linkable);
    }

    #[test]
    fn test_link_places_dependency_libs_after_objects() {
        let input = LinkInput {
            objects: vec![PathBuf::from("main.o")],
            output: PathBuf::from("_bin/debug/app"),
            lib_files: vec![PathBuf::from("libgfx.a"), PathBuf::from("libbase.a")],
            libs: vec!["m".into(), "ws2_32.lib".into()],
            ldflags: Vec::new(),
            subsystem: SubsystemKind::Console,
            driver: Language::Cxx,
        };
        let cmd = toolchain().link_exe_command(&input, BuildType::Release);

        let pos = |s: &str| cmd.args.iter().position(|a| a == s).unwrap();
        assert!(pos("main.o") < pos("libgfx.a"));
        assert!(pos("libgfx.a") < pos("libbase.a"));
        assert!(pos("libbase.a") < pos("-lm"));
        assert!(cmd.args.contains(&"-lws2_32".to_string()));
    }

    #[test]
    fn test_archive_command() {
        let input = ArchiveInput {
            objects: vec![PathBuf::from("a.o"), PathBuf::from("b.o")],
            output: PathBuf::from("libbase.a"),
        };
        let cmd = toolchain().archive_command(&input);
        assert_eq!(cmd.program, PathBuf::from("ar"));
        assert_eq!(cmd.args, ["rcs", "libbase.a", "a.o", "b.o"]);
    }
}
