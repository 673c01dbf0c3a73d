//! cl.exe, lib.exe and link.exe.

use std::path::Path;

use crate::core::project::{BuildType, SubsystemKind};

use super::{
    ArchiveInput, CommandSpec, CompileInput, Language, LinkInput, PchLayout, PchMode, Toolchain,
    ToolchainInfo,
};

/// Microsoft's compiler, run from an already configured developer prompt.
#[derive(Debug, Clone)]
pub struct MsvcToolchain {
    info: ToolchainInfo,
}

impl MsvcToolchain {
    pub fn new(info: ToolchainInfo) -> Self {
        MsvcToolchain { info }
    }

    fn link_inputs(&self, cmd: CommandSpec, input: &LinkInput) -> CommandSpec {
        cmd.args(input.objects.iter().chain(&input.lib_files).map(|p| p.display().to_string()))
            .args(self.info.system_lib_dirs.iter().map(|d| format!("/LIBPATH:{}", d.display())))
            .args(input.libs.iter().map(|lib| {
                if lib.ends_with(".lib") {
                    lib.clone()
                } else {
                    format!("{}.lib", lib)
                }
            }))
            .args(input.ldflags.iter().cloned())
            .produces(&input.output)
    }
}

impl Toolchain for MsvcToolchain {
    fn info(&self) -> &ToolchainInfo {
        &self.info
    }

    fn compile_command(
        &self,
        input: &CompileInput,
        lang: Language,
        build_type: BuildType,
    ) -> CommandSpec {
        let lang_flags: &[&str] = match lang {
            Language::Cxx => &["/TP", "/std:c++17", "/EHsc"],
            Language::C => &["/TC"],
        };
        // Debug info goes into the object so parallel compiles never share
        // a .pdb
        let build_flags: &[&str] = match build_type {
            BuildType::Debug => &["/Z7", "/Od", "/MDd"],
            BuildType::Release => &["/O2", "/MD"],
        };

        // cl.exe handles both languages
        let mut cmd = CommandSpec::new(&self.info.cc)
            .args(["/nologo", "/c"])
            .args(lang_flags.iter().copied())
            .args(build_flags.iter().copied());

        if let Some(pch) = &input.pch {
            let flag = match pch.mode {
                PchMode::Create => "/Yc",
                PchMode::Use => "/Yu",
            };
            cmd = cmd
                .arg(format!("{}{}", flag, pch.header))
                .arg(format!("/Fp{}", pch.pch_file.display()));
        }

        cmd.args(
            input
                .include_dirs
                .iter()
                .chain(&self.info.system_include_dirs)
                .map(|dir| format!("/I{}", dir.display())),
        )
        .args(input.defines.iter().map(|(name, value)| match value {
            Some(v) => format!("/D{}={}", name, v),
            None => format!("/D{}", name),
        }))
        .arg(input.source.display().to_string())
        .arg(format!("/Fo{}", input.output.display()))
        .produces(&input.output)
    }

    fn archive_command(&self, input: &ArchiveInput) -> CommandSpec {
        CommandSpec::new(&self.info.archiver)
            .arg("/nologo")
            .arg(format!("/OUT:{}", input.output.display()))
            .args(input.objects.iter().map(|o| o.display().to_string()))
            .produces(&input.output)
    }

    fn link_shared_command(&self, input: &LinkInput, build_type: BuildType) -> CommandSpec {
        let cmd = CommandSpec::new(&self.info.linker)
            .args(["/nologo", "/DLL"])
            .args((build_type == BuildType::Debug).then_some("/DEBUG"))
            .arg(format!("/OUT:{}", input.output.display()))
            .arg(format!("/IMPLIB:{}", input.output.with_extension("lib").display()));

        self.link_inputs(cmd, input)
    }

    fn link_exe_command(&self, input: &LinkInput, build_type: BuildType) -> CommandSpec {
        let subsystem = match input.subsystem {
            SubsystemKind::Windowed => Some("/SUBSYSTEM:WINDOWS"),
            SubsystemKind::Console => Some("/SUBSYSTEM:CONSOLE"),
            SubsystemKind::NotApplicable => None,
        };
        let cmd = CommandSpec::new(&self.info.linker)
            .arg("/nologo")
            .args((build_type == BuildType::Debug).then_some("/DEBUG"))
            .args(subsystem)
            .arg(format!("/OUT:{}", input.output.display()));

        self.link_inputs(cmd, input)
    }

    fn pch_layout(&self, obj_dir: &Path, project_name: &str) -> PchLayout {
        PchLayout {
            wrapper: obj_dir.join("pch.cc"),
            output: obj_dir.join("pch.cc.obj"),
            pch_file: obj_dir.join(format!("{}.pch", project_name)),
            linkable: true,
        }
    }

    fn object_extension(&self) -> &str {
        "obj"
    }

    fn static_lib_extension(&self) -> &str {
        "lib"
    }

    fn shared_lib_extension(&self) -> &str {
        "dll"
    }

    fn exe_extension(&self) -> &str {
        "exe"
    }

    fn lib_prefix(&self) -> &str {
        ""
    }

    fn import_lib_extension(&self) -> Option<&str> {
        Some("lib")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::toolchain::{PchUsage, ToolchainPlatform};
    use std::path::PathBuf;

    fn toolchain() -> MsvcToolchain {
        MsvcToolchain::new(ToolchainInfo {
            platform: ToolchainPlatform::Msvc,
            cc: PathBuf::from("cl.exe"),
            cxx: PathBuf::from("cl.exe"),
            linker: PathBuf::from("link.exe"),
            archiver: PathBuf::from("lib.exe"),
            system_include_dirs: vec![PathBuf::from("C:/sdk/include")],
            system_lib_dirs: vec![PathBuf::from("C:/sdk/lib")],
        })
    }

    #[test]
    fn test_compile_command() {
        let input = CompileInput {
            source: PathBuf::from("src/main.cc"),
            output: PathBuf::from("_obj/release/src/main.cc.obj"),
            include_dirs: vec![PathBuf::from("src")],
            defines: vec![("NDEBUG".into(), None)],
            pic: false,
            pch: None,
        };
        let cmd = toolchain().compile_command(&input, Language::Cxx, BuildType::Release);

        assert_eq!(cmd.program, PathBuf::from("cl.exe"));
        assert_eq!(&cmd.args[..3], ["/nologo", "/c", "/TP"]);
        assert!(cmd.args.contains(&"/O2".to_string()));
        assert!(cmd.args.contains(&"/DNDEBUG".to_string()));
        let includes: Vec<_> = cmd.args.iter().filter(|a| a.starts_with("/I")).collect();
        assert_eq!(includes, ["/Isrc", "/IC:/sdk/include"]);
        assert_eq!(
            cmd.args.last().unwrap(),
            "/Fo_obj/release/src/main.cc.obj"
        );
    }

    #[test]
    fn test_pch_flags() {
        let tc = toolchain();
        let layout = tc.pch_layout(Path::new("_obj/debug"), "app");
        assert!(layout.linkable);
        assert_eq!(layout.pch_file, PathBuf::from("_obj/debug/app.pch"));

        let input = CompileInput {
            source: layout.wrapper.clone(),
            output: layout.output.clone(),
            include_dirs: Vec::new(),
            defines: Vec::new(),
            pic: false,
            pch: Some(PchUsage {
                mode: PchMode::Create,
                header: "common.h".into(),
                wrapper: layout.wrapper.clone(),
                pch_file: layout.pch_file.clone(),
            }),
        };
        let cmd = tc.compile_command(&input, Language::Cxx, BuildType::Debug);
        assert!(cmd.args.contains(&"/Yccommon.h".to_string()));
        assert!(cmd.args.contains(&"/Fp_obj/debug/app.pch".to_string()));
    }

    #[test]
    fn test_dll_link_writes_import_library() {
        let input = LinkInput {
            objects: vec![PathBuf::from("a.obj")],
            output: PathBuf::from("_bin/debug/render.dll"),
            lib_files: vec![PathBuf::from("../base/_bin/debug/base.lib")],
            libs: vec!["user32".into(), "gdi32.lib".into()],
            ldflags: Vec::new(),
            subsystem: SubsystemKind::NotApplicable,
            driver: Language::Cxx,
        };
        let cmd = toolchain().link_shared_command(&input, BuildType::Debug);

        assert!(cmd.args.contains(&"/DLL".to_string()));
        assert!(cmd.args.contains(&"/IMPLIB:_bin/debug/render.lib".to_string()));
        assert!(cmd.args.contains(&"user32.lib".to_string()));
        assert!(cmd.args.contains(&"gdi32.lib".to_string()));
        assert!(cmd.args.contains(&"/LIBPATH:C:/sdk/lib".to_string()));
    }

    #[test]
    fn test_windowed_subsystem() {
        let input = LinkInput {
            objects: vec![PathBuf::from("main.obj")],
            output: PathBuf::from("_bin/debug/app.exe"),
            lib_files: Vec::new(),
            libs: Vec::new(),
            ldflags: Vec::new(),
            subsystem: SubsystemKind::Windowed,
            driver: Language::Cxx,
        };
        let cmd = toolchain().link_exe_command(&input, BuildType::Release);
        assert!(cmd.args.contains(&"/SUBSYSTEM:WINDOWS".to_string()));
    }
}
