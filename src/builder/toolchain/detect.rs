//! Locating a compiler, archiver and linker on the host.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use which::which;

use crate::util::config::Config;

use super::{GccToolchain, MsvcToolchain, Toolchain, ToolchainInfo, ToolchainPlatform};

/// Find a usable toolchain, trying in order:
/// 1. Tool config (`.forge/config.toml` or `~/.forge/config.toml`)
/// 2. Environment variables (CC, CXX, AR)
/// 3. On Windows: cl.exe from a Developer Command Prompt
/// 4. cc/gcc/clang plus ar from PATH
pub fn detect_toolchain(config: &Config) -> Result<Box<dyn Toolchain>> {
    if config.has_toolchain_overrides() {
        if let Some(toolchain) = try_detect_from_config(config)? {
            return Ok(toolchain);
        }
    }

    if cfg!(windows) && std::env::var_os("CC").is_none() {
        if let Some(toolchain) = try_detect_msvc()? {
            return Ok(toolchain);
        }
    }

    if let Some(toolchain) = try_detect_gcc()? {
        return Ok(toolchain);
    }

    bail!(
        "no C/C++ compiler found\n\
         \n\
         Install gcc, clang or MSVC, point CC/CXX at one, or set\n\
         `[toolchain]` in ~/.forge/config.toml."
    )
}

/// `[toolchain]` from the config files. A configured compiler that does
/// not exist falls through to detection.
fn try_detect_from_config(config: &Config) -> Result<Option<Box<dyn Toolchain>>> {
    let tc = &config.toolchain;

    let cc = match &tc.cc {
        Some(cc) if cc.exists() => cc.clone(),
        Some(cc) => {
            tracing::warn!("configured compiler {} does not exist", cc.display());
            return Ok(None);
        }
        None => return Ok(None),
    };

    let cxx = tc
        .cxx
        .clone()
        .filter(|p| p.exists())
        .or_else(|| std::env::var_os("CXX").map(PathBuf::from))
        .unwrap_or_else(|| GccToolchain::infer_cxx(&cc));

    let ar = tc
        .ar
        .clone()
        .filter(|p| p.exists())
        .or_else(|| find_tool("AR", &["ar", "llvm-ar"]));
    let Some(ar) = ar else {
        tracing::warn!("no archiver to go with {}", cc.display());
        return Ok(None);
    };

    let linker = tc.linker.clone().unwrap_or_else(|| cxx.clone());
    let platform = detect_compiler_family(&cc);

    tracing::debug!("configured toolchain: cc={} ar={}", cc.display(), ar.display());

    Ok(Some(Box::new(GccToolchain::new(ToolchainInfo {
        platform,
        cc,
        cxx,
        linker,
        archiver: ar,
        system_include_dirs: Vec::new(),
        system_lib_dirs: Vec::new(),
    }))))
}

/// Detect MSVC from an already configured Developer Command Prompt.
fn try_detect_msvc() -> Result<Option<Box<dyn Toolchain>>> {
    let Ok(cl) = which("cl") else {
        return Ok(None);
    };
    let (Some(include), Some(lib_env)) = (std::env::var_os("INCLUDE"), std::env::var_os("LIB"))
    else {
        tracing::debug!("cl.exe found but INCLUDE/LIB are not set");
        return Ok(None);
    };

    let (Ok(lib), Ok(link)) = (which("lib"), which("link")) else {
        bail!("`{}` is on PATH but lib.exe or link.exe is not", cl.display());
    };
    tracing::debug!("found MSVC: cl={}", cl.display());

    Ok(Some(Box::new(MsvcToolchain::new(ToolchainInfo {
        platform: ToolchainPlatform::Msvc,
        cc: cl.clone(),
        cxx: cl,
        linker: link,
        archiver: lib,
        system_include_dirs: split_path_list(&include.to_string_lossy()),
        system_lib_dirs: split_path_list(&lib_env.to_string_lossy()),
    }))))
}

/// `$env` if set, else the first of `candidates` found on `PATH`.
fn find_tool(env: &str, candidates: &[&str]) -> Option<PathBuf> {
    std::env::var_os(env)
        .map(PathBuf::from)
        .or_else(|| candidates.iter().find_map(|name| which(name).ok()))
}

/// A GCC-style driver from the environment or `PATH`.
fn try_detect_gcc() -> Result<Option<Box<dyn Toolchain>>> {
    let Some(cc) = find_tool("CC", &["cc", "gcc", "clang"]) else {
        return Ok(None);
    };
    let cxx = find_tool("CXX", &["c++", "g++", "clang++"])
        .unwrap_or_else(|| GccToolchain::infer_cxx(&cc));
    let Some(ar) = find_tool("AR", &["ar", "llvm-ar"]) else {
        return Ok(None);
    };

    let platform = detect_compiler_family(&cc);
    tracing::debug!(
        "found {} toolchain: cc={} cxx={} ar={}",
        platform.as_str(),
        cc.display(),
        cxx.display(),
        ar.display()
    );

    Ok(Some(Box::new(GccToolchain::new(ToolchainInfo {
        platform,
        linker: cxx.clone(),
        cc,
        cxx,
        archiver: ar,
        system_include_dirs: Vec::new(),
        system_lib_dirs: Vec::new(),
    }))))
}

/// Tell GCC from the clangs, by file name first and `--version` second.
fn detect_compiler_family(cc: &Path) -> ToolchainPlatform {
    let name = cc
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if name.contains("gcc") || name.contains("g++") {
        return ToolchainPlatform::Gcc;
    }

    let banner = version_banner(cc);
    if !name.contains("clang") && !banner.contains("clang") {
        ToolchainPlatform::Gcc
    } else if banner.contains("apple") {
        ToolchainPlatform::AppleClang
    } else {
        ToolchainPlatform::Clang
    }
}

/// Lower-cased `--version` output, empty if the compiler cannot be run.
fn version_banner(cc: &Path) -> String {
    std::process::Command::new(cc)
        .arg("--version")
        .output()
        .map(|out| String::from_utf8_lossy(&out.stdout).to_lowercase())
        .unwrap_or_default()
}

/// Split a `;`-separated directory list such as MSVC's INCLUDE.
fn split_path_list(value: &str) -> Vec<PathBuf> {
    value
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}
