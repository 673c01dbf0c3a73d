//! Generated translation units: embedded data files and the PCH wrapper.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::project::BuildType;
use crate::util::fs::write_string;

const BYTES_PER_ROW: usize = 16;

/// Turn a relative path into a C identifier: every character that is not
/// ASCII alphanumeric becomes `_`, and a leading digit gets a `_` prefix.
pub fn symbolise(rel: &Path) -> String {
    let text = portable(rel);
    let mut symbol: String = text
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if symbol.starts_with(|c: char| c.is_ascii_digit()) {
        symbol.insert(0, '_');
    }
    symbol
}

/// Where the generated source for data file `rel` (relative to the project
/// root) is written.
pub fn data_source_path(project_root: &Path, build_type: BuildType, rel: &Path) -> PathBuf {
    let mut name = rel.as_os_str().to_os_string();
    name.push(".cc");
    project_root
        .join(crate::core::project::OBJ_DIR)
        .join(build_type.dir_name())
        .join(name)
}

/// C++ source defining `<symbol>[]` and `size_<symbol>` for `bytes`.
pub fn render_data_source(rel: &Path, bytes: &[u8]) -> String {
    let name = symbolise(rel);
    let mut out = String::with_capacity(256 + bytes.len() * 6);

    out.push_str("// Data file generated by Forge.\n");
    out.push_str("//\n");
    let _ = writeln!(out, "// Source: {}", portable(rel));
    out.push('\n');
    out.push_str("#include <cstdint>\n");
    out.push('\n');
    let _ = writeln!(out, "extern const uint8_t {}[];", name);
    let _ = writeln!(out, "extern const uint64_t size_{};", name);
    out.push('\n');
    let _ = writeln!(out, "const uint64_t size_{} = {};", name, bytes.len());
    let _ = writeln!(out, "const uint8_t {}[] = ", name);
    out.push_str("{\n");

    for row in bytes.chunks(BYTES_PER_ROW) {
        out.push_str("    ");
        for byte in row {
            let _ = write!(out, "0x{:02x}, ", byte);
        }
        out.push('\n');
    }

    out.push_str("};\n");
    out
}

/// Read `raw` and write its generated source to `generated`.
pub fn write_data_source(raw: &Path, rel: &Path, generated: &Path) -> Result<()> {
    let bytes =
        std::fs::read(raw).with_context(|| format!("failed to read data file: {}", raw.display()))?;
    write_string(generated, &render_data_source(rel, &bytes))
}

/// The wrapper translation unit compiled to create the precompiled header.
pub fn render_pch_wrapper(header: &str) -> String {
    format!(
        "// PCH wrapper generated by Forge.\n\n#include <{}>\n",
        header
    )
}

pub fn write_pch_wrapper(wrapper: &Path, header: &str) -> Result<()> {
    write_string(wrapper, &render_pch_wrapper(header))
}

fn portable(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}
