//! `compile_commands.json` emission for editors and language servers.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::context::BuildContext;
use crate::builder::plan::ProjectPlan;
use crate::util::fs::write_string;

/// compile_commands.json entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct CompileCommand {
    pub directory: String,
    pub file: String,
    pub arguments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// One entry per unit of every plan, whether stale or not.
pub fn compile_commands(ctx: &BuildContext, plans: &[ProjectPlan]) -> Vec<CompileCommand> {
    plans
        .iter()
        .flat_map(|plan| {
            plan.units.iter().map(move |unit| {
                let input = plan.compile_input(unit);
                let spec = ctx
                    .toolchain()
                    .compile_command(&input, unit.lang, ctx.build_type);

                let mut arguments = Vec::with_capacity(spec.args.len() + 1);
                arguments.push(spec.program.display().to_string());
                arguments.extend(spec.args);

                CompileCommand {
                    directory: plan.root.display().to_string(),
                    file: unit.source.display().to_string(),
                    arguments,
                    output: Some(unit.object.display().to_string()),
                }
            })
        })
        .collect()
}

/// Write the entries for `plans` to `path`.
pub fn emit_compile_commands(ctx: &BuildContext, plans: &[ProjectPlan], path: &Path) -> Result<()> {
    let commands = compile_commands(ctx, plans);
    let json = serde_json::to_string_pretty(&commands)
        .context("failed to serialize compile commands")?;
    write_string(path, &json)?;
    tracing::debug!("wrote {} compile commands to {}", commands.len(), path.display());
    Ok(())
}
