//! Native C/C++ compiler driver.
//!
//! Executes a [`ProjectPlan`]: regenerates generated sources, compiles the
//! precompiled header, compiles stale units in parallel and finally links or
//! archives.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::builder::context::BuildContext;
use crate::builder::generated::{write_data_source, write_pch_wrapper};
use crate::builder::plan::{CompileUnit, LinkKind, LinkPlan, ProjectPlan, UnitKind};
use crate::builder::toolchain::{ArchiveInput, LinkInput};
use crate::core::error::BuildError;
use crate::util::fs::{ensure_dir, ensure_parent, relative_path};
use crate::util::shell::Status;

/// What executing a plan did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectOutcome {
    /// Units compiled this run
    pub compiled: usize,
    /// Whether the link or archive step ran
    pub linked: bool,
    pub artifact: PathBuf,
}

impl ProjectOutcome {
    pub fn did_work(&self) -> bool {
        self.compiled > 0 || self.linked
    }
}

/// Native C/C++ builder.
pub struct NativeBuilder<'a> {
    ctx: &'a BuildContext,
}

impl<'a> NativeBuilder<'a> {
    pub fn new(ctx: &'a BuildContext) -> Self {
        NativeBuilder { ctx }
    }

    /// Execute the plan.
    ///
    /// The PCH unit runs on its own before anything else. The remaining
    /// stale units compile in parallel and the first failure aborts the
    /// project before it links.
    pub fn execute(&self, plan: &ProjectPlan) -> Result<ProjectOutcome> {
        let compiled = AtomicUsize::new(0);

        let (pch, units): (Vec<&CompileUnit>, Vec<&CompileUnit>) =
            plan.stale_units().partition(|u| u.kind == UnitKind::Pch);

        for unit in pch {
            self.compile(plan, unit)?;
            compiled.fetch_add(1, Ordering::SeqCst);
        }

        if !units.is_empty() {
            tracing::debug!("compiling {} units of `{}`", units.len(), plan.name);
            self.pool()?.install(|| {
                units.par_iter().try_for_each(|unit| {
                    self.compile(plan, unit)?;
                    compiled.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), anyhow::Error>(())
                })
            })?;
        }

        let compiled = compiled.load(Ordering::SeqCst);
        let linked = if plan.link.is_needed(compiled) {
            self.link(plan)?;
            true
        } else {
            tracing::debug!("`{}` is up to date, not linking", plan.name);
            false
        };

        if linked && cfg!(windows) {
            self.copy_runtime_files(&plan.link)?;
        }

        Ok(ProjectOutcome {
            compiled,
            linked,
            artifact: plan.link.output.clone(),
        })
    }

    fn pool(&self) -> Result<rayon::ThreadPool> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(jobs) = self.ctx.jobs {
            builder = builder.num_threads(jobs);
        }
        builder
            .build()
            .context("failed to start the compile thread pool")
    }

    /// Compile one unit, regenerating its source first when needed.
    fn compile(&self, plan: &ProjectPlan, unit: &CompileUnit) -> Result<()> {
        let name = unit.display_name(&plan.root);
        if let crate::builder::staleness::Verdict::Build(reason) = &unit.verdict {
            tracing::debug!("{}: {}", name, reason);
        }

        if unit.regenerate {
            self.regenerate(plan, unit)?;
        }

        ensure_parent(&unit.object)?;

        let input = plan.compile_input(unit);
        let spec = self
            .ctx
            .toolchain()
            .compile_command(&input, unit.lang, self.ctx.build_type);

        self.ctx.shell.status(Status::Compiling, &name);
        let output = self.ctx.run(&spec, &plan.root)?;

        if !output.success() {
            self.ctx.shell.print_lines(&output.lines);
            return Err(BuildError::CompilationFailed {
                source_file: unit.origin.clone(),
                diagnostics: output.lines,
            }
            .into());
        }

        Ok(())
    }

    fn regenerate(&self, plan: &ProjectPlan, unit: &CompileUnit) -> Result<()> {
        match unit.kind {
            UnitKind::Data => {
                let rel = relative_path(&plan.root, &unit.origin);
                self.ctx
                    .shell
                    .status(Status::Generating, unit.display_name(&plan.root));
                write_data_source(&unit.origin, &rel, &unit.source).map_err(|e| {
                    tracing::debug!("{:#}", e);
                    BuildError::DataFile {
                        path: unit.origin.clone(),
                    }
                })?;
            }
            UnitKind::Pch => {
                if let Some(pch) = &plan.pch {
                    write_pch_wrapper(&unit.source, &pch.header)?;
                }
            }
            UnitKind::Source => {}
        }
        Ok(())
    }

    fn link(&self, plan: &ProjectPlan) -> Result<()> {
        let link = &plan.link;
        if let Some(parent) = link.output.parent() {
            ensure_dir(parent)?;
        }

        let tc = self.ctx.toolchain();
        let file_name = link
            .output
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();

        let spec = match link.kind {
            LinkKind::Archive => {
                self.ctx.shell.status(Status::Archiving, &file_name);
                tc.archive_command(&ArchiveInput {
                    objects: link.objects.clone(),
                    output: link.output.clone(),
                })
            }
            LinkKind::Shared | LinkKind::Executable => {
                self.ctx.shell.status(Status::Linking, &file_name);
                let input = LinkInput {
                    objects: link.objects.clone(),
                    output: link.output.clone(),
                    lib_files: link.lib_files.clone(),
                    libs: link.libs.clone(),
                    ldflags: link.ldflags.clone(),
                    subsystem: link.subsystem,
                    driver: link.driver,
                };
                if link.kind == LinkKind::Shared {
                    tc.link_shared_command(&input, self.ctx.build_type)
                } else {
                    tc.link_exe_command(&input, self.ctx.build_type)
                }
            }
        };

        let output = self.ctx.run(&spec, &plan.root)?;
        if !output.success() {
            self.ctx.shell.print_lines(&output.lines);
            return Err(BuildError::LinkFailed {
                output: link.output.clone(),
                diagnostics: output.lines,
            }
            .into());
        }

        Ok(())
    }

    /// Place dependency DLLs next to the output so it can be started.
    fn copy_runtime_files(&self, link: &LinkPlan) -> Result<()> {
        let Some(dest_dir) = link.output.parent() else {
            return Ok(());
        };
        for file in &link.runtime_files {
            let Some(name) = file.file_name() else {
                continue;
            };
            let dest = dest_dir.join(name);
            std::fs::copy(file, &dest).map_err(|e| BuildError::Filesystem {
                path: dest.clone(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }
}
