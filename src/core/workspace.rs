//! Workspace - every project needed to build one requested project.
//!
//! Projects live in an arena and refer to each other by [`ProjectId`]. The
//! arena is filled in post-order of discovery, so dependencies are always
//! inserted before the projects that declare them and the requested project
//! is the last one.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use petgraph::algo::{is_cyclic_directed, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::DfsPostOrder;

use crate::core::error::ConfigError;
use crate::core::manifest::is_project_dir;
use crate::core::project::Project;

/// Index of a project inside its workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectId(pub usize);

impl ProjectId {
    /// Placeholder carried by a project that has not been inserted yet.
    pub const UNASSIGNED: ProjectId = ProjectId(usize::MAX);
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The set of projects resolved from one root project.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    projects: Vec<Project>,
}

#[derive(Debug, Clone, Copy)]
enum Visit {
    InProgress,
    Done(ProjectId),
}

/// Recursive dependency graph builder.
struct Resolver {
    projects: Vec<Project>,
    visits: HashMap<PathBuf, Visit>,
    /// Projects currently being resolved, outermost first.
    stack: Vec<(PathBuf, String)>,
}

impl Resolver {
    fn resolve(&mut self, root: &Path) -> Result<ProjectId, ConfigError> {
        match self.visits.get(root) {
            Some(Visit::Done(id)) => return Ok(*id),
            Some(Visit::InProgress) => return Err(self.cycle_error(root)),
            None => {}
        }

        self.visits.insert(root.to_path_buf(), Visit::InProgress);

        let mut project = Project::load(root)?;
        self.stack.push((root.to_path_buf(), project.name.clone()));

        let mut dependencies = Vec::with_capacity(project.declarations.len());
        for decl in &project.declarations {
            let target = decl
                .path
                .canonicalize()
                .map_err(|_| ConfigError::DependencyPathNotFound {
                    name: decl.name.clone(),
                    path: decl.path.clone(),
                })?;

            if target == root {
                return Err(ConfigError::SelfDependency {
                    name: project.name.clone(),
                    path: root.to_path_buf(),
                });
            }

            if !is_project_dir(&target) {
                return Err(ConfigError::NotAProject { path: target });
            }

            dependencies.push(self.resolve(&target)?);
        }

        self.stack.pop();

        let id = ProjectId(self.projects.len());
        project.id = id;
        project.dependencies = dependencies;
        self.projects.push(project);
        self.visits.insert(root.to_path_buf(), Visit::Done(id));

        Ok(id)
    }

    fn cycle_error(&self, revisited: &Path) -> ConfigError {
        let start = self
            .stack
            .iter()
            .position(|(path, _)| path == revisited)
            .unwrap_or(0);

        let mut cycle: Vec<String> = self.stack[start..]
            .iter()
            .map(|(_, name)| name.clone())
            .collect();
        if let Some(first) = cycle.first().cloned() {
            cycle.push(first);
        }

        ConfigError::CyclicDependency { cycle }
    }
}

impl Workspace {
    /// Resolve the project at `root` and, recursively, all of its local
    /// dependencies.
    ///
    /// A project reached through several paths is resolved once and shared.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let canonical = root.canonicalize().map_err(|_| ConfigError::NotAProject {
            path: root.to_path_buf(),
        })?;

        if !is_project_dir(&canonical) {
            return Err(ConfigError::NotAProject { path: canonical });
        }

        let mut resolver = Resolver {
            projects: Vec::new(),
            visits: HashMap::new(),
            stack: Vec::new(),
        };
        resolver.resolve(&canonical)?;

        tracing::debug!(
            "resolved workspace at {} ({} projects)",
            canonical.display(),
            resolver.projects.len()
        );

        Ok(Workspace {
            root: canonical,
            projects: resolver.projects,
        })
    }

    /// Root directory of the requested project.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All projects, dependencies before dependents.
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, id: ProjectId) -> &Project {
        &self.projects[id.0]
    }

    pub fn project_mut(&mut self, id: ProjectId) -> &mut Project {
        &mut self.projects[id.0]
    }

    /// The project the command was invoked for.
    pub fn requested(&self) -> &Project {
        &self.projects[self.requested_id().0]
    }

    pub fn requested_id(&self) -> ProjectId {
        ProjectId(self.projects.len().saturating_sub(1))
    }

    /// Order the projects required by `root` so that every dependency comes
    /// before its dependents. Each project appears exactly once.
    pub fn build_order(&self, root: ProjectId) -> Result<Vec<ProjectId>, ConfigError> {
        let graph = self.graph();
        self.check_acyclic(&graph)?;

        let mut order = Vec::new();
        let mut dfs = DfsPostOrder::new(&graph, NodeIndex::new(root.0));
        while let Some(node) = dfs.next(&graph) {
            order.push(graph[node]);
        }

        Ok(order)
    }

    /// Every project `id` transitively requires, dependencies first,
    /// excluding `id` itself.
    pub fn transitive_deps(&self, id: ProjectId) -> Result<Vec<ProjectId>, ConfigError> {
        let mut order = self.build_order(id)?;
        order.retain(|&p| p != id);
        Ok(order)
    }

    /// Include search path for compiling `id`: its own directories, then the
    /// `inc` folder of every transitive library dependency in build order.
    pub fn include_dirs(&self, id: ProjectId) -> Result<Vec<PathBuf>, ConfigError> {
        let mut dirs = self.project(id).own_include_dirs();
        for dep in self.transitive_deps(id)? {
            let dep = self.project(dep);
            if dep.kind.is_library() {
                dirs.push(dep.inc_dir());
            }
        }

        let mut seen = HashSet::new();
        dirs.retain(|d| seen.insert(d.clone()));
        Ok(dirs)
    }

    /// Find a project by its display name.
    pub fn find(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    fn graph(&self) -> DiGraph<ProjectId, ()> {
        let mut graph = DiGraph::with_capacity(self.projects.len(), 0);
        for project in &self.projects {
            graph.add_node(project.id);
        }
        for project in &self.projects {
            for dep in &project.dependencies {
                graph.add_edge(NodeIndex::new(project.id.0), NodeIndex::new(dep.0), ());
            }
        }
        graph
    }

    fn check_acyclic(&self, graph: &DiGraph<ProjectId, ()>) -> Result<(), ConfigError> {
        if !is_cyclic_directed(graph) {
            return Ok(());
        }

        let component = tarjan_scc(graph)
            .into_iter()
            .find(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
            .unwrap_or_default();

        let mut cycle: Vec<String> = component
            .iter()
            .rev()
            .map(|&n| self.project(graph[n]).name.clone())
            .collect();
        if let Some(first) = cycle.first().cloned() {
            cycle.push(first);
        }

        Err(ConfigError::CyclicDependency { cycle })
    }
}
