//! The route tree: scanning, merging, and template resolution per node.
//!
//! Nodes are keyed by *logical relative path*, never by physical filesystem
//! identity: two directories that map to the same relative path (module
//! overlays, symlinked aliases) are the same node and are processed once.
//! Each node walks a small state machine:
//!
//! ```text
//! unvisited → scanning → merging → resolving-templates → built
//! ```
//!
//! Once a node is `built`, any further attempt to process the same relative
//! path short-circuits — that is the guard against cyclic filesystem links.
//! Construction is synchronous and runs to completion once per
//! initialization; the finished tree is frozen before the first request is
//! dispatched.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::Config;
use crate::definition::{ActionDef, ControllerDef, ModelDef};
use crate::error::Error;
use crate::method::Method;
use crate::module::Registry;
use crate::scan::{self, FileKind, Scanned};
use crate::template::{self, TemplateSet, ROLE_ALL};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) enum NodeState {
    #[default]
    Unvisited,
    Scanning,
    Merging,
    ResolvingTemplates,
    Built,
}

/// One node of the merged route tree: everything every module contributed
/// at one relative path, plus the child segments below it.
#[derive(Default)]
pub struct RouteNode {
    pub(crate) rel: Vec<String>,
    pub(crate) controller: ControllerDef,
    pub(crate) model: Option<ModelDef>,
    pub(crate) templates: TemplateSet,
    /// Pass-through actions generated for unclaimed templates. Kept apart
    /// from the explicit actions so explicit entries always bind first.
    pub(crate) synthesized: Vec<(String, ActionDef)>,
    pub(crate) children: BTreeMap<String, RouteNode>,
    pub(crate) state: NodeState,
}

impl RouteNode {
    fn new(rel: Vec<String>) -> Self {
        Self { rel, ..Self::default() }
    }

    pub fn is_root(&self) -> bool {
        self.rel.is_empty()
    }

    /// The node's path from the application root, e.g. `/widgets/reviews`.
    pub fn path(&self) -> String {
        format!("/{}", self.rel.join("/"))
    }

    pub fn controller(&self) -> &ControllerDef {
        &self.controller
    }

    pub fn model(&self) -> Option<&ModelDef> {
        self.model.as_ref()
    }

    pub fn synthesized_actions(&self) -> &[(String, ActionDef)] {
        &self.synthesized
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &RouteNode)> {
        self.children.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Walks `widgets/reviews`-style relative paths down the tree.
    pub fn at(&self, rel: &str) -> Option<&RouteNode> {
        rel.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self, |node, seg| node.children.get(seg))
    }

    /// Claims templates referenced by explicit actions, then synthesizes a
    /// GET pass-through action per remaining `(name, role)` variant.
    fn resolve_templates(&mut self) {
        for (action_name, def) in &self.controller.actions {
            let reference = def.template.as_deref().unwrap_or(action_name);
            let (name, explicit_role) = parse_ref(reference);
            let role = explicit_role
                .or(def.role.as_deref())
                .unwrap_or(ROLE_ALL);
            self.templates.claim(name, role);
        }

        let synthesized: Vec<(String, ActionDef)> = self
            .templates
            .unclaimed()
            .into_iter()
            .map(|t| {
                let action_name = if t.role == ROLE_ALL {
                    t.name.clone()
                } else {
                    format!("{}.{}", t.name, t.role)
                };
                // `index` maps to the node's own path, not `/index`.
                let path = if t.name == "index" { String::new() } else { t.name.clone() };
                let def = ActionDef::new()
                    .method(Method::Get)
                    .path(path)
                    .role(t.role.clone())
                    .template(t.name.clone());
                (action_name, def)
            })
            .collect();
        self.synthesized = synthesized;
    }
}

/// Splits an action's template reference into `(name, explicit role)`.
pub(crate) fn parse_ref(reference: &str) -> (&str, Option<&str>) {
    match reference.split_once('.') {
        Some((name, role)) => (name, Some(role)),
        None => (reference, None),
    }
}

/// The finished product of the build phase: the frozen tree plus every
/// model encountered, in registration order, for sequential syncing.
pub(crate) struct BuildOutput {
    pub(crate) root: RouteNode,
    pub(crate) models: Vec<ModelDef>,
}

impl std::fmt::Debug for BuildOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildOutput").finish_non_exhaustive()
    }
}

/// Builds the full merged tree for every module in `registry`.
pub(crate) fn build(registry: &Registry, config: &Config) -> Result<BuildOutput, Error> {
    let mut root = RouteNode::new(Vec::new());
    let mut models = Vec::new();
    build_node(&mut root, registry, config, &mut models)?;
    Ok(BuildOutput { root, models })
}

fn build_node(
    node: &mut RouteNode,
    registry: &Registry,
    config: &Config,
    models: &mut Vec<ModelDef>,
) -> Result<(), Error> {
    // The `loaded` guard: a relative path is processed at most once.
    if node.state == NodeState::Built {
        debug!(path = %node.path(), "already built, short-circuiting");
        return Ok(());
    }

    node.state = NodeState::Scanning;

    // Every physical directory contributing to this relative path, in
    // module-registration order. A missing directory contributes nothing.
    let mut contributions: Vec<(usize, Scanned)> = Vec::new();
    let mut subdirs: Vec<String> = Vec::new();
    for (index, module) in registry.modules().iter().enumerate() {
        for root_dir in module.roots() {
            let dir = node.rel.iter().fold(root_dir.clone(), |d, seg| d.join(seg));
            if !dir.is_dir() {
                continue;
            }
            let scanned = scan::scan(&dir, &config.template_ext)?;
            for sub in &scanned.subdirs {
                if !subdirs.contains(sub) {
                    subdirs.push(sub.clone());
                }
            }
            contributions.push((index, scanned));
        }
    }

    // Depth-first: nested segments are fully built before this node's own
    // routing consequences, so literal sub-routes can be bound ahead of any
    // placeholder entry this node declares.
    for name in subdirs {
        let mut rel = node.rel.clone();
        rel.push(name.clone());
        let child = node
            .children
            .entry(name)
            .or_insert_with(|| RouteNode::new(rel));
        build_node(child, registry, config, models)?;
    }

    node.state = NodeState::Merging;
    for (index, scanned) in contributions {
        let module = &registry.modules()[index];
        for file in scanned.files {
            let key = definition_key(&node.rel, &file.stem);
            match file.kind {
                FileKind::Controller => {
                    let def = module.controller(&key).ok_or_else(|| Error::MissingDefinition {
                        module: module.name().to_owned(),
                        kind: "controller",
                        key: key.clone(),
                    })?;
                    node.controller.merge_from(def.clone());
                }
                FileKind::Model => {
                    let def = module.model(&key).ok_or_else(|| Error::MissingDefinition {
                        module: module.name().to_owned(),
                        kind: "model",
                        key: key.clone(),
                    })?;
                    if let Some(existing) = &node.model {
                        return Err(Error::DuplicateModel {
                            path: node.path(),
                            existing: existing.name.clone(),
                            duplicate: def.name.clone(),
                        });
                    }
                    node.model = Some(def.clone());
                    models.push(def.clone());
                }
                FileKind::Template => {
                    let (name, role) = template::parse_stem(&file.stem, &file.path)?;
                    node.templates.insert(name, role, file.path);
                }
            }
        }
    }

    node.state = NodeState::ResolvingTemplates;
    node.resolve_templates();
    node.state = NodeState::Built;

    debug!(
        path = %node.path(),
        actions = node.controller.actions.len(),
        synthesized = node.synthesized.len(),
        children = node.children.len(),
        "node built"
    );
    Ok(())
}

/// Registration key for a definition file: relative directory plus the
/// file stem, e.g. `widgets/widgets.controller`.
fn definition_key(rel: &[String], stem: &str) -> String {
    if rel.is_empty() {
        stem.to_owned()
    } else {
        format!("{}/{}", rel.join("/"), stem)
    }
}
