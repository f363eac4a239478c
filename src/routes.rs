//! Route ordering, binding, and the first-match router.
//!
//! Binding flattens the frozen tree into one ordered table. The order *is*
//! the routing semantics, because lookup is first-match-wins:
//!
//! 1. a node's literal entries
//! 2. every child subtree, fully bound (recursively, in segment order)
//! 3. the node's placeholder entries (`:param` segments)
//!
//! Within one node the partition is stable, and no ordering is defined
//! between two placeholder paths — they compare equal. The net guarantee:
//! `/foo/bar` beats `/foo/:id` no matter which was registered first,
//! because a literal nested path can never end up behind an ancestor's
//! catch-all rule.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::definition::InputBinding;
use crate::error::Error;
use crate::handler::ActionFn;
use crate::method::Method;
use crate::template::{TemplateRef, ROLE_ALL};
use crate::tree::{parse_ref, RouteNode};

// ── Handler specs ─────────────────────────────────────────────────────────────

pub(crate) enum HandlerKind {
    Action(ActionFn),
    Template(TemplateRef),
}

/// One fully-resolved, role-gated handler: what dispatch needs and nothing
/// it would still have to look up. A bound table never contains a dangling
/// entry — resolution failures abort the bind instead.
pub struct HandlerSpec {
    pub role: String,
    pub inputs: Vec<InputBinding>,
    pub allow_override: Vec<String>,
    pub(crate) kind: HandlerKind,
    action: String,
}

impl HandlerSpec {
    /// Name of the controller action this spec was bound from.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// True when this spec renders a template instead of calling a handler.
    pub fn is_template(&self) -> bool {
        matches!(self.kind, HandlerKind::Template(_))
    }
}

// ── Routes ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Eq, PartialEq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// One `(path, method)` table entry with its ordered role-gated specs.
pub struct Route {
    path: String,
    method: Method,
    segments: Vec<Segment>,
    specs: Vec<HandlerSpec>,
}

impl Route {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Explicit specs first, synthesized after; module order within each.
    pub fn specs(&self) -> &[HandlerSpec] {
        &self.specs
    }
}

// ── Ordering ──────────────────────────────────────────────────────────────────

/// `0` for literal paths, `1` for paths containing a placeholder segment.
fn path_class(path: &str) -> u8 {
    let has_placeholder = path
        .split('/')
        .any(|seg| seg.starts_with(':'));
    u8::from(has_placeholder)
}

/// Sibling comparison: literal before placeholder, everything else —
/// including two placeholders — deliberately equal, so a stable sort
/// preserves registration order within each class.
pub(crate) fn sibling_order(a: &str, b: &str) -> Ordering {
    path_class(a).cmp(&path_class(b))
}

// ── Router ────────────────────────────────────────────────────────────────────

/// The bound routing table. Immutable after [`bind`](Router::bind); safe to
/// share across request tasks without locking.
pub struct Router {
    routes: Vec<Route>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router").finish_non_exhaustive()
    }
}

impl Router {
    /// Flattens a built tree into the final ordered table.
    pub(crate) fn bind(root: &RouteNode) -> Result<Self, Error> {
        let mut routes = Vec::new();
        bind_node(root, "/", &mut routes)?;
        Ok(Self { routes })
    }

    /// All table entries, in match order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// First-match lookup. Returns the route and the captured placeholder
    /// parameters.
    pub fn lookup(&self, method: Method, path: &str) -> Option<(&Route, HashMap<String, String>)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        'routes: for route in &self.routes {
            if route.method != method || route.segments.len() != segments.len() {
                continue;
            }
            let mut params = HashMap::new();
            for (pattern, segment) in route.segments.iter().zip(&segments) {
                match pattern {
                    Segment::Literal(lit) if lit == segment => {}
                    Segment::Param(name) => {
                        params.insert(name.clone(), (*segment).to_owned());
                    }
                    _ => continue 'routes,
                }
            }
            return Some((route, params));
        }
        None
    }
}

fn bind_node(node: &RouteNode, base: &str, out: &mut Vec<Route>) -> Result<(), Error> {
    // (declared sub-path, route) — the sub-path drives the partition
    let mut entries: Vec<(String, Route)> = Vec::new();

    let explicit = node.controller.actions.iter().map(|(n, d)| (n.as_str(), d));
    let synthesized = node.synthesized.iter().map(|(n, d)| (n.as_str(), d));

    for (name, def) in explicit.chain(synthesized) {
        let sub = def.path.clone().unwrap_or_default();

        // A literal leading segment that is also a child directory would
        // shadow (or be shadowed by) the whole subtree.
        if let Some(first) = sub.split('/').find(|s| !s.is_empty()) {
            if !first.starts_with(':') && node.children.contains_key(first) {
                let segment = first.to_owned();
                return Err(Error::PathCollision {
                    path: node.path(),
                    route: sub,
                    segment,
                });
            }
        }

        let role = def.role.clone().unwrap_or_else(|| ROLE_ALL.to_owned());
        let kind = match &def.handler {
            Some(handler) => HandlerKind::Action(handler.clone()),
            None => {
                let reference = def.template.as_deref().unwrap_or(name);
                let (template_name, explicit_role) = parse_ref(reference);
                let wanted = explicit_role.unwrap_or(&role);
                match node.templates.resolve(template_name, wanted) {
                    Some(template) => HandlerKind::Template(template.clone()),
                    None => {
                        return Err(Error::UnresolvedAction {
                            path: node.path(),
                            action: name.to_owned(),
                        });
                    }
                }
            }
        };
        let spec = HandlerSpec {
            role,
            inputs: def.inputs.clone(),
            allow_override: def.allow_override.clone(),
            kind,
            action: name.to_owned(),
        };

        let method = def.method.unwrap_or_default();
        let full = join_path(base, &sub);
        match entries
            .iter_mut()
            .find(|(_, route)| route.path == full && route.method == method)
        {
            Some((_, route)) => route.specs.push(spec),
            None => {
                let segments = parse_segments(&full);
                entries.push((sub, Route { path: full, method, segments, specs: vec![spec] }));
            }
        }
    }

    // stable partition: literals keep their relative order, placeholders too
    entries.sort_by(|(a, _), (b, _)| sibling_order(a, b));
    let placeholder_start = entries
        .iter()
        .position(|(sub, _)| path_class(sub) == 1)
        .unwrap_or(entries.len());
    let placeholders: Vec<Route> = entries.split_off(placeholder_start).into_iter().map(|(_, r)| r).collect();

    out.extend(entries.into_iter().map(|(_, r)| r));

    // child sub-routers mount before this node's own placeholder entries
    for (name, child) in &node.children {
        bind_node(child, &join_path(base, name), out)?;
    }

    out.extend(placeholders);
    Ok(())
}

fn parse_segments(path: &str) -> Vec<Segment> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|seg| match seg.strip_prefix(':') {
            Some(name) => Segment::Param(name.to_owned()),
            None => Segment::Literal(seg.to_owned()),
        })
        .collect()
}

fn join_path(base: &str, sub: &str) -> String {
    let segments: Vec<&str> = base
        .split('/')
        .chain(sub.split('/'))
        .filter(|s| !s.is_empty())
        .collect();
    if segments.is_empty() {
        "/".to_owned()
    } else {
        format!("/{}", segments.join("/"))
    }
}
