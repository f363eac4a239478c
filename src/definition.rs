//! Typed controller and model definitions, and their merge rules.
//!
//! Definitions are registered explicitly on a [`Module`](crate::Module),
//! keyed by the relative path of the file the scanner will discover. The
//! merge semantics live here as typed functions — one per definition shape —
//! so overwrite-vs-concatenate-vs-reject is enforced by the field types,
//! not inferred from runtime shape:
//!
//! - scalar and handler fields: later-registered module wins
//! - array fields: concatenated in module-registration order
//! - nested value objects: merged recursively
//! - models: never merged — a second model at one path is a hard error

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;
use crate::handler::{Action, ActionFn};
use crate::method::Method;

// ── Input bindings ────────────────────────────────────────────────────────────

/// Where a declared input is pulled from at dispatch time.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingSource {
    Body,
    Query,
    Param,
    Header,
}

/// One declared request input for an action.
///
/// A `required` binding that cannot be satisfied at dispatch time fails the
/// request with `422` before the handler runs.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct InputBinding {
    pub name: String,
    pub source: BindingSource,
    pub required: bool,
}

// ── Controller definitions ────────────────────────────────────────────────────

/// One controller action: the handler metadata merged across modules.
///
/// Every field is optional or additive so a later module can override a
/// single aspect of a module-provided action without redeclaring the rest.
#[derive(Clone, Default)]
pub struct ActionDef {
    /// HTTP method; `GET` when never declared.
    pub method: Option<Method>,
    /// Sub-path below the owning node, e.g. `":id"`. Empty or undeclared
    /// means the node's own path.
    pub path: Option<String>,
    /// Role required to reach this action; `all` when never declared.
    pub role: Option<String>,
    /// Template reference, `name` or `name.role`. When absent the action
    /// name is used to claim a template of the same name, if one exists.
    pub template: Option<String>,
    /// Declared request inputs. Concatenated on merge.
    pub inputs: Vec<InputBinding>,
    /// Free-form override markers passed through to the handler spec.
    /// Concatenated on merge.
    pub allow_override: Vec<String>,
    /// The handler function. Later-registered module wins.
    pub handler: Option<ActionFn>,
    /// Open extension bag for application metadata. Merged recursively:
    /// objects merge, arrays concatenate, scalars overwrite.
    pub extra: Map<String, Value>,
}

impl ActionDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn input(mut self, name: impl Into<String>, source: BindingSource, required: bool) -> Self {
        self.inputs.push(InputBinding { name: name.into(), source, required });
        self
    }

    pub fn allow_override(mut self, flag: impl Into<String>) -> Self {
        self.allow_override.push(flag.into());
        self
    }

    pub fn handler(mut self, action: impl Action) -> Self {
        self.handler = Some(action.into_action_fn());
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Typed merge: `other` comes from a later-registered module.
    pub(crate) fn merge_from(&mut self, other: ActionDef) {
        if other.method.is_some() {
            self.method = other.method;
        }
        if other.path.is_some() {
            self.path = other.path;
        }
        if other.role.is_some() {
            self.role = other.role;
        }
        if other.template.is_some() {
            self.template = other.template;
        }
        if other.handler.is_some() {
            self.handler = other.handler;
        }
        self.inputs.extend(other.inputs);
        self.allow_override.extend(other.allow_override);
        merge_map(&mut self.extra, other.extra);
    }
}

impl fmt::Debug for ActionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDef")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("role", &self.role)
            .field("template", &self.template)
            .field("inputs", &self.inputs)
            .field("allow_override", &self.allow_override)
            .field("has_handler", &self.handler.is_some())
            .field("extra", &self.extra)
            .finish()
    }
}

/// A controller: a named set of actions contributed to one route node.
#[derive(Clone, Debug, Default)]
pub struct ControllerDef {
    pub actions: BTreeMap<String, ActionDef>,
}

impl ControllerDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action(mut self, name: impl Into<String>, def: ActionDef) -> Self {
        self.actions.insert(name.into(), def);
        self
    }

    /// Typed merge: actions sharing a name are merged field-by-field,
    /// new actions are added.
    pub(crate) fn merge_from(&mut self, other: ControllerDef) {
        for (name, def) in other.actions {
            match self.actions.get_mut(&name) {
                Some(existing) => existing.merge_from(def),
                None => {
                    self.actions.insert(name, def);
                }
            }
        }
    }
}

/// Recursive merge for the open `extra` bags: objects merge key-by-key,
/// arrays concatenate, anything else is overwritten by the later value.
fn merge_value(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(d), Value::Object(s)) => merge_map(d, s),
        (Value::Array(d), Value::Array(s)) => d.extend(s),
        (d, s) => *d = s,
    }
}

fn merge_map(dst: &mut Map<String, Value>, src: Map<String, Value>) {
    for (key, value) in src {
        match dst.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                dst.insert(key, value);
            }
        }
    }
}

// ── Model definitions ─────────────────────────────────────────────────────────

pub(crate) type SyncFuture = Pin<Box<dyn Future<Output = Result<(), Error>> + Send>>;
pub(crate) type SyncFn = Arc<dyn Fn() -> SyncFuture + Send + Sync>;

/// One model definition. At most one per route node — duplicates are a
/// configuration error, never a merge.
#[derive(Clone)]
pub struct ModelDef {
    pub name: String,
    pub schema: Map<String, Value>,
    pub(crate) sync: Option<SyncFn>,
}

impl ModelDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), schema: Map::new(), sync: None }
    }

    pub fn field(mut self, name: impl Into<String>, descriptor: Value) -> Self {
        self.schema.insert(name.into(), descriptor);
        self
    }

    /// Hook awaited during initialization, after the route tree is built.
    /// Hooks run strictly one at a time, in registration order.
    pub fn on_sync<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), Error>> + Send + 'static,
    {
        self.sync = Some(Arc::new(move || Box::pin(hook())));
        self
    }
}

impl fmt::Debug for ModelDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDef")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("has_sync", &self.sync.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{Request, Response};

    async fn noop(_req: Request) -> Response {
        Response::text("ok")
    }

    #[test]
    fn scalar_fields_are_overwritten_by_later_module() {
        let mut base = ActionDef::new().method(Method::Post).role("admin");
        base.merge_from(ActionDef::new().method(Method::Put));
        assert_eq!(base.method, Some(Method::Put));
        // untouched scalar survives
        assert_eq!(base.role.as_deref(), Some("admin"));
    }

    #[test]
    fn array_fields_concatenate_in_registration_order() {
        let mut base = ActionDef::new()
            .input("id", BindingSource::Param, true)
            .allow_override("method");
        base.merge_from(
            ActionDef::new()
                .input("page", BindingSource::Query, false)
                .allow_override("role"),
        );
        let names: Vec<&str> = base.inputs.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["id", "page"]);
        assert_eq!(base.allow_override, ["method", "role"]);
    }

    #[test]
    fn extra_objects_merge_recursively() {
        let mut base = ActionDef::new()
            .extra("limits", json!({"page": 10, "nested": {"a": 1}}))
            .extra("tags", json!(["x"]));
        base.merge_from(
            ActionDef::new()
                .extra("limits", json!({"nested": {"b": 2}}))
                .extra("tags", json!(["y"])),
        );
        assert_eq!(base.extra["limits"], json!({"page": 10, "nested": {"a": 1, "b": 2}}));
        assert_eq!(base.extra["tags"], json!(["x", "y"]));
    }

    #[test]
    fn later_handler_replaces_earlier() {
        let mut base = ActionDef::new().handler(noop);
        let replacement = ActionDef::new().handler(noop);
        let expected = replacement.handler.clone().unwrap();
        base.merge_from(replacement);
        let merged = base.handler.unwrap();
        assert!(Arc::ptr_eq(&merged, &expected));
    }

    #[test]
    fn controllers_merge_action_by_action() {
        let mut base = ControllerDef::new()
            .action("get", ActionDef::new().method(Method::Get).extra("a", json!(1)));
        base.merge_from(
            ControllerDef::new()
                .action("get", ActionDef::new().extra("b", json!(2)))
                .action("create", ActionDef::new().method(Method::Post)),
        );
        let get = &base.actions["get"];
        assert_eq!(get.method, Some(Method::Get));
        assert_eq!(get.extra["a"], json!(1));
        assert_eq!(get.extra["b"], json!(2));
        assert!(base.actions.contains_key("create"));
    }
}
