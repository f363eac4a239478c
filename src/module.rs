//! Modules and the caller-owned registry.
//!
//! A module is a source of route-contributing directories: the application
//! itself plus any reusable packages it pulls in. Registration order is the
//! override precedence — a later-registered module wins where definitions
//! collide on a relative path.
//!
//! The registry is a plain value owned by the process entry point. There is
//! no hidden process-wide module cache: build two registries and you get two
//! independent applications.
//!
//! Definitions are registered explicitly, keyed by the relative path of the
//! file the scanner will discover (extension dropped): a module shipping
//! `app/widgets/widgets.controller.rs` registers its [`ControllerDef`] under
//! `widgets/widgets.controller`. The scanner derives structure from the
//! filesystem; the definitions themselves never travel through dynamic
//! loading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::definition::{ControllerDef, ModelDef};

/// One registered source of route-contributing directories.
pub struct Module {
    name: String,
    base_path: PathBuf,
    roots: Vec<PathBuf>,
    controllers: HashMap<String, ControllerDef>,
    models: HashMap<String, ModelDef>,
}

impl Module {
    /// Starts building a module rooted at `base_path`. With no explicit
    /// [`root`](ModuleBuilder::root) call, `<base_path>/app` is scanned.
    pub fn builder(name: impl Into<String>, base_path: impl Into<PathBuf>) -> ModuleBuilder {
        ModuleBuilder {
            module: Module {
                name: name.into(),
                base_path: base_path.into(),
                roots: Vec::new(),
                controllers: HashMap::new(),
                models: HashMap::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute scan roots, in declaration order.
    pub(crate) fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub(crate) fn controller(&self, key: &str) -> Option<&ControllerDef> {
        self.controllers.get(key)
    }

    pub(crate) fn model(&self, key: &str) -> Option<&ModelDef> {
        self.models.get(key)
    }
}

/// Builder for [`Module`]. Finish with [`build`](ModuleBuilder::build).
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    /// Adds a scan root, relative to the module's base path.
    pub fn root(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = self.module.base_path.join(dir.as_ref());
        self.module.roots.push(dir);
        self
    }

    /// Registers the controller definition for a discoverable file.
    ///
    /// `key` is the file's path relative to the scan root, extension
    /// dropped — e.g. `"widgets/widgets.controller"`.
    pub fn controller(mut self, key: impl Into<String>, def: ControllerDef) -> Self {
        self.module.controllers.insert(key.into(), def);
        self
    }

    /// Registers the model definition for a discoverable file, keyed like
    /// [`controller`](Self::controller) — e.g. `"widgets/widget.model"`.
    pub fn model(mut self, key: impl Into<String>, def: ModelDef) -> Self {
        self.module.models.insert(key.into(), def);
        self
    }

    pub fn build(mut self) -> Module {
        if self.module.roots.is_empty() {
            self.module.roots.push(self.module.base_path.join("app"));
        }
        self.module
    }
}

/// The ordered collection of registered modules.
///
/// Owned by the caller and handed to [`App::build`](crate::App::build);
/// nothing global, nothing cached between builds.
#[derive(Default)]
pub struct Registry {
    modules: Vec<Module>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a module. Later registrations override earlier ones where
    /// their definitions land on the same relative path.
    pub fn register(&mut self, module: Module) -> &mut Self {
        tracing::debug!(module = %module.name, "module registered");
        self.modules.push(module);
        self
    }

    pub(crate) fn modules(&self) -> &[Module] {
        &self.modules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_root_is_app_under_base_path() {
        let module = Module::builder("shop", "/srv/shop").build();
        assert_eq!(module.roots(), [PathBuf::from("/srv/shop/app")]);
    }

    #[test]
    fn explicit_roots_suppress_the_default() {
        let module = Module::builder("shop", "/srv/shop")
            .root("app")
            .root("admin")
            .build();
        assert_eq!(
            module.roots(),
            [PathBuf::from("/srv/shop/app"), PathBuf::from("/srv/shop/admin")]
        );
    }

    #[test]
    fn registration_order_is_preserved() {
        let mut registry = Registry::new();
        registry
            .register(Module::builder("base", "/srv/base").build())
            .register(Module::builder("app", "/srv/app").build());
        let names: Vec<&str> = registry.modules().iter().map(Module::name).collect();
        assert_eq!(names, ["base", "app"]);
    }
}
