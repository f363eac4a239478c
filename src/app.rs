//! The application: build the tree, bind the table, sync the models.
//!
//! Construction is all-or-nothing. [`App::build`] runs the synchronous
//! scan/merge/resolve/bind pipeline; [`App::initialize`] additionally awaits
//! each model's sync hook, one at a time, in registration order — schema
//! migrations against a shared store must not race. A failure at any stage
//! aborts the whole startup; the tree is never served half-built. The
//! finished `App` is immutable and can be shared freely across request
//! tasks.

use std::sync::Arc;

use serde_json::json;
use tracing::{error, info};

use crate::config::Config;
use crate::definition::ModelDef;
use crate::error::Error;
use crate::module::Registry;
use crate::request::Request;
use crate::response::Response;
use crate::routes::{HandlerKind, HandlerSpec, Router};
use crate::template::{FileRenderer, Renderer, ROLE_ALL};
use crate::tree::{self, RouteNode};

/// A fully built application: frozen route tree, bound routing table, and
/// the models awaiting (or done with) synchronization.
pub struct App {
    tree: RouteNode,
    router: Router,
    models: Vec<ModelDef>,
    renderer: Arc<dyn Renderer>,
    pub(crate) config: Config,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Builds the route tree and binds the routing table. Synchronous; no
    /// model synchronization happens here.
    pub fn build(registry: &Registry, config: Config) -> Result<Self, Error> {
        config.validate()?;
        let output = tree::build(registry, &config)?;
        let router = Router::bind(&output.root)?;
        info!(
            routes = router.routes().len(),
            models = output.models.len(),
            "route table built"
        );
        Ok(Self {
            tree: output.root,
            router,
            models: output.models,
            renderer: Arc::new(FileRenderer),
            config,
        })
    }

    /// [`build`](Self::build), then every model sync hook awaited
    /// sequentially in registration order.
    pub async fn initialize(registry: &Registry, config: Config) -> Result<Self, Error> {
        let app = Self::build(registry, config)?;
        app.sync_models().await?;
        Ok(app)
    }

    /// Runs the model sync hooks, one at a time, in registration order.
    pub async fn sync_models(&self) -> Result<(), Error> {
        for model in &self.models {
            let Some(sync) = &model.sync else { continue };
            info!(model = %model.name, "syncing model");
            sync().await?;
        }
        Ok(())
    }

    /// Replaces the default file-passthrough [`Renderer`].
    pub fn with_renderer(mut self, renderer: impl Renderer) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    /// The frozen merged tree, for inspection.
    pub fn tree(&self) -> &RouteNode {
        &self.tree
    }

    /// The bound routing table.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Models in registration order.
    pub fn models(&self) -> &[ModelDef] {
        &self.models
    }

    /// Dispatches one request through the bound table: route lookup, role
    /// gating, input validation, then handler call or template render.
    pub async fn handle(&self, mut req: Request) -> Response {
        let Some((route, params)) = self.router.lookup(req.method(), req.path()) else {
            return Response::status(404);
        };
        req.set_params(params);

        let Some(spec) = select_spec(route.specs(), req.role()) else {
            return Response::status(403);
        };

        for binding in spec.inputs.iter().filter(|b| b.required) {
            if req.input(binding).is_none() {
                return Response::status(422);
            }
        }

        match &spec.kind {
            HandlerKind::Action(handler) => handler.call(req).await,
            HandlerKind::Template(template) => {
                let data = json!({
                    "params": req.params(),
                    "query": req.query_map(),
                });
                match self.renderer.render(template, &data) {
                    Ok(body) => Response::html(body),
                    Err(e) => {
                        error!(template = %template.name, "render failed: {e}");
                        Response::status(500)
                    }
                }
            }
        }
    }
}

/// Picks the spec for a session role: exact role match first, then the
/// `all` fallback, in bound (explicit-before-synthesized) order.
fn select_spec<'a>(specs: &'a [HandlerSpec], role: &str) -> Option<&'a HandlerSpec> {
    specs
        .iter()
        .find(|s| s.role == role)
        .or_else(|| specs.iter().find(|s| s.role == ROLE_ALL))
}
