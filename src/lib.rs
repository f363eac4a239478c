//! # arbor
//!
//! A convention-driven web framework core: directory trees in, ordered
//! route tables out.
//!
//! ## The contract
//!
//! Your filesystem layout *is* your routing table. Each directory under a
//! module's `app/` root becomes a path segment; `*.controller.*` and
//! `*.model.*` files mark where explicitly registered definitions attach;
//! template files (`.hbs` by default) become pages, with role-specific
//! variants (`detail.admin.hbs`) picked per request. Modules merge in
//! registration order — a later module overrides or extends an earlier one
//! at the same relative path — and templates no controller claims get a
//! pass-through GET action synthesized for them.
//!
//! The part that earns its keep is the ordering guarantee: literal routes
//! always bind before placeholder routes, and nested subtrees bind before
//! any ancestor's catch-all, so `/widgets/reviews` can never be swallowed
//! by `/widgets/:id` no matter what order things were declared in.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use arbor::{
//!     ActionDef, App, Config, ControllerDef, Method, Module, Registry,
//!     Request, Response, Server,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut registry = Registry::new();
//!     registry.register(
//!         Module::builder("shop", "demos/shop")
//!             .controller(
//!                 "widgets/widgets.controller",
//!                 ControllerDef::new()
//!                     .action("list", ActionDef::new().handler(list_widgets))
//!                     .action("get", ActionDef::new().path(":id").handler(get_widget)),
//!             )
//!             .build(),
//!     );
//!
//!     let app = App::initialize(&registry, Config::new()).await.unwrap();
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn list_widgets(_req: Request) -> Response {
//!     Response::json(br#"[{"id":1}]"#.to_vec())
//! }
//!
//! async fn get_widget(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#).into_bytes())
//! }
//! ```
//!
//! Everything is built once, at startup, synchronously; a configuration
//! problem aborts initialization instead of surfacing at request time. The
//! finished [`App`] is immutable and lock-free to share.

mod app;
mod config;
mod definition;
mod error;
mod handler;
mod method;
mod module;
mod request;
mod response;
mod routes;
mod scan;
mod server;
mod template;
mod tree;

pub mod health;

pub use app::App;
pub use config::Config;
pub use definition::{ActionDef, BindingSource, ControllerDef, InputBinding, ModelDef};
pub use error::Error;
pub use handler::Action;
pub use method::Method;
pub use module::{Module, ModuleBuilder, Registry};
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use routes::{HandlerSpec, Route, Router};
pub use server::Server;
pub use template::{FileRenderer, Renderer, TemplateRef, ROLE_ALL};
pub use tree::RouteNode;
