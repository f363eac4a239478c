//! Minimal arbor example — a convention-routed shop.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/                    # index.hbs
//!   curl http://localhost:3000/about               # about.hbs
//!   curl -H 'x-role: admin' http://localhost:3000/about   # about.admin.hbs
//!   curl http://localhost:3000/widgets
//!   curl http://localhost:3000/widgets/42
//!
//! The directory tree under demos/shop/app drives the routing table:
//! templates become GET pages automatically, the widgets controller claims
//! /widgets and /widgets/:id, and literal routes always win over :id.

use arbor::{ActionDef, App, Config, ControllerDef, Module, Registry, Request, Response, Server};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let mut registry = Registry::new();
    registry.register(
        Module::builder("shop", "demos/shop")
            .controller(
                "widgets/widgets.controller",
                ControllerDef::new()
                    .action("list", ActionDef::new().handler(list_widgets))
                    .action("get", ActionDef::new().path(":id").handler(get_widget)),
            )
            .build(),
    );

    let app = App::initialize(&registry, Config::new())
        .await
        .expect("initialization error");

    Server::bind("0.0.0.0:3000")
        .serve(app)
        .await
        .expect("server error");
}

// GET /widgets
async fn list_widgets(_req: Request) -> Response {
    Response::json(br#"[{"id":"1","name":"sprocket"}]"#.to_vec())
}

// GET /widgets/:id
async fn get_widget(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    Response::json(format!(r#"{{"id":"{id}","name":"sprocket"}}"#).into_bytes())
}
