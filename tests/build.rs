//! End-to-end: real directory trees in, bound applications out.

use std::fs;
use std::path::Path;

use serde_json::json;

use arbor::{
    ActionDef, App, BindingSource, Config, ControllerDef, Method, ModelDef, Module, Registry,
    Request, Response,
};

fn write(base: &Path, rel: &str, contents: &str) {
    let path = base.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

async fn list(_req: Request) -> Response {
    Response::json(br#"[]"#.to_vec())
}

#[test]
fn cross_module_action_fields_merge_into_one_spec() {
    // modules [base, app], both declaring `get` at /widgets:
    // base brings {method}, app brings {extra} — the merged action has both
    let base = tempfile::tempdir().unwrap();
    let app_dir = tempfile::tempdir().unwrap();
    write(base.path(), "app/widgets/widgets.controller.rs", "");
    write(app_dir.path(), "app/widgets/widgets.controller.rs", "");

    let mut registry = Registry::new();
    registry.register(
        Module::builder("base", base.path())
            .controller(
                "widgets/widgets.controller",
                ControllerDef::new()
                    .action("get", ActionDef::new().method(Method::Get).handler(list)),
            )
            .build(),
    );
    registry.register(
        Module::builder("app", app_dir.path())
            .controller(
                "widgets/widgets.controller",
                ControllerDef::new()
                    .action("get", ActionDef::new().extra("cache", json!("private"))),
            )
            .build(),
    );

    let app = App::build(&registry, Config::new()).unwrap();
    let node = app.tree().at("widgets").unwrap();
    let get = &node.controller().actions["get"];
    assert_eq!(get.method, Some(Method::Get));
    assert_eq!(get.extra["cache"], json!("private"));
    assert!(get.handler.is_some());
}

#[test]
fn bare_controller_directory_yields_exactly_one_node() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "app/foo/bar/bar.controller.rs", "");

    let mut registry = Registry::new();
    registry.register(
        Module::builder("app", tmp.path())
            .controller(
                "foo/bar/bar.controller",
                ControllerDef::new().action("baz", ActionDef::new().handler(list)),
            )
            .build(),
    );

    let app = App::build(&registry, Config::new()).unwrap();
    let node = app.tree().at("foo/bar").unwrap();
    assert_eq!(node.path(), "/foo/bar");
    assert!(node.controller().actions.contains_key("baz"));
    assert_eq!(node.children().count(), 0);
    assert!(node.synthesized_actions().is_empty());

    // the intermediate segment exists purely as a path component
    let foo = app.tree().at("foo").unwrap();
    assert!(foo.controller().actions.is_empty());
    assert!(foo.model().is_none());
}

#[test]
fn duplicate_models_error_regardless_of_module_order() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    write(first.path(), "app/widgets/widget.model.rs", "");
    write(second.path(), "app/widgets/rival.model.rs", "");

    for flipped in [false, true] {
        let mut registry = Registry::new();
        let mut order = vec![
            Module::builder("first", first.path())
                .model("widgets/widget.model", ModelDef::new("widget"))
                .model("widgets/rival.model", ModelDef::new("widget")) // unused in first
                .build(),
            Module::builder("second", second.path())
                .model("widgets/widget.model", ModelDef::new("rival"))
                .model("widgets/rival.model", ModelDef::new("rival"))
                .build(),
        ];
        if flipped {
            order.reverse();
        }
        for module in order {
            registry.register(module);
        }
        let err = App::build(&registry, Config::new()).unwrap_err();
        assert!(matches!(err, arbor::Error::DuplicateModel { .. }));
    }
}

#[tokio::test]
async fn literal_nested_route_beats_ancestor_placeholder() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "app/foo/foo.controller.rs", "");
    write(tmp.path(), "app/foo/bar/index.hbs", "<p>literal bar</p>");

    let mut registry = Registry::new();
    registry.register(
        Module::builder("app", tmp.path())
            .controller(
                "foo/foo.controller",
                ControllerDef::new().action("by_id", ActionDef::new().path(":id").handler(list)),
            )
            .build(),
    );

    let app = App::build(&registry, Config::new()).unwrap();

    // the subtree route binds ahead of the parent's :id entry
    let paths: Vec<&str> = app.router().routes().iter().map(|r| r.path()).collect();
    assert_eq!(paths, ["/foo/bar", "/foo/:id"]);

    let res = app.handle(Request::new(Method::Get, "/foo/bar")).await;
    assert_eq!(res.body(), b"<p>literal bar</p>");

    let res = app.handle(Request::new(Method::Get, "/foo/42")).await;
    assert_eq!(res.header("content-type"), Some("application/json"));
}

#[test]
fn overlapping_modules_union_their_directory_trees() {
    let base = tempfile::tempdir().unwrap();
    let app_dir = tempfile::tempdir().unwrap();
    write(base.path(), "app/shared/index.hbs", "base");
    write(app_dir.path(), "app/shared/index.hbs", "app"); // later wins
    write(app_dir.path(), "app/extra/index.hbs", "extra");

    let mut registry = Registry::new();
    registry.register(Module::builder("base", base.path()).build());
    registry.register(Module::builder("app", app_dir.path()).build());

    let app = App::build(&registry, Config::new()).unwrap();
    assert!(app.tree().at("shared").is_some());
    assert!(app.tree().at("extra").is_some());
}

#[tokio::test]
async fn later_module_template_overrides_earlier_at_same_pair() {
    let base = tempfile::tempdir().unwrap();
    let app_dir = tempfile::tempdir().unwrap();
    write(base.path(), "app/about.hbs", "from base");
    write(app_dir.path(), "app/about.hbs", "from app");

    let mut registry = Registry::new();
    registry.register(Module::builder("base", base.path()).build());
    registry.register(Module::builder("app", app_dir.path()).build());

    let app = App::build(&registry, Config::new()).unwrap();
    let res = app.handle(Request::new(Method::Get, "/about")).await;
    assert_eq!(res.body(), b"from app");
}

#[test]
fn controller_path_shadowing_a_directory_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "app/foo/foo.controller.rs", "");
    write(tmp.path(), "app/foo/bar/index.hbs", "");

    let mut registry = Registry::new();
    registry.register(
        Module::builder("app", tmp.path())
            .controller(
                "foo/foo.controller",
                ControllerDef::new().action("bar", ActionDef::new().path("bar").handler(list)),
            )
            .build(),
    );

    let err = App::build(&registry, Config::new()).unwrap_err();
    assert!(matches!(err, arbor::Error::PathCollision { .. }));
}

#[tokio::test]
async fn required_inputs_gate_dispatch() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "app/widgets/widgets.controller.rs", "");

    let mut registry = Registry::new();
    registry.register(
        Module::builder("app", tmp.path())
            .controller(
                "widgets/widgets.controller",
                ControllerDef::new().action(
                    "create",
                    ActionDef::new()
                        .method(Method::Post)
                        .input("payload", BindingSource::Body, true)
                        .handler(list),
                ),
            )
            .build(),
    );

    let app = App::build(&registry, Config::new()).unwrap();

    let res = app.handle(Request::new(Method::Post, "/widgets")).await;
    assert_eq!(res.status_code(), 422);

    let res = app
        .handle(Request::new(Method::Post, "/widgets").with_body(b"{}".to_vec()))
        .await;
    assert_eq!(res.status_code(), 200);
}

#[test]
fn rebuilding_from_the_same_registry_is_deterministic() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "app/a/index.hbs", "");
    write(tmp.path(), "app/b/index.hbs", "");
    write(tmp.path(), "app/b/c/index.hbs", "");

    let mut registry = Registry::new();
    registry.register(Module::builder("app", tmp.path()).build());

    let first = App::build(&registry, Config::new()).unwrap();
    let second = App::build(&registry, Config::new()).unwrap();
    let paths = |app: &App| -> Vec<String> {
        app.router().routes().iter().map(|r| r.path().to_owned()).collect()
    };
    assert_eq!(paths(&first), paths(&second));
    assert_eq!(paths(&first), ["/a", "/b", "/b/c"]);
}
