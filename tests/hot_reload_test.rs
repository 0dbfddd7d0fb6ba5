//! Development-mode reloads through the override registry.

use std::path::PathBuf;
use std::time::Duration;

use axum::http::Method;
use route_autoload::reload::{ChangeOutcome, HotReloader};
use route_autoload::{AppConfig, Application, Shutdown};
use tokio::sync::mpsc;

mod common;

use common::{get_body, manifest, manifest_loader, send, RouteTree};

async fn dev_app(tree: &RouteTree, watch_dirs: Vec<PathBuf>) -> Application {
    let mut config = AppConfig::default();
    config.routes.routes_dir = tree.routes_dir();
    config.hot_reload.enabled = true;
    config.hot_reload.watch_dirs = watch_dirs;
    let (loader, graph) = manifest_loader();
    Application::build(&config, loader, graph).await.unwrap()
}

#[tokio::test]
async fn test_route_edit_overrides_static_handler() {
    let tree = RouteTree::new();
    let hello = tree.route("hello.toml", "v1");
    let app = dev_app(&tree, vec![]).await;
    let dev = app.dev.as_ref().unwrap();

    assert_eq!(get_body(&app.router, "/hello").await, "v1");

    tree.write("routes/hello.toml", &manifest("v2"));
    let outcome = dev.resolver.handle_change(&hello).await;
    assert!(matches!(outcome, ChangeOutcome::Applied(ref keys) if keys.len() == 1));

    assert_eq!(get_body(&app.router, "/hello").await, "v2");
    assert!(dev.overrides.get("get", "/hello").is_some());
}

#[tokio::test]
async fn test_dynamic_override_keeps_static_precedence() {
    let tree = RouteTree::new();
    tree.route("users/new.toml", "new");
    let by_id = tree.route("users/[id].toml", "id v1");
    let app = dev_app(&tree, vec![]).await;
    let dev = app.dev.as_ref().unwrap();

    tree.write("routes/users/[id].toml", &manifest("id v2"));
    dev.resolver.handle_change(&by_id).await;

    assert_eq!(get_body(&app.router, "/users/5").await, "id v2");
    assert_eq!(get_body(&app.router, "/users/new").await, "new");
}

#[tokio::test]
async fn test_shared_module_edit_reloads_importers() {
    let tree = RouteTree::new();
    let shared = tree.write("shared/common.toml", "[headers]\nx-version = \"1\"\n");
    tree.write(
        "routes/a.toml",
        "imports = [\"../shared/common.toml\"]\n[default]\nbody = \"a\"\n",
    );
    tree.route("b.toml", "b");
    let app = dev_app(&tree, vec![]).await;
    let dev = app.dev.as_ref().unwrap();

    assert_eq!(send(&app.router, Method::GET, "/a").await.1["x-version"], "1");

    tree.write("shared/common.toml", "[headers]\nx-version = \"2\"\n");
    let outcome = dev.resolver.handle_change(&shared).await;
    let ChangeOutcome::Applied(keys) = outcome else {
        panic!("expected Applied");
    };
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].to_string(), "GET /a");

    assert_eq!(send(&app.router, Method::GET, "/a").await.1["x-version"], "2");
    assert!(dev.overrides.get("get", "/b").is_none());
}

#[tokio::test]
async fn test_imported_non_route_file_under_routes_dir() {
    let tree = RouteTree::new();
    let shared = tree.write("routes/_shared/h.toml", "[headers]\nx-version = \"1\"\n");
    tree.write(
        "routes/a.json",
        r#"{ "imports": ["_shared/h.toml"], "default": { "body": "a" } }"#,
    );

    let mut config = AppConfig::default();
    config.routes.routes_dir = tree.routes_dir();
    config.routes.pattern = "**/*.json".into();
    config.hot_reload.enabled = true;
    let (loader, graph) = manifest_loader();
    let app = Application::build(&config, loader, graph).await.unwrap();
    let dev = app.dev.as_ref().unwrap();
    assert_eq!(app.report.registered.len(), 1);

    tree.write("routes/_shared/h.toml", "[headers]\nx-version = \"2\"\n");
    let outcome = dev.resolver.handle_change(&shared).await;
    assert!(matches!(outcome, ChangeOutcome::Applied(ref keys) if keys.len() == 1));
    assert_eq!(send(&app.router, Method::GET, "/a").await.1["x-version"], "2");
}

#[tokio::test]
async fn test_head_follows_reloaded_get_handler() {
    let tree = RouteTree::new();
    let hello = tree.write("routes/hello.toml", "[default]\nbody = \"v1\"\nheaders = { x-v = \"1\" }\n");
    let app = dev_app(&tree, vec![]).await;
    let dev = app.dev.as_ref().unwrap();

    tree.write("routes/hello.toml", "[default]\nbody = \"v2\"\nheaders = { x-v = \"2\" }\n");
    dev.resolver.handle_change(&hello).await;

    assert_eq!(send(&app.router, Method::GET, "/hello").await.1["x-v"], "2");
    assert_eq!(send(&app.router, Method::HEAD, "/hello").await.1["x-v"], "2");
}

#[tokio::test]
async fn test_trailing_slash_matches_static_routing() {
    let tree = RouteTree::new();
    let hello = tree.route("hello.toml", "v1");
    let app = dev_app(&tree, vec![]).await;
    let dev = app.dev.as_ref().unwrap();

    tree.write("routes/hello.toml", &manifest("v2"));
    dev.resolver.handle_change(&hello).await;

    assert_eq!(get_body(&app.router, "/hello").await, "v2");
    assert_eq!(
        send(&app.router, Method::GET, "/hello/").await.0,
        axum::http::StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_import_cycle_terminates() {
    let tree = RouteTree::new();
    tree.write("shared/x.toml", "imports = [\"y.toml\"]\n[headers]\nx-from = \"x\"\n");
    let y = tree.write("shared/y.toml", "imports = [\"x.toml\"]\n");
    tree.write(
        "routes/page.toml",
        "imports = [\"../shared/x.toml\"]\n[default]\nbody = \"page\"\n",
    );
    let app = dev_app(&tree, vec![]).await;
    let dev = app.dev.as_ref().unwrap();

    let affected = dev.resolver.affected_routes(&y);
    assert_eq!(affected, vec![tree.routes_dir().join("page.toml")]);

    let outcome = dev.resolver.handle_change(&y).await;
    assert!(matches!(outcome, ChangeOutcome::Applied(ref keys) if keys.len() == 1));
    assert_eq!(dev.overrides.len(), 1);
}

#[tokio::test]
async fn test_failed_reload_keeps_previous_handler() {
    let tree = RouteTree::new();
    let hello = tree.route("hello.toml", "v1");
    let app = dev_app(&tree, vec![]).await;
    let dev = app.dev.as_ref().unwrap();

    tree.write("routes/hello.toml", &manifest("v2"));
    dev.resolver.handle_change(&hello).await;

    tree.write("routes/hello.toml", "[default\n");
    let outcome = dev.resolver.handle_change(&hello).await;
    assert!(matches!(outcome, ChangeOutcome::Failed(_)));
    assert_eq!(get_body(&app.router, "/hello").await, "v2");

    tree.write("routes/hello.toml", "default = \"text\"\n");
    let outcome = dev.resolver.handle_change(&hello).await;
    assert!(matches!(outcome, ChangeOutcome::Failed(_)));
    assert_eq!(get_body(&app.router, "/hello").await, "v2");
}

#[tokio::test]
async fn test_allow_list_ignores_unrelated_paths() {
    let tree = RouteTree::new();
    tree.route("hello.toml", "v1");
    let shared_dir = tree.root().join("shared");
    std::fs::create_dir_all(&shared_dir).unwrap();
    let app = dev_app(&tree, vec![shared_dir]).await;
    let dev = app.dev.as_ref().unwrap();

    let unrelated = tree.write("elsewhere/notes.toml", "x = 1\n");
    assert!(matches!(
        dev.resolver.handle_change(&unrelated).await,
        ChangeOutcome::Ignored
    ));

    let orphan = tree.write("shared/orphan.toml", "x = 1\n");
    assert!(matches!(
        dev.resolver.handle_change(&orphan).await,
        ChangeOutcome::NoImporters
    ));

    let readme = tree.write("routes/README.md", "docs");
    assert!(matches!(
        dev.resolver.handle_change(&readme).await,
        ChangeOutcome::Ignored
    ));
    assert!(dev.overrides.is_empty());
}

#[tokio::test]
async fn test_reload_task_debounces_and_stops() {
    let tree = RouteTree::new();
    let hello = tree.route("hello.toml", "v1");
    let app = dev_app(&tree, vec![]).await;
    let dev = app.dev.as_ref().unwrap();

    let (tx, rx) = mpsc::unbounded_channel();
    let shutdown = Shutdown::new();
    let reloader = HotReloader::new(dev.resolver.clone(), Duration::from_millis(20));
    let task = tokio::spawn(reloader.run(rx, shutdown.subscribe()));

    tree.write("routes/hello.toml", &manifest("v2"));
    for _ in 0..5 {
        tx.send(hello.clone()).unwrap();
    }

    let mut reloaded = false;
    for _ in 0..100 {
        if get_body(&app.router, "/hello").await == "v2" {
            reloaded = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(reloaded, "reload task never applied the change");

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("reload task did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_static_mode_has_no_overrides() {
    let tree = RouteTree::new();
    tree.route("hello.toml", "v1");
    let mut config = AppConfig::default();
    config.routes.routes_dir = tree.routes_dir();
    let (loader, graph) = manifest_loader();
    let app = Application::build(&config, loader, graph).await.unwrap();

    assert!(app.dev.is_none());
    assert!(app.start_hot_reload(&Shutdown::new()).unwrap().is_none());
}
