//! The shipped sample configuration stays loadable.

use std::path::Path;

use action_router::config::{load_config, EvaluatorKind};
use action_router::lifecycle::build_servers;

#[test]
fn test_sample_config_builds() {
    let config = load_config(Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/config/action-router.toml"))).unwrap();
    assert_eq!(config.triggers.len(), 1);
    assert_eq!(config.triggers[0].dispatch.evaluator, EvaluatorKind::Contains);

    let servers = build_servers(&config).unwrap();
    let routes = servers[0].routes();
    assert_eq!(routes.len(), 2);
    assert_eq!(routes[0].path, "/orders");
    assert_eq!(routes[0].default_action_id.as_deref(), Some("orders_default"));
    assert_eq!(routes[0].dispatches, 1);
    assert_eq!(routes[1].path, "/orders/{id}");
}
