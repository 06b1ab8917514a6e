//! Tests for resource registration and named-route URL generation.

use std::collections::HashMap;

use restlink::{Registry, RegistryError, RequestContext, Resource, UrlError};

mod tracing_util;
use tracing_util::TestTracing;

fn get_only_resource() -> Resource {
    Resource::builder()
        .get(|_ctx: &mut RequestContext| Ok(()))
        .build()
}

#[test]
fn test_register_resource() {
    let _t = TestTracing::init();
    let mut registry = Registry::new();
    registry
        .register(Some("resource"), "/resource", get_only_resource())
        .unwrap();
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_decline_empty_resource() {
    let _t = TestTracing::init();
    let mut registry = Registry::new();
    let err = registry
        .register(Some("resource"), "/resource", Resource::builder().build())
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::EmptyResource {
            name: "resource".to_string()
        }
    );
    assert!(registry.is_empty());
}

#[test]
fn test_decline_empty_anonymous_resource_names_the_pattern() {
    let _t = TestTracing::init();
    let mut registry = Registry::new();
    let err = registry
        .register(None, "/anon", Resource::builder().build())
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::EmptyResource {
            name: "/anon".to_string()
        }
    );
}

#[test]
fn test_decline_duplicate_name() {
    let _t = TestTracing::init();
    let mut registry = Registry::new();
    registry
        .register(Some("r"), "/r", get_only_resource())
        .unwrap();
    let err = registry
        .register(Some("r"), "/other", get_only_resource())
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::DuplicateName {
            name: "r".to_string()
        }
    );
    // The failed registration must not land in the match table either.
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_duplicate_pattern_is_allowed() {
    let _t = TestTracing::init();
    let mut registry = Registry::new();
    registry
        .register(Some("a"), "/same", get_only_resource())
        .unwrap();
    registry
        .register(Some("b"), "/same", get_only_resource())
        .unwrap();
    assert_eq!(registry.find_matches("/same").len(), 2);
}

#[test]
fn test_url_without_params() {
    let _t = TestTracing::init();
    let mut registry = Registry::new();
    registry
        .register(Some("r1"), "/r1", get_only_resource())
        .unwrap();
    assert_eq!(registry.url("r1", &[]).unwrap(), "/r1");
}

#[test]
fn test_url_with_params() {
    let _t = TestTracing::init();
    let mut registry = Registry::new();
    registry
        .register(Some("r1"), "/r1/:uuid", get_only_resource())
        .unwrap();
    assert_eq!(registry.url("r1", &["123"]).unwrap(), "/r1/123");
}

#[test]
fn test_url_named_params() {
    let _t = TestTracing::init();
    let mut registry = Registry::new();
    registry
        .register(Some("post"), "/u/:uid/posts/:pid", get_only_resource())
        .unwrap();
    let mut values = HashMap::new();
    values.insert("uid".to_string(), "7".to_string());
    values.insert("pid".to_string(), "9".to_string());
    assert_eq!(registry.url_named("post", &values).unwrap(), "/u/7/posts/9");
}

#[test]
fn test_url_unknown_name_is_recoverable() {
    let _t = TestTracing::init();
    let registry = Registry::new();
    let err = registry.url("missing", &[]).unwrap_err();
    assert_eq!(
        err,
        UrlError::NoSuchRoute {
            name: "missing".to_string()
        }
    );
    assert_eq!(err.to_string(), "no route found for resource: missing");
}

#[test]
fn test_url_is_idempotent() {
    let _t = TestTracing::init();
    let mut registry = Registry::new();
    registry
        .register(Some("r1"), "/r1/:uuid", get_only_resource())
        .unwrap();
    let first = registry.url("r1", &["123"]).unwrap();
    let second = registry.url("r1", &["123"]).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_url_insufficient_values() {
    let _t = TestTracing::init();
    let mut registry = Registry::new();
    registry
        .register(Some("r1"), "/r1/:uuid", get_only_resource())
        .unwrap();
    let err = registry.url("r1", &[]).unwrap_err();
    assert!(matches!(err, UrlError::MissingValues { expected: 1, .. }));
}

#[test]
fn test_find_matches_preserves_registration_order() {
    let _t = TestTracing::init();
    let mut registry = Registry::new();
    registry
        .register(Some("by-id"), "/things/:id", get_only_resource())
        .unwrap();
    registry
        .register(Some("special"), "/things/special", get_only_resource())
        .unwrap();

    let matches = registry.find_matches("/things/special");
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].route.name(), Some("by-id"));
    assert_eq!(matches[1].route.name(), Some("special"));
}

#[test]
fn test_find_matches_ignores_query_string() {
    let _t = TestTracing::init();
    let mut registry = Registry::new();
    registry
        .register(Some("r"), "/r/:uuid", get_only_resource())
        .unwrap();
    let matches = registry.find_matches("/r/1?view=full");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].params[0].1, "1");
}
