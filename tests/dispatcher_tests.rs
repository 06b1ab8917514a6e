//! Tests for the request dispatcher: verb selection, registration-order
//! tie-breaks, `Allow`/405/501/204 handling, parameter merging, and error
//! propagation.

use std::sync::Arc;

use anyhow::anyhow;
use http::Method;
use restlink::{
    DispatchOutcome, Dispatcher, Registry, RequestContext, Resource, RuntimeConfig,
};
use serde_json::json;

mod tracing_util;
use tracing_util::TestTracing;

fn init() -> TestTracing {
    let size = std::env::var("RESTLINK_STACK_SIZE")
        .ok()
        .and_then(|v| {
            if let Some(hex) = v.strip_prefix("0x") {
                usize::from_str_radix(hex, 16).ok()
            } else {
                v.parse().ok()
            }
        })
        .unwrap_or(0x4000);
    may::config().set_stack_size(size);
    TestTracing::init()
}

#[test]
fn test_routes_request_to_proper_resource() {
    let _t = init();
    let mut registry = Registry::new();
    registry
        .register(
            Some("r1"),
            "/r1",
            Resource::builder()
                .get(|ctx: &mut RequestContext| {
                    ctx.status = Some(200);
                    ctx.body = Some(json!({}));
                    Ok(())
                })
                .build(),
        )
        .unwrap();
    registry
        .register(
            Some("r2"),
            "/r2",
            Resource::builder()
                .get(|ctx: &mut RequestContext| {
                    ctx.status = Some(404);
                    Ok(())
                })
                .post(|_ctx: &mut RequestContext| Ok(()))
                .build(),
        )
        .unwrap();
    let dispatcher = Dispatcher::new(registry, RuntimeConfig::default());

    let mut ctx = RequestContext::new(Method::GET, "/r1");
    assert_eq!(
        dispatcher.dispatch(&mut ctx).unwrap(),
        DispatchOutcome::Handled
    );
    assert_eq!(ctx.status, Some(200));
    assert_eq!(ctx.body, Some(json!({})));

    let mut ctx = RequestContext::new(Method::GET, "/r2");
    assert_eq!(
        dispatcher.dispatch(&mut ctx).unwrap(),
        DispatchOutcome::Handled
    );
    assert_eq!(ctx.status, Some(404));
}

#[test]
fn test_earliest_registered_route_wins() {
    let _t = init();
    let mut registry = Registry::new();
    registry
        .register(
            Some("first"),
            "/dup/:id",
            Resource::builder()
                .get(|ctx: &mut RequestContext| {
                    ctx.status = Some(200);
                    ctx.body = Some(json!({"winner": "first"}));
                    Ok(())
                })
                .build(),
        )
        .unwrap();
    registry
        .register(
            Some("second"),
            "/dup/:name",
            Resource::builder()
                .get(|ctx: &mut RequestContext| {
                    ctx.status = Some(200);
                    ctx.body = Some(json!({"winner": "second"}));
                    Ok(())
                })
                .build(),
        )
        .unwrap();
    let dispatcher = Dispatcher::new(registry, RuntimeConfig::default());

    let mut ctx = RequestContext::new(Method::GET, "/dup/x");
    dispatcher.dispatch(&mut ctx).unwrap();
    assert_eq!(ctx.body, Some(json!({"winner": "first"})));
}

#[test]
fn test_later_route_serves_verbs_the_first_lacks() {
    let _t = init();
    let mut registry = Registry::new();
    registry
        .register(
            Some("reader"),
            "/overlap",
            Resource::builder()
                .get(|ctx: &mut RequestContext| {
                    ctx.status = Some(200);
                    Ok(())
                })
                .build(),
        )
        .unwrap();
    registry
        .register(
            Some("writer"),
            "/overlap",
            Resource::builder()
                .post(|ctx: &mut RequestContext| {
                    ctx.status = Some(201);
                    Ok(())
                })
                .build(),
        )
        .unwrap();
    let dispatcher = Dispatcher::new(registry, RuntimeConfig::default());

    let mut ctx = RequestContext::new(Method::POST, "/overlap");
    dispatcher.dispatch(&mut ctx).unwrap();
    assert_eq!(ctx.status, Some(201));
}

#[test]
fn test_match_params_merge_into_context() {
    let _t = init();
    let mut registry = Registry::new();
    registry
        .register(
            Some("post"),
            "/u/:uid/posts/:pid",
            Resource::builder()
                .get(|ctx: &mut RequestContext| {
                    ctx.status = Some(200);
                    ctx.body = Some(json!({
                        "uid": ctx.param("uid"),
                        "pid": ctx.param("pid"),
                    }));
                    Ok(())
                })
                .build(),
        )
        .unwrap();
    let dispatcher = Dispatcher::new(registry, RuntimeConfig::default());

    let mut ctx = RequestContext::new(Method::GET, "/u/7/posts/9");
    // Pre-existing entries survive the merge but are shadowed on conflict.
    ctx.params.push((Arc::from("uid"), "stale".to_string()));
    dispatcher.dispatch(&mut ctx).unwrap();
    assert_eq!(ctx.body, Some(json!({"uid": "7", "pid": "9"})));
}

#[test]
fn test_method_not_allowed_sets_allow_union() {
    let _t = init();
    let mut registry = Registry::new();
    registry
        .register(
            Some("reader"),
            "/thing/:id",
            Resource::builder()
                .get(|_ctx: &mut RequestContext| Ok(()))
                .build(),
        )
        .unwrap();
    registry
        .register(
            Some("writer"),
            "/thing/:key",
            Resource::builder()
                .post(|_ctx: &mut RequestContext| Ok(()))
                .delete(|_ctx: &mut RequestContext| Ok(()))
                .build(),
        )
        .unwrap();
    let dispatcher = Dispatcher::new(registry, RuntimeConfig::default());

    let mut ctx = RequestContext::new(Method::PUT, "/thing/1");
    assert_eq!(
        dispatcher.dispatch(&mut ctx).unwrap(),
        DispatchOutcome::Handled
    );
    assert_eq!(ctx.status, Some(405));
    assert_eq!(ctx.header("Allow"), Some("DELETE, GET, POST"));
}

#[test]
fn test_options_gets_204_with_allow() {
    let _t = init();
    let mut registry = Registry::new();
    registry
        .register(
            Some("r"),
            "/r",
            Resource::builder()
                .get(|_ctx: &mut RequestContext| Ok(()))
                .post(|_ctx: &mut RequestContext| Ok(()))
                .build(),
        )
        .unwrap();
    let dispatcher = Dispatcher::new(registry, RuntimeConfig::default());

    let mut ctx = RequestContext::new(Method::OPTIONS, "/r");
    dispatcher.dispatch(&mut ctx).unwrap();
    assert_eq!(ctx.status, Some(204));
    assert_eq!(ctx.header("Allow"), Some("GET, POST"));
}

#[test]
fn test_unrecognized_verb_gets_501() {
    let _t = init();
    let mut registry = Registry::new();
    registry
        .register(
            Some("r"),
            "/r",
            Resource::builder()
                .get(|_ctx: &mut RequestContext| Ok(()))
                .build(),
        )
        .unwrap();
    let dispatcher = Dispatcher::new(registry, RuntimeConfig::default());

    let mut ctx = RequestContext::new(Method::PATCH, "/r");
    dispatcher.dispatch(&mut ctx).unwrap();
    assert_eq!(ctx.status, Some(501));
    assert_eq!(ctx.header("Allow"), Some("GET"));
}

#[test]
fn test_link_verb_dispatches() {
    let _t = init();
    let mut registry = Registry::new();
    registry
        .register(
            Some("linker"),
            "/linkable",
            Resource::builder()
                .link(|ctx: &mut RequestContext| {
                    ctx.status = Some(204);
                    Ok(())
                })
                .build(),
        )
        .unwrap();
    let dispatcher = Dispatcher::new(registry, RuntimeConfig::default());

    let link = Method::from_bytes(b"LINK").unwrap();
    let mut ctx = RequestContext::new(link, "/linkable");
    dispatcher.dispatch(&mut ctx).unwrap();
    assert_eq!(ctx.status, Some(204));
}

#[test]
fn test_unmatched_path_falls_through_to_next() {
    let _t = init();
    let mut registry = Registry::new();
    registry
        .register(
            Some("r"),
            "/r",
            Resource::builder()
                .get(|_ctx: &mut RequestContext| Ok(()))
                .build(),
        )
        .unwrap();
    let dispatcher = Dispatcher::new(registry, RuntimeConfig::default());

    let mut ctx = RequestContext::new(Method::GET, "/elsewhere");
    assert_eq!(
        dispatcher.dispatch(&mut ctx).unwrap(),
        DispatchOutcome::NotMatched
    );
    assert_eq!(ctx.status, None);

    let mut ctx = RequestContext::new(Method::GET, "/elsewhere");
    dispatcher
        .handle(&mut ctx, |ctx| {
            ctx.status = Some(404);
            Ok(())
        })
        .unwrap();
    assert_eq!(ctx.status, Some(404));
}

#[test]
fn test_handler_error_propagates() {
    let _t = init();
    let mut registry = Registry::new();
    registry
        .register(
            Some("boom"),
            "/boom",
            Resource::builder()
                .get(|_ctx: &mut RequestContext| Err(anyhow!("backend exploded")))
                .build(),
        )
        .unwrap();
    let dispatcher = Dispatcher::new(registry, RuntimeConfig::default());

    let mut ctx = RequestContext::new(Method::GET, "/boom");
    let err = dispatcher.dispatch(&mut ctx).unwrap_err();
    assert!(err.to_string().contains("backend exploded"));
}

#[test]
fn test_non_get_verbs_skip_expansion() {
    let _t = init();
    let mut registry = Registry::new();
    registry
        .register(
            Some("r"),
            "/r",
            Resource::builder()
                .post(|ctx: &mut RequestContext| {
                    ctx.status = Some(201);
                    ctx.body = Some(json!({"created": true}));
                    Ok(())
                })
                .format(|_body: serde_json::Value, _options: Option<&serde_json::Value>| {
                    Ok(json!({"formatted": true}))
                })
                .build(),
        )
        .unwrap();
    let dispatcher = Dispatcher::new(registry, RuntimeConfig::default());

    let mut ctx = RequestContext::new(Method::POST, "/r");
    dispatcher.dispatch(&mut ctx).unwrap();
    // The format hook belongs to the GET pipeline; POST must not touch it.
    assert_eq!(ctx.body, Some(json!({"created": true})));
}
