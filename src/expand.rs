//! # View-Expansion Pipeline
//!
//! Post-processing for successful GET dispatches: turns a flat resource
//! body with relation links into a nested response tree.
//!
//! ## Pipeline
//!
//! 1. **Format** — the resource's `format` hook replaces the body.
//! 2. **View selection** — a `?view=` query parameter resolved through the
//!    resource's `shortcut` hook yields an [`ExtractSpec`]; without both,
//!    the response is returned as-is.
//! 3. **Recursive extraction** — per relation, in spec order: `extract`
//!    lists link URIs, each URI is resolved by re-entering the route table
//!    and executing the first read-capable match's `read` hook on its
//!    worker, the child body is expanded depth-first against the nested
//!    spec using the child route's own hooks, and `embed` attaches the
//!    result to the parent.
//!
//! Every step is capability-gated: a missing hook silently skips its step.
//! A failing hook or read aborts the whole expansion and propagates as the
//! request error.
//!
//! ## Ordering
//!
//! Sibling relations resolve top-to-bottom in spec enumeration order;
//! links within a relation resolve sequentially in the order `extract`
//! returned them, and embed in that same order. A single resolved link
//! embeds as a scalar, several embed as an array — never collapsed, never
//! reordered.
//!
//! ## Defenses
//!
//! Recursion is structurally bounded by the finite [`ExtractSpec`] tree
//! (the child's `shortcut` is not re-consulted mid-expansion), with a
//! configured depth ceiling on top. A per-request resolve cache keyed by
//! URI runs each distinct link's `read` at most once per request; repeat
//! references — including back-references into already-visited resources —
//! are served from the cache.

use anyhow::{bail, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::context::{ReadContext, RequestContext};
use crate::dispatcher::Dispatcher;
use crate::ids::RequestId;
use crate::resource::{ExtractSpec, Resource};
use crate::router::Route;

/// Per-request expansion state: the resolve cache and the depth ceiling.
struct ExpandState<'a> {
    dispatcher: &'a Dispatcher,
    request_id: RequestId,
    /// URI → (raw read body, route that served it). Raw bodies are memoized
    /// so each distinct URI's read runs at most once per request; nested
    /// expansion operates on a clone per occurrence, since occurrences may
    /// carry different nested specs.
    resolved: HashMap<String, (Value, Arc<Route>)>,
    max_depth: usize,
}

/// Run the pipeline for a completed GET dispatch.
pub(crate) fn run(dispatcher: &Dispatcher, route: &Arc<Route>, ctx: &mut RequestContext) -> Result<()> {
    let resource = route.resource();

    if let Some(format) = resource.format_hook() {
        if let Some(body) = ctx.body.take() {
            ctx.body = Some(format(body, None)?);
        }
    }

    let Some(view) = ctx.query_param("view").map(str::to_string) else {
        return Ok(());
    };
    let Some(shortcut) = resource.shortcut_hook() else {
        return Ok(());
    };
    let Some(options) = shortcut(&view) else {
        debug!(request_id = %ctx.request_id, view = %view, "view not recognized by shortcut hook");
        return Ok(());
    };
    let Some(spec) = options.extract else {
        return Ok(());
    };
    if spec.is_empty() {
        return Ok(());
    }
    let request_id = ctx.request_id;
    let Some(body) = ctx.body.as_mut() else {
        return Ok(());
    };

    debug!(
        request_id = %request_id,
        view = %view,
        relations = spec.len(),
        "link expansion start"
    );

    let mut state = ExpandState {
        dispatcher,
        request_id,
        resolved: HashMap::new(),
        max_depth: dispatcher.config().max_expand_depth,
    };
    expand_node(resource, body, &spec, &mut state, 0)
}

/// Expand one body against one spec level, depth-first.
fn expand_node(
    resource: &Arc<Resource>,
    body: &mut Value,
    spec: &ExtractSpec,
    state: &mut ExpandState<'_>,
    depth: usize,
) -> Result<()> {
    if depth >= state.max_depth {
        bail!("link expansion exceeded max depth {}", state.max_depth);
    }

    for (relation, nested) in spec.iter() {
        let Some(extract) = resource.extract_hook() else {
            debug!(
                request_id = %state.request_id,
                relation = relation,
                "resource has no extract hook, relation skipped"
            );
            continue;
        };
        let uris = extract(body, relation)?;
        if uris.is_empty() {
            continue;
        }

        debug!(
            request_id = %state.request_id,
            relation = relation,
            links = uris.len(),
            depth = depth,
            "resolving relation links"
        );

        let mut resolved = Vec::with_capacity(uris.len());
        for uri in &uris {
            resolved.push(resolve_link(uri, nested, state, depth)?);
        }

        let Some(embed) = resource.embed_hook() else {
            debug!(
                request_id = %state.request_id,
                relation = relation,
                "resource has no embed hook, relation skipped"
            );
            continue;
        };
        let packaged = if resolved.len() == 1 {
            resolved.swap_remove(0)
        } else {
            Value::Array(resolved)
        };
        embed(body, relation, packaged)?;
    }

    Ok(())
}

/// Resolve one link URI to a fully expanded body.
///
/// The read itself is served from the per-request cache when the URI was
/// already resolved; the nested expansion always runs, on a clone, because
/// this occurrence's nested spec may differ from the cached one's.
fn resolve_link(
    uri: &str,
    nested: &ExtractSpec,
    state: &mut ExpandState<'_>,
    depth: usize,
) -> Result<Value> {
    let cached = state
        .resolved
        .get(uri)
        .map(|(value, route)| (value.clone(), Arc::clone(route)));

    let (mut value, route) = match cached {
        Some(hit) => hit,
        None => {
            let matches = state.dispatcher.registry().find_matches(uri);
            let Some(m) = matches
                .into_iter()
                .find(|m| m.route.resource().has_read())
            else {
                warn!(
                    request_id = %state.request_id,
                    uri = %uri,
                    "no read-capable route for link, embedding null"
                );
                return Ok(Value::Null);
            };

            let read_ctx = ReadContext {
                request_id: state.request_id,
                uri: uri.to_string(),
                params: m.params,
                embedded: true,
            };
            let value = state.dispatcher.read(&m.route, read_ctx)?;
            state
                .resolved
                .insert(uri.to_string(), (value.clone(), Arc::clone(&m.route)));
            (value, m.route)
        }
    };

    if !nested.is_empty() {
        expand_node(route.resource(), &mut value, nested, state, depth + 1)?;
    }
    Ok(value)
}
