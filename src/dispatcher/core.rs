//! Dispatcher core - per-request verb selection and worker invocation.

use anyhow::{anyhow, Result};
use http::Method;
use may::coroutine;
use may::sync::mpsc;
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::context::{ReadContext, RequestContext};
use crate::expand;
use crate::resource::{Verb, VerbSet};
use crate::router::{Registry, Route};
use crate::runtime_config::RuntimeConfig;

/// Message consumed by a route's worker coroutine.
pub(crate) enum ResourceCall {
    /// Full verb dispatch: the request context travels to the worker and
    /// comes back mutated on success.
    Verb {
        verb: Verb,
        ctx: RequestContext,
        reply_tx: mpsc::Sender<Result<RequestContext>>,
    },
    /// Embedded read during link expansion.
    Read {
        ctx: ReadContext,
        reply_tx: mpsc::Sender<Result<Value>>,
    },
}

/// Channel sender feeding a route's worker coroutine.
pub(crate) type WorkerSender = mpsc::Sender<ResourceCall>;

/// How a dispatch concluded, from the enclosing chain's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler ran, or the dispatcher wrote a routing-decision status
    /// (405/501/204) into the context.
    Handled,
    /// No route matched the path; the next stage of the enclosing chain
    /// owns the request.
    NotMatched,
}

/// Immutable dispatch engine over a finalized route table.
///
/// `Dispatcher::new` is the builder→serving transition: it consumes the
/// mutable [`Registry`] and spawns one worker coroutine per route. After
/// construction everything is read-only and safe to share across
/// concurrently dispatching coroutines (wrap in `Arc` to share).
///
/// Per request the dispatcher collects all matching routes, selects the
/// earliest-registered one supporting the request verb, merges extracted
/// path parameters into the context, and forwards the context to the
/// route's worker. Receiving the reply is the suspension point: in a
/// coroutine context the dispatching coroutine parks until the handler
/// completes. A successful GET then flows through the view-expansion
/// pipeline.
pub struct Dispatcher {
    registry: Registry,
    workers: Vec<WorkerSender>,
    config: RuntimeConfig,
}

impl Dispatcher {
    /// Finalize a registry into a serving dispatcher.
    ///
    /// Spawns one worker coroutine per registered route with the configured
    /// stack size. A spawn failure is logged and leaves that route
    /// unservable (dispatching to it reports a worker-unavailable error);
    /// it does not tear down the rest of the table.
    #[must_use]
    pub fn new(registry: Registry, config: RuntimeConfig) -> Self {
        let workers = registry
            .routes()
            .iter()
            .map(|route| spawn_worker(Arc::clone(route), config.stack_size))
            .collect();
        info!(
            routes = registry.len(),
            stack_size = config.stack_size,
            "dispatcher finalized, route workers spawned"
        );
        Self {
            registry,
            workers,
            config,
        }
    }

    /// The finalized route table.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Generate the URL for a named route. See [`Registry::url`].
    pub fn url(&self, name: &str, values: &[&str]) -> Result<String, crate::router::UrlError> {
        self.registry.url(name, values)
    }

    /// Dispatch one request, mutating the context in place.
    ///
    /// Returns [`DispatchOutcome::NotMatched`] when no route matches — the
    /// caller should hand the context to the next stage of its chain. Every
    /// other routing decision is written into the context (`status`,
    /// `Allow`). Handler and pipeline failures come back as `Err` and must
    /// be surfaced to the caller's error handling, never converted to a
    /// status here.
    pub fn dispatch(&self, ctx: &mut RequestContext) -> Result<DispatchOutcome> {
        debug!(
            request_id = %ctx.request_id,
            method = %ctx.method,
            path = %ctx.path,
            "dispatch"
        );

        let matches = self.registry.find_matches(&ctx.path);
        if matches.is_empty() {
            debug!(request_id = %ctx.request_id, path = %ctx.path, "no route matched, passing through");
            return Ok(DispatchOutcome::NotMatched);
        }

        let verb = Verb::from_method(&ctx.method);
        let mut methods_available = VerbSet::EMPTY;
        let mut selected = None;
        for m in matches {
            methods_available = methods_available.union(m.route.verbs());
            if selected.is_none() {
                if let Some(verb) = verb {
                    if m.route.verbs().contains(verb) {
                        selected = Some(m);
                    }
                }
            }
        }

        let Some(m) = selected else {
            // Routing decisions are recovered locally into status codes:
            // 204 for OPTIONS preflight, 501 for verbs outside the
            // recognized set, 405 otherwise. Allow always reports the verb
            // union across every matching route.
            let status = if ctx.method == Method::OPTIONS {
                204
            } else if verb.is_none() {
                501
            } else {
                405
            };
            let allow = methods_available.allow_header();
            warn!(
                request_id = %ctx.request_id,
                method = %ctx.method,
                path = %ctx.path,
                status = status,
                allow = %allow,
                "no matching route supports the request verb"
            );
            ctx.set_header("Allow", allow);
            ctx.set_status(status);
            return Ok(DispatchOutcome::Handled);
        };

        // Selection is settled; verb is necessarily recognized here.
        let verb = verb.ok_or_else(|| anyhow!("selected a route without a recognized verb"))?;

        info!(
            request_id = %ctx.request_id,
            verb = %verb,
            route_pattern = m.route.pattern_str(),
            route_index = m.route.index(),
            "request dispatched to route worker"
        );

        ctx.merge_params(m.params);
        self.invoke(&m.route, verb, ctx)?;

        if verb == Verb::Get {
            expand::run(self, &m.route, ctx)?;
        }

        Ok(DispatchOutcome::Handled)
    }

    /// Dispatch as one stage of a middleware chain: `next` runs iff no
    /// route matched the path.
    pub fn handle<N>(&self, ctx: &mut RequestContext, next: N) -> Result<()>
    where
        N: FnOnce(&mut RequestContext) -> Result<()>,
    {
        match self.dispatch(ctx)? {
            DispatchOutcome::Handled => Ok(()),
            DispatchOutcome::NotMatched => next(ctx),
        }
    }

    /// Send the context to the route's worker and await the reply.
    fn invoke(&self, route: &Arc<Route>, verb: Verb, ctx: &mut RequestContext) -> Result<()> {
        let (reply_tx, reply_rx) = mpsc::channel();
        let owned = std::mem::take(ctx);
        let call = ResourceCall::Verb {
            verb,
            ctx: owned,
            reply_tx,
        };
        self.workers[route.index()]
            .send(call)
            .map_err(|_| anyhow!("worker for route '{}' is unavailable", route.pattern_str()))?;

        match reply_rx.recv() {
            Ok(Ok(returned)) => {
                *ctx = returned;
                Ok(())
            }
            Ok(Err(err)) => Err(err),
            Err(_) => Err(anyhow!(
                "worker for route '{}' dropped the reply channel",
                route.pattern_str()
            )),
        }
    }

    /// Execute an embedded read on the route's worker.
    pub(crate) fn read(&self, route: &Arc<Route>, ctx: ReadContext) -> Result<Value> {
        let (reply_tx, reply_rx) = mpsc::channel();
        debug!(
            request_id = %ctx.request_id,
            uri = %ctx.uri,
            route_pattern = route.pattern_str(),
            "embedded read dispatched"
        );
        self.workers[route.index()]
            .send(ResourceCall::Read { ctx, reply_tx })
            .map_err(|_| anyhow!("worker for route '{}' is unavailable", route.pattern_str()))?;

        match reply_rx.recv() {
            Ok(result) => result,
            Err(_) => Err(anyhow!(
                "worker for route '{}' dropped the reply channel",
                route.pattern_str()
            )),
        }
    }
}

/// Spawn the worker coroutine serving one route.
///
/// The worker loops over its channel for the lifetime of the dispatcher,
/// executing verb handlers and embedded reads. Handler panics are caught
/// and surfaced to the dispatching side as errors rather than killing the
/// worker.
fn spawn_worker(route: Arc<Route>, stack_size: usize) -> WorkerSender {
    let (tx, rx) = mpsc::channel::<ResourceCall>();
    let pattern = route.pattern_str().to_string();

    // SAFETY: may's coroutine spawn is unsafe because the runtime cannot
    // verify TLS access or stack discipline inside the coroutine body. The
    // worker closure owns its captures (`Arc<Route>`, the receiver), is
    // Send + 'static, and communicates only over channels, which keeps it
    // within the runtime's requirements.
    let spawn_result = unsafe {
        coroutine::Builder::new()
            .stack_size(stack_size)
            .spawn(move || {
                debug!(
                    route_pattern = route.pattern_str(),
                    stack_size = stack_size,
                    "route worker start"
                );
                for call in rx.iter() {
                    match call {
                        ResourceCall::Verb {
                            verb,
                            mut ctx,
                            reply_tx,
                        } => {
                            let Some(handler) = route.resource().handler(verb) else {
                                let _ = reply_tx.send(Err(anyhow!(
                                    "no {} handler bound for route '{}'",
                                    verb,
                                    route.pattern_str()
                                )));
                                continue;
                            };

                            let request_id = ctx.request_id;
                            debug!(
                                request_id = %request_id,
                                verb = %verb,
                                route_pattern = route.pattern_str(),
                                "verb handler start"
                            );
                            let start = Instant::now();

                            let outcome = catch_unwind(AssertUnwindSafe(|| handler(&mut ctx)));
                            let reply = match outcome {
                                Ok(Ok(())) => {
                                    info!(
                                        request_id = %request_id,
                                        verb = %verb,
                                        route_pattern = route.pattern_str(),
                                        status = ?ctx.status,
                                        latency_us = start.elapsed().as_micros() as u64,
                                        "verb handler complete"
                                    );
                                    Ok(ctx)
                                }
                                Ok(Err(err)) => {
                                    warn!(
                                        request_id = %request_id,
                                        verb = %verb,
                                        route_pattern = route.pattern_str(),
                                        error = %err,
                                        "verb handler failed"
                                    );
                                    Err(err)
                                }
                                Err(panic) => {
                                    error!(
                                        request_id = %request_id,
                                        verb = %verb,
                                        route_pattern = route.pattern_str(),
                                        panic_message = %format!("{panic:?}"),
                                        "verb handler panicked"
                                    );
                                    Err(anyhow!(
                                        "{} handler for route '{}' panicked: {:?}",
                                        verb,
                                        route.pattern_str(),
                                        panic
                                    ))
                                }
                            };
                            let _ = reply_tx.send(reply);
                        }
                        ResourceCall::Read { ctx, reply_tx } => {
                            let Some(read) = route.resource().read_hook().cloned() else {
                                let _ = reply_tx.send(Err(anyhow!(
                                    "route '{}' has no read hook",
                                    route.pattern_str()
                                )));
                                continue;
                            };

                            let request_id = ctx.request_id;
                            let outcome = catch_unwind(AssertUnwindSafe(|| read(&ctx)));
                            let reply = match outcome {
                                Ok(result) => result,
                                Err(panic) => {
                                    error!(
                                        request_id = %request_id,
                                        uri = %ctx.uri,
                                        route_pattern = route.pattern_str(),
                                        panic_message = %format!("{panic:?}"),
                                        "read hook panicked"
                                    );
                                    Err(anyhow!(
                                        "read hook for route '{}' panicked: {:?}",
                                        route.pattern_str(),
                                        panic
                                    ))
                                }
                            };
                            let _ = reply_tx.send(reply);
                        }
                    }
                }
            })
    };

    if let Err(e) = spawn_result {
        error!(
            route_pattern = %pattern,
            error = %e,
            stack_size = stack_size,
            "failed to spawn route worker"
        );
    }

    tx
}
