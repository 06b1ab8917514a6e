//! # restlink
//!
//! **restlink** is a coroutine-powered REST resource dispatcher for Rust:
//! a registry of named resources, verb-table dispatch with proper
//! `Allow`/405/501 semantics, named-route URL generation, and a recursive
//! hypermedia link-expansion pipeline that turns a flat resource graph
//! into a nested response tree.
//!
//! ## Overview
//!
//! Resources are capability tables: a handler per supported verb
//! (GET/POST/PUT/DELETE/LINK/UNLINK) plus optional hypermedia hooks
//! (`format`, `shortcut`, `extract`, `embed`, `read`). Register them on
//! path patterns during a mutable builder phase, finalize into an
//! immutable [`Dispatcher`], and drop that dispatcher into your server's
//! middleware chain — restlink rides on whatever HTTP transport the
//! surrounding process provides and owns no sockets of its own.
//!
//! ## Architecture
//!
//! - **[`router`]** — pattern compilation (`/channels/:uuid`), the ordered
//!   route table, multi-match collection, and URL generation
//! - **[`resource`]** — the verb table and hook capability model
//! - **[`dispatcher`]** — per-route worker coroutines and the request
//!   state machine (verb selection, `Allow` handling, parameter merging)
//! - **`expand`** (internal) — the recursive extract → read → embed
//!   pipeline behind `?view=` requests
//! - **[`context`]** — the per-request context the HTTP layer supplies
//! - **[`runtime_config`]**, **[`logging`]**, **[`ids`]** — env-driven
//!   runtime knobs, tracing bootstrap, ULID request correlation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use http::Method;
//! use restlink::{Dispatcher, Registry, RequestContext, Resource, RuntimeConfig};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut registry = Registry::new();
//! registry.register(
//!     Some("channel"),
//!     "/channels/:uuid",
//!     Resource::builder()
//!         .get(|ctx: &mut RequestContext| {
//!             let uuid = ctx.param("uuid").unwrap_or_default().to_string();
//!             ctx.status = Some(200);
//!             ctx.body = Some(json!({ "uuid": uuid }));
//!             Ok(())
//!         })
//!         .build(),
//! )?;
//!
//! let dispatcher = Dispatcher::new(registry, RuntimeConfig::from_env());
//!
//! // One stage of your server's middleware chain:
//! let mut ctx = RequestContext::new(Method::GET, "/channels/123");
//! dispatcher.handle(&mut ctx, |ctx| {
//!     ctx.status = Some(404); // no route matched; next stage owns it
//!     Ok(())
//! })?;
//! assert_eq!(ctx.status, Some(200));
//!
//! // Named-route URL generation:
//! assert_eq!(dispatcher.url("channel", &["123"])?, "/channels/123");
//! # Ok(())
//! # }
//! ```
//!
//! ## Link Expansion
//!
//! A GET answered by a resource with hypermedia hooks can be expanded by
//! requesting a view: `GET /channels/1?view=full`. The resource's
//! `shortcut` hook maps `"full"` to an [`ExtractSpec`]; for each relation
//! in the spec the pipeline asks `extract` for the relation's link URIs,
//! resolves each URI through the route table by running the target
//! route's `read` hook, recursively expands the child body against the
//! nested spec (depth-first, with the child route's own hooks), and hands
//! the resolved bodies to `embed`. Order is contractual: siblings resolve
//! in spec order, links within a relation embed in `extract` order.
//!
//! ## Runtime Considerations
//!
//! restlink uses the `may` coroutine runtime, not tokio or async-std:
//!
//! - Each route's handlers run on a dedicated worker coroutine
//! - Handlers block with `may`'s facilities; the dispatcher awaits the
//!   worker reply channel before proceeding
//! - Worker stack size is configurable via `RESTLINK_STACK_SIZE`
//! - Expansion recursion depth is bounded via `RESTLINK_MAX_DEPTH`

pub mod context;
pub mod dispatcher;
mod expand;
pub mod ids;
pub mod logging;
pub mod resource;
pub mod router;
pub mod runtime_config;

pub use context::{parse_query, HeaderVec, ReadContext, RequestContext, MAX_INLINE_HEADERS};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use ids::RequestId;
pub use resource::{
    ExtractSpec, Resource, ResourceBuilder, Verb, VerbSet, ViewOptions,
};
pub use router::{
    ParamVec, PathPattern, Registry, RegistryError, Route, RouteMatch, UrlError,
    MAX_INLINE_PARAMS,
};
pub use runtime_config::RuntimeConfig;
