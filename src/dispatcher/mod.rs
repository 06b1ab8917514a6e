//! # Dispatcher Module
//!
//! Coroutine-based request dispatch over the finalized route table.
//!
//! ## Overview
//!
//! The dispatcher is the request-cycle state machine. Per request it:
//! - collects every route matching the path, in registration order
//! - selects the earliest-registered match supporting the request verb
//! - merges extracted path parameters into the request context
//! - forwards the context to the selected route's worker coroutine and
//!   awaits the reply
//! - answers 405 (or 204 for `OPTIONS`) with an `Allow` header when
//!   matches exist but none support the verb, and 501 for verbs outside
//!   the recognized set
//! - runs the view-expansion pipeline after a successful GET
//!
//! ## Architecture
//!
//! Each registered route owns one worker coroutine (the `may` runtime),
//! spawned when the registry is finalized into a `Dispatcher`. Requests
//! travel to workers over MPSC channels; replies come back on a per-call
//! channel, and awaiting that reply is the dispatcher's suspension point.
//! A handler blocks with `may`'s facilities and the worker coroutine
//! parks without holding a thread.
//!
//! "Not found" is deliberately not the dispatcher's business: when no
//! route matches, [`Dispatcher::dispatch`] reports
//! [`DispatchOutcome::NotMatched`] and [`Dispatcher::handle`] invokes the
//! next stage of the enclosing chain.
//!
//! ## Error Handling
//!
//! Routing decisions (no verb, unrecognized verb) become status codes.
//! Handler execution failures — including caught panics in worker
//! coroutines — propagate as `Err` to the caller and are never converted
//! into response statuses by the core.

mod core;

pub use core::{DispatchOutcome, Dispatcher};
