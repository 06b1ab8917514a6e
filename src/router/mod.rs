//! # Router Module
//!
//! Path matching, the ordered route table, and named-route URL generation.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Compiling `/channels/:uuid` style patterns into matchers
//! - Collecting every route that matches an incoming path, in registration
//!   order
//! - Extracting path parameters from matched routes
//! - Rendering concrete paths back from parameter values (`url`)
//!
//! ## Architecture
//!
//! Matching is a two-phase affair:
//!
//! 1. **Compilation**: at registration, patterns are converted into regexes
//!    that match segment-for-segment and capture named parameters.
//!
//! 2. **Matching**: per request, the table is scanned in registration order
//!    and *all* matching routes are collected. Verb selection across the
//!    collected matches is the dispatcher's job — several patterns may
//!    overlap on a path while supporting different verbs, and the union of
//!    their verbs feeds the `Allow` header.
//!
//! The scan is deliberately linear: the ordered multi-match contract (the
//! earliest-registration tie-break and the cross-match verb union) is
//! user-visible, and a first-match prefix tree would short-circuit it.
//!
//! ## Example
//!
//! ```rust
//! use restlink::resource::Resource;
//! use restlink::router::Registry;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = Registry::new();
//! let resource = Resource::builder()
//!     .get(|ctx: &mut restlink::context::RequestContext| {
//!         ctx.status = Some(200);
//!         Ok(())
//!     })
//!     .build();
//! registry.register(Some("channel"), "/channels/:uuid", resource)?;
//!
//! assert_eq!(registry.url("channel", &["123"])?, "/channels/123");
//! assert_eq!(registry.find_matches("/channels/123").len(), 1);
//! # Ok(())
//! # }
//! ```

mod core;
mod error;
mod pattern;

pub use core::{ParamVec, Registry, Route, RouteMatch, MAX_INLINE_PARAMS};
pub use error::{RegistryError, UrlError};
pub use pattern::PathPattern;
