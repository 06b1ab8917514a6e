//! Registry core - route table construction and the match hot path.

use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::resource::{Resource, VerbSet};

use super::error::{RegistryError, UrlError};
use super::pattern::PathPattern;

/// Maximum number of path/query parameters before heap allocation.
/// Most REST patterns have ≤4 named segments; 8 keeps the common case on
/// the stack.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the dispatch hot path.
///
/// Param names use `Arc<str>` instead of `String`: names come from the
/// static route table, so `Arc::clone()` is an O(1) refcount bump rather
/// than a string copy. Values remain `String` as they are per-request data
/// from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// A registered route: compiled pattern, verb table, and resource binding.
///
/// Routes are created during registration and immutable for the lifetime of
/// the process; they are safe for unsynchronized concurrent reads.
#[derive(Debug)]
pub struct Route {
    name: Option<String>,
    pattern: PathPattern,
    verbs: VerbSet,
    resource: Arc<Resource>,
    index: usize,
}

impl Route {
    /// The route's unique name, if it was registered with one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The compiled path pattern.
    #[must_use]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// The original pattern string, for logging and error messages.
    #[must_use]
    pub fn pattern_str(&self) -> &str {
        self.pattern.as_str()
    }

    /// Verbs recorded for this route at registration time.
    #[must_use]
    pub fn verbs(&self) -> VerbSet {
        self.verbs
    }

    /// The bound resource capability table.
    #[must_use]
    pub fn resource(&self) -> &Arc<Resource> {
        &self.resource
    }

    /// Registration position; earlier routes win dispatch tie-breaks.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Result of successfully matching a request path to a route
///
/// Contains the matched route and the parameters extracted from the path.
/// Ephemeral: produced per request and discarded afterwards.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched route (`Arc` to avoid copying the table entry)
    pub route: Arc<Route>,
    /// Path parameters extracted from the URL (e.g. `:uuid` → `"123"`)
    pub params: ParamVec,
}

/// Ordered route table with a name index.
///
/// The registry is the mutable builder phase of the routing table: resources
/// are registered at startup, then the registry is finalized into an
/// immutable [`Dispatcher`](crate::dispatcher::Dispatcher) before serving
/// begins. Registration order is significant: overlapping patterns are
/// resolved by earliest registration, a deliberate and user-visible
/// tie-break.
#[derive(Debug, Default)]
pub struct Registry {
    routes: Vec<Arc<Route>>,
    named: HashMap<String, Arc<Route>>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource on a path pattern.
    ///
    /// Validates that the resource implements at least one recognized verb,
    /// compiles the pattern, and appends the route to the table. A non-empty
    /// `name` additionally indexes the route for URL generation; names are
    /// unique and duplicates are rejected.
    ///
    /// # Errors
    ///
    /// [`RegistryError::EmptyResource`] if the resource declares no verb
    /// handler, [`RegistryError::DuplicateName`] for a name collision, or
    /// [`RegistryError::InvalidPattern`] if the pattern fails to compile.
    /// All of these are startup errors: do not begin serving after one.
    pub fn register(
        &mut self,
        name: Option<&str>,
        pattern: &str,
        resource: Resource,
    ) -> Result<(), RegistryError> {
        let verbs = resource.verbs();
        if verbs.is_empty() {
            return Err(RegistryError::EmptyResource {
                name: name.unwrap_or(pattern).to_string(),
            });
        }
        if let Some(name) = name {
            if self.named.contains_key(name) {
                return Err(RegistryError::DuplicateName {
                    name: name.to_string(),
                });
            }
        }

        let pattern = PathPattern::compile(pattern)?;
        let route = Arc::new(Route {
            name: name.map(str::to_string),
            pattern,
            verbs,
            resource: Arc::new(resource),
            index: self.routes.len(),
        });

        info!(
            name = name.unwrap_or(""),
            route_pattern = route.pattern_str(),
            verbs = ?verbs.names(),
            "resource registered"
        );

        if let Some(name) = name {
            self.named.insert(name.to_string(), Arc::clone(&route));
        }
        self.routes.push(route);
        Ok(())
    }

    /// Find every route whose pattern matches `path`, in registration order.
    ///
    /// Any query-string suffix on `path` is ignored for matching. Returns an
    /// empty vector when nothing matches; "not found" handling belongs to
    /// the enclosing middleware chain.
    #[must_use]
    pub fn find_matches(&self, path: &str) -> Vec<RouteMatch> {
        let path = match path.find('?') {
            Some(pos) => &path[..pos],
            None => path,
        };

        let matches: Vec<RouteMatch> = self
            .routes
            .iter()
            .filter_map(|route| {
                route.pattern.matches(path).map(|params| RouteMatch {
                    route: Arc::clone(route),
                    params,
                })
            })
            .collect();

        debug!(path = path, matched = matches.len(), "route match scan");
        matches
    }

    /// Generate the URL for a named route from positional parameter values.
    ///
    /// Rendering is pure: identical arguments always yield the identical
    /// path string.
    ///
    /// # Errors
    ///
    /// [`UrlError::NoSuchRoute`] when no route carries `name` — a
    /// recoverable condition the caller must handle, not a panic — or a
    /// render error from the pattern.
    pub fn url(&self, name: &str, values: &[&str]) -> Result<String, UrlError> {
        let route = self.named.get(name).ok_or_else(|| UrlError::NoSuchRoute {
            name: name.to_string(),
        })?;
        let url = route.pattern.render(values)?;
        debug!(name = name, url = %url, "generated route url");
        Ok(url)
    }

    /// Generate the URL for a named route from named parameter values.
    ///
    /// # Errors
    ///
    /// As [`Registry::url`], with [`UrlError::MissingParam`] for an absent
    /// named value.
    pub fn url_named(
        &self,
        name: &str,
        values: &HashMap<String, String>,
    ) -> Result<String, UrlError> {
        let route = self.named.get(name).ok_or_else(|| UrlError::NoSuchRoute {
            name: name.to_string(),
        })?;
        let url = route.pattern.render_named(values)?;
        debug!(name = name, url = %url, "generated route url");
        Ok(url)
    }

    /// All registered routes in registration order.
    #[must_use]
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the registry has no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
