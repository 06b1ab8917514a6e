//! # Resource Module
//!
//! The verb table and resource capability model.
//!
//! A resource is a bundle of verb handlers plus optional hypermedia hooks,
//! bound to one or more route patterns at registration. Capabilities are
//! declared once, at build time, through [`ResourceBuilder`] — the
//! dispatcher and the expansion pipeline branch on typed optional slots
//! instead of probing objects at request time.
//!
//! ## Verbs
//!
//! The recognized verb set is fixed: GET, POST, PUT, DELETE, LINK, UNLINK.
//! A request method outside this set is *unrecognized* and dispatches to a
//! 501. Handlers are plain closures executed on a per-route worker
//! coroutine; a handler suspends by using `may`'s blocking facilities and
//! the dispatcher awaits its completion before proceeding.
//!
//! ## Hooks
//!
//! The optional hooks feed the view-expansion pipeline:
//!
//! - `format(body, options)` — normalize/augment the body after a GET
//! - `shortcut(view)` — map a `?view=` name to [`ViewOptions`]
//! - `extract(body, relation)` — list the relation's link URIs, in order
//! - `embed(body, relation, resolved)` — attach resolved sub-resources
//! - `read(ctx)` — produce a body for an embedded read of one URI
//!
//! Every hook is individually optional; an absent hook silently skips its
//! pipeline step.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use http::Method;
use serde_json::Value;

use crate::context::{ReadContext, RequestContext};

/// A recognized request verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
    Link,
    Unlink,
}

impl Verb {
    /// All recognized verbs, in canonical table order.
    pub const ALL: [Verb; 6] = [
        Verb::Get,
        Verb::Post,
        Verb::Put,
        Verb::Delete,
        Verb::Link,
        Verb::Unlink,
    ];

    /// Uppercase wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
            Verb::Link => "LINK",
            Verb::Unlink => "UNLINK",
        }
    }

    /// Map an HTTP method onto the recognized verb set, case-insensitively.
    ///
    /// Returns `None` for anything outside the set (`PATCH`, `OPTIONS`, …);
    /// the dispatcher turns that into a 501 or the OPTIONS 204 special case.
    #[must_use]
    pub fn from_method(method: &Method) -> Option<Verb> {
        let name = method.as_str();
        Verb::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(name))
    }

    fn slot(self) -> usize {
        match self {
            Verb::Get => 0,
            Verb::Post => 1,
            Verb::Put => 2,
            Verb::Delete => 3,
            Verb::Link => 4,
            Verb::Unlink => 5,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compact set of recognized verbs.
///
/// Recorded per route at registration; unions across overlapping routes
/// feed the `Allow` header on a 405.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerbSet(u8);

impl VerbSet {
    /// The empty set.
    pub const EMPTY: VerbSet = VerbSet(0);

    /// Insert a verb.
    pub fn insert(&mut self, verb: Verb) {
        self.0 |= 1 << verb.slot();
    }

    /// Whether `verb` is in the set.
    #[must_use]
    pub fn contains(self, verb: Verb) -> bool {
        self.0 & (1 << verb.slot()) != 0
    }

    /// Set union.
    #[must_use]
    pub fn union(self, other: VerbSet) -> VerbSet {
        VerbSet(self.0 | other.0)
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Member verbs in canonical table order.
    pub fn iter(self) -> impl Iterator<Item = Verb> {
        Verb::ALL.into_iter().filter(move |v| self.contains(*v))
    }

    /// Wire names of the member verbs, in canonical table order.
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        self.iter().map(Verb::as_str).collect()
    }

    /// `Allow` header value: the member verbs, alphabetically sorted and
    /// comma-joined.
    #[must_use]
    pub fn allow_header(self) -> String {
        let mut names = self.names();
        names.sort_unstable();
        names.join(", ")
    }
}

/// Verb handler: runs on the route's worker coroutine and mutates the
/// request context in place (status, headers, body).
pub type VerbHandler = Arc<dyn Fn(&mut RequestContext) -> Result<()> + Send + Sync>;

/// Body-formatting hook: replaces the body after a successful GET, before
/// link extraction. The options argument is reserved for resource-side
/// reuse; the pipeline passes `None`.
pub type FormatHook = Arc<dyn Fn(Value, Option<&Value>) -> Result<Value> + Send + Sync>;

/// View shortcut hook: maps a `?view=` name to extraction options.
/// Returning `None` means the view is unknown and no extraction occurs.
pub type ShortcutHook = Arc<dyn Fn(&str) -> Option<ViewOptions> + Send + Sync>;

/// Link extraction hook: lists the URIs a relation links to, in the order
/// they should be resolved and embedded.
pub type ExtractHook = Arc<dyn Fn(&Value, &str) -> Result<Vec<String>> + Send + Sync>;

/// Embed hook: attaches resolved sub-resource bodies to the parent body
/// under the relation name. A single resolved link arrives as a scalar
/// `Value`, multiple arrive as a `Value::Array` in extraction order.
pub type EmbedHook = Arc<dyn Fn(&mut Value, &str, Value) -> Result<()> + Send + Sync>;

/// Embedded-read hook: produces the body for one resolved link URI. Runs on
/// the target route's worker coroutine, like a verb handler.
pub type ReadHook = Arc<dyn Fn(&ReadContext) -> Result<Value> + Send + Sync>;

/// Options resolved from a view shortcut.
#[derive(Clone, Default)]
pub struct ViewOptions {
    /// Relations to extract and embed, recursively. `None` leaves the
    /// response as-is.
    pub extract: Option<ExtractSpec>,
}

impl ViewOptions {
    /// Options that extract according to `spec`.
    #[must_use]
    pub fn extracting(spec: ExtractSpec) -> Self {
        Self {
            extract: Some(spec),
        }
    }
}

/// Ordered extraction specification.
///
/// Maps relation names to nested specifications, preserving enumeration
/// order — the order here is the order relations are resolved and embedded,
/// so the backing store is a vector rather than a map.
///
/// # Example
///
/// ```rust
/// use restlink::resource::ExtractSpec;
///
/// // Resolve `author`, then `comments`; inside each comment, resolve its
/// // own `author` relation before embedding the comment.
/// let spec = ExtractSpec::new()
///     .relation("author")
///     .nested("comments", ExtractSpec::new().relation("author"));
/// assert_eq!(spec.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExtractSpec {
    relations: Vec<(String, ExtractSpec)>,
}

impl ExtractSpec {
    /// An empty specification.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a leaf relation (no nested resolution).
    #[must_use]
    pub fn relation(self, name: impl Into<String>) -> Self {
        self.nested(name, ExtractSpec::new())
    }

    /// Append a relation with a nested specification applied to each
    /// resolved sub-resource before it is embedded.
    #[must_use]
    pub fn nested(mut self, name: impl Into<String>, nested: ExtractSpec) -> Self {
        self.relations.push((name.into(), nested));
        self
    }

    /// Relations in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExtractSpec)> {
        self.relations.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Number of relations at this level.
    #[must_use]
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    /// Whether this level names no relations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

/// Resource capability table: verb handlers plus optional hypermedia hooks.
///
/// Built once with [`Resource::builder`] and validated at registration —
/// a resource must implement at least one recognized verb. The handler
/// signatures make the "declared verb is not a valid handler" class of
/// startup error unrepresentable; only the emptiness check remains a
/// runtime concern.
pub struct Resource {
    verbs: [Option<VerbHandler>; 6],
    format: Option<FormatHook>,
    shortcut: Option<ShortcutHook>,
    extract: Option<ExtractHook>,
    embed: Option<EmbedHook>,
    read: Option<ReadHook>,
}

impl Resource {
    /// Start building a capability table.
    #[must_use]
    pub fn builder() -> ResourceBuilder {
        ResourceBuilder::default()
    }

    /// The verbs this resource implements.
    #[must_use]
    pub fn verbs(&self) -> VerbSet {
        let mut set = VerbSet::EMPTY;
        for verb in Verb::ALL {
            if self.verbs[verb.slot()].is_some() {
                set.insert(verb);
            }
        }
        set
    }

    /// The handler for `verb`, if implemented.
    #[must_use]
    pub fn handler(&self, verb: Verb) -> Option<VerbHandler> {
        self.verbs[verb.slot()].clone()
    }

    /// Whether the resource supports embedded reads.
    #[must_use]
    pub fn has_read(&self) -> bool {
        self.read.is_some()
    }

    #[must_use]
    pub fn format_hook(&self) -> Option<&FormatHook> {
        self.format.as_ref()
    }

    #[must_use]
    pub fn shortcut_hook(&self) -> Option<&ShortcutHook> {
        self.shortcut.as_ref()
    }

    #[must_use]
    pub fn extract_hook(&self) -> Option<&ExtractHook> {
        self.extract.as_ref()
    }

    #[must_use]
    pub fn embed_hook(&self) -> Option<&EmbedHook> {
        self.embed.as_ref()
    }

    #[must_use]
    pub fn read_hook(&self) -> Option<&ReadHook> {
        self.read.as_ref()
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("verbs", &self.verbs().names())
            .field("format", &self.format.is_some())
            .field("shortcut", &self.shortcut.is_some())
            .field("extract", &self.extract.is_some())
            .field("embed", &self.embed.is_some())
            .field("read", &self.read.is_some())
            .finish()
    }
}

/// Builder for [`Resource`] capability tables.
#[derive(Default)]
pub struct ResourceBuilder {
    verbs: [Option<VerbHandler>; 6],
    format: Option<FormatHook>,
    shortcut: Option<ShortcutHook>,
    extract: Option<ExtractHook>,
    embed: Option<EmbedHook>,
    read: Option<ReadHook>,
}

impl ResourceBuilder {
    /// Install a handler for an arbitrary recognized verb.
    #[must_use]
    pub fn verb<F>(mut self, verb: Verb, handler: F) -> Self
    where
        F: Fn(&mut RequestContext) -> Result<()> + Send + Sync + 'static,
    {
        self.verbs[verb.slot()] = Some(Arc::new(handler));
        self
    }

    /// Install the GET handler.
    #[must_use]
    pub fn get<F>(self, handler: F) -> Self
    where
        F: Fn(&mut RequestContext) -> Result<()> + Send + Sync + 'static,
    {
        self.verb(Verb::Get, handler)
    }

    /// Install the POST handler.
    #[must_use]
    pub fn post<F>(self, handler: F) -> Self
    where
        F: Fn(&mut RequestContext) -> Result<()> + Send + Sync + 'static,
    {
        self.verb(Verb::Post, handler)
    }

    /// Install the PUT handler.
    #[must_use]
    pub fn put<F>(self, handler: F) -> Self
    where
        F: Fn(&mut RequestContext) -> Result<()> + Send + Sync + 'static,
    {
        self.verb(Verb::Put, handler)
    }

    /// Install the DELETE handler.
    #[must_use]
    pub fn delete<F>(self, handler: F) -> Self
    where
        F: Fn(&mut RequestContext) -> Result<()> + Send + Sync + 'static,
    {
        self.verb(Verb::Delete, handler)
    }

    /// Install the LINK handler.
    #[must_use]
    pub fn link<F>(self, handler: F) -> Self
    where
        F: Fn(&mut RequestContext) -> Result<()> + Send + Sync + 'static,
    {
        self.verb(Verb::Link, handler)
    }

    /// Install the UNLINK handler.
    #[must_use]
    pub fn unlink<F>(self, handler: F) -> Self
    where
        F: Fn(&mut RequestContext) -> Result<()> + Send + Sync + 'static,
    {
        self.verb(Verb::Unlink, handler)
    }

    /// Install the body-formatting hook.
    #[must_use]
    pub fn format<F>(mut self, hook: F) -> Self
    where
        F: Fn(Value, Option<&Value>) -> Result<Value> + Send + Sync + 'static,
    {
        self.format = Some(Arc::new(hook));
        self
    }

    /// Install the view shortcut hook.
    #[must_use]
    pub fn shortcut<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str) -> Option<ViewOptions> + Send + Sync + 'static,
    {
        self.shortcut = Some(Arc::new(hook));
        self
    }

    /// Install the link extraction hook.
    #[must_use]
    pub fn extract<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Value, &str) -> Result<Vec<String>> + Send + Sync + 'static,
    {
        self.extract = Some(Arc::new(hook));
        self
    }

    /// Install the embed hook.
    #[must_use]
    pub fn embed<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Value, &str, Value) -> Result<()> + Send + Sync + 'static,
    {
        self.embed = Some(Arc::new(hook));
        self
    }

    /// Install the embedded-read hook.
    #[must_use]
    pub fn read<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ReadContext) -> Result<Value> + Send + Sync + 'static,
    {
        self.read = Some(Arc::new(hook));
        self
    }

    /// Finish the table. Verb-emptiness is validated at registration, not
    /// here: hook-only resources are constructible but not registrable.
    #[must_use]
    pub fn build(self) -> Resource {
        Resource {
            verbs: self.verbs,
            format: self.format,
            shortcut: self.shortcut,
            extract: self.extract,
            embed: self.embed,
            read: self.read,
        }
    }
}
