use std::fmt;

/// Registration-time error
///
/// Returned by [`Registry::register`](super::Registry::register) when a
/// resource or pattern is unfit to serve. These are startup errors: the
/// caller is expected to treat them as fatal and refuse to start serving
/// the offending resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The resource declares no recognized verb handler
    EmptyResource {
        /// Route name, or the pattern for anonymous routes
        name: String,
    },
    /// A route with this name is already registered
    ///
    /// Names are unique by invariant; re-registering a name would leave the
    /// shadowed route physically matchable but unreachable by name.
    DuplicateName {
        /// The conflicting route name
        name: String,
    },
    /// The path pattern cannot be compiled
    InvalidPattern {
        /// The offending pattern string
        pattern: String,
        /// Why compilation failed
        reason: String,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::EmptyResource { name } => {
                write!(f, "resource '{}' must implement at least one verb", name)
            }
            RegistryError::DuplicateName { name } => {
                write!(f, "a route named '{}' is already registered", name)
            }
            RegistryError::InvalidPattern { pattern, reason } => {
                write!(f, "invalid route pattern '{}': {}", pattern, reason)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// URL-generation error
///
/// Returned by [`Registry::url`](super::Registry::url) and the
/// [`PathPattern`](super::PathPattern) render methods. Unlike registration
/// errors these are recoverable values the caller handles per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlError {
    /// No route is registered under the requested name
    NoSuchRoute {
        /// The unknown route name
        name: String,
    },
    /// Fewer positional values were supplied than the pattern has parameters
    MissingValues {
        /// The route pattern being rendered
        pattern: String,
        /// Number of named segments in the pattern
        expected: usize,
        /// Number of values supplied
        supplied: usize,
    },
    /// A named render did not supply a value for a pattern parameter
    MissingParam {
        /// The parameter with no value
        name: String,
    },
}

impl fmt::Display for UrlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlError::NoSuchRoute { name } => {
                write!(f, "no route found for resource: {}", name)
            }
            UrlError::MissingValues {
                pattern,
                expected,
                supplied,
            } => {
                write!(
                    f,
                    "insufficient values to render '{}': expected {}, got {}",
                    pattern, expected, supplied
                )
            }
            UrlError::MissingParam { name } => {
                write!(f, "no value supplied for pattern parameter '{}'", name)
            }
        }
    }
}

impl std::error::Error for UrlError {}
