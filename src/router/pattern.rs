use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

use super::core::ParamVec;
use super::error::{RegistryError, UrlError};

/// Compiled route pattern
///
/// A pattern is a path template of literal segments and `:name` parameter
/// segments, e.g. `/channels/:uuid`. Compilation turns it into a regex that
/// matches segment-for-segment: literals must match exactly, parameter
/// segments capture one path segment. The same compiled pattern renders
/// concrete paths back from parameter values for URL generation.
///
/// # Example
///
/// ```rust
/// use restlink::router::PathPattern;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pattern = PathPattern::compile("/channels/:uuid")?;
/// let params = pattern.matches("/channels/123").expect("should match");
/// assert_eq!(params[0].1, "123");
/// assert_eq!(pattern.render(&["123"])?, "/channels/123");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PathPattern {
    pattern: String,
    regex: Regex,
    /// Parameter names in pattern order. `Arc<str>` so extracted params can
    /// share the name allocation with the static route table.
    params: Vec<Arc<str>>,
}

impl PathPattern {
    /// Compile a pattern string into a matcher.
    ///
    /// Segments starting with `:` become named parameters; everything else
    /// is matched literally (regex metacharacters in literals are escaped).
    /// Empty segments are ignored, so `/a/` compiles the same as `/a`.
    pub fn compile(pattern: &str) -> Result<Self, RegistryError> {
        if !pattern.starts_with('/') {
            return Err(RegistryError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "pattern must start with '/'".to_string(),
            });
        }

        if pattern == "/" {
            let regex = Regex::new(r"^/$").map_err(|e| RegistryError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
            return Ok(Self {
                pattern: pattern.to_string(),
                regex,
                params: Vec::new(),
            });
        }

        let mut source = String::with_capacity(pattern.len() + 8);
        source.push('^');
        let mut params = Vec::with_capacity(pattern.matches(':').count());

        for segment in pattern.split('/') {
            if let Some(name) = segment.strip_prefix(':') {
                if name.is_empty() {
                    return Err(RegistryError::InvalidPattern {
                        pattern: pattern.to_string(),
                        reason: "parameter segment has no name".to_string(),
                    });
                }
                source.push_str("/([^/]+)");
                params.push(Arc::from(name));
            } else if !segment.is_empty() {
                source.push('/');
                source.push_str(&regex::escape(segment));
            }
        }

        source.push('$');
        let regex = Regex::new(&source).map_err(|e| RegistryError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            params,
        })
    }

    /// Match a concrete path against this pattern.
    ///
    /// Returns the extracted parameters on a match, `None` otherwise.
    /// Segment counts must agree and literal segments must match exactly.
    /// Captured values are percent-decoded.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<ParamVec> {
        let caps = self.regex.captures(path)?;
        let mut params = ParamVec::new();
        for (i, name) in self.params.iter().enumerate() {
            let raw = caps.get(i + 1)?.as_str();
            let value = urlencoding::decode(raw)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            params.push((Arc::clone(name), value));
        }
        Some(params)
    }

    /// Render a concrete path by substituting positional values into the
    /// pattern's named segments, in order. Values are percent-encoded.
    ///
    /// # Errors
    ///
    /// [`UrlError::MissingValues`] if fewer values are supplied than the
    /// pattern has parameters. Extra values are ignored.
    pub fn render(&self, values: &[&str]) -> Result<String, UrlError> {
        if values.len() < self.params.len() {
            return Err(UrlError::MissingValues {
                pattern: self.pattern.clone(),
                expected: self.params.len(),
                supplied: values.len(),
            });
        }

        let mut out = String::with_capacity(self.pattern.len());
        let mut idx = 0;
        for segment in self.pattern.split('/') {
            if segment.is_empty() {
                continue;
            }
            out.push('/');
            if segment.starts_with(':') {
                out.push_str(&urlencoding::encode(values[idx]));
                idx += 1;
            } else {
                out.push_str(segment);
            }
        }
        if out.is_empty() {
            out.push('/');
        }
        Ok(out)
    }

    /// Render a concrete path from named values.
    ///
    /// # Errors
    ///
    /// [`UrlError::MissingParam`] naming the first pattern parameter with
    /// no entry in `values`.
    pub fn render_named(&self, values: &HashMap<String, String>) -> Result<String, UrlError> {
        let mut out = String::with_capacity(self.pattern.len());
        for segment in self.pattern.split('/') {
            if segment.is_empty() {
                continue;
            }
            out.push('/');
            if let Some(name) = segment.strip_prefix(':') {
                let value = values.get(name).ok_or_else(|| UrlError::MissingParam {
                    name: name.to_string(),
                })?;
                out.push_str(&urlencoding::encode(value));
            } else {
                out.push_str(segment);
            }
        }
        if out.is_empty() {
            out.push('/');
        }
        Ok(out)
    }

    /// The original pattern string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Parameter names in pattern order.
    #[must_use]
    pub fn param_names(&self) -> &[Arc<str>] {
        &self.params
    }
}
