//! # Binding Patterns
//!
//! Topic binding patterns with wildcard segments: `*` matches exactly one
//! dot-separated segment, `#` matches zero or more.

use thiserror::Error;

/// Errors parsing a binding pattern.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Patterns must have at least one segment and no empty segments.
    #[error("invalid binding pattern `{pattern}`")]
    Invalid { pattern: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `*` — exactly one segment.
    Single,
    /// `#` — zero or more segments.
    Rest,
}

/// A parsed binding pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingPattern {
    source: String,
    segments: Vec<Segment>,
}

impl BindingPattern {
    /// Parse a pattern like `post.*` or `#`.
    ///
    /// # Errors
    ///
    /// `PatternError::Invalid` for empty patterns or patterns with empty
    /// segments (`post..created`).
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Invalid {
                pattern: pattern.to_owned(),
            });
        }

        let segments = pattern
            .split('.')
            .map(|segment| match segment {
                "" => Err(PatternError::Invalid {
                    pattern: pattern.to_owned(),
                }),
                "*" => Ok(Segment::Single),
                "#" => Ok(Segment::Rest),
                literal => Ok(Segment::Literal(literal.to_owned())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: pattern.to_owned(),
            segments,
        })
    }

    /// The pattern text as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether a routing key matches this pattern.
    #[must_use]
    pub fn matches(&self, routing_key: &str) -> bool {
        let key: Vec<&str> = routing_key.split('.').collect();
        Self::match_segments(&self.segments, &key)
    }

    fn match_segments(pattern: &[Segment], key: &[&str]) -> bool {
        match pattern.first() {
            None => key.is_empty(),
            Some(Segment::Rest) => {
                // `#` absorbs any number of leading segments.
                (0..=key.len()).any(|taken| Self::match_segments(&pattern[1..], &key[taken..]))
            }
            Some(Segment::Single) => {
                !key.is_empty() && Self::match_segments(&pattern[1..], &key[1..])
            }
            Some(Segment::Literal(literal)) => key
                .first()
                .is_some_and(|segment| segment == literal)
                && Self::match_segments(&pattern[1..], &key[1..]),
        }
    }
}
