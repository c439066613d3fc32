//! `where`-style query filters.
//!
//! Filters render to the expression syntax the accounting API accepts
//! (`Name=="Jane" OR EmailAddress=="jane@example.com"`) and can also be
//! evaluated locally, which is how the in-memory service answers queries.

use core::fmt;

/// Equality filter over named entity fields, combinable with `OR`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq { field: String, value: String },
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Combine with another filter; nested `Or`s are flattened.
    pub fn or(self, other: Filter) -> Self {
        let mut terms = match self {
            Filter::Or(terms) => terms,
            single => vec![single],
        };
        match other {
            Filter::Or(more) => terms.extend(more),
            single => terms.push(single),
        }
        Filter::Or(terms)
    }

    /// Evaluate against an entity, given a lookup from field name to value.
    pub fn matches<'a, F>(&self, field_value: &F) -> bool
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        match self {
            Filter::Eq { field, value } => field_value(field) == Some(value.as_str()),
            Filter::Or(terms) => terms.iter().any(|t| t.matches(field_value)),
        }
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Eq { field, value } => write!(f, "{field}==\"{}\"", escape(value)),
            Filter::Or(terms) => {
                for (idx, term) in terms.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" OR ")?;
                    }
                    write!(f, "{term}")?;
                }
                Ok(())
            }
        }
    }
}
