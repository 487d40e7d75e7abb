//! Request DTOs for the feed API
//!
//! Defines the query parameters accepted by the feed endpoint.

use serde::Deserialize;

/// Query string of `GET /sherv-challenge/v1/strategy11-data`
///
/// # Fields
/// - `_fields`: Optional comma-separated subset of `title`, `headers`, `rows`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedQuery {
    #[serde(rename = "_fields", default)]
    pub fields: Option<String>,
}

impl FeedQuery {
    /// Resolves which response fields were asked for.
    ///
    /// A missing or blank `_fields` selects everything. A nested name such
    /// as `rows.id` selects its top-level field.
    pub fn selection(&self) -> FieldSelection {
        let requested: Vec<&str> = match self.fields.as_deref() {
            Some(list) if !list.trim().is_empty() => list
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .collect(),
            _ => return FieldSelection::all(),
        };

        let includes = |field: &str| {
            requested.iter().any(|name| {
                *name == field
                    || name
                        .strip_prefix(field)
                        .is_some_and(|rest| rest.starts_with('.'))
            })
        };

        FieldSelection {
            title: includes("title"),
            headers: includes("headers"),
            rows: includes("rows"),
        }
    }
}

/// Fields of the feed response to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSelection {
    pub title: bool,
    pub headers: bool,
    pub rows: bool,
}

impl FieldSelection {
    pub fn all() -> Self {
        Self {
            title: true,
            headers: true,
            rows: true,
        }
    }
}
