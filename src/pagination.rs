//! Page/limit/sort query compilation shared by every list endpoint.
//!
//! Parsing never fails: malformed input degrades to defaults. `p` is the page
//! (1-based), `l` the page size and `s` a sort list such as `+created_at,-id`.

use serde::Deserialize;

/// Largest page size served when none is configured.
pub const MAX_LIMIT: i64 = 100;

/// Raw list query parameters as received on the URL.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PaginationQuery {
    pub p: Option<String>,
    pub l: Option<String>,
    pub s: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// One `ORDER BY` term, possibly qualified with a table prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    pub direction: SortDirection,
}

impl SortField {
    fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Compiled list directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub offset: i64,
    pub limit: i64,
    pub sorts: Vec<SortField>,
}

impl ListQuery {
    /// Renders ` ORDER BY ...` keeping only fields present in `sortable`.
    ///
    /// Returns an empty string when nothing survives. Field names reach SQL
    /// verbatim, so `sortable` must only contain trusted column names.
    pub fn order_by_clause(&self, sortable: &[&str]) -> String {
        let terms: Vec<String> = self
            .sorts
            .iter()
            .filter(|sort| sortable.contains(&sort.field.as_str()))
            .map(|sort| format!("{} {}", sort.field, sort.direction.as_sql()))
            .collect();

        if terms.is_empty() {
            String::new()
        } else {
            format!(" ORDER BY {}", terms.join(", "))
        }
    }
}

/// Compiles raw list parameters with a configured maximum page size.
#[derive(Debug, Clone, Copy)]
pub struct ListQueryCompiler {
    max_limit: i64,
}

impl Default for ListQueryCompiler {
    fn default() -> Self {
        Self {
            max_limit: MAX_LIMIT,
        }
    }
}

impl ListQueryCompiler {
    pub fn new(max_limit: i64) -> Self {
        Self {
            max_limit: max_limit.max(1),
        }
    }

    /// Compiles `p`, `l` and `s`, qualifying sort fields with `prefix` if given.
    pub fn compile(&self, query: &PaginationQuery, prefix: Option<&str>) -> ListQuery {
        let (offset, limit) =
            self.pagination(query.p.as_deref().unwrap_or(""), query.l.as_deref().unwrap_or(""));

        ListQuery {
            offset,
            limit,
            sorts: parse_sort(query.s.as_deref().unwrap_or(""), prefix),
        }
    }

    /// Returns `(offset, limit)`.
    ///
    /// A page that does not parse or is below 1 becomes 1. A limit that does
    /// not parse or falls outside `[1, max_limit]` becomes `max_limit`.
    pub fn pagination(&self, page: &str, limit: &str) -> (i64, i64) {
        let page = match page.parse::<i64>() {
            Ok(page) if page >= 1 => page,
            _ => 1,
        };

        let limit = match limit.parse::<i64>() {
            Ok(limit) if (1..=self.max_limit).contains(&limit) => limit,
            _ => self.max_limit,
        };

        ((page - 1).saturating_mul(limit), limit)
    }
}

/// [`ListQueryCompiler::pagination`] with the default [`MAX_LIMIT`].
pub fn parse_pagination(page: &str, limit: &str) -> (i64, i64) {
    ListQueryCompiler::default().pagination(page, limit)
}

/// Parses a comma separated list of `+field` / `-field` tokens.
///
/// Tokens without a sign, or with an empty field, are dropped. Input order is
/// preserved. Field names are not validated here.
pub fn parse_sort(sorts: &str, prefix: Option<&str>) -> Vec<SortField> {
    sorts
        .split(',')
        .filter_map(|token| {
            let (direction, field) = if let Some(field) = token.strip_prefix('+') {
                (SortDirection::Asc, field)
            } else if let Some(field) = token.strip_prefix('-') {
                (SortDirection::Desc, field)
            } else {
                return None;
            };

            if field.is_empty() {
                return None;
            }

            Some(match prefix {
                Some(prefix) => SortField::new(format!("{}.{}", prefix, field), direction),
                None => SortField::new(field, direction),
            })
        })
        .collect()
}
