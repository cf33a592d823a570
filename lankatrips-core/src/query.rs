//! Shared building blocks for the list endpoints: pagination resolution,
//! case-insensitive free-text search, whitelisted exact-match filters and
//! whitelisted sort clauses, all applied onto a `sqlx::QueryBuilder`.
//!
//! Every repository builds two queries from the same filter set: the page
//! query and an unpaginated COUNT, so `meta.total` always reflects the
//! filter rather than the page.

use sqlx::{Postgres, QueryBuilder};
use std::collections::HashMap;

/// Resolved pagination for a list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: i64,
    pub limit: i64,
}

impl PageParams {
    /// Resolves `page` and `limit` from raw query parameters.
    ///
    /// Invalid numeric input never fails: it falls back to the default,
    /// then `page` is floored at 1 and `limit` clamped to [1, 100].
    pub fn from_query(params: &HashMap<String, String>, default_limit: i64) -> Self {
        let page = params
            .get("page")
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(1)
            .max(1);
        let limit = params
            .get("limit")
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(default_limit)
            .clamp(1, 100);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// Escapes LIKE wildcards so user input only ever matches literally.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Appends a case-insensitive substring search over the union of `fields`
/// when a non-empty `q` parameter is present. An empty or missing `q` is
/// "no search". Entries in `fields` are trusted SQL expressions.
pub fn push_search(
    qb: &mut QueryBuilder<'_, Postgres>,
    params: &HashMap<String, String>,
    fields: &[&str],
) {
    let q = match params.get("q").map(|v| v.trim()) {
        Some(q) if !q.is_empty() && !fields.is_empty() => q,
        _ => return,
    };
    let pattern = format!("%{}%", escape_like(q));

    qb.push(" AND (");
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push(*field);
        qb.push(" ILIKE ");
        qb.push_bind(pattern.clone());
    }
    qb.push(")");
}

/// Appends an exact-match equality filter for each allowed key that is
/// present and non-empty in the query. `allowed` maps query key to column;
/// keys not listed are ignored entirely.
pub fn push_eq_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    params: &HashMap<String, String>,
    allowed: &[(&str, &str)],
) {
    for (key, column) in allowed {
        if let Some(value) = params.get(*key) {
            if !value.is_empty() {
                qb.push(" AND ");
                qb.push(*column);
                qb.push(" = ");
                qb.push_bind(value.clone());
            }
        }
    }
}

/// Builds an ORDER BY clause from the `sort` parameter: a comma-separated
/// list of field names, `-` prefix for descending, applied in order.
/// Fields are matched against the `allowed` (query name, column) whitelist;
/// unknown fields are skipped. Falls back to `default` when nothing
/// usable remains.
pub fn order_by(
    params: &HashMap<String, String>,
    allowed: &[(&str, &str)],
    default: &str,
) -> String {
    let sort = match params.get("sort").map(|v| v.trim()) {
        Some(s) if !s.is_empty() => s,
        _ => return default.to_string(),
    };

    let mut clauses = Vec::new();
    for part in sort.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (name, direction) = match part.strip_prefix('-') {
            Some(name) => (name, "DESC"),
            None => (part, "ASC"),
        };
        if let Some((_, column)) = allowed.iter().find(|(key, _)| *key == name) {
            clauses.push(format!("{column} {direction}"));
        }
    }

    if clauses.is_empty() {
        default.to_string()
    } else {
        clauses.join(", ")
    }
}

/// Appends an inclusive range filter for a numeric column. Either bound
/// may be absent; input that fails to parse as `T` is treated as absent.
pub fn push_range<'qb, T>(
    qb: &mut QueryBuilder<'qb, Postgres>,
    params: &HashMap<String, String>,
    column: &str,
    min_key: &str,
    max_key: &str,
) where
    T: std::str::FromStr + sqlx::Encode<'qb, Postgres> + sqlx::Type<Postgres> + Send + 'qb,
{
    if let Some(min) = params.get(min_key).and_then(|v| v.parse::<T>().ok()) {
        qb.push(" AND ");
        qb.push(column);
        qb.push(" >= ");
        qb.push_bind(min);
    }
    if let Some(max) = params.get(max_key).and_then(|v| v.parse::<T>().ok()) {
        qb.push(" AND ");
        qb.push(column);
        qb.push(" <= ");
        qb.push_bind(max);
    }
}

/// Appends LIMIT/OFFSET for the resolved page.
pub fn push_page(qb: &mut QueryBuilder<'_, Postgres>, page: &PageParams) {
    qb.push(" LIMIT ");
    qb.push_bind(page.limit);
    qb.push(" OFFSET ");
    qb.push_bind(page.offset());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn page_params_default_and_clamp() {
        let p = PageParams::from_query(&params(&[]), 10);
        assert_eq!(p, PageParams { page: 1, limit: 10 });

        let p = PageParams::from_query(&params(&[("page", "3"), ("limit", "25")]), 10);
        assert_eq!(p, PageParams { page: 3, limit: 25 });
        assert_eq!(p.offset(), 50);

        let p = PageParams::from_query(&params(&[("page", "0"), ("limit", "500")]), 10);
        assert_eq!(p, PageParams { page: 1, limit: 100 });

        let p = PageParams::from_query(&params(&[("page", "-2"), ("limit", "0")]), 10);
        assert_eq!(p, PageParams { page: 1, limit: 1 });
    }

    #[test]
    fn page_params_coerce_garbage_input() {
        let p = PageParams::from_query(&params(&[("page", "abc"), ("limit", "NaN")]), 12);
        assert_eq!(p, PageParams { page: 1, limit: 12 });
    }

    #[test]
    fn escape_like_neutralizes_wildcards() {
        assert_eq!(escape_like("100%_\\"), "100\\%\\_\\\\");
    }

    #[test]
    fn search_is_skipped_for_empty_q() {
        let mut qb = QueryBuilder::new("SELECT * FROM locations WHERE 1=1");
        push_search(&mut qb, &params(&[("q", "  ")]), &["name", "region"]);
        assert_eq!(qb.sql(), "SELECT * FROM locations WHERE 1=1");
    }

    #[test]
    fn search_ors_across_all_fields() {
        let mut qb = QueryBuilder::new("SELECT * FROM locations WHERE 1=1");
        push_search(&mut qb, &params(&[("q", "galle")]), &["name", "region"]);
        assert_eq!(
            qb.sql(),
            "SELECT * FROM locations WHERE 1=1 AND (name ILIKE $1 OR region ILIKE $2)"
        );
    }

    #[test]
    fn eq_filters_apply_only_allowed_keys() {
        let mut qb = QueryBuilder::new("SELECT * FROM bookings WHERE 1=1");
        push_eq_filters(
            &mut qb,
            &params(&[("status", "pending"), ("role", "admin")]),
            &[("status", "status")],
        );
        assert_eq!(
            qb.sql(),
            "SELECT * FROM bookings WHERE 1=1 AND status = $1"
        );
    }

    #[test]
    fn order_by_parses_prefixes_and_whitelists() {
        let allowed = [("price", "price"), ("createdAt", "created_at")];

        let clause = order_by(
            &params(&[("sort", "-price,createdAt")]),
            &allowed,
            "created_at DESC",
        );
        assert_eq!(clause, "price DESC, created_at ASC");

        let clause = order_by(
            &params(&[("sort", "-secret;DROP TABLE")]),
            &allowed,
            "created_at DESC",
        );
        assert_eq!(clause, "created_at DESC");

        let clause = order_by(&params(&[]), &allowed, "created_at DESC");
        assert_eq!(clause, "created_at DESC");
    }

    #[test]
    fn range_applies_inclusive_bounds_and_skips_garbage() {
        let mut qb = QueryBuilder::new("SELECT * FROM packages WHERE 1=1");
        push_range::<i32>(
            &mut qb,
            &params(&[("durationMin", "2"), ("durationMax", "7")]),
            "duration_days",
            "durationMin",
            "durationMax",
        );
        assert_eq!(
            qb.sql(),
            "SELECT * FROM packages WHERE 1=1 AND duration_days >= $1 AND duration_days <= $2"
        );

        let mut qb = QueryBuilder::new("SELECT * FROM packages WHERE 1=1");
        push_range::<i32>(
            &mut qb,
            &params(&[("durationMin", "abc")]),
            "duration_days",
            "durationMin",
            "durationMax",
        );
        assert_eq!(qb.sql(), "SELECT * FROM packages WHERE 1=1");
    }

    #[test]
    fn push_page_binds_limit_and_offset() {
        let mut qb = QueryBuilder::new("SELECT * FROM packages WHERE 1=1");
        push_page(&mut qb, &PageParams { page: 2, limit: 12 });
        assert_eq!(
            qb.sql(),
            "SELECT * FROM packages WHERE 1=1 LIMIT $1 OFFSET $2"
        );
    }
}
