use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::location::{CreateLocation, LocationSummary, UpdateLocation};
use crate::models::{split_commas, Location};
use crate::query::{order_by, push_eq_filters, push_page, push_search, PageParams};

const COLUMNS: &str = "id, name, region, description, images, map_url, tags, created_at, updated_at";

const DEFAULT_LIMIT: i64 = 10;

/// Searchable fields for the free-text `q` parameter. Tags are an array
/// column, flattened for the substring match.
const SEARCH_FIELDS: &[&str] = &[
    "name",
    "region",
    "description",
    "array_to_string(tags, ' ')",
];

const SORTABLE: &[(&str, &str)] = &[
    ("name", "name"),
    ("region", "region"),
    ("createdAt", "created_at"),
];

fn apply_filters(qb: &mut QueryBuilder<'_, Postgres>, params: &HashMap<String, String>) {
    push_search(qb, params, SEARCH_FIELDS);
    push_eq_filters(qb, params, &[("region", "region")]);
}

pub async fn list(
    pool: &PgPool,
    params: &HashMap<String, String>,
) -> Result<(Vec<Location>, i64, PageParams), sqlx::Error> {
    let page = PageParams::from_query(params, DEFAULT_LIMIT);

    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM locations WHERE 1=1"));
    apply_filters(&mut qb, params);
    qb.push(" ORDER BY ");
    qb.push(order_by(params, SORTABLE, "created_at DESC"));
    push_page(&mut qb, &page);
    let items = qb.build_query_as::<Location>().fetch_all(pool).await?;

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM locations WHERE 1=1");
    apply_filters(&mut count_qb, params);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    Ok((items, total, page))
}

pub async fn find(pool: &PgPool, id: Uuid) -> Result<Option<Location>, sqlx::Error> {
    sqlx::query_as::<_, Location>(&format!("SELECT {COLUMNS} FROM locations WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Resolves a set of location ids to (id, name, region) summaries.
/// Stale ids resolve to nothing.
pub async fn find_summaries(
    pool: &PgPool,
    ids: &[Uuid],
) -> Result<Vec<LocationSummary>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, LocationSummary>(
        "SELECT id, name, region FROM locations WHERE id = ANY($1)",
    )
    .bind(ids.to_vec())
    .fetch_all(pool)
    .await
}

/// Resolves a set of location ids to full records.
pub async fn find_many(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Location>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, Location>(&format!(
        "SELECT {COLUMNS} FROM locations WHERE id = ANY($1)"
    ))
    .bind(ids.to_vec())
    .fetch_all(pool)
    .await
}

pub async fn create(pool: &PgPool, req: &CreateLocation) -> Result<Location, sqlx::Error> {
    sqlx::query_as::<_, Location>(&format!(
        "INSERT INTO locations (id, name, region, description, images, map_url, tags) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(req.name.trim())
    .bind(req.region.trim())
    .bind(req.description.trim())
    .bind(req.images.clone().unwrap_or_default())
    .bind(req.map_url.as_deref().filter(|u| !u.is_empty()))
    .bind(req.tag_list())
    .fetch_one(pool)
    .await
}

/// Applies a partial update: unspecified fields keep their stored value,
/// new images are appended to the existing list.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    req: &UpdateLocation,
) -> Result<Option<Location>, sqlx::Error> {
    let Some(existing) = find(pool, id).await? else {
        return Ok(None);
    };

    let name = req.name.clone().unwrap_or(existing.name);
    let region = req.region.clone().unwrap_or(existing.region);
    let description = req.description.clone().unwrap_or(existing.description);
    let map_url = req
        .map_url
        .clone()
        .filter(|u| !u.is_empty())
        .or(existing.map_url);
    let tags = match &req.tags {
        Some(raw) => split_commas(raw),
        None => existing.tags,
    };

    let mut images = existing.images;
    if let Some(new_images) = &req.images {
        images.extend(new_images.iter().cloned());
    }

    sqlx::query_as::<_, Location>(&format!(
        "UPDATE locations SET name = $2, region = $3, description = $4, images = $5, \
         map_url = $6, tags = $7, updated_at = NOW() WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(name)
    .bind(region)
    .bind(description)
    .bind(images)
    .bind(map_url)
    .bind(tags)
    .fetch_optional(pool)
    .await
}

/// Hard delete. Packages referencing the location keep their stale
/// reference.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<Location>, sqlx::Error> {
    sqlx::query_as::<_, Location>(&format!(
        "DELETE FROM locations WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}
