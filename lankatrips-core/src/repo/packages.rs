use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::package::{CreatePackage, PackageDetail, PackageListItem, UpdatePackage};
use crate::models::Package;
use crate::query::{order_by, push_eq_filters, push_page, push_range, push_search, PageParams};
use crate::repo::locations;

const COLUMNS: &str = "id, title, price, duration_days, category, region, location_refs, \
                       itinerary, includes, excludes, images, created_at, updated_at";

const DEFAULT_LIMIT: i64 = 12;

const SEARCH_FIELDS: &[&str] = &["title", "category", "region"];

const SORTABLE: &[(&str, &str)] = &[
    ("title", "title"),
    ("price", "price"),
    ("durationDays", "duration_days"),
    ("createdAt", "created_at"),
];

fn apply_filters(qb: &mut QueryBuilder<'_, Postgres>, params: &HashMap<String, String>) {
    push_search(qb, params, SEARCH_FIELDS);
    push_eq_filters(qb, params, &[("category", "category"), ("region", "region")]);
    push_range::<Decimal>(qb, params, "price", "priceMin", "priceMax");
    push_range::<i32>(qb, params, "duration_days", "durationMin", "durationMax");
}

/// Lists packages with their location references resolved to
/// (id, name, region) summaries. Stale references drop out silently.
pub async fn list(
    pool: &PgPool,
    params: &HashMap<String, String>,
) -> Result<(Vec<PackageListItem>, i64, PageParams), sqlx::Error> {
    let page = PageParams::from_query(params, DEFAULT_LIMIT);

    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM packages WHERE 1=1"));
    apply_filters(&mut qb, params);
    qb.push(" ORDER BY ");
    qb.push(order_by(params, SORTABLE, "created_at DESC"));
    push_page(&mut qb, &page);
    let packages = qb.build_query_as::<Package>().fetch_all(pool).await?;

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM packages WHERE 1=1");
    apply_filters(&mut count_qb, params);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    // One lookup for the whole page, then each package picks its own refs
    // back out in order.
    let all_refs: Vec<Uuid> = packages
        .iter()
        .flat_map(|p| p.location_refs.iter().copied())
        .collect();
    let summaries = locations::find_summaries(pool, &all_refs).await?;
    let by_id: HashMap<Uuid, _> = summaries.into_iter().map(|s| (s.id, s)).collect();

    let items = packages
        .into_iter()
        .map(|package| {
            let resolved = package
                .location_refs
                .iter()
                .filter_map(|id| by_id.get(id).cloned())
                .collect();
            PackageListItem {
                package,
                locations: resolved,
            }
        })
        .collect();

    Ok((items, total, page))
}

pub async fn find(pool: &PgPool, id: Uuid) -> Result<Option<Package>, sqlx::Error> {
    sqlx::query_as::<_, Package>(&format!("SELECT {COLUMNS} FROM packages WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Fetches a package with its location references fully resolved,
/// preserving reference order.
pub async fn find_detail(pool: &PgPool, id: Uuid) -> Result<Option<PackageDetail>, sqlx::Error> {
    let Some(package) = find(pool, id).await? else {
        return Ok(None);
    };

    let resolved = locations::find_many(pool, &package.location_refs).await?;
    let by_id: HashMap<Uuid, _> = resolved.into_iter().map(|l| (l.id, l)).collect();
    let ordered = package
        .location_refs
        .iter()
        .filter_map(|id| by_id.get(id).cloned())
        .collect();

    Ok(Some(PackageDetail {
        package,
        locations: ordered,
    }))
}

pub async fn create(pool: &PgPool, req: &CreatePackage) -> Result<Package, sqlx::Error> {
    sqlx::query_as::<_, Package>(&format!(
        "INSERT INTO packages (id, title, price, duration_days, category, region, \
         location_refs, itinerary, includes, excludes, images) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(req.title.trim())
    .bind(req.price)
    .bind(req.duration_days)
    .bind(req.category.trim())
    .bind(req.region.trim())
    .bind(req.location_ref_list())
    .bind(req.itinerary_list())
    .bind(req.includes_list())
    .bind(req.excludes_list())
    .bind(req.images.clone().unwrap_or_default())
    .fetch_one(pool)
    .await
}

/// Applies a partial update: unspecified fields keep their stored value,
/// new images are appended to the existing list.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    req: &UpdatePackage,
) -> Result<Option<Package>, sqlx::Error> {
    let Some(existing) = find(pool, id).await? else {
        return Ok(None);
    };

    let title = req.title.clone().unwrap_or(existing.title);
    let price = req.price.unwrap_or(existing.price);
    let duration_days = req.duration_days.unwrap_or(existing.duration_days);
    let category = req.category.clone().unwrap_or(existing.category);
    let region = req.region.clone().unwrap_or(existing.region);
    let location_refs = match &req.location_refs {
        Some(raw) => crate::models::package::parse_location_refs(raw).unwrap_or_default(),
        None => existing.location_refs,
    };
    let itinerary = match &req.itinerary {
        Some(raw) => crate::models::split_lines(raw),
        None => existing.itinerary,
    };
    let includes = match &req.includes {
        Some(raw) => crate::models::split_lines(raw),
        None => existing.includes,
    };
    let excludes = match &req.excludes {
        Some(raw) => crate::models::split_lines(raw),
        None => existing.excludes,
    };

    let mut images = existing.images;
    if let Some(new_images) = &req.images {
        images.extend(new_images.iter().cloned());
    }

    sqlx::query_as::<_, Package>(&format!(
        "UPDATE packages SET title = $2, price = $3, duration_days = $4, category = $5, \
         region = $6, location_refs = $7, itinerary = $8, includes = $9, excludes = $10, \
         images = $11, updated_at = NOW() WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(title)
    .bind(price)
    .bind(duration_days)
    .bind(category)
    .bind(region)
    .bind(location_refs)
    .bind(itinerary)
    .bind(includes)
    .bind(excludes)
    .bind(images)
    .fetch_optional(pool)
    .await
}

/// Hard delete. Bookings referencing the package keep their stale
/// reference and their frozen total price.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<Package>, sqlx::Error> {
    sqlx::query_as::<_, Package>(&format!(
        "DELETE FROM packages WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}
