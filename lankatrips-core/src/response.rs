use axum::Json;
use serde::Serialize;

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Meta {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

/// The uniform response envelope returned by every endpoint.
///
/// Success responses carry the payload in `data`; error responses are
/// rendered by `ApiError` with `success: false` and `data: null`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, message: &str) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: message.to_string(),
            meta: None,
        })
    }

    pub fn paginated(data: T, message: &str, meta: Meta) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: message.to_string(),
            meta: Some(meta),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_computes_total_pages() {
        let meta = Meta::new(1, 10, 25);
        assert_eq!(meta.total_pages, 3);

        let meta = Meta::new(1, 10, 30);
        assert_eq!(meta.total_pages, 3);

        let meta = Meta::new(1, 10, 0);
        assert_eq!(meta.total_pages, 0);
    }

    #[test]
    fn envelope_skips_missing_meta() {
        let Json(resp) = ApiResponse::ok(serde_json::json!({"x": 1}), "OK");
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "OK");
        assert!(value.get("meta").is_none());
    }

    #[test]
    fn envelope_serializes_meta_camel_case() {
        let Json(resp) = ApiResponse::paginated(vec![1, 2, 3], "Items", Meta::new(2, 3, 7));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["meta"]["page"], 2);
        assert_eq!(value["meta"]["totalPages"], 3);
    }
}
