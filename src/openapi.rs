// OpenAPI 3 description of the route table, served at /openapi.json

use axum::response::Json;
use serde_json::Value;
use utoipa::OpenApi;

use crate::error::{ApiError, ApiResult, HttpValidationError};
use crate::handlers;
use crate::models::{CreateItemRequest, Image, Item, ModelName, User};
use crate::routes::{files, request_meta};
use crate::validation::ErrorDetail;

#[derive(OpenApi)]
#[openapi(
    info(title = "Items API"),
    paths(
        handlers::root,
        request_meta::read_cookies,
        request_meta::read_headers,
        handlers::list_items,
        handlers::create_item,
        handlers::read_item,
        handlers::read_user_me,
        handlers::read_user,
        handlers::read_user_item,
        handlers::get_model,
        files::read_file,
        files::read_file_root,
        files::create_file,
        files::create_upload_file,
    ),
    components(schemas(
        Item,
        Image,
        User,
        CreateItemRequest,
        ModelName,
        files::FileUpload,
        ErrorDetail,
        HttpValidationError,
    ))
)]
pub struct ApiDoc;

/// GET /openapi.json
pub async fn openapi_json() -> ApiResult<Json<Value>> {
    let document = serde_json::to_value(ApiDoc::openapi())
        .map_err(|e| ApiError::Internal(format!("openapi document: {e}")))?;
    Ok(Json(document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{ITEM_ID_MAX, ITEM_QUERY_MAX_LENGTH, ITEM_QUERY_MIN_LENGTH, ITEM_QUERY_PARAM};
    use crate::models::DESCRIPTION_MAX_LENGTH;
    use serde_json::json;

    fn document() -> Value {
        serde_json::to_value(ApiDoc::openapi()).unwrap()
    }

    fn parameter<'a>(doc: &'a Value, path: &str, method: &str, name: &str) -> &'a Value {
        doc["paths"][path][method]["parameters"]
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["name"] == name)
            .unwrap()
    }

    #[test]
    fn test_every_route_is_described() {
        let doc = document();
        let routes = [
            ("/", "get"),
            ("/cookies/", "get"),
            ("/headers/", "get"),
            ("/items/", "get"),
            ("/items/", "post"),
            ("/items/{item_id}", "get"),
            ("/users/me", "get"),
            ("/users/{user_id}", "get"),
            ("/users/{user_id}/items/{item_id}", "get"),
            ("/model/{model_name}", "get"),
            ("/files/{file_path}", "get"),
            ("/files/", "get"),
            ("/files/", "post"),
            ("/uploadfile/", "post"),
        ];
        for (path, method) in routes {
            assert!(doc["paths"][path][method].is_object(), "missing {method} {path}");
        }
        assert_eq!(doc["info"]["title"], "Items API");
    }

    #[test]
    fn test_item_query_matches_validation() {
        let doc = document();
        let q = parameter(&doc, "/items/", "get", ITEM_QUERY_PARAM);
        assert_eq!(q["in"], "query");
        assert_eq!(q["deprecated"], true);
        assert_eq!(q["required"], true);
        assert_eq!(q["schema"]["pattern"], "^fixedquery$");
        assert_eq!(q["schema"]["minLength"], ITEM_QUERY_MIN_LENGTH);
        assert_eq!(q["schema"]["maxLength"], ITEM_QUERY_MAX_LENGTH);
    }

    #[test]
    fn test_item_id_bounds_match_validation() {
        let doc = document();
        let item_id = parameter(&doc, "/items/{item_id}", "get", "item_id");
        assert_eq!(item_id["in"], "path");
        assert_eq!(item_id["schema"]["maximum"].as_f64(), Some(ITEM_ID_MAX as f64));
        assert_eq!(item_id["schema"]["exclusiveMinimum"].as_f64(), Some(0.0));
    }

    #[test]
    fn test_item_schema_constraints() {
        let doc = document();
        let item = &doc["components"]["schemas"]["Item"];
        assert_eq!(item["required"], json!(["name", "price"]));
        assert_eq!(item["properties"]["description"]["maxLength"], DESCRIPTION_MAX_LENGTH);
        assert_eq!(item["properties"]["price"]["exclusiveMinimum"].as_f64(), Some(0.0));
    }

    #[test]
    fn test_model_name_enum_values() {
        let doc = document();
        assert_eq!(
            doc["components"]["schemas"]["ModelName"]["enum"],
            json!(ModelName::VALUES)
        );
    }

    #[test]
    fn test_uploads_are_multipart() {
        let doc = document();
        let content = &doc["paths"]["/uploadfile/"]["post"]["requestBody"]["content"];
        assert!(content["multipart/form-data"].is_object());
        assert!(doc["paths"]["/"]["get"]["responses"].get("422").is_none());
        assert!(doc["paths"]["/files/"]["post"]["responses"].get("422").is_some());
    }
}
