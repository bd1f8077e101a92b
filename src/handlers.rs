// HTTP request handlers for the items API

use axum::{extract::State, response::Json};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use tracing::debug;
use utoipa::IntoParams;

use crate::app_state::SharedState;
use crate::error::HttpValidationError;
use crate::extract::{FromParams, Params, RawParams, ValidJson};
use crate::models::{CreateItemRequest, ModelName};
use crate::validation::{
    greater_than, less_or_equal, matches, max_length, min_length, parse_bool, parse_int, required,
    ErrorDetail, Loc, Violations,
};

pub const ITEM_QUERY_PARAM: &str = "item-query";
pub const ITEM_QUERY_MIN_LENGTH: usize = 3;
pub const ITEM_QUERY_MAX_LENGTH: usize = 50;
pub const ITEM_ID_MAX: i64 = 1000;

pub const ITEM_LONG_DESCRIPTION: &str = "This is an amazing item with a long description";
pub const USER_ITEM_LONG_DESCRIPTION: &str = "This is an amazing item that has a long description";

pub static ITEM_QUERY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new("^fixedquery$").expect("item query pattern is a valid regex"));

/// Optional boolean query flag, `false` when absent
fn flag(params: &RawParams, name: &str, violations: &mut Violations) -> Option<bool> {
    violations.check(
        Loc::query(name),
        params.query(name).map(parse_bool).unwrap_or(Ok(false)),
    )
}

fn optional_query(params: &RawParams, name: &str) -> Option<String> {
    params.query(name).map(str::to_string)
}

// ===== ROOT =====

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Successful Response"))
)]
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello World" }))
}

// ===== ITEM ENDPOINTS =====

#[derive(Debug, PartialEq)]
pub struct ListItemsParams {
    pub skip: i64,
    pub limit: i64,
    pub q: String,
}

impl FromParams for ListItemsParams {
    fn from_params(params: &RawParams) -> Result<Self, Vec<ErrorDetail>> {
        let mut violations = Violations::new();

        let skip = violations.check(
            Loc::query("skip"),
            params.query("skip").map(parse_int).unwrap_or(Ok(0)),
        );
        let limit = violations.check(
            Loc::query("limit"),
            params.query("limit").map(parse_int).unwrap_or(Ok(10)),
        );
        let q = violations.check(
            Loc::query(ITEM_QUERY_PARAM),
            required(params.query(ITEM_QUERY_PARAM))
                .map(str::to_string)
                .and_then(|q| min_length(q, ITEM_QUERY_MIN_LENGTH))
                .and_then(|q| max_length(q, ITEM_QUERY_MAX_LENGTH))
                .and_then(|q| matches(q, &ITEM_QUERY_PATTERN)),
        );

        violations.finish(|| {
            Some(ListItemsParams {
                skip: skip?,
                limit: limit?,
                q: q?,
            })
        })
    }
}

/// GET /items/
/// Page through the fake database
#[utoipa::path(
    get,
    path = "/items/",
    params(
        ("skip" = Option<i64>, Query, description = "Rows to skip, negative counts from the end"),
        ("limit" = Option<i64>, Query, description = "Slice end offset from `skip`, 10 when absent"),
        ("item-query" = String, Query, deprecated,
            min_length = 3, max_length = 50, pattern = "^fixedquery$"),
    ),
    responses(
        (status = 200, description = "Successful Response"),
        (status = 422, description = "Validation Error", body = HttpValidationError),
    )
)]
pub async fn list_items(
    State(state): State<SharedState>,
    Params(params): Params<ListItemsParams>,
) -> Json<Value> {
    let mut results = json!({ "items": state.page(params.skip, params.limit) });
    if !params.q.is_empty() {
        results["q"] = json!(params.q);
    }
    Json(results)
}

#[derive(Debug, PartialEq)]
pub struct ReadItemParams {
    pub item_id: i64,
    pub q: Option<String>,
    pub short: bool,
}

impl FromParams for ReadItemParams {
    fn from_params(params: &RawParams) -> Result<Self, Vec<ErrorDetail>> {
        let mut violations = Violations::new();

        let item_id = violations.check(
            Loc::path("item_id"),
            required(params.path("item_id"))
                .and_then(parse_int)
                .and_then(|id| greater_than(id, 0))
                .and_then(|id| less_or_equal(id, ITEM_ID_MAX)),
        );
        let q = optional_query(params, "q");
        let short = flag(params, "short", &mut violations);

        violations.finish(|| {
            Some(ReadItemParams {
                item_id: item_id?,
                q,
                short: short?,
            })
        })
    }
}

/// GET /items/:item_id
#[utoipa::path(
    get,
    path = "/items/{item_id}",
    params(
        ("item_id" = i64, Path, description = "The ID of the item to get",
            exclusive_minimum = 0, maximum = 1000),
        ("q" = Option<String>, Query,),
        ("short" = Option<bool>, Query,),
    ),
    responses(
        (status = 200, description = "Successful Response"),
        (status = 422, description = "Validation Error", body = HttpValidationError),
    )
)]
pub async fn read_item(Params(params): Params<ReadItemParams>) -> Json<Value> {
    let mut item = json!({ "item_id": params.item_id });
    if let Some(q) = params.q.filter(|q| !q.is_empty()) {
        item["q"] = json!(q);
    }
    if !params.short {
        // "descripton" is the published key for this endpoint
        item["descripton"] = json!(ITEM_LONG_DESCRIPTION);
    }
    Json(item)
}

/// POST /items/
/// Validate an item together with its owner and echo both back
#[utoipa::path(
    post,
    path = "/items/",
    request_body = CreateItemRequest,
    responses(
        (status = 200, description = "Successful Response"),
        (status = 422, description = "Validation Error", body = HttpValidationError),
    )
)]
pub async fn create_item(ValidJson(request): ValidJson<CreateItemRequest>) -> Json<Value> {
    debug!(importance = ?request.importance, item = %request.item.name, "item submitted");

    Json(json!({
        "item": request.item,
        "user": request.user,
        "importance": request.importance,
    }))
}

// ===== USER ENDPOINTS =====

#[utoipa::path(
    get,
    path = "/users/me",
    responses((status = 200, description = "Successful Response"))
)]
pub async fn read_user_me() -> Json<Value> {
    Json(json!({ "user_id": "the current user" }))
}

#[derive(Debug, PartialEq, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct UserPath {
    pub user_id: String,
}

impl FromParams for UserPath {
    fn from_params(params: &RawParams) -> Result<Self, Vec<ErrorDetail>> {
        let mut violations = Violations::new();
        let user_id = violations.check(
            Loc::path("user_id"),
            required(params.path("user_id")).map(str::to_string),
        );
        violations.finish(|| Some(UserPath { user_id: user_id? }))
    }
}

/// GET /users/:user_id
/// `/users/me` is routed separately and wins over this one
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    params(UserPath),
    responses((status = 200, description = "Successful Response"))
)]
pub async fn read_user(Params(path): Params<UserPath>) -> Json<Value> {
    Json(json!({ "user_id": path.user_id }))
}

#[derive(Debug, PartialEq)]
pub struct UserItemParams {
    pub user_id: i64,
    pub item_id: String,
    pub q: Option<String>,
    pub short: bool,
}

impl FromParams for UserItemParams {
    fn from_params(params: &RawParams) -> Result<Self, Vec<ErrorDetail>> {
        let mut violations = Violations::new();

        let user_id = violations.check(
            Loc::path("user_id"),
            required(params.path("user_id")).and_then(parse_int),
        );
        let item_id = violations.check(
            Loc::path("item_id"),
            required(params.path("item_id")).map(str::to_string),
        );
        let q = optional_query(params, "q");
        let short = flag(params, "short", &mut violations);

        violations.finish(|| {
            Some(UserItemParams {
                user_id: user_id?,
                item_id: item_id?,
                q,
                short: short?,
            })
        })
    }
}

/// GET /users/:user_id/items/:item_id
#[utoipa::path(
    get,
    path = "/users/{user_id}/items/{item_id}",
    params(
        ("user_id" = i64, Path,),
        ("item_id" = String, Path,),
        ("q" = Option<String>, Query,),
        ("short" = Option<bool>, Query,),
    ),
    responses(
        (status = 200, description = "Successful Response"),
        (status = 422, description = "Validation Error", body = HttpValidationError),
    )
)]
pub async fn read_user_item(Params(params): Params<UserItemParams>) -> Json<Value> {
    let mut item = json!({ "item_id": params.item_id, "owner_id": params.user_id });
    if let Some(q) = params.q.filter(|q| !q.is_empty()) {
        item["q"] = json!(q);
    }
    if !params.short {
        item["description"] = json!(USER_ITEM_LONG_DESCRIPTION);
    }
    Json(item)
}

// ===== MODEL ENDPOINTS =====

#[derive(Debug, PartialEq, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct ModelPath {
    pub model_name: ModelName,
}

impl FromParams for ModelPath {
    fn from_params(params: &RawParams) -> Result<Self, Vec<ErrorDetail>> {
        let mut violations = Violations::new();
        let model_name = violations.check(
            Loc::path("model_name"),
            required(params.path("model_name")).and_then(str::parse::<ModelName>),
        );
        violations.finish(|| Some(ModelPath { model_name: model_name? }))
    }
}

/// GET /model/:model_name
#[utoipa::path(
    get,
    path = "/model/{model_name}",
    params(ModelPath),
    responses(
        (status = 200, description = "Successful Response"),
        (status = 422, description = "Validation Error", body = HttpValidationError),
    )
)]
pub async fn get_model(Params(path): Params<ModelPath>) -> Json<Value> {
    let message = match path.model_name {
        ModelName::Alexnet => "Deep Learning FTW!",
        ModelName::Lenet => "LeCNN all the images",
        ModelName::Resnet => "Have some residuals",
    };
    Json(json!({ "model_name": path.model_name, "message": message }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn params(path: &[(&str, &str)], query: &[(&str, &str)]) -> RawParams {
        RawParams::new(owned(path), owned(query))
    }

    #[test]
    fn test_list_items_defaults() {
        let parsed = ListItemsParams::from_params(&params(&[], &[("item-query", "fixedquery")]));
        assert_eq!(
            parsed.unwrap(),
            ListItemsParams {
                skip: 0,
                limit: 10,
                q: "fixedquery".into()
            }
        );
    }

    #[test]
    fn test_list_items_query_constraints() {
        let errors = ListItemsParams::from_params(&params(&[], &[("item-query", "ab")])).unwrap_err();
        assert_eq!(errors[0].kind, "value_error.any_str.min_length");

        let long = "x".repeat(51);
        let errors = ListItemsParams::from_params(&params(&[], &[("item-query", long.as_str())])).unwrap_err();
        assert_eq!(errors[0].kind, "value_error.any_str.max_length");

        let errors =
            ListItemsParams::from_params(&params(&[], &[("item-query", "otherquery")])).unwrap_err();
        assert_eq!(errors[0].kind, "value_error.str.regex");
        assert_eq!(errors[0].msg, "string does not match regex \"^fixedquery$\"");
    }

    #[test]
    fn test_list_items_reports_all_bad_params() {
        let errors = ListItemsParams::from_params(&params(&[], &[("skip", "x"), ("limit", "y")]))
            .unwrap_err();
        let kinds: Vec<&str> = errors.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(
            kinds,
            vec!["type_error.integer", "type_error.integer", "value_error.missing"]
        );
    }

    #[test]
    fn test_read_item_bounds() {
        assert!(ReadItemParams::from_params(&params(&[("item_id", "1000")], &[])).is_ok());
        let errors = ReadItemParams::from_params(&params(&[("item_id", "0")], &[])).unwrap_err();
        assert_eq!(errors[0].kind, "value_error.number.not_gt");
        let errors = ReadItemParams::from_params(&params(&[("item_id", "1001")], &[])).unwrap_err();
        assert_eq!(errors[0].kind, "value_error.number.not_le");
    }

    #[test]
    fn test_read_item_short_flag() {
        let parsed =
            ReadItemParams::from_params(&params(&[("item_id", "3")], &[("short", "yes")])).unwrap();
        assert!(parsed.short);
        let errors =
            ReadItemParams::from_params(&params(&[("item_id", "3")], &[("short", "sure")]))
                .unwrap_err();
        assert_eq!(errors[0].kind, "type_error.bool");
    }

    #[tokio::test]
    async fn test_read_item_response_shapes() {
        let Json(full) = read_item(Params(ReadItemParams {
            item_id: 5,
            q: Some("hi".into()),
            short: false,
        }))
        .await;
        assert_eq!(
            full,
            json!({ "item_id": 5, "q": "hi", "descripton": ITEM_LONG_DESCRIPTION })
        );

        let Json(short) = read_item(Params(ReadItemParams {
            item_id: 5,
            q: Some(String::new()),
            short: true,
        }))
        .await;
        assert_eq!(short, json!({ "item_id": 5 }));
    }

    #[tokio::test]
    async fn test_model_messages() {
        let cases = [
            (ModelName::Alexnet, "Deep Learning FTW!"),
            (ModelName::Lenet, "LeCNN all the images"),
            (ModelName::Resnet, "Have some residuals"),
        ];
        for (model_name, message) in cases {
            let Json(body) = get_model(Params(ModelPath { model_name })).await;
            assert_eq!(body["model_name"], model_name.as_str());
            assert_eq!(body["message"], message);
        }
    }

    #[test]
    fn test_model_path_rejects_unknown_model() {
        let errors = ModelPath::from_params(&params(&[("model_name", "vgg")], &[])).unwrap_err();
        assert_eq!(errors[0].kind, "type_error.enum");
    }

    #[test]
    fn test_user_item_owner_must_be_integer() {
        let errors = UserItemParams::from_params(&params(
            &[("user_id", "me"), ("item_id", "foo")],
            &[],
        ))
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(serde_json::to_value(&errors[0].loc).unwrap(), json!(["path", "user_id"]));
    }
}
