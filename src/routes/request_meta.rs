// Routes that echo request metadata: cookies and headers

use axum::{
    http::{
        header::{ACCEPT, CACHE_CONTROL, USER_AGENT},
        HeaderMap, HeaderName,
    },
    response::Json,
};
use axum_extra::extract::CookieJar;
use serde_json::{json, Value};

pub const COOKIE_ID: &str = "cookie_id";

/// First value of a header; non-UTF-8 bytes are replaced rather than rejected
fn header_value(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
}

/// GET /cookies/
#[utoipa::path(
    get,
    path = "/cookies/",
    params(("cookie_id" = Option<String>, Cookie,)),
    responses((status = 200, description = "Successful Response"))
)]
pub async fn read_cookies(jar: CookieJar) -> Json<Value> {
    let cookie_id = jar.get(COOKIE_ID).map(|cookie| cookie.value().to_string());
    Json(json!({ "cookie_id": cookie_id }))
}

/// GET /headers/
#[utoipa::path(
    get,
    path = "/headers/",
    params(
        ("user-agent" = Option<String>, Header,),
        ("accept" = Option<String>, Header,),
        ("cache-control" = Option<String>, Header,),
    ),
    responses((status = 200, description = "Successful Response"))
)]
pub async fn read_headers(headers: HeaderMap) -> Json<Value> {
    Json(json!({
        "User-Agent": header_value(&headers, USER_AGENT),
        "Accept": header_value(&headers, ACCEPT),
        "Cache-Control": header_value(&headers, CACHE_CONTROL),
    }))
}
