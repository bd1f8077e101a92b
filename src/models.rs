// Data models for the items API
// Request models decode through `FromJson` so every bad field is reported;
// response shapes serialize with serde.

use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::validation::{
    as_object, field, float_greater_than, http_url, json_float, json_int, json_string,
    json_string_list, max_length, greater_than, ErrorKind, FromJson, Loc, Violations,
};

pub const DESCRIPTION_MAX_LENGTH: usize = 300;

// ===== IMAGE =====

/// An absolute http(s) URL, kept exactly as submitted
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HttpUrl(String);

impl HttpUrl {
    pub fn parse(raw: String) -> Result<Self, ErrorKind> {
        http_url(raw).map(HttpUrl)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({ "url": "https://imgur.com/foo.png", "name": "foo.png" }))]
pub struct Image {
    #[schema(value_type = String, min_length = 1, max_length = 2083)]
    pub url: HttpUrl,
    pub name: String,
}

impl FromJson for Image {
    fn from_json(value: &Value, loc: &Loc, violations: &mut Violations) -> Option<Self> {
        let object = violations.check(loc.clone(), as_object(value))?;

        let url = violations.check(
            loc.key("url"),
            field(object, "url")
                .ok_or(ErrorKind::Missing)
                .and_then(json_string)
                .and_then(HttpUrl::parse),
        );
        let name = violations.check(
            loc.key("name"),
            field(object, "name").ok_or(ErrorKind::Missing).and_then(json_string),
        );

        Some(Image { url: url?, name: name? })
    }
}

// ===== ITEM =====

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Item {
    #[schema(example = "Foo")]
    pub name: String,
    #[schema(max_length = 300, example = "Nice item")]
    pub description: Option<String>,
    /// The price must be greater than zero
    #[schema(exclusive_minimum = 0, example = 3.5)]
    pub price: f64,
    #[schema(example = 0.5)]
    pub tax: Option<f64>,
    #[serde(default)]
    #[schema(example = json!(["a", "b"]))]
    pub tags: Vec<String>,
    pub image: Option<Image>,
}

impl FromJson for Item {
    fn from_json(value: &Value, loc: &Loc, violations: &mut Violations) -> Option<Self> {
        let object = violations.check(loc.clone(), as_object(value))?;

        let name = violations.check(
            loc.key("name"),
            field(object, "name").ok_or(ErrorKind::Missing).and_then(json_string),
        );
        let description = violations.check(
            loc.key("description"),
            field(object, "description")
                .map(|v| json_string(v).and_then(|s| max_length(s, DESCRIPTION_MAX_LENGTH)))
                .transpose(),
        );
        let price = violations.check(
            loc.key("price"),
            field(object, "price")
                .ok_or(ErrorKind::Missing)
                .and_then(json_float)
                .and_then(|p| float_greater_than(p, 0)),
        );
        let tax = violations.check(
            loc.key("tax"),
            field(object, "tax").map(json_float).transpose(),
        );
        let tags = match field(object, "tags") {
            Some(v) => json_string_list(v, &loc.key("tags"), violations),
            None => Some(Vec::new()),
        };
        let image = match field(object, "image") {
            Some(v) => Image::from_json(v, &loc.key("image"), violations).map(Some),
            None => Some(None),
        };

        Some(Item {
            name: name?,
            description: description?,
            price: price?,
            tax: tax?,
            tags: tags?,
            image: image?,
        })
    }
}

// ===== USER =====

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct User {
    pub username: String,
    pub full_name: Option<String>,
}

impl FromJson for User {
    fn from_json(value: &Value, loc: &Loc, violations: &mut Violations) -> Option<Self> {
        let object = violations.check(loc.clone(), as_object(value))?;

        let username = violations.check(
            loc.key("username"),
            field(object, "username").ok_or(ErrorKind::Missing).and_then(json_string),
        );
        let full_name = violations.check(
            loc.key("full_name"),
            field(object, "full_name").map(json_string).transpose(),
        );

        Some(User {
            username: username?,
            full_name: full_name?,
        })
    }
}

// ===== CREATE ITEM REQUEST =====

/// Body of `POST /items/`: the item, its owner and an optional importance
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CreateItemRequest {
    pub item: Item,
    pub user: User,
    #[schema(exclusive_minimum = 0)]
    pub importance: Option<i64>,
}

impl FromJson for CreateItemRequest {
    fn from_json(value: &Value, loc: &Loc, violations: &mut Violations) -> Option<Self> {
        let object = violations.check(loc.clone(), as_object(value))?;

        let item = match field(object, "item") {
            Some(v) => Item::from_json(v, &loc.key("item"), violations),
            None => violations.check(loc.key("item"), Err(ErrorKind::Missing)),
        };
        let user = match field(object, "user") {
            Some(v) => User::from_json(v, &loc.key("user"), violations),
            None => violations.check(loc.key("user"), Err(ErrorKind::Missing)),
        };
        let importance = violations.check(
            loc.key("importance"),
            field(object, "importance")
                .map(|v| json_int(v).and_then(|n| greater_than(n, 0)))
                .transpose(),
        );

        Some(CreateItemRequest {
            item: item?,
            user: user?,
            importance: importance?,
        })
    }
}

// ===== MODEL NAME =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ModelName {
    Alexnet,
    Resnet,
    Lenet,
}

impl ModelName {
    pub const VALUES: &'static [&'static str] = &["alexnet", "resnet", "lenet"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelName::Alexnet => "alexnet",
            ModelName::Resnet => "resnet",
            ModelName::Lenet => "lenet",
        }
    }
}

impl FromStr for ModelName {
    type Err = ErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alexnet" => Ok(ModelName::Alexnet),
            "resnet" => Ok(ModelName::Resnet),
            "lenet" => Ok(ModelName::Lenet),
            _ => Err(ErrorKind::NotAnEnumMember(Self::VALUES)),
        }
    }
}

// ===== FAKE DATABASE ROW =====

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FakeItem {
    pub item_name: String,
}
