use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Book;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 100, message = "Author must be between 1 and 100 characters"))]
    pub author: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub price: Decimal,
    pub category_id: i32,
    #[validate(length(max = 200))]
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Author must be between 1 and 100 characters"))]
    pub author: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<i32>,
    #[validate(length(max = 200))]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct BookList {
    #[schema(value_type = Vec<Book>)]
    pub items: Vec<Book>,
}
