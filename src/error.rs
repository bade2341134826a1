use crate::listing::model::{ItemId, ItemStatus};
use crate::listing::validation::ValidationErrors;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ListingError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    // 존재하지 않거나 볼 수 없는 상품
    #[error("Item {0} not found")]
    NotFound(ItemId),

    #[error("Image {image_id} not found on item {item_id}")]
    ImageNotFound { item_id: ItemId, image_id: i64 },

    #[error("Cannot change status from {from} to {to}")]
    InvalidTransition { from: ItemStatus, to: ItemStatus },

    #[error("Item {0} is not open for purchase requests")]
    NotListed(ItemId),

    #[error("Buyer has not requested to purchase item {0}")]
    NotRequester(ItemId),

    #[error("Sellers cannot request their own item {0}")]
    OwnItem(ItemId),

    #[error("Purchase of item {0} has already been requested")]
    DuplicateRequest(ItemId),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Event publishing failed: {0}")]
    Broker(String),
}

impl From<ValidationErrors> for ListingError {
    fn from(errors: ValidationErrors) -> Self {
        ListingError::Validation(errors)
    }
}

pub type Result<T> = std::result::Result<T, ListingError>;
