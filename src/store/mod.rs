/// 상품 저장소 경계
/// 1. Postgres 구현체
/// 2. 메모리 구현체 (테스트, 로컬 실행용)
// region:    --- Imports
use crate::error::Result;
use crate::listing::model::{
    Comment, DestroyedItem, Item, ItemId, ItemImage, NewImage, PurchaseRequest, UserId,
};
use crate::listing::transition::SavedItem;
use crate::listing::validation::ValidItem;
use crate::query::scope::ItemScope;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
// endregion: --- Imports

pub mod memory;
pub mod postgres;

pub use memory::MemoryItemStore;
pub use postgres::PostgresItemStore;

// region:    --- Item Store Trait
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn user_exists(&self, user_id: UserId) -> Result<bool>;

    async fn insert_item(&self, item: ValidItem, now: DateTime<Utc>) -> Result<Item>;

    /// 저장 후 새 행과 저장 직전 상태를 함께 돌려준다
    async fn save_item(&self, id: ItemId, item: ValidItem) -> Result<SavedItem>;

    /// scope 를 모두 만족하는 상품 (등록 순서)
    async fn find_items(&self, scopes: &[ItemScope], now: DateTime<Utc>) -> Result<Vec<Item>>;

    /// 상품과 하위 레코드(구매 신청, 댓글, 이미지)를 함께 삭제
    async fn destroy_item(&self, id: ItemId) -> Result<DestroyedItem>;

    /// 이미 신청한 경우 None
    async fn insert_purchase_request(
        &self,
        item_id: ItemId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<PurchaseRequest>>;

    async fn purchase_requests(&self, item_id: ItemId) -> Result<Vec<PurchaseRequest>>;

    async fn requesting_users(&self, item_id: ItemId) -> Result<Vec<UserId>>;

    async fn insert_comment(
        &self,
        item_id: ItemId,
        user_id: UserId,
        body: String,
        now: DateTime<Utc>,
    ) -> Result<Comment>;

    async fn comments(&self, item_id: ItemId) -> Result<Vec<Comment>>;

    async fn attach_image(
        &self,
        item_id: ItemId,
        image: NewImage,
        now: DateTime<Utc>,
    ) -> Result<ItemImage>;

    async fn images(&self, item_id: ItemId) -> Result<Vec<ItemImage>>;

    /// 해당 상품에 없는 이미지면 None
    async fn detach_image(&self, item_id: ItemId, image_id: i64) -> Result<Option<ItemImage>>;
}
// endregion: --- Item Store Trait
