// region:    --- Imports
use super::ItemStore;
use crate::database::DatabaseManager;
use crate::error::{ListingError, Result};
use crate::listing::model::{
    Comment, DestroyedItem, Item, ItemId, ItemImage, ItemStatus, NewImage, PurchaseRequest,
    UserId,
};
use crate::listing::transition::SavedItem;
use crate::listing::validation::ValidItem;
use crate::query::queries;
use crate::query::scope::{build_items_query, ItemScope};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
// endregion: --- Imports

/// 저장 쿼리 결과: 새 행 + 저장 직전 상태
#[derive(sqlx::FromRow)]
struct UpdatedItemRow {
    #[sqlx(flatten)]
    item: Item,
    previous_status: ItemStatus,
}

pub struct PostgresItemStore {
    db_manager: Arc<DatabaseManager>,
}

impl PostgresItemStore {
    pub fn new(db_manager: Arc<DatabaseManager>) -> Self {
        Self { db_manager }
    }
}

#[async_trait]
impl ItemStore for PostgresItemStore {
    async fn user_exists(&self, user_id: UserId) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(queries::USER_EXISTS)
            .bind(user_id)
            .fetch_one(self.db_manager.pool())
            .await?;
        Ok(exists)
    }

    async fn insert_item(&self, item: ValidItem, now: DateTime<Utc>) -> Result<Item> {
        info!("{:<12} --> 상품 등록 seller: {}", "Store", item.user_id);
        let item = sqlx::query_as::<_, Item>(queries::INSERT_ITEM)
            .bind(item.user_id)
            .bind(item.buyer_id)
            .bind(item.name)
            .bind(item.description)
            .bind(item.price)
            .bind(item.shipping_cost_covered)
            .bind(item.deadline)
            .bind(item.status)
            .bind(now)
            .fetch_one(self.db_manager.pool())
            .await?;
        Ok(item)
    }

    async fn save_item(&self, id: ItemId, item: ValidItem) -> Result<SavedItem> {
        info!("{:<12} --> 상품 저장 id: {}", "Store", id);
        let row = self
            .db_manager
            .transaction(|tx| {
                Box::pin(async move {
                    sqlx::query_as::<_, UpdatedItemRow>(queries::UPDATE_ITEM)
                        .bind(id)
                        .bind(item.buyer_id)
                        .bind(item.name)
                        .bind(item.description)
                        .bind(item.price)
                        .bind(item.shipping_cost_covered)
                        .bind(item.deadline)
                        .bind(item.status)
                        .fetch_optional(&mut **tx)
                        .await
                })
            })
            .await?
            .ok_or(ListingError::NotFound(id))?;
        Ok(SavedItem::updated(row.item, row.previous_status))
    }

    async fn find_items(&self, scopes: &[ItemScope], now: DateTime<Utc>) -> Result<Vec<Item>> {
        let mut builder = build_items_query(queries::SELECT_ITEMS, scopes, now);
        let items = builder
            .build_query_as::<Item>()
            .fetch_all(self.db_manager.pool())
            .await?;
        Ok(items)
    }

    async fn destroy_item(&self, id: ItemId) -> Result<DestroyedItem> {
        info!("{:<12} --> 상품 삭제 id: {}", "Store", id);
        self.db_manager
            .transaction(|tx| {
                Box::pin(async move {
                    let purchase_requests = sqlx::query(queries::DELETE_ITEM_PURCHASE_REQUESTS)
                        .bind(id)
                        .execute(&mut **tx)
                        .await?
                        .rows_affected();
                    let comments = sqlx::query(queries::DELETE_ITEM_COMMENTS)
                        .bind(id)
                        .execute(&mut **tx)
                        .await?
                        .rows_affected();
                    let images = sqlx::query(queries::DELETE_ITEM_IMAGES)
                        .bind(id)
                        .execute(&mut **tx)
                        .await?
                        .rows_affected();
                    let deleted = sqlx::query(queries::DELETE_ITEM)
                        .bind(id)
                        .execute(&mut **tx)
                        .await?
                        .rows_affected();

                    // 롤백되도록 오류로 반환
                    if deleted == 0 {
                        return Err(ListingError::NotFound(id));
                    }
                    Ok::<_, ListingError>(DestroyedItem {
                        item_id: id,
                        purchase_requests,
                        comments,
                        images,
                    })
                })
            })
            .await
    }

    async fn insert_purchase_request(
        &self,
        item_id: ItemId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<PurchaseRequest>> {
        let request = sqlx::query_as::<_, PurchaseRequest>(queries::INSERT_PURCHASE_REQUEST)
            .bind(item_id)
            .bind(user_id)
            .bind(now)
            .fetch_optional(self.db_manager.pool())
            .await?;
        Ok(request)
    }

    async fn purchase_requests(&self, item_id: ItemId) -> Result<Vec<PurchaseRequest>> {
        let requests = sqlx::query_as::<_, PurchaseRequest>(queries::GET_PURCHASE_REQUESTS)
            .bind(item_id)
            .fetch_all(self.db_manager.pool())
            .await?;
        Ok(requests)
    }

    async fn requesting_users(&self, item_id: ItemId) -> Result<Vec<UserId>> {
        let users = sqlx::query_scalar::<_, UserId>(queries::GET_REQUESTING_USERS)
            .bind(item_id)
            .fetch_all(self.db_manager.pool())
            .await?;
        Ok(users)
    }

    async fn insert_comment(
        &self,
        item_id: ItemId,
        user_id: UserId,
        body: String,
        now: DateTime<Utc>,
    ) -> Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(queries::INSERT_COMMENT)
            .bind(item_id)
            .bind(user_id)
            .bind(body)
            .bind(now)
            .fetch_one(self.db_manager.pool())
            .await?;
        Ok(comment)
    }

    async fn comments(&self, item_id: ItemId) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(queries::GET_COMMENTS)
            .bind(item_id)
            .fetch_all(self.db_manager.pool())
            .await?;
        Ok(comments)
    }

    async fn attach_image(
        &self,
        item_id: ItemId,
        image: NewImage,
        now: DateTime<Utc>,
    ) -> Result<ItemImage> {
        let image = sqlx::query_as::<_, ItemImage>(queries::INSERT_IMAGE)
            .bind(item_id)
            .bind(image.blob_key)
            .bind(image.filename)
            .bind(image.content_type)
            .bind(now)
            .fetch_one(self.db_manager.pool())
            .await?;
        Ok(image)
    }

    async fn images(&self, item_id: ItemId) -> Result<Vec<ItemImage>> {
        let images = sqlx::query_as::<_, ItemImage>(queries::GET_IMAGES)
            .bind(item_id)
            .fetch_all(self.db_manager.pool())
            .await?;
        Ok(images)
    }

    async fn detach_image(&self, item_id: ItemId, image_id: i64) -> Result<Option<ItemImage>> {
        let image = sqlx::query_as::<_, ItemImage>(queries::DELETE_IMAGE)
            .bind(item_id)
            .bind(image_id)
            .fetch_optional(self.db_manager.pool())
            .await?;
        Ok(image)
    }
}
