// region:    --- Imports
use super::ItemStore;
use crate::error::{ListingError, Result};
use crate::listing::model::{
    Comment, DestroyedItem, Item, ItemId, ItemImage, NewImage, PurchaseRequest, UserId,
};
use crate::listing::transition::SavedItem;
use crate::listing::validation::ValidItem;
use crate::query::scope::{matches_all, ItemScope};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tokio::sync::RwLock;
use tracing::debug;
// endregion: --- Imports

#[derive(Default)]
struct MemoryState {
    users: BTreeSet<UserId>,
    items: Vec<Item>,
    purchase_requests: Vec<PurchaseRequest>,
    comments: Vec<Comment>,
    images: Vec<ItemImage>,
    last_id: i64,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

/// 메모리 상품 저장소
/// Postgres 구현과 같은 의미를 가지며 등록 순서를 유지한다.
#[derive(Default)]
pub struct MemoryItemStore {
    state: RwLock<MemoryState>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = UserId>) -> Self {
        let state = MemoryState {
            users: users.into_iter().collect(),
            ..Default::default()
        };
        Self {
            state: RwLock::new(state),
        }
    }

    pub async fn add_user(&self, user_id: UserId) {
        self.state.write().await.users.insert(user_id);
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn user_exists(&self, user_id: UserId) -> Result<bool> {
        Ok(self.state.read().await.users.contains(&user_id))
    }

    async fn insert_item(&self, item: ValidItem, now: DateTime<Utc>) -> Result<Item> {
        let mut state = self.state.write().await;
        let item = Item {
            id: state.next_id(),
            user_id: item.user_id,
            buyer_id: item.buyer_id,
            name: item.name,
            description: item.description,
            price: item.price,
            shipping_cost_covered: item.shipping_cost_covered,
            deadline: item.deadline,
            status: item.status,
            created_at: now,
        };
        debug!("{:<12} --> 상품 등록 id: {}", "Store", item.id);
        state.items.push(item.clone());
        Ok(item)
    }

    async fn save_item(&self, id: ItemId, item: ValidItem) -> Result<SavedItem> {
        let mut state = self.state.write().await;
        let stored = state
            .items
            .iter_mut()
            .find(|stored| stored.id == id)
            .ok_or(ListingError::NotFound(id))?;
        let previous_status = stored.status;
        stored.buyer_id = item.buyer_id;
        stored.name = item.name;
        stored.description = item.description;
        stored.price = item.price;
        stored.shipping_cost_covered = item.shipping_cost_covered;
        stored.deadline = item.deadline;
        stored.status = item.status;
        Ok(SavedItem::updated(stored.clone(), previous_status))
    }

    async fn find_items(&self, scopes: &[ItemScope], now: DateTime<Utc>) -> Result<Vec<Item>> {
        let state = self.state.read().await;
        Ok(state
            .items
            .iter()
            .filter(|item| matches_all(scopes, item, now))
            .cloned()
            .collect())
    }

    async fn destroy_item(&self, id: ItemId) -> Result<DestroyedItem> {
        let mut state = self.state.write().await;
        let position = state
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(ListingError::NotFound(id))?;
        state.items.remove(position);

        let purchase_requests = remove_children(&mut state.purchase_requests, |r| r.item_id == id);
        let comments = remove_children(&mut state.comments, |c| c.item_id == id);
        let images = remove_children(&mut state.images, |i| i.item_id == id);
        Ok(DestroyedItem {
            item_id: id,
            purchase_requests,
            comments,
            images,
        })
    }

    async fn insert_purchase_request(
        &self,
        item_id: ItemId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<PurchaseRequest>> {
        let mut state = self.state.write().await;
        let duplicate = state
            .purchase_requests
            .iter()
            .any(|r| r.item_id == item_id && r.user_id == user_id);
        if duplicate {
            return Ok(None);
        }
        let request = PurchaseRequest {
            id: state.next_id(),
            item_id,
            user_id,
            created_at: now,
        };
        state.purchase_requests.push(request.clone());
        Ok(Some(request))
    }

    async fn purchase_requests(&self, item_id: ItemId) -> Result<Vec<PurchaseRequest>> {
        let state = self.state.read().await;
        Ok(state
            .purchase_requests
            .iter()
            .filter(|r| r.item_id == item_id)
            .cloned()
            .collect())
    }

    async fn requesting_users(&self, item_id: ItemId) -> Result<Vec<UserId>> {
        let state = self.state.read().await;
        Ok(state
            .purchase_requests
            .iter()
            .filter(|r| r.item_id == item_id)
            .map(|r| r.user_id)
            .collect())
    }

    async fn insert_comment(
        &self,
        item_id: ItemId,
        user_id: UserId,
        body: String,
        now: DateTime<Utc>,
    ) -> Result<Comment> {
        let mut state = self.state.write().await;
        let comment = Comment {
            id: state.next_id(),
            item_id,
            user_id,
            body,
            created_at: now,
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn comments(&self, item_id: ItemId) -> Result<Vec<Comment>> {
        let state = self.state.read().await;
        Ok(state
            .comments
            .iter()
            .filter(|c| c.item_id == item_id)
            .cloned()
            .collect())
    }

    async fn attach_image(
        &self,
        item_id: ItemId,
        image: NewImage,
        now: DateTime<Utc>,
    ) -> Result<ItemImage> {
        let mut state = self.state.write().await;
        let image = ItemImage {
            id: state.next_id(),
            item_id,
            blob_key: image.blob_key,
            filename: image.filename,
            content_type: image.content_type,
            created_at: now,
        };
        state.images.push(image.clone());
        Ok(image)
    }

    async fn images(&self, item_id: ItemId) -> Result<Vec<ItemImage>> {
        let state = self.state.read().await;
        Ok(state
            .images
            .iter()
            .filter(|i| i.item_id == item_id)
            .cloned()
            .collect())
    }

    async fn detach_image(&self, item_id: ItemId, image_id: i64) -> Result<Option<ItemImage>> {
        let mut state = self.state.write().await;
        let position = state
            .images
            .iter()
            .position(|i| i.item_id == item_id && i.id == image_id);
        Ok(position.map(|position| state.images.remove(position)))
    }
}

fn remove_children<T>(rows: &mut Vec<T>, belongs_to_item: impl Fn(&T) -> bool) -> u64 {
    let before = rows.len();
    rows.retain(|row| !belongs_to_item(row));
    (before - rows.len()) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::model::ItemStatus;
    use chrono::Duration;

    fn valid_item(user_id: UserId, status: ItemStatus) -> ValidItem {
        ValidItem {
            user_id,
            buyer_id: None,
            name: "Camera".to_string(),
            description: "Film camera".to_string(),
            price: 30000,
            shipping_cost_covered: true,
            deadline: Utc::now() + Duration::days(2),
            status,
        }
    }

    #[tokio::test]
    async fn save_reports_previous_status() {
        let store = MemoryItemStore::with_users([1]);
        let item = store
            .insert_item(valid_item(1, ItemStatus::Unpublished), Utc::now())
            .await
            .unwrap();

        let saved = store
            .save_item(item.id, valid_item(1, ItemStatus::Listed))
            .await
            .unwrap();
        assert!(saved.changed_to_listed_from_unpublished());
        assert!(!saved.changed_to_unpublished_from_listed());

        let saved_again = store
            .save_item(item.id, valid_item(1, ItemStatus::Listed))
            .await
            .unwrap();
        assert_eq!(saved_again.status_change, None);
    }

    #[tokio::test]
    async fn destroy_removes_children() {
        let store = MemoryItemStore::with_users([1, 2, 3]);
        let now = Utc::now();
        let item = store
            .insert_item(valid_item(1, ItemStatus::Listed), now)
            .await
            .unwrap();
        let other = store
            .insert_item(valid_item(1, ItemStatus::Listed), now)
            .await
            .unwrap();

        store.insert_purchase_request(item.id, 2, now).await.unwrap();
        store.insert_purchase_request(item.id, 3, now).await.unwrap();
        store.insert_purchase_request(other.id, 2, now).await.unwrap();
        store
            .insert_comment(item.id, 2, "Still available?".to_string(), now)
            .await
            .unwrap();

        let destroyed = store.destroy_item(item.id).await.unwrap();
        assert_eq!(destroyed.purchase_requests, 2);
        assert_eq!(destroyed.comments, 1);
        assert_eq!(destroyed.images, 0);

        assert!(store.purchase_requests(item.id).await.unwrap().is_empty());
        assert!(store.comments(item.id).await.unwrap().is_empty());
        assert_eq!(store.purchase_requests(other.id).await.unwrap().len(), 1);

        assert!(matches!(
            store.destroy_item(item.id).await,
            Err(ListingError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_purchase_request_is_ignored() {
        let store = MemoryItemStore::with_users([1, 2]);
        let now = Utc::now();
        let item = store
            .insert_item(valid_item(1, ItemStatus::Listed), now)
            .await
            .unwrap();
        assert!(store.insert_purchase_request(item.id, 2, now).await.unwrap().is_some());
        assert!(store.insert_purchase_request(item.id, 2, now).await.unwrap().is_none());
        assert_eq!(store.requesting_users(item.id).await.unwrap(), vec![2]);
    }
}
