// region:    --- Imports
use super::scope::ItemScope;
use crate::auth::CurrentUser;
use crate::error::{ListingError, Result};
use crate::listing::model::{beginning_of_day, Item, ItemId};
use crate::store::ItemStore;
use chrono::{DateTime, Duration, Utc};
use tracing::info;

// endregion: --- Imports

// region:    --- Query Handlers

/// 내 상품 목록 조회 (상태 무관, 등록 순서)
pub async fn list_my_items(store: &impl ItemStore, current_user: &CurrentUser) -> Result<Vec<Item>> {
    info!("{:<12} --> 내 상품 목록 조회 user: {}", "Query", current_user.id);
    store
        .find_items(&[ItemScope::OwnedBy(current_user.id)], Utc::now())
        .await
}

/// 볼 수 있는 상품 목록 조회
pub async fn accessible_items(
    store: &impl ItemStore,
    current_user: &CurrentUser,
) -> Result<Vec<Item>> {
    info!("{:<12} --> 공개 상품 목록 조회 user: {}", "Query", current_user.id);
    store
        .find_items(&[ItemScope::AccessibleFor(current_user.id)], Utc::now())
        .await
}

/// 마감일이 지난 공개 상품 조회
pub async fn closed_yesterday(store: &impl ItemStore, now: DateTime<Utc>) -> Result<Vec<Item>> {
    info!("{:<12} --> 마감 상품 조회", "Query");
    store.find_items(&[ItemScope::ClosedYesterday], now).await
}

/// 전날 하루 동안 마감된 공개 상품 (하루 한 번 돌리는 마감 알림용)
pub async fn closed_during_previous_day(
    store: &impl ItemStore,
    now: DateTime<Utc>,
) -> Result<Vec<Item>> {
    info!("{:<12} --> 전날 마감 상품 조회", "Query");
    let since = beginning_of_day(now) - Duration::days(1);
    store
        .find_items(
            &[ItemScope::ClosedYesterday, ItemScope::DeadlineOnOrAfter(since)],
            now,
        )
        .await
}

/// 볼 수 있는 상품 하나 조회 (볼 수 없으면 NotFound)
pub async fn get_accessible_item(
    store: &impl ItemStore,
    current_user: &CurrentUser,
    item_id: ItemId,
) -> Result<Item> {
    info!("{:<12} --> 상품 조회 id: {}", "Query", item_id);
    find_one(
        store,
        &[ItemScope::AccessibleFor(current_user.id), ItemScope::Id(item_id)],
        item_id,
    )
    .await
}

/// 판매자 본인의 상품 하나 조회
pub async fn get_owned_item(
    store: &impl ItemStore,
    current_user: &CurrentUser,
    item_id: ItemId,
) -> Result<Item> {
    find_one(
        store,
        &[ItemScope::OwnedBy(current_user.id), ItemScope::Id(item_id)],
        item_id,
    )
    .await
}

async fn find_one(store: &impl ItemStore, scopes: &[ItemScope], item_id: ItemId) -> Result<Item> {
    store
        .find_items(scopes, Utc::now())
        .await?
        .into_iter()
        .next()
        .ok_or(ListingError::NotFound(item_id))
}

// endregion: --- Query Handlers
