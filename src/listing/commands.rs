/// 상품 관련 커맨드 처리
/// 1. 상품 등록 / 수정 / 삭제
/// 2. 공개 / 비공개 전환
/// 3. 구매 신청, 구매자 선택
/// 4. 댓글, 이미지 첨부
// region:    --- Imports
use super::events::ListingEvent;
use super::model::{
    Comment, DestroyedItem, Item, ItemId, ItemImage, ItemStatus, NewImage, PurchaseRequest,
    UserId,
};
use super::transition::SavedItem;
use super::validation::{
    Input, ItemAttributes, ItemChanges, ValidItem, ValidationContext, ValidationErrors, BLANK,
    MUST_EXIST, NOT_INCLUDED,
};
use crate::auth::CurrentUser;
use crate::error::{ListingError, Result};
use crate::message_broker::EventPublisher;
use crate::query::handlers::{get_accessible_item, get_owned_item};
use crate::store::ItemStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Commands
/// 상품 등록 명령
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CreateItemCommand {
    #[serde(flatten)]
    pub attributes: ItemChanges,
    /// 비공개(임시 저장)로 등록할 때만 지정
    pub status: Option<Input<ItemStatus>>,
}

/// 구매자 선택 명령
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct SelectBuyerCommand {
    pub buyer_id: UserId,
}

/// 댓글 작성 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AddCommentCommand {
    pub body: String,
}

/// 1. 상품 등록
pub async fn handle_create_item(
    seller: &CurrentUser,
    cmd: CreateItemCommand,
    store: &impl ItemStore,
    now: DateTime<Utc>,
) -> Result<Item> {
    info!("{:<12} --> 상품 등록 요청 seller: {}", "Command", seller.id);

    let mut errors = ValidationErrors::new();
    if !store.user_exists(seller.id).await? {
        errors.add("user", MUST_EXIST);
    }
    // 등록 시에는 listed / unpublished 만 허용
    let status = match cmd.status {
        None => ItemStatus::default(),
        Some(Input::Valid(status)) if status != ItemStatus::BuyerSelected => status,
        Some(_) => {
            errors.add("status", NOT_INCLUDED);
            ItemStatus::default()
        }
    };

    let attributes = ItemAttributes {
        user_id: Some(seller.id),
        status,
        ..Default::default()
    }
    .apply(cmd.attributes);
    let valid = attributes.validate_with(ValidationContext::Default, now, errors)?;

    let item = store.insert_item(valid, now).await?;
    info!("{:<12} --> 상품 등록 완료 id: {}", "Command", item.id);
    Ok(item)
}

/// 1. 상품 수정
pub async fn handle_update_item(
    seller: &CurrentUser,
    item_id: ItemId,
    changes: ItemChanges,
    store: &impl ItemStore,
    publisher: &impl EventPublisher,
    now: DateTime<Utc>,
) -> Result<SavedItem> {
    info!("{:<12} --> 상품 수정 요청 id: {}", "Command", item_id);
    let item = get_owned_item(store, seller, item_id).await?;
    let valid = ItemAttributes::from(&item)
        .apply(changes)
        .validate(ValidationContext::Default, now)?;
    save_and_notify(store, publisher, item_id, valid, now).await
}

/// 1. 상품 삭제 (구매 신청, 댓글, 이미지 함께 삭제)
pub async fn handle_destroy_item(
    seller: &CurrentUser,
    item_id: ItemId,
    store: &impl ItemStore,
) -> Result<DestroyedItem> {
    info!("{:<12} --> 상품 삭제 요청 id: {}", "Command", item_id);
    get_owned_item(store, seller, item_id).await?;
    let destroyed = store.destroy_item(item_id).await?;
    info!(
        "{:<12} --> 상품 삭제 완료 id: {}, 구매 신청 {}건, 댓글 {}건, 이미지 {}건",
        "Command", item_id, destroyed.purchase_requests, destroyed.comments, destroyed.images
    );
    Ok(destroyed)
}

/// 2. 공개 전환
pub async fn handle_publish_item(
    seller: &CurrentUser,
    item_id: ItemId,
    store: &impl ItemStore,
    publisher: &impl EventPublisher,
    now: DateTime<Utc>,
) -> Result<SavedItem> {
    change_status(seller, item_id, ItemStatus::Listed, store, publisher, now).await
}

/// 2. 비공개 전환
pub async fn handle_unpublish_item(
    seller: &CurrentUser,
    item_id: ItemId,
    store: &impl ItemStore,
    publisher: &impl EventPublisher,
    now: DateTime<Utc>,
) -> Result<SavedItem> {
    change_status(seller, item_id, ItemStatus::Unpublished, store, publisher, now).await
}

async fn change_status(
    seller: &CurrentUser,
    item_id: ItemId,
    status: ItemStatus,
    store: &impl ItemStore,
    publisher: &impl EventPublisher,
    now: DateTime<Utc>,
) -> Result<SavedItem> {
    info!(
        "{:<12} --> 상태 변경 요청 id: {}, status: {}",
        "Command", item_id, status
    );
    let item = get_owned_item(store, seller, item_id).await?;

    // 구매자가 정해진 상품은 되돌릴 수 없음
    if item.status == ItemStatus::BuyerSelected {
        return Err(ListingError::InvalidTransition {
            from: item.status,
            to: status,
        });
    }

    let mut attributes = ItemAttributes::from(&item);
    attributes.status = status;
    let valid = attributes.validate(ValidationContext::Default, now)?;
    save_and_notify(store, publisher, item_id, valid, now).await
}

/// 3. 구매 신청
pub async fn handle_request_purchase(
    requester: &CurrentUser,
    item_id: ItemId,
    store: &impl ItemStore,
    now: DateTime<Utc>,
) -> Result<PurchaseRequest> {
    info!(
        "{:<12} --> 구매 신청 id: {}, user: {}",
        "Command", item_id, requester.id
    );
    let item = get_accessible_item(store, requester, item_id).await?;

    if item.is_owned_by(requester.id) {
        return Err(ListingError::OwnItem(item_id));
    }
    if item.status != ItemStatus::Listed {
        return Err(ListingError::NotListed(item_id));
    }

    store
        .insert_purchase_request(item_id, requester.id, now)
        .await?
        .ok_or(ListingError::DuplicateRequest(item_id))
}

/// 3. 구매 신청 목록 (판매자만)
pub async fn handle_list_purchase_requests(
    seller: &CurrentUser,
    item_id: ItemId,
    store: &impl ItemStore,
) -> Result<Vec<PurchaseRequest>> {
    get_owned_item(store, seller, item_id).await?;
    store.purchase_requests(item_id).await
}

/// 3. 구매자 선택
/// 마감일이 지난 뒤에 선택하는 경우가 일반적이므로 마감일 검사는 건너뛴다.
pub async fn handle_select_buyer(
    seller: &CurrentUser,
    item_id: ItemId,
    cmd: SelectBuyerCommand,
    store: &impl ItemStore,
    publisher: &impl EventPublisher,
    now: DateTime<Utc>,
) -> Result<SavedItem> {
    info!(
        "{:<12} --> 구매자 선택 id: {}, buyer: {}",
        "Command", item_id, cmd.buyer_id
    );
    let item = get_owned_item(store, seller, item_id).await?;

    if item.status != ItemStatus::Listed {
        return Err(ListingError::InvalidTransition {
            from: item.status,
            to: ItemStatus::BuyerSelected,
        });
    }

    let requesting_users = store.requesting_users(item_id).await?;
    if !requesting_users.contains(&cmd.buyer_id) {
        return Err(ListingError::NotRequester(item_id));
    }

    let mut attributes = ItemAttributes::from(&item);
    attributes.buyer_id = Some(cmd.buyer_id);
    attributes.status = ItemStatus::BuyerSelected;
    let valid = attributes.validate(ValidationContext::SelectBuyer, now)?;

    let saved = save_and_notify(store, publisher, item_id, valid, now).await?;
    notify(
        publisher,
        ListingEvent::BuyerSelected {
            item_id,
            seller_id: saved.item.user_id,
            buyer_id: cmd.buyer_id,
            timestamp: now,
        },
    )
    .await;
    Ok(saved)
}

/// 4. 댓글 작성
pub async fn handle_add_comment(
    author: &CurrentUser,
    item_id: ItemId,
    cmd: AddCommentCommand,
    store: &impl ItemStore,
    now: DateTime<Utc>,
) -> Result<Comment> {
    get_accessible_item(store, author, item_id).await?;

    if cmd.body.trim().is_empty() {
        let mut errors = ValidationErrors::new();
        errors.add("body", BLANK);
        return Err(errors.into());
    }

    store.insert_comment(item_id, author.id, cmd.body, now).await
}

/// 4. 댓글 목록
pub async fn handle_list_comments(
    viewer: &CurrentUser,
    item_id: ItemId,
    store: &impl ItemStore,
) -> Result<Vec<Comment>> {
    get_accessible_item(store, viewer, item_id).await?;
    store.comments(item_id).await
}

/// 4. 이미지 첨부 (블롭은 외부 저장소에 이미 올라가 있어야 함)
pub async fn handle_attach_image(
    seller: &CurrentUser,
    item_id: ItemId,
    image: NewImage,
    store: &impl ItemStore,
    now: DateTime<Utc>,
) -> Result<ItemImage> {
    get_owned_item(store, seller, item_id).await?;

    let mut errors = ValidationErrors::new();
    if image.blob_key.trim().is_empty() {
        errors.add("blob_key", BLANK);
    }
    if image.filename.trim().is_empty() {
        errors.add("filename", BLANK);
    }
    if !errors.is_empty() {
        return Err(errors.into());
    }

    store.attach_image(item_id, image, now).await
}

/// 4. 이미지 목록
pub async fn handle_list_images(
    viewer: &CurrentUser,
    item_id: ItemId,
    store: &impl ItemStore,
) -> Result<Vec<ItemImage>> {
    get_accessible_item(store, viewer, item_id).await?;
    store.images(item_id).await
}

/// 4. 이미지 첨부 해제
pub async fn handle_detach_image(
    seller: &CurrentUser,
    item_id: ItemId,
    image_id: i64,
    store: &impl ItemStore,
) -> Result<ItemImage> {
    get_owned_item(store, seller, item_id).await?;
    store
        .detach_image(item_id, image_id)
        .await?
        .ok_or(ListingError::ImageNotFound { item_id, image_id })
}

// endregion: --- Commands

// region:    --- Notifications
/// 저장 후 상태 변경에 따라 이벤트 발행
async fn save_and_notify(
    store: &impl ItemStore,
    publisher: &impl EventPublisher,
    item_id: ItemId,
    valid: ValidItem,
    now: DateTime<Utc>,
) -> Result<SavedItem> {
    let saved = store.save_item(item_id, valid).await?;

    if saved.changed_to_listed_from_unpublished() {
        let requesting_users = store.requesting_users(item_id).await?;
        notify(
            publisher,
            ListingEvent::Relisted {
                item_id,
                requesting_users,
                timestamp: now,
            },
        )
        .await;
    } else if saved.changed_to_unpublished_from_listed() {
        let requesting_users = store.requesting_users(item_id).await?;
        notify(
            publisher,
            ListingEvent::Unpublished {
                item_id,
                requesting_users,
                timestamp: now,
            },
        )
        .await;
    }

    Ok(saved)
}

/// 저장은 이미 끝났으므로 발행 실패는 기록만 한다
async fn notify(publisher: &impl EventPublisher, event: ListingEvent) {
    if let Err(e) = publisher.publish(&event).await {
        error!(
            "{:<12} --> {} 이벤트 발행 실패: {:?}",
            "Command",
            event.event_type(),
            e
        );
    }
}
// endregion: --- Notifications
