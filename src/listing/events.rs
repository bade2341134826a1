use super::model::{ItemId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ListingEvent {
    // 비공개 -> 공개 재등록 (구매 신청자에게 알림)
    Relisted {
        item_id: ItemId,
        requesting_users: Vec<UserId>,
        timestamp: DateTime<Utc>,
    },
    // 공개 -> 비공개 전환
    Unpublished {
        item_id: ItemId,
        requesting_users: Vec<UserId>,
        timestamp: DateTime<Utc>,
    },
    // 구매자 선택
    BuyerSelected {
        item_id: ItemId,
        seller_id: UserId,
        buyer_id: UserId,
        timestamp: DateTime<Utc>,
    },
    // 마감일이 지난 공개 상품
    ListingClosed {
        item_id: ItemId,
        seller_id: UserId,
        requesting_users: Vec<UserId>,
        timestamp: DateTime<Utc>,
    },
}

impl ListingEvent {
    pub fn item_id(&self) -> ItemId {
        match self {
            ListingEvent::Relisted { item_id, .. }
            | ListingEvent::Unpublished { item_id, .. }
            | ListingEvent::BuyerSelected { item_id, .. }
            | ListingEvent::ListingClosed { item_id, .. } => *item_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            ListingEvent::Relisted { .. } => "Relisted",
            ListingEvent::Unpublished { .. } => "Unpublished",
            ListingEvent::BuyerSelected { .. } => "BuyerSelected",
            ListingEvent::ListingClosed { .. } => "ListingClosed",
        }
    }
}
