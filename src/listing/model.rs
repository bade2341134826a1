use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub type ItemId = i64;
pub type UserId = i64;

// 상품 상태 (DB에는 SMALLINT 0, 1, 2로 저장)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Listed = 0,
    Unpublished = 1,
    BuyerSelected = 2,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Listed => "listed",
            ItemStatus::Unpublished => "unpublished",
            ItemStatus::BuyerSelected => "buyer_selected",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// 상품 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    pub id: ItemId,
    pub user_id: UserId,
    pub buyer_id: Option<UserId>,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub shipping_cost_covered: bool,
    pub deadline: DateTime<Utc>,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
}

impl Item {
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}

// 구매 신청 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PurchaseRequest {
    pub id: i64,
    pub item_id: ItemId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

// 댓글 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub item_id: ItemId,
    pub user_id: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// 상품 이미지 첨부
///
/// 바이너리는 외부 블롭 저장소에 있고 여기에는 참조 키만 남는다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ItemImage {
    pub id: i64,
    pub item_id: ItemId,
    pub blob_key: String,
    pub filename: String,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}

/// 새로 첨부할 이미지 정보
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewImage {
    pub blob_key: String,
    pub filename: String,
    pub content_type: String,
}

/// 상품 삭제 시 함께 제거된 하위 레코드 수
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DestroyedItem {
    pub item_id: ItemId,
    pub purchase_requests: u64,
    pub comments: u64,
    pub images: u64,
}

/// 해당 시각이 속한 날의 00:00:00 (UTC)
pub fn beginning_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN))
}
