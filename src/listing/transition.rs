use super::model::{Item, ItemStatus};
use serde::Serialize;

/// 한 번의 저장에서 일어난 상태 변경 (이전 값, 새 값)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub from: ItemStatus,
    pub to: ItemStatus,
}

impl StatusChange {
    /// 값이 실제로 바뀐 경우에만 변경으로 본다
    pub fn between(from: ItemStatus, to: ItemStatus) -> Option<Self> {
        (from != to).then_some(Self { from, to })
    }
}

/// 저장 직후의 상품과 마지막 저장에서의 상태 변경
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedItem {
    pub item: Item,
    pub status_change: Option<StatusChange>,
}

impl SavedItem {
    /// 생성 직후: 기록된 변경 없음
    pub fn created(item: Item) -> Self {
        Self {
            item,
            status_change: None,
        }
    }

    pub fn updated(item: Item, previous_status: ItemStatus) -> Self {
        let status_change = StatusChange::between(previous_status, item.status);
        Self {
            item,
            status_change,
        }
    }

    pub fn changed_to_listed_from_unpublished(&self) -> bool {
        self.changed_status(ItemStatus::Unpublished, ItemStatus::Listed)
    }

    pub fn changed_to_unpublished_from_listed(&self) -> bool {
        self.changed_status(ItemStatus::Listed, ItemStatus::Unpublished)
    }

    fn changed_status(&self, from: ItemStatus, to: ItemStatus) -> bool {
        self.status_change == Some(StatusChange { from, to })
    }
}
