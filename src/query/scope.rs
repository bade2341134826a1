/// 상품 조회 범위 (scope)
/// 같은 조건을 메모리 판정과 SQL 조건절 두 가지로 표현한다.
// region:    --- Imports
use crate::listing::model::{beginning_of_day, Item, ItemId, ItemStatus, UserId};
use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
// endregion: --- Imports

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemScope {
    /// 판매자가 user 인 상품
    OwnedBy(UserId),
    /// 본인 상품이거나 비공개가 아닌 상품
    AccessibleFor(UserId),
    /// 마감일이 오늘 이전인데 아직 공개 중인 상품
    ClosedYesterday,
    /// 마감일이 주어진 시각 이후인 상품
    DeadlineOnOrAfter(DateTime<Utc>),
    Id(ItemId),
}

impl ItemScope {
    pub fn matches(&self, item: &Item, now: DateTime<Utc>) -> bool {
        match *self {
            ItemScope::OwnedBy(user_id) => item.user_id == user_id,
            ItemScope::AccessibleFor(user_id) => {
                item.user_id == user_id || item.status != ItemStatus::Unpublished
            }
            ItemScope::ClosedYesterday => {
                item.status == ItemStatus::Listed && item.deadline < beginning_of_day(now)
            }
            ItemScope::DeadlineOnOrAfter(since) => item.deadline >= since,
            ItemScope::Id(id) => item.id == id,
        }
    }

    pub fn push_sql(&self, builder: &mut QueryBuilder<'_, Postgres>, now: DateTime<Utc>) {
        match *self {
            ItemScope::OwnedBy(user_id) => {
                builder.push("user_id = ").push_bind(user_id);
            }
            ItemScope::AccessibleFor(user_id) => {
                builder
                    .push("(user_id = ")
                    .push_bind(user_id)
                    .push(" OR status <> ")
                    .push_bind(ItemStatus::Unpublished)
                    .push(")");
            }
            ItemScope::ClosedYesterday => {
                builder
                    .push("(status = ")
                    .push_bind(ItemStatus::Listed)
                    .push(" AND deadline < ")
                    .push_bind(beginning_of_day(now))
                    .push(")");
            }
            ItemScope::DeadlineOnOrAfter(since) => {
                builder.push("deadline >= ").push_bind(since);
            }
            ItemScope::Id(id) => {
                builder.push("id = ").push_bind(id);
            }
        }
    }
}

/// 모든 scope 를 AND 로 묶어서 만족 여부 판정
pub fn matches_all(scopes: &[ItemScope], item: &Item, now: DateTime<Utc>) -> bool {
    scopes.iter().all(|scope| scope.matches(item, now))
}

/// scope 목록으로 상품 조회 쿼리 생성 (등록 순서 정렬)
pub fn build_items_query<'a>(
    select: &'a str,
    scopes: &[ItemScope],
    now: DateTime<Utc>,
) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::new(select);
    for (index, scope) in scopes.iter().enumerate() {
        builder.push(if index == 0 { " WHERE " } else { " AND " });
        scope.push_sql(&mut builder, now);
    }
    builder.push(" ORDER BY id ASC");
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap()
    }

    fn item(id: ItemId, user_id: UserId, status: ItemStatus, deadline: DateTime<Utc>) -> Item {
        Item {
            id,
            user_id,
            buyer_id: None,
            name: format!("item {}", id),
            description: "test".to_string(),
            price: 100,
            shipping_cost_covered: true,
            deadline,
            status,
            created_at: now(),
        }
    }

    #[test]
    fn unpublished_items_are_only_visible_to_their_seller() {
        let a = item(1, 1, ItemStatus::Unpublished, now());
        let b = item(2, 2, ItemStatus::Listed, now());
        let c = item(3, 2, ItemStatus::BuyerSelected, now());

        let for_seller = ItemScope::AccessibleFor(1);
        assert!(for_seller.matches(&a, now()));
        assert!(for_seller.matches(&b, now()));
        assert!(for_seller.matches(&c, now()));

        let for_other = ItemScope::AccessibleFor(2);
        assert!(!for_other.matches(&a, now()));
        assert!(for_other.matches(&b, now()));
    }

    #[test]
    fn closed_yesterday_selects_listed_items_past_deadline() {
        let yesterday = Utc.with_ymd_and_hms(2024, 5, 16, 10, 0, 0).unwrap();
        let today = Utc.with_ymd_and_hms(2024, 5, 17, 10, 0, 0).unwrap();

        let a = item(1, 1, ItemStatus::Listed, yesterday);
        let b = item(2, 1, ItemStatus::Listed, today);
        let c = item(3, 1, ItemStatus::BuyerSelected, yesterday);
        let d = item(4, 1, ItemStatus::Unpublished, yesterday - Duration::days(3));

        let scope = ItemScope::ClosedYesterday;
        assert!(scope.matches(&a, now()));
        assert!(!scope.matches(&b, now()));
        assert!(!scope.matches(&c, now()));
        assert!(!scope.matches(&d, now()));
    }

    #[test]
    fn scopes_compose_with_and() {
        let mine = item(1, 1, ItemStatus::Listed, now() - Duration::days(1));
        let theirs = item(2, 2, ItemStatus::Listed, now() - Duration::days(1));
        let scopes = [ItemScope::ClosedYesterday, ItemScope::OwnedBy(1)];
        assert!(matches_all(&scopes, &mine, now()));
        assert!(!matches_all(&scopes, &theirs, now()));
        assert!(matches_all(&[], &theirs, now()));
    }

    #[test]
    fn builds_where_clause_in_order() {
        let builder = build_items_query(
            "SELECT * FROM items",
            &[ItemScope::AccessibleFor(3), ItemScope::Id(9)],
            now(),
        );
        assert_eq!(
            builder.sql(),
            "SELECT * FROM items WHERE (user_id = $1 OR status <> $2) AND id = $3 ORDER BY id ASC"
        );

        let builder = build_items_query("SELECT * FROM items", &[ItemScope::ClosedYesterday], now());
        assert_eq!(
            builder.sql(),
            "SELECT * FROM items WHERE (status = $1 AND deadline < $2) ORDER BY id ASC"
        );
    }

    #[test]
    fn deadline_lower_bound_limits_closed_items_to_one_day() {
        let since = beginning_of_day(now()) - Duration::days(1);
        let yesterday = item(1, 1, ItemStatus::Listed, since + Duration::hours(10));
        let two_days_ago = item(2, 1, ItemStatus::Listed, since - Duration::hours(1));
        let scopes = [ItemScope::ClosedYesterday, ItemScope::DeadlineOnOrAfter(since)];

        assert!(matches_all(&scopes, &yesterday, now()));
        assert!(!matches_all(&scopes, &two_days_ago, now()));
        assert!(ItemScope::DeadlineOnOrAfter(since).matches(&item(3, 1, ItemStatus::Listed, since), now()));

        let builder = build_items_query("SELECT * FROM items", &scopes, now());
        assert_eq!(
            builder.sql(),
            "SELECT * FROM items WHERE (status = $1 AND deadline < $2) AND deadline >= $3 ORDER BY id ASC"
        );
    }
}
