/// 마감 상품 알림 스케줄러
/// 전날 마감됐는데 아직 공개 중인 상품을 찾아 ListingClosed 이벤트를 발행한다.
/// 상품마다 마감 다음 날 한 번만 알린다. 상태 자체는 바꾸지 않는다.
// region:    --- Imports
use crate::error::Result;
use crate::listing::events::ListingEvent;
use crate::message_broker::EventPublisher;
use crate::query;
use crate::store::ItemStore;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info};

// endregion: --- Imports

// region:    --- Closing Scheduler
pub struct ClosingScheduler<S, P> {
    store: Arc<S>,
    publisher: Arc<P>,
    period: Duration,
}

impl<S, P> ClosingScheduler<S, P>
where
    S: ItemStore + 'static,
    P: EventPublisher + 'static,
{
    pub fn new(store: Arc<S>, publisher: Arc<P>, period: Duration) -> Self {
        Self {
            store,
            publisher,
            period,
        }
    }

    /// 스케줄러 시작
    pub fn start(&self) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let publisher = Arc::clone(&self.publisher);
        let period = self.period;
        tokio::spawn(async move {
            let mut interval = interval(period);
            let mut last_swept: Option<NaiveDate> = None;
            loop {
                interval.tick().await;
                let now = Utc::now();
                // 같은 날 두 번 돌면 같은 상품을 다시 알리게 됨
                if last_swept == Some(now.date_naive()) {
                    debug!("{:<12} --> 오늘은 이미 알림 완료", "Scheduler");
                    continue;
                }
                match Self::notify_closed_items(store.as_ref(), publisher.as_ref(), now).await {
                    Ok(_) => last_swept = Some(now.date_naive()),
                    Err(e) => error!(
                        "{:<12} --> 마감 상품 알림 중 오류 발생: {:?}",
                        "Scheduler", e
                    ),
                }
            }
        })
    }

    /// 마감 상품마다 이벤트 발행, 발행한 건수 반환
    pub async fn notify_closed_items(store: &S, publisher: &P, now: DateTime<Utc>) -> Result<usize> {
        let items = query::handlers::closed_during_previous_day(store, now).await?;
        let mut published = 0;

        for item in items {
            let requesting_users = store.requesting_users(item.id).await?;
            let event = ListingEvent::ListingClosed {
                item_id: item.id,
                seller_id: item.user_id,
                requesting_users,
                timestamp: now,
            };
            match publisher.publish(&event).await {
                Ok(()) => published += 1,
                Err(e) => error!(
                    "{:<12} --> 마감 알림 발행 실패 id: {}, {:?}",
                    "Scheduler", item.id, e
                ),
            }
        }

        if published > 0 {
            info!("{:<12} --> 마감 상품 알림 {}건 발행", "Scheduler", published);
        } else {
            debug!("{:<12} --> 마감 상품 없음", "Scheduler");
        }
        Ok(published)
    }
}
// endregion: --- Closing Scheduler

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ListingError;
    use crate::listing::model::{ItemStatus, UserId};
    use crate::listing::validation::ValidItem;
    use crate::store::MemoryItemStore;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingPublisher {
        events: Mutex<Vec<ListingEvent>>,
        fail: bool,
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish(&self, event: &ListingEvent) -> Result<()> {
            if self.fail {
                return Err(ListingError::Broker("broker unavailable".to_string()));
            }
            self.events.lock().await.push(event.clone());
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, 3, 0, 0).unwrap()
    }

    async fn insert(store: &MemoryItemStore, user_id: UserId, status: ItemStatus, day: u32) {
        let item = ValidItem {
            user_id,
            buyer_id: None,
            name: "Sofa".to_string(),
            description: "Three seats".to_string(),
            price: 20000,
            shipping_cost_covered: false,
            deadline: Utc.with_ymd_and_hms(2024, 5, day, 10, 0, 0).unwrap(),
            status,
        };
        store.insert_item(item, now()).await.unwrap();
    }

    #[tokio::test]
    async fn publishes_one_event_per_expired_listing() {
        let store = MemoryItemStore::with_users([1, 2]);
        insert(&store, 1, ItemStatus::Listed, 16).await;
        insert(&store, 2, ItemStatus::Listed, 17).await;
        insert(&store, 2, ItemStatus::BuyerSelected, 16).await;
        store.insert_purchase_request(1, 2, now()).await.unwrap();

        let publisher = RecordingPublisher::default();
        let published = ClosingScheduler::notify_closed_items(&store, &publisher, now())
            .await
            .unwrap();
        assert_eq!(published, 1);

        let events = publisher.events.lock().await;
        assert_eq!(
            *events,
            vec![ListingEvent::ListingClosed {
                item_id: 1,
                seller_id: 1,
                requesting_users: vec![2],
                timestamp: now(),
            }]
        );
    }

    #[tokio::test]
    async fn publish_failures_do_not_abort_the_sweep() {
        let store = MemoryItemStore::with_users([1]);
        insert(&store, 1, ItemStatus::Listed, 16).await;
        insert(&store, 1, ItemStatus::Listed, 16).await;

        let publisher = RecordingPublisher {
            fail: true,
            ..Default::default()
        };
        let published = ClosingScheduler::notify_closed_items(&store, &publisher, now())
            .await
            .unwrap();
        assert_eq!(published, 0);
    }

    #[tokio::test]
    async fn daily_sweeps_notify_each_listing_once() {
        let store = MemoryItemStore::with_users([1, 2]);
        insert(&store, 1, ItemStatus::Listed, 16).await;
        insert(&store, 2, ItemStatus::Listed, 18).await;
        insert(&store, 2, ItemStatus::Listed, 30).await;

        let publisher = RecordingPublisher::default();
        for day in 17..=21 {
            let sweep_at = Utc.with_ymd_and_hms(2024, 5, day, 3, 0, 0).unwrap();
            ClosingScheduler::notify_closed_items(&store, &publisher, sweep_at)
                .await
                .unwrap();
        }

        let events = publisher.events.lock().await;
        let mut notified: Vec<_> = events.iter().map(ListingEvent::item_id).collect();
        notified.sort();
        assert_eq!(notified, vec![1, 2]);
    }
}
