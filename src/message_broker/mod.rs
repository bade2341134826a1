// region:    --- Imports
use crate::config::AppConfig;
use crate::error::{ListingError, Result};
use crate::listing::events::ListingEvent;
use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

// endregion: --- Imports

pub const LISTING_EVENTS_TOPIC: &str = "listing-events";

// region:    --- Event Publisher Trait
/// 상품 이벤트 발행 트레이트
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &ListingEvent) -> Result<()>;
}
// endregion: --- Event Publisher Trait

// region:    --- Kafka Producer
#[derive(Clone)]
pub struct KafkaProducer {
    producer: Arc<FutureProducer>,
    topic: String,
}

/// KafkaProducer 구현
impl KafkaProducer {
    pub fn new(brokers: &str, topic: &str) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| ListingError::Broker(format!("Producer creation error: {:?}", e)))?;

        Ok(KafkaProducer {
            producer: Arc::new(producer),
            topic: topic.to_string(),
        })
    }
}

#[async_trait]
impl EventPublisher for KafkaProducer {
    async fn publish(&self, event: &ListingEvent) -> Result<()> {
        let key = event.item_id().to_string();
        let payload =
            serde_json::to_string(event).map_err(|e| ListingError::Broker(e.to_string()))?;
        info!(
            "{:<12} --> Kafka 메시지 전송: topic={}, key={}, type={}",
            "Producer",
            self.topic,
            key,
            event.event_type()
        );

        let record = FutureRecord::to(&self.topic)
            .key(key.as_str())
            .payload(payload.as_str());
        self.producer
            .send(record, Duration::from_secs(0))
            .await
            .map_err(|(e, _)| ListingError::Broker(format!("Error sending message: {:?}", e)))?;

        Ok(())
    }
}

// endregion: --- Kafka Producer

// region:    --- Kafka Manager
pub struct KafkaManager {
    producer: Arc<KafkaProducer>,
    brokers: String,
}

/// KafkaManager 구현
impl KafkaManager {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let producer = Arc::new(KafkaProducer::new(
            &config.kafka_brokers,
            LISTING_EVENTS_TOPIC,
        )?);

        Ok(KafkaManager {
            producer,
            brokers: config.kafka_brokers.clone(),
        })
    }

    /// 프로듀서 반환
    pub fn get_producer(&self) -> Arc<KafkaProducer> {
        Arc::clone(&self.producer)
    }

    /// 토픽 생성
    pub async fn create_topic(
        &self,
        topic_name: &str,
        num_partitions: i32,
        replication_factor: i32,
    ) -> Result<()> {
        info!("{:<12} --> Kafka 토픽 생성 시작: {}", "Manager", topic_name);

        let admin_client: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .create()
            .map_err(|e| ListingError::Broker(format!("AdminClient 생성 실패: {:?}", e)))?;

        let new_topic = NewTopic::new(
            topic_name,
            num_partitions,
            TopicReplication::Fixed(replication_factor),
        );

        match admin_client
            .create_topics(&[new_topic], &AdminOptions::new())
            .await
        {
            Ok(_) => {
                info!("{:<12} --> Kafka 토픽 생성 성공: {}", "Manager", topic_name);
                Ok(())
            }
            Err(e) => {
                error!("{:<12} --> Kafka 토픽 생성 실패: {:?}", "Manager", e);
                Err(ListingError::Broker(format!("토픽 생성 실패: {:?}", e)))
            }
        }
    }
}

// endregion: --- Kafka Manager
