// region:    --- Imports
use axum::extract::DefaultBodyLimit;
use listing_service::config::AppConfig;
use listing_service::database::DatabaseManager;
use listing_service::handlers;
use listing_service::message_broker::{KafkaManager, LISTING_EVENTS_TOPIC};
use listing_service::scheduler::ClosingScheduler;
use listing_service::store::PostgresItemStore;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        error!("{:<12} --> 설정 로드 실패: {}", "Main", e);
        e
    })?;

    // DatabaseManager 생성 및 스키마 초기화
    let db_manager = Arc::new(DatabaseManager::new(&config).await?);
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // Kafka 매니저 생성 및 토픽 생성
    let kafka_manager = KafkaManager::new(&config)?;
    kafka_manager.create_topic(LISTING_EVENTS_TOPIC, 3, 1).await?;
    let producer = kafka_manager.get_producer();

    let store = Arc::new(PostgresItemStore::new(Arc::clone(&db_manager)));

    // 마감 상품 알림 스케줄러
    let scheduler = ClosingScheduler::new(
        Arc::clone(&store),
        Arc::clone(&producer),
        config.closing_sweep_interval,
    );
    let _closing_task = scheduler.start();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = handlers::routes((store, producer))
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024));

    let listener = TcpListener::bind(config.listen_addr.as_str()).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
