// region:    --- Imports
use crate::auth::CurrentUser;
use crate::error::ListingError;
use crate::listing::commands::{
    self, AddCommentCommand, CreateItemCommand, SelectBuyerCommand,
};
use crate::listing::model::{ItemId, NewImage};
use crate::listing::validation::ItemChanges;
use crate::message_broker::KafkaProducer;
use crate::query;
use crate::store::PostgresItemStore;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

// endregion: --- Imports

pub type AppState = (Arc<PostgresItemStore>, Arc<KafkaProducer>);

// region:    --- Router
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/listed_items", get(handle_list_my_items))
        .route("/items", get(handle_get_items).post(handle_create_item))
        .route(
            "/items/:id",
            get(handle_get_item)
                .patch(handle_update_item)
                .delete(handle_destroy_item),
        )
        .route("/items/:id/publish", post(handle_publish_item))
        .route("/items/:id/unpublish", post(handle_unpublish_item))
        .route("/items/:id/select_buyer", post(handle_select_buyer))
        .route(
            "/items/:id/purchase_requests",
            get(handle_list_purchase_requests).post(handle_request_purchase),
        )
        .route(
            "/items/:id/comments",
            get(handle_list_comments).post(handle_add_comment),
        )
        .route(
            "/items/:id/images",
            get(handle_list_images).post(handle_attach_image),
        )
        .route("/items/:id/images/:image_id", delete(handle_detach_image))
        .with_state(state)
}
// endregion: --- Router

// region:    --- Error Response
impl IntoResponse for ListingError {
    fn into_response(self) -> Response {
        let status = match &self {
            ListingError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ListingError::NotFound(_) | ListingError::ImageNotFound { .. } => StatusCode::NOT_FOUND,
            ListingError::InvalidTransition { .. }
            | ListingError::NotListed(_)
            | ListingError::DuplicateRequest(_) => StatusCode::CONFLICT,
            ListingError::NotRequester(_) | ListingError::OwnItem(_) => StatusCode::BAD_REQUEST,
            ListingError::Database(_) | ListingError::Broker(_) => {
                error!("{:<12} --> 내부 오류: {:?}", "Handler", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = match self {
            ListingError::Validation(errors) => serde_json::json!({ "errors": errors }),
            ListingError::Database(_) | ListingError::Broker(_) => {
                serde_json::json!({ "error": "internal server error" })
            }
            other => serde_json::json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, ListingError>) -> Response {
    match result {
        Ok(value) => (status, Json(value)).into_response(),
        Err(e) => e.into_response(),
    }
}
// endregion: --- Error Response

// region:    --- Query Handlers

/// 내 상품 목록
pub async fn handle_list_my_items(
    State((store, _)): State<AppState>,
    current_user: CurrentUser,
) -> Response {
    info!("{:<12} --> 내 상품 목록 user: {}", "HandlerQuery", current_user.id);
    respond(
        StatusCode::OK,
        query::handlers::list_my_items(store.as_ref(), &current_user).await,
    )
}

/// 볼 수 있는 상품 목록
pub async fn handle_get_items(
    State((store, _)): State<AppState>,
    current_user: CurrentUser,
) -> Response {
    info!("{:<12} --> 상품 목록 user: {}", "HandlerQuery", current_user.id);
    respond(
        StatusCode::OK,
        query::handlers::accessible_items(store.as_ref(), &current_user).await,
    )
}

/// 상품 조회
pub async fn handle_get_item(
    State((store, _)): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<ItemId>,
) -> Response {
    info!("{:<12} --> 상품 조회 id: {}", "HandlerQuery", item_id);
    respond(
        StatusCode::OK,
        query::handlers::get_accessible_item(store.as_ref(), &current_user, item_id).await,
    )
}

/// 구매 신청 목록
pub async fn handle_list_purchase_requests(
    State((store, _)): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<ItemId>,
) -> Response {
    respond(
        StatusCode::OK,
        commands::handle_list_purchase_requests(&current_user, item_id, store.as_ref()).await,
    )
}

/// 댓글 목록
pub async fn handle_list_comments(
    State((store, _)): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<ItemId>,
) -> Response {
    respond(
        StatusCode::OK,
        commands::handle_list_comments(&current_user, item_id, store.as_ref()).await,
    )
}

/// 이미지 목록
pub async fn handle_list_images(
    State((store, _)): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<ItemId>,
) -> Response {
    respond(
        StatusCode::OK,
        commands::handle_list_images(&current_user, item_id, store.as_ref()).await,
    )
}

// endregion: --- Query Handlers

// region:    --- Command Handlers

fn log_command(message: std::fmt::Arguments<'_>) {
    info!("{:<12} --> {}", "HandlerCommand", message);
}

/// 상품 등록
pub async fn handle_create_item(
    State((store, _)): State<AppState>,
    current_user: CurrentUser,
    Json(cmd): Json<CreateItemCommand>,
) -> Response {
    log_command(format_args!("상품 등록 요청: {:?}", cmd));
    respond(
        StatusCode::CREATED,
        commands::handle_create_item(&current_user, cmd, store.as_ref(), Utc::now()).await,
    )
}

/// 상품 수정
pub async fn handle_update_item(
    State((store, producer)): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<ItemId>,
    Json(changes): Json<ItemChanges>,
) -> Response {
    log_command(format_args!("상품 수정 id: {}", item_id));
    respond(
        StatusCode::OK,
        commands::handle_update_item(
            &current_user,
            item_id,
            changes,
            store.as_ref(),
            producer.as_ref(),
            Utc::now(),
        )
        .await,
    )
}

/// 상품 삭제
pub async fn handle_destroy_item(
    State((store, _)): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<ItemId>,
) -> Response {
    log_command(format_args!("상품 삭제 id: {}", item_id));
    respond(
        StatusCode::OK,
        commands::handle_destroy_item(&current_user, item_id, store.as_ref()).await,
    )
}

/// 공개 전환
pub async fn handle_publish_item(
    State((store, producer)): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<ItemId>,
) -> Response {
    log_command(format_args!("공개 전환 id: {}", item_id));
    respond(
        StatusCode::OK,
        commands::handle_publish_item(
            &current_user,
            item_id,
            store.as_ref(),
            producer.as_ref(),
            Utc::now(),
        )
        .await,
    )
}

/// 비공개 전환
pub async fn handle_unpublish_item(
    State((store, producer)): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<ItemId>,
) -> Response {
    log_command(format_args!("비공개 전환 id: {}", item_id));
    respond(
        StatusCode::OK,
        commands::handle_unpublish_item(
            &current_user,
            item_id,
            store.as_ref(),
            producer.as_ref(),
            Utc::now(),
        )
        .await,
    )
}

/// 구매자 선택
pub async fn handle_select_buyer(
    State((store, producer)): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<ItemId>,
    Json(cmd): Json<SelectBuyerCommand>,
) -> Response {
    log_command(format_args!("구매자 선택 id: {}, buyer: {}", item_id, cmd.buyer_id));
    respond(
        StatusCode::OK,
        commands::handle_select_buyer(
            &current_user,
            item_id,
            cmd,
            store.as_ref(),
            producer.as_ref(),
            Utc::now(),
        )
        .await,
    )
}

/// 구매 신청
pub async fn handle_request_purchase(
    State((store, _)): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<ItemId>,
) -> Response {
    log_command(format_args!("구매 신청 id: {}", item_id));
    respond(
        StatusCode::CREATED,
        commands::handle_request_purchase(&current_user, item_id, store.as_ref(), Utc::now())
            .await,
    )
}

/// 댓글 작성
pub async fn handle_add_comment(
    State((store, _)): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<ItemId>,
    Json(cmd): Json<AddCommentCommand>,
) -> Response {
    log_command(format_args!("댓글 작성 id: {}", item_id));
    respond(
        StatusCode::CREATED,
        commands::handle_add_comment(&current_user, item_id, cmd, store.as_ref(), Utc::now())
            .await,
    )
}

/// 이미지 첨부
pub async fn handle_attach_image(
    State((store, _)): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<ItemId>,
    Json(image): Json<NewImage>,
) -> Response {
    log_command(format_args!("이미지 첨부 id: {}", item_id));
    respond(
        StatusCode::CREATED,
        commands::handle_attach_image(&current_user, item_id, image, store.as_ref(), Utc::now())
            .await,
    )
}

/// 이미지 첨부 해제
pub async fn handle_detach_image(
    State((store, _)): State<AppState>,
    current_user: CurrentUser,
    Path((item_id, image_id)): Path<(ItemId, i64)>,
) -> Response {
    log_command(format_args!("이미지 첨부 해제 id: {}, image: {}", item_id, image_id));
    respond(
        StatusCode::OK,
        commands::handle_detach_image(&current_user, item_id, image_id, store.as_ref()).await,
    )
}

// endregion: --- Command Handlers

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::validation::{ValidationErrors, BLANK};

    #[test]
    fn maps_errors_to_status_codes() {
        let mut errors = ValidationErrors::new();
        errors.add("name", BLANK);
        assert_eq!(
            ListingError::Validation(errors).into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ListingError::NotFound(3).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ListingError::DuplicateRequest(3).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ListingError::NotListed(3).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ListingError::Broker("down".to_string()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    /// 로그 출력을 모으는 writer
    #[derive(Clone, Default)]
    struct CapturedLog(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn command_handlers_log_with_their_own_tag() {
        let captured = CapturedLog::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            log_command(format_args!("상품 등록 요청: {:?}", CreateItemCommand::default()));
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("HandlerCommand --> 상품 등록 요청"));
    }
}
