/// 인증된 사용자
/// 인증 자체는 앞단 게이트웨이가 처리하고 X-User-Id 헤더로 사용자 id 를 넘겨준다고 가정
// region:    --- Imports
use crate::listing::model::UserId;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
// endregion: --- Imports

pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<UserId>().ok())
            .map(|id| CurrentUser { id })
            .ok_or((StatusCode::UNAUTHORIZED, "missing or invalid X-User-Id header"))
    }
}
