use async_trait::async_trait;
use axum::{
    extract::{FromRequest, FromRequestParts},
    http::request::Parts,
};
use kernel::model::{id::UserId, role::Role, user::Caller};
use shared::error::AppError;

// 認証ゲートウェイが付与するヘッダー
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// 認証済みの利用者。ゲートウェイが検証した識別子と役割をヘッダーから取り出す
pub struct AuthorizedUser {
    caller: Caller,
}

impl AuthorizedUser {
    pub fn id(&self) -> UserId {
        self.caller.user_id
    }

    pub fn caller(&self) -> Caller {
        self.caller
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthorizedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<UserId>().ok())
            .ok_or(AppError::UnauthenticatedError)?;

        // 役割ヘッダーが無ければ一般利用者として扱う。不明な値は認証エラー
        let role = match parts.headers.get(USER_ROLE_HEADER) {
            None => Role::default(),
            Some(v) => v
                .to_str()
                .ok()
                .and_then(|v| v.trim().parse::<Role>().ok())
                .ok_or(AppError::UnauthenticatedError)?,
        };

        Ok(Self {
            caller: Caller::new(user_id, role),
        })
    }
}

// 本文・クエリ・パスの解釈に失敗したときは AppError として 400 を返す
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);
