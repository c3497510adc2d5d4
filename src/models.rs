use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::UserId;

#[derive(Deserialize, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "ada")]
    pub username: String,
    #[schema(example = "correct horse battery staple")]
    pub password: String,
    #[schema(example = "correct horse battery staple")]
    pub confirm_password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "ada")]
    pub username: String,
    #[schema(example = "correct horse battery staple")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: UserId,
    pub sub: String,
    pub exp: usize,
    /// Session id; confirmation state is keyed by it
    pub jti: String,
}
