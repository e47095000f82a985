//! HTTP handlers for the user resource.
//!
//! Handlers stay thin: extract the transaction scope and the payload, call
//! the service, let [`super::error::ApiError`] render failures.

use actix_web::{delete, get, patch, post, web};

use crate::domain::{
    CreateUserRequest, CreateUserResponse, DeleteUserResponse, UpdateUserRequest, UserProfile,
    UserService,
};
use crate::middleware::TransactionScope;
use crate::outbound::persistence::DieselUserRepository;

use super::error::ApiResult;

/// The service as wired in production.
pub type Users = UserService<DieselUserRepository>;

#[post("/user")]
pub async fn create_user(
    service: web::Data<Users>,
    mut tx: TransactionScope,
    payload: web::Json<CreateUserRequest>,
) -> ApiResult<web::Json<CreateUserResponse>> {
    let response = service.create_user(&mut tx, &payload).await?;
    Ok(web::Json(response))
}

#[get("/user/{id}")]
pub async fn get_user(
    service: web::Data<Users>,
    mut tx: TransactionScope,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserProfile>> {
    let profile = service.get_user(&mut tx, &path).await?;
    Ok(web::Json(profile))
}

#[get("/user")]
pub async fn get_users(
    service: web::Data<Users>,
    mut tx: TransactionScope,
) -> ApiResult<web::Json<Vec<UserProfile>>> {
    let profiles = service.list_users(&mut tx).await?;
    Ok(web::Json(profiles))
}

#[patch("/user/{id}")]
pub async fn update_user(
    service: web::Data<Users>,
    mut tx: TransactionScope,
    path: web::Path<String>,
    payload: web::Json<UpdateUserRequest>,
) -> ApiResult<web::Json<UserProfile>> {
    let profile = service.update_user(&mut tx, &path, &payload).await?;
    Ok(web::Json(profile))
}

#[delete("/user/{id}")]
pub async fn delete_user(
    service: web::Data<Users>,
    mut tx: TransactionScope,
    path: web::Path<String>,
) -> ApiResult<web::Json<DeleteUserResponse>> {
    let response = service.delete_user(&mut tx, &path).await?;
    Ok(web::Json(response))
}
