use crate::middlewares::current_user;
use crate::models::*;
use crate::services::GroupChatService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/api/group-chats",
    tag = "group-chats",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Visible group chats")
    )
)]
pub async fn list_group_chats(
    group_chat_service: web::Data<GroupChatService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match group_chat_service.list(&user).await {
        Ok(chats) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "groupChats": chats
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/group-chats",
    tag = "group-chats",
    request_body = CreateGroupChatRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Group chat created"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn create_group_chat(
    group_chat_service: web::Data<GroupChatService>,
    req: HttpRequest,
    request: web::Json<CreateGroupChatRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match group_chat_service.create(&user, request.into_inner()).await {
        Ok(chat) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "groupChat": chat
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/api/group-chats/{id}/status",
    tag = "group-chats",
    params(("id" = String, Path, description = "Group chat ID")),
    request_body = UpdateGroupChatStatusRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Status updated"),
        (status = 404, description = "Group chat not found")
    )
)]
pub async fn update_group_chat_status(
    group_chat_service: web::Data<GroupChatService>,
    req: HttpRequest,
    path: web::Path<String>,
    request: web::Json<UpdateGroupChatStatusRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match group_chat_service
        .set_status(&user, &path.into_inner(), request.into_inner())
        .await
    {
        Ok(chat) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "groupChat": chat
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn group_chat_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/group-chats")
            .route("", web::get().to(list_group_chats))
            .route("", web::post().to(create_group_chat))
            .route("/{id}/status", web::patch().to(update_group_chat_status)),
    );
}
