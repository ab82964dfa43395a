//! Routes shared by the seven ticket kinds. Each handler is generic over the
//! ticket table and registered once per kind in [`ticket_config`].

use crate::entities::{
    TicketEntity, cashins, cashouts, commissions, concerns, customer_supports, remittances, tasks,
};
use crate::error::{AppError, AppResult};
use crate::middlewares::current_user;
use crate::models::*;
use crate::services::TicketService;
use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use futures_util::StreamExt;
use serde_json::{Value, json};

const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

fn ticket_body<E: TicketEntity>(ticket: Value) -> Value {
    let mut body = json!({ "success": true });
    body[E::KIND.policy().response_key] = ticket;
    body
}

pub async fn list_tickets<E: TicketEntity>(
    ticket_service: web::Data<TicketService>,
    query: web::Query<TicketListQuery>,
) -> Result<HttpResponse> {
    match ticket_service.list::<E>(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub async fn get_ticket<E: TicketEntity>(
    ticket_service: web::Data<TicketService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match ticket_service.get::<E>(&path.into_inner()).await {
        Ok(ticket) => Ok(HttpResponse::Ok().json(ticket_body::<E>(ticket))),
        Err(e) => Ok(e.error_response()),
    }
}

pub async fn create_ticket<E: TicketEntity>(
    ticket_service: web::Data<TicketService>,
    req: HttpRequest,
    request: web::Json<CreateTicketRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match ticket_service.create::<E>(&user, request.into_inner()).await {
        Ok(ticket) => Ok(HttpResponse::Created().json(ticket_body::<E>(ticket))),
        Err(e) => Ok(e.error_response()),
    }
}

pub async fn update_status<E: TicketEntity>(
    ticket_service: web::Data<TicketService>,
    req: HttpRequest,
    path: web::Path<String>,
    request: web::Json<UpdateTicketStatusRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match ticket_service
        .update_status::<E>(&user, &path.into_inner(), request.into_inner())
        .await
    {
        Ok(ticket) => Ok(HttpResponse::Ok().json(ticket_body::<E>(ticket))),
        Err(e) => Ok(e.error_response()),
    }
}

/// `message` text field plus any number of file parts.
async fn read_thread_form(payload: &mut Multipart) -> AppResult<(String, Vec<UploadedFile>)> {
    let mut message = String::new();
    let mut files = Vec::new();

    while let Some(field) = payload.next().await {
        let mut field = field
            .map_err(|e| AppError::ValidationError(format!("Invalid multipart body: {e}")))?;
        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);
        let content_type = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk
                .map_err(|e| AppError::ValidationError(format!("Invalid multipart body: {e}")))?;
            if bytes.len() + chunk.len() > MAX_ATTACHMENT_BYTES {
                return Err(AppError::ValidationError(format!(
                    "Attachment exceeds {} MB",
                    MAX_ATTACHMENT_BYTES / 1024 / 1024
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        match (name.as_str(), filename) {
            ("message", None) => {
                message = String::from_utf8(bytes).map_err(|_| {
                    AppError::ValidationError("message must be UTF-8 text".to_string())
                })?;
            }
            (_, Some(filename)) if !bytes.is_empty() => files.push(UploadedFile {
                filename,
                content_type,
                bytes,
            }),
            _ => {}
        }
    }
    Ok((message, files))
}

pub async fn add_thread<E: TicketEntity>(
    ticket_service: web::Data<TicketService>,
    req: HttpRequest,
    path: web::Path<String>,
    mut payload: Multipart,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    let (message, files) = match read_thread_form(&mut payload).await {
        Ok(form) => form,
        Err(e) => return Ok(e.error_response()),
    };
    match ticket_service
        .add_thread::<E>(&user, &path.into_inner(), message, files)
        .await
    {
        Ok(thread) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "thread": thread
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub async fn count_pending<E: TicketEntity>(
    ticket_service: web::Data<TicketService>,
    query: web::Query<CasinoGroupQuery>,
) -> Result<HttpResponse> {
    match ticket_service.count_pending::<E>(&query).await {
        Ok(count) => Ok(HttpResponse::Ok().json(CountResponse { count })),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/api/cashin/{id}/close-chat",
    tag = "tickets",
    params(("id" = String, Path, description = "Cashin ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Cashin completed and linked requests released"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Cashin not found")
    )
)]
pub async fn close_cashin_chat(
    ticket_service: web::Data<TicketService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match ticket_service
        .close_cashin_chat(&user, &path.into_inner())
        .await
    {
        Ok(ticket) => Ok(HttpResponse::Ok().json(ticket_body::<cashins::Entity>(ticket))),
        Err(e) => Ok(e.error_response()),
    }
}

fn ticket_scope<E: TicketEntity>() -> actix_web::Scope {
    web::scope(&format!("/{}", E::KIND.slug()))
        .route("", web::get().to(list_tickets::<E>))
        .route("", web::post().to(create_ticket::<E>))
        .route("/count-pending", web::get().to(count_pending::<E>))
        .route("/{id}", web::get().to(get_ticket::<E>))
        .route("/{id}/status", web::patch().to(update_status::<E>))
        .route("/{id}/thread", web::post().to(add_thread::<E>))
}

pub fn ticket_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        ticket_scope::<cashins::Entity>()
            .route("/{id}/close-chat", web::patch().to(close_cashin_chat)),
    )
    .service(ticket_scope::<cashouts::Entity>())
    .service(ticket_scope::<commissions::Entity>())
    .service(ticket_scope::<concerns::Entity>())
    .service(ticket_scope::<customer_supports::Entity>())
    .service(ticket_scope::<remittances::Entity>())
    .service(ticket_scope::<tasks::Entity>());
}

/// OpenAPI entries for the generic routes, one module per ticket kind.
macro_rules! ticket_path_docs {
    ($kind:ident, $collection:tt, $item:tt, $count:tt, $status:tt, $thread:tt) => {
        pub mod $kind {
            use crate::models::*;

            #[utoipa::path(
                get,
                path = $collection,
                tag = "tickets",
                operation_id = concat!("list_", stringify!($kind)),
                params(TicketListQuery),
                security(("bearer_auth" = [])),
                responses(
                    (status = 200, description = "Paginated tickets"),
                    (status = 404, description = "Casino group not found")
                )
            )]
            pub fn list() {}

            #[utoipa::path(
                post,
                path = $collection,
                tag = "tickets",
                operation_id = concat!("create_", stringify!($kind)),
                request_body = CreateTicketRequest,
                security(("bearer_auth" = [])),
                responses(
                    (status = 201, description = "Ticket created"),
                    (status = 400, description = "Invalid request"),
                    (status = 404, description = "Casino group not found")
                )
            )]
            pub fn create() {}

            #[utoipa::path(
                get,
                path = $count,
                tag = "tickets",
                operation_id = concat!("count_pending_", stringify!($kind)),
                params(CasinoGroupQuery),
                security(("bearer_auth" = [])),
                responses(
                    (status = 200, description = "Open ticket count", body = CountResponse)
                )
            )]
            pub fn count_pending() {}

            #[utoipa::path(
                get,
                path = $item,
                tag = "tickets",
                operation_id = concat!("get_", stringify!($kind)),
                params(("id" = String, Path, description = "Ticket ID")),
                security(("bearer_auth" = [])),
                responses(
                    (status = 200, description = "Ticket with logs and threads"),
                    (status = 404, description = "Ticket not found")
                )
            )]
            pub fn get() {}

            #[utoipa::path(
                patch,
                path = $status,
                tag = "tickets",
                operation_id = concat!("update_", stringify!($kind), "_status"),
                params(("id" = String, Path, description = "Ticket ID")),
                request_body = UpdateTicketStatusRequest,
                security(("bearer_auth" = [])),
                responses(
                    (status = 200, description = "Status updated"),
                    (status = 400, description = "Unknown status"),
                    (status = 403, description = "Forbidden"),
                    (status = 404, description = "Ticket not found"),
                    (status = 409, description = "Ticket changed concurrently")
                )
            )]
            pub fn update_status() {}

            #[utoipa::path(
                post,
                path = $thread,
                tag = "tickets",
                operation_id = concat!("add_", stringify!($kind), "_thread"),
                params(("id" = String, Path, description = "Ticket ID")),
                security(("bearer_auth" = [])),
                responses(
                    (status = 201, description = "Thread added; multipart `message` plus file parts"),
                    (status = 400, description = "Invalid multipart body"),
                    (status = 404, description = "Ticket not found")
                )
            )]
            pub fn add_thread() {}
        }
    };
}

pub mod docs {
    ticket_path_docs!(
        cashin,
        "/api/cashin",
        "/api/cashin/{id}",
        "/api/cashin/count-pending",
        "/api/cashin/{id}/status",
        "/api/cashin/{id}/thread"
    );
    ticket_path_docs!(
        cashout,
        "/api/cashout",
        "/api/cashout/{id}",
        "/api/cashout/count-pending",
        "/api/cashout/{id}/status",
        "/api/cashout/{id}/thread"
    );
    ticket_path_docs!(
        commission,
        "/api/commission",
        "/api/commission/{id}",
        "/api/commission/count-pending",
        "/api/commission/{id}/status",
        "/api/commission/{id}/thread"
    );
    ticket_path_docs!(
        concern,
        "/api/concern",
        "/api/concern/{id}",
        "/api/concern/count-pending",
        "/api/concern/{id}/status",
        "/api/concern/{id}/thread"
    );
    ticket_path_docs!(
        customer_support,
        "/api/customer-support",
        "/api/customer-support/{id}",
        "/api/customer-support/count-pending",
        "/api/customer-support/{id}/status",
        "/api/customer-support/{id}/thread"
    );
    ticket_path_docs!(
        remittance,
        "/api/remittance",
        "/api/remittance/{id}",
        "/api/remittance/count-pending",
        "/api/remittance/{id}/status",
        "/api/remittance/{id}/thread"
    );
    ticket_path_docs!(
        task,
        "/api/task",
        "/api/task/{id}",
        "/api/task/count-pending",
        "/api/task/{id}/status",
        "/api/task/{id}/thread"
    );
}
