use crate::middlewares::current_user;
use crate::models::*;
use crate::services::CasinoGroupService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/api/casino-group",
    tag = "casino-group",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Visible casino groups"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_casino_groups(
    casino_group_service: web::Data<CasinoGroupService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match casino_group_service.list_for(&user).await {
        Ok(groups) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": groups
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// Badge counts for every ticket kind of one casino group. Public.
#[utoipa::path(
    get,
    path = "/api/casino-group/pending-counts",
    tag = "casino-group",
    params(CasinoGroupQuery),
    responses(
        (status = 200, description = "Pending count per ticket kind", body = PendingCounts),
        (status = 404, description = "Casino group not found")
    )
)]
pub async fn pending_counts(
    casino_group_service: web::Data<CasinoGroupService>,
    query: web::Query<CasinoGroupQuery>,
) -> Result<HttpResponse> {
    match casino_group_service.pending_counts(&query).await {
        Ok(counts) => Ok(HttpResponse::Ok().json(counts)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn casino_group_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/casino-group")
            .route("", web::get().to(list_casino_groups))
            .route("/pending-counts", web::get().to(pending_counts)),
    );
}
