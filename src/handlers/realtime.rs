use crate::config::SessionConfig;
use crate::middlewares::optional_user;
use crate::models::ChannelAuthForm;
use crate::services::ChannelAuthService;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use uuid::Uuid;

/// Channel subscription auth. Callers without a session get a stable guest
/// id cookie so presence channels can still list them.
#[utoipa::path(
    post,
    path = "/api/pusher/auth",
    tag = "realtime",
    responses(
        (status = 200, description = "Channel signature"),
        (status = 403, description = "Channel not allowed")
    )
)]
pub async fn pusher_auth(
    channel_auth: web::Data<ChannelAuthService>,
    session: web::Data<SessionConfig>,
    req: HttpRequest,
    form: web::Form<ChannelAuthForm>,
) -> Result<HttpResponse> {
    let user = optional_user(&req);
    let (guest_id, issued) = match req.cookie(&session.guest_cookie_name) {
        Some(cookie) if !cookie.value().is_empty() => (cookie.value().to_string(), false),
        _ => (Uuid::new_v4().to_string(), true),
    };

    match channel_auth.authorize(user.as_ref(), &guest_id, &form) {
        Ok(auth) => {
            let mut resp = HttpResponse::Ok();
            if issued {
                resp.cookie(
                    Cookie::build(session.guest_cookie_name.clone(), guest_id)
                        .path("/")
                        .http_only(true)
                        .secure(session.secure_cookies)
                        .same_site(SameSite::Lax)
                        .finish(),
                );
            }
            Ok(resp.json(auth))
        }
        Err(e) => Ok(e.error_response()),
    }
}

pub fn realtime_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/pusher/auth", web::post().to(pusher_auth));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PusherConfig;
    use crate::external::PusherClient;
    use actix_web::{App, test};
    use serde_json::Value;

    #[actix_web::test]
    async fn test_guest_gets_cookie_and_guest_presence_member() {
        let svc = ChannelAuthService::new(Some(PusherClient::new(PusherConfig {
            app_id: "1".into(),
            key: "key".into(),
            secret: "secret".into(),
            cluster: "ap1".into(),
        })));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(svc))
                .app_data(web::Data::new(SessionConfig::default()))
                .service(web::scope("/api").configure(realtime_config)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/pusher/auth")
            .set_form([("socket_id", "1.2"), ("channel_name", "presence-lobby")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let guest = resp
            .response()
            .cookies()
            .find(|c| c.name() == "guest_id")
            .map(|c| c.value().to_string())
            .unwrap();
        let body: Value = test::read_body_json(resp).await;
        let member: Value = serde_json::from_str(body["channel_data"].as_str().unwrap()).unwrap();
        assert_eq!(member["user_id"], guest);
        assert_eq!(member["user_info"]["type"], "guest");
    }
}
