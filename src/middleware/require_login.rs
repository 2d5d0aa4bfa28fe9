/// Login guard middleware
///
/// Resolves the caller from the bearer header or the `access_token` cookie
/// and injects the `User` into request extensions for route handlers.
/// Requests that do not resolve to a logged-in user never reach the handler.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{AuthService, RequestCredentials};
use crate::error::AppError;

/// Guard for routes that require a logged-in user
///
/// Needs `web::Data<AuthService>` registered as app data.
pub struct RequireLogin;

impl<S, B> Transform<S, ServiceRequest> for RequireLogin
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireLoginService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RequireLoginService {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireLoginService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireLoginService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let credentials = RequestCredentials::from_request(req.request());
        let auth = req.app_data::<web::Data<AuthService>>().cloned();
        let service = self.service.clone();

        Box::pin(async move {
            let auth = auth.ok_or_else(|| {
                AppError::Internal("AuthService is not registered as app data".to_string())
            })?;

            let user = auth.resolver().require_logged_in(&credentials).await?;
            tracing::debug!(user_id = %user.id, path = %req.path(), "Request authenticated");

            req.extensions_mut().insert(user);
            service.call(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenKind;
    use crate::test_support::{harness, signed_up_user};
    use crate::users::User;
    use actix_web::http::{header::AUTHORIZATION, StatusCode};
    use actix_web::{test, App, HttpResponse};

    async fn whoami(user: web::ReqData<User>) -> HttpResponse {
        HttpResponse::Ok().body(user.email.clone())
    }

    #[actix_web::test]
    async fn test_anonymous_request_is_rejected() {
        let h = harness();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(h.service))
                .service(web::scope("/private").wrap(RequireLogin).route("", web::get().to(whoami))),
        )
        .await;

        let req = test::TestRequest::get().uri("/private").to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_logged_in_user_reaches_handler() {
        let h = harness();
        signed_up_user(&h, "a@x.com").await;
        let tokens = h.service.login("a@x.com", "password123").await.unwrap();
        assert!(h.codec.verify(&tokens.access_token, TokenKind::Access).is_some());

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(h.service))
                .service(web::scope("/private").wrap(RequireLogin).route("", web::get().to(whoami))),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/private")
            .insert_header((AUTHORIZATION, format!("Bearer {}", tokens.access_token)))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(test::read_body(res).await, "a@x.com");
    }

    #[actix_web::test]
    async fn test_expired_session_is_forbidden() {
        let h = harness();
        let user = signed_up_user(&h, "a@x.com").await;
        let tokens = h.service.login("a@x.com", "password123").await.unwrap();
        h.sessions.expire(&user.id.to_string()).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(h.service))
                .service(web::scope("/private").wrap(RequireLogin).route("", web::get().to(whoami))),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/private")
            .insert_header((AUTHORIZATION, format!("Bearer {}", tokens.access_token)))
            .to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.as_response_error().status_code(), StatusCode::FORBIDDEN);
    }
}
