use actix_web::{web, HttpResponse};

use crate::routes::auth::UserResponse;
use crate::users::User;

/// GET /users/me
///
/// Requires the `RequireLogin` middleware, which injects the user.
pub async fn get_me(user: web::ReqData<User>) -> HttpResponse {
    HttpResponse::Ok().json(UserResponse {
        status: "success",
        user: user.into_inner(),
    })
}
