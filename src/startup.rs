use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::{AuthService, CookiePolicy};
use crate::logger::LoggerMiddleware;
use crate::middleware::RequireLogin;
use crate::routes::{get_me, health_check, login, logout, refresh, signup};

pub fn run(
    listener: TcpListener,
    auth: AuthService,
    cookies: CookiePolicy,
) -> Result<Server, std::io::Error> {
    let auth = web::Data::new(auth);
    let cookies = web::Data::new(cookies);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(auth.clone())
            .app_data(cookies.clone())

            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/signup", web::post().to(signup))
            .route("/auth/login", web::post().to(login))
            .route("/auth/refresh", web::post().to(refresh))
            .route("/auth/logout", web::post().to(logout))

            // Protected routes
            .service(
                web::scope("/users")
                    .wrap(RequireLogin)
                    .route("/me", web::get().to(get_me)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
