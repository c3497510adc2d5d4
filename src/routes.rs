use crate::{
    api::{account, confirm, leave, profile},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let requests_per_min = requests_per_min.max(1);
        let per_ms = (60_000 / requests_per_min as u64).max(1);
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap_or_default();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/profile")
                    // /profile
                    .service(web::resource("").route(web::get().to(profile::get_profile)))
                    // /profile/weekday-hours/{weekday}
                    .service(
                        web::resource("/weekday-hours/{weekday}")
                            .route(web::put().to(profile::set_weekday_hours)),
                    )
                    // /profile/balance
                    .service(
                        web::resource("/balance").route(web::put().to(profile::propose_balance)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave::leave_list))
                            .route(web::post().to(leave::create_leave))
                            .route(web::delete().to(leave::propose_delete_all)),
                    )
                    // /leave/preview
                    .service(web::resource("/preview").route(web::get().to(leave::preview_leave)))
                    // /leave/{leave_id}
                    .service(
                        web::resource("/{leave_id}")
                            .route(web::delete().to(leave::propose_delete_leave)),
                    ),
            )
            .service(
                web::resource("/account").route(web::delete().to(account::propose_delete_account)),
            )
            .service(web::resource("/pending").route(web::get().to(confirm::pending)))
            .service(web::resource("/confirm/{flow}").route(web::post().to(confirm::confirm)))
            .service(web::resource("/cancel/{flow}").route(web::post().to(confirm::cancel))),
    );
}

// LOGIN
//  └─ access_token (jti = session id)

// API REQUEST
//  └─ Authorization: Bearer access_token

// DESTRUCTIVE REQUEST
//  └─ 202 + proposal held in the session
//       └─ POST /confirm/{flow} applies it, POST /cancel/{flow} drops it
