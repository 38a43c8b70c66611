use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::process;

use taskboard::auth::{AuthMiddleware, TokenService};
use taskboard::{db, routes, Config};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    let config = Config::from_env();
    let default_filter = match &config {
        Ok(config) if config.is_development() => "debug",
        _ => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    let pool = match db::connect(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to connect to database: {}", e);
            process::exit(1);
        }
    };
    if let Err(e) = db::migrate(&pool).await {
        log::error!("Failed to run migrations: {}", e);
        process::exit(1);
    }

    let tokens = web::Data::new(TokenService::from_config(&config));
    let pool = web::Data::new(pool);

    log::info!(
        "Starting Taskboard server at {} ({:?})",
        config.server_url(),
        config.environment
    );

    HttpServer::new(move || {
        App::new()
            .app_data(pool.clone())
            .app_data(tokens.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(routes::welcome)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
