use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::Context;
use chrono::Local; // timestamp in log lines
use chrono_tz::Tz;
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use asso_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{MailService, PaymentGateway, RevalidationService},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {e}"))?;

    let pool = create_pool(&config.database)
        .await
        .context("Failed to create database connection pool")?;

    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );

    // external services
    let revalidator = RevalidationService::new(config.revalidate.clone());
    let mailer = MailService::new(config.mail.clone());
    if !mailer.is_enabled() {
        log::warn!("MAIL_API_KEY is not set, registration e-mails are disabled");
    }
    let timezone: Tz = config
        .mail
        .timezone
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid timezone {}: {e}", config.mail.timezone))?;
    let gateway = PaymentGateway::from_config(&config);
    log::info!("Payment method: {}", gateway.methode());

    let auth_service = AuthService::new(pool.clone(), jwt_service.clone());
    let event_service = EventService::new(pool.clone(), revalidator.clone());
    let registration_service = RegistrationService::new(
        pool.clone(),
        NotificationService::new(mailer, timezone),
        revalidator.clone(),
    );
    let payment_service = PaymentService::new(
        pool.clone(),
        gateway,
        config.payment.clone(),
        revalidator,
    );
    let calendar_service = CalendarService::new(pool.clone(), config.calendar.clone());

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    let allowed_origin = config.server.allowed_origin.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors(allowed_origin.as_deref()))
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(event_service.clone()))
            .app_data(web::Data::new(registration_service.clone()))
            .app_data(web::Data::new(payment_service.clone()))
            .app_data(web::Data::new(calendar_service.clone()))
            .configure(swagger_config)
            .configure(handlers::webhook_config)
            .configure(handlers::calendar_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::evenements_config)
                    .configure(handlers::inscriptions_config)
                    .configure(handlers::paiements_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    Ok(())
}
