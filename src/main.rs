use actix_web::HttpServer;
use actix_web::web::Data;
use dotenvy::dotenv;
use teacher_attendance::{AppState, build_app, config::Config, db::init_db, templates};
use tracing::info;
use tracing_appender::rolling;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(subjects = ?config.subjects, "Server starting...");

    let pool = init_db(&config.database_url).await?;
    let templates = templates::load()?;

    let server_addr = config.server_addr.clone();
    let state = AppState {
        pool,
        config: Data::new(config),
        templates: Data::new(templates),
    };

    HttpServer::new(move || build_app(state.clone()))
        .bind(&server_addr)?
        .run()
        .await?;

    info!("Server stopped");
    Ok(())
}
