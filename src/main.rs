use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Result;
use std::sync::Arc;
use std::{env, process};
use tracing::info;
use wastesort::catalog::Catalog;
use wastesort::config::Settings;
use wastesort::server::{self, AppState};
use wastesort::util::init_tracing;

const USAGE: &str = "usage: ./wastesort [config file]";

fn get_args() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    if args.len() > 2 {
        println!("{USAGE}");
        process::exit(1);
    }

    args.get(1).cloned()
}

#[actix_web::main]
async fn main() -> Result<()> {
    init_tracing();

    let config_file = get_args();
    let settings = Settings::load(config_file.as_deref())?;
    info!(?settings, "loaded settings");

    let catalog = Arc::new(Catalog::builtin());
    let state = web::Data::new(AppState::new(&settings, catalog.clone()));
    info!(
        materials = catalog.len(),
        policy = ?state.classifier.policy(),
        "waste catalog ready"
    );

    let addr = settings.bind_addr();
    info!("listening on http://{addr}");

    // Start the HTTP server
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(server::configure)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
