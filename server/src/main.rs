use std::sync::Arc;

use dashmap::DashMap;
use minesweeper_server::{
    cleanup::start_cleanup_task,
    config::ServerConfig,
    host::Tables,
    routes::{create_game, websocket_handler},
};
use rocket::{
    Build, Rocket,
    fairing::{Fairing, Info, Kind},
    routes,
};
use tracing::{info, warn};

struct CleanupFairing;

#[rocket::async_trait]
impl Fairing for CleanupFairing {
    fn info(&self) -> Info {
        Info {
            name: "Cleanup Task",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        match (rocket.state::<Tables>(), rocket.state::<ServerConfig>()) {
            (Some(tables), Some(config)) => {
                info!("Starting cleanup task for table management");
                let tables = tables.clone();
                let (every, timeout) = (config.cleanup_interval, config.inactive_timeout);
                tokio::spawn(async move {
                    start_cleanup_task(tables, every, timeout).await;
                });
            }
            _ => warn!("Failed to get table state for cleanup task"),
        }
        Ok(rocket)
    }
}

#[rocket::launch]
fn rocket() -> Rocket<Build> {
    tracing_subscriber::fmt::init();
    info!("Starting minesweeper table server");

    let tables: Tables = Arc::new(DashMap::new());
    let config = ServerConfig::from_env();

    info!(
        "Saves go to {}, sessions use {} workers",
        config.save_dir.display(),
        config.session.workers
    );

    let rocket = rocket::build()
        .attach(CleanupFairing)
        .manage(tables)
        .manage(config)
        .mount("/", routes![create_game, websocket_handler]);

    info!("Endpoints: POST /create, GET /ws");

    rocket
}
