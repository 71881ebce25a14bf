#[macro_use]
extern crate rocket;

mod entrypoints;

use std::{
    path::PathBuf,
    sync::{atomic::AtomicBool, Arc},
    time::Duration,
};

use rocket::fairing::AdHoc;
use rocket_prometheus::PrometheusMetrics;
use shared::api::StandingsClient;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use tvk_fan_of_month::{
    archive::WinnerArchive,
    consts::DEFAULT_REFRESH_INTERVAL_IN_MINUTES,
    orchestrator::{FanOfMonth, SystemClock},
    refresher,
    storage::FileStore,
};

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, serde::Deserialize)]
pub struct Env {
    standings_url: String,
    #[serde(default = "default_data_dir")]
    data_dir: PathBuf,
    media_base_url: Option<String>,
    refresh_interval_in_minutes: Option<u32>,
    history_limit: Option<usize>,
    http_timeout_in_seconds: Option<u64>,
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer());
    tracing::subscriber::set_global_default(subscriber)?;

    let env = envy::from_env::<Env>()?;
    let sleep_duration = Duration::from_secs(
        env.refresh_interval_in_minutes
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_IN_MINUTES) as u64
            * 60,
    );

    let store = FileStore::open(&env.data_dir)?;
    let archive = WinnerArchive::new(Arc::new(store)).with_history_limit(env.history_limit);
    let client = StandingsClient::new(
        env.standings_url,
        env.http_timeout_in_seconds.map(Duration::from_secs),
    )?;
    let fan_of_month = Arc::new(FanOfMonth::new(
        archive,
        Arc::new(client),
        Arc::new(SystemClock),
        env.media_base_url,
    ));

    let prometheus = PrometheusMetrics::new();
    let cors = rocket_cors::CorsOptions::default()
        .to_cors()
        .map_err(|e| anyhow::anyhow!("Failed to configure CORS: {e}"))?;
    let atomic_bool = Arc::new(AtomicBool::new(true));
    let atomic_bool_clone = atomic_bool.clone();

    tracing::info!(
        "Serving fan of the month from {} every {} minutes",
        env.data_dir.display(),
        sleep_duration.as_secs() / 60
    );

    rocket::build()
        .manage(fan_of_month)
        .attach(prometheus.clone())
        .attach(cors)
        .attach(refresher::stage(sleep_duration, atomic_bool))
        .attach(AdHoc::on_shutdown("Stop refreshing standings", |_| {
            Box::pin(async move {
                atomic_bool_clone.store(false, std::sync::atomic::Ordering::Relaxed);
            })
        }))
        .attach(entrypoints::stage())
        .mount("/metrics", prometheus)
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Rocket failed: {e}"))?;

    Ok(())
}
