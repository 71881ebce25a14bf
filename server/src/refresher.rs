use std::{
    sync::{atomic::AtomicBool, Arc},
    time::Duration,
};

use rocket::fairing::AdHoc;

use crate::orchestrator::FanOfMonth;

pub fn stage(sleep_duration: Duration, atomic_bool: Arc<AtomicBool>) -> AdHoc {
    AdHoc::on_liftoff("Refresh fan of the month standings", move |rocket| {
        Box::pin(async move {
            let Some(fan_of_month) = rocket.state::<Arc<FanOfMonth>>().cloned() else {
                tracing::error!("Fan of the month state is not managed, refresher is disabled");
                return;
            };

            rocket::tokio::spawn(async move {
                let mut interval = rocket::tokio::time::interval(sleep_duration);
                while atomic_bool.load(std::sync::atomic::Ordering::Relaxed) {
                    interval.tick().await;
                    let outcome = fan_of_month.refresh().await;
                    tracing::info!("Scheduled fan of the month refresh: {outcome:?}");
                }
            });
        })
    })
}
