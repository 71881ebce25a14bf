use std::sync::Arc;

use rocket::{serde::json::Json, State};
use tvk_fan_of_month::{
    orchestrator::FanOfMonth,
    types::{FullPageView, TeaserView, WinnerCard},
};

#[utoipa::path(context_path = "/fan-of-month", responses(
    (status = 200, description = "Homepage teaser: live leader and countdown, or the revealed winner", body = TeaserView)
))]
#[get("/teaser")]
pub async fn get_teaser(fan_of_month: &State<Arc<FanOfMonth>>) -> Json<TeaserView> {
    Json(fan_of_month.teaser())
}

#[utoipa::path(context_path = "/fan-of-month", responses(
    (status = 200, description = "Full fan of the month page with the Hall of Fame", body = FullPageView)
))]
#[get("/")]
pub async fn get_full_page(fan_of_month: &State<Arc<FanOfMonth>>) -> Json<FullPageView> {
    Json(fan_of_month.full_page())
}

#[utoipa::path(context_path = "/fan-of-month", responses(
    (status = 200, description = "Archived winners, most recent month first", body = Vec<WinnerCard>)
))]
#[get("/hall-of-fame")]
pub async fn get_hall_of_fame(fan_of_month: &State<Arc<FanOfMonth>>) -> Json<Vec<WinnerCard>> {
    Json(fan_of_month.hall_of_fame())
}

#[utoipa::path(context_path = "/fan-of-month", responses(
    (status = 200, description = "Fetch standings now and return the refreshed page", body = FullPageView)
))]
#[post("/refresh")]
pub async fn refresh(fan_of_month: &State<Arc<FanOfMonth>>) -> Json<FullPageView> {
    let outcome = fan_of_month.refresh().await;
    tracing::info!("Manual fan of the month refresh: {outcome:?}");
    Json(fan_of_month.full_page())
}

pub fn stage() -> rocket::fairing::AdHoc {
    rocket::fairing::AdHoc::on_ignite("Installing fan of the month entrypoints", |rocket| async {
        rocket.mount(
            "/fan-of-month",
            rocket::routes![get_teaser, get_full_page, get_hall_of_fame, refresh],
        )
    })
}
