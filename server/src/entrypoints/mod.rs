use rocket::fairing::AdHoc;
use tvk_fan_of_month::types::{CountdownResponse, FullPageView, Spotlight, TeaserView, WinnerCard};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod fan_of_month;

#[derive(OpenApi)]
#[openapi(
    info(title = "TVK Members: Fan of the Month"),
    paths(
        fan_of_month::get_teaser,
        fan_of_month::get_full_page,
        fan_of_month::get_hall_of_fame,
        fan_of_month::refresh
    ),
    components(schemas(
        TeaserView,
        FullPageView,
        Spotlight,
        WinnerCard,
        CountdownResponse
    ))
)]
pub struct ApiDoc;

pub fn stage() -> AdHoc {
    AdHoc::on_ignite("Installing entrypoints", |rocket| async {
        let swagger =
            SwaggerUi::new("/swagger-ui/<_..>").url("/api-docs/openapi.json", ApiDoc::openapi());
        rocket.attach(fan_of_month::stage()).mount("/", swagger)
    })
}
