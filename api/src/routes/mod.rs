//! Add top-level routes as submodules here.

use crate::state::RocketState;
use rocket::{routes, Build, Rocket};
use rocket_okapi::{
    openapi_get_routes,
    swagger_ui::{make_swagger_ui, DefaultModelRendering, SwaggerUIConfig},
};

mod moderation;
mod session;
mod transactions;
mod users;

const VERSION: &str = "/v0";

pub fn register(rocket: Rocket<Build>, state: RocketState) -> Rocket<Build> {
    let rocket = rocket.manage(state);
    let rocket = rocket.mount(
        VERSION,
        openapi_get_routes![
            session::probe,
            users::create,
            users::list,
            users::get,
            users::update_status,
            moderation::submit_public,
            moderation::list_pending,
            moderation::approve,
            moderation::deny,
            transactions::log,
            transactions::pay,
            transactions::list_by_user,
        ],
    );
    // Routes whose guards or responders have no OpenAPI impls (cookie jar,
    // bare status codes) are mounted outside the documented set.
    let rocket = rocket.mount(
        VERSION,
        routes![session::login, session::logout, users::delete],
    );
    mount_swagger(rocket)
}

pub fn mount_swagger(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount(
        format!("{}/swagger", VERSION),
        make_swagger_ui(&SwaggerUIConfig {
            url: "../openapi.json".to_owned(),
            default_model_rendering: DefaultModelRendering::Model,
            show_extensions: true,
            ..Default::default()
        }),
    )
}
