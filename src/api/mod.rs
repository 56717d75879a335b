pub mod campaign;
pub mod health;
pub mod validation;

use actix_web::web;

/// Register every route of the console
pub fn routes(config: &mut web::ServiceConfig) {
    config
        .configure(health::health_config)
        .configure(campaign::campaign_config);
}
