pub mod alerts;
pub mod health;
pub mod settings;
pub mod sweeps;
pub mod visits;

use actix_web::web;

/// Registers every route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::configure)
        .configure(sweeps::configure)
        .configure(visits::configure)
        .configure(alerts::configure)
        .configure(settings::configure);
}
