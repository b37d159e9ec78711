pub mod deliver_reminder;

use actix_web::web;
use deliver_reminder::deliver_reminder_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/internal/deliver",
        web::post().to(deliver_reminder_controller),
    );
}
