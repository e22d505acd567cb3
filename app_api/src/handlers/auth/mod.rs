use actix_web::web;

pub mod auth_handler_dto;
pub mod login_handler;
pub mod me_handler;
pub mod register_handler;

pub fn configure(cfg: &mut web::ServiceConfig) {
    register_handler::configure(cfg);
    login_handler::configure(cfg);
    me_handler::configure(cfg);
}
