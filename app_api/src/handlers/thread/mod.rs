use actix_web::web;

pub mod thread_handler;
pub mod thread_handler_dto;

pub fn configure(cfg: &mut web::ServiceConfig) {
    thread_handler::configure(cfg);
}
