use actix_web::web;

pub mod lookout_handler;
pub mod lookout_handler_dto;

pub fn configure(cfg: &mut web::ServiceConfig) {
    lookout_handler::configure(cfg);
}
