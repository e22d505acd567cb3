use actix_web::web;

pub mod property_handler;
pub mod property_handler_dto;

pub fn configure(cfg: &mut web::ServiceConfig) {
    property_handler::configure(cfg);
}
