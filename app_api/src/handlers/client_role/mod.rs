use actix_web::web;

pub mod client_role_handler;
pub mod client_role_handler_dto;

pub fn configure(cfg: &mut web::ServiceConfig) {
    client_role_handler::configure(cfg);
}
