use actix_web::web;

pub mod task_handler;
pub mod task_handler_dto;

pub fn configure(cfg: &mut web::ServiceConfig) {
    task_handler::configure(cfg);
}
