use actix_web::web;

pub mod referral_handler;
pub mod referral_handler_dto;

pub fn configure(cfg: &mut web::ServiceConfig) {
    referral_handler::configure(cfg);
}
