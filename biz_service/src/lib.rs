use mongodb::Database;

pub mod biz_service;
pub mod entitys;
pub mod manager;
pub mod util;

pub fn init_service(db: Database) {
    biz_service::init_service(db);
}
