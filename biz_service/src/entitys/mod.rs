pub mod client_entity;
pub mod client_role_entity;
pub mod common_entity;
pub mod lookout_entity;
pub mod property_entity;
pub mod referral_entity;
pub mod task_entity;
pub mod thread_entity;
pub mod user_entity;
