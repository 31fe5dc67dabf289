pub mod account_service;
pub mod auth_service;
pub mod category_service;
pub mod task_service;

pub use auth_service::CredentialService;
