pub mod auth_service;
pub mod llm_service;
pub mod medicine_service;

pub use llm_service::*;
pub use medicine_service::*;
