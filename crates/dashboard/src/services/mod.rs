pub mod sync_service;
pub mod view_service;
