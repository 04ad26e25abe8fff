pub mod handlers;
pub mod storage;
pub mod store;
pub mod upload;
