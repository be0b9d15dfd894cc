pub mod offline_store;
pub mod remote_client;
pub mod report_store;
pub mod repositories;
pub mod session;
