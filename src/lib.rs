pub mod cli;
pub mod commit;
pub mod credentials;
pub mod error;
pub mod event;
pub mod hub_provider;
pub mod migrator;
pub mod plan;
pub mod provider;
pub mod publisher;
pub mod repository;
pub mod staging;
