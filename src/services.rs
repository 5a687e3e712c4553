pub mod backends;
pub mod base;
pub mod registry;
pub mod service_provider;
