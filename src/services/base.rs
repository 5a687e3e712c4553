pub mod export_strategy;
pub mod standard_storage;
pub mod status;
pub mod types;
pub mod updated_object_info;
