pub mod registry_settings;
