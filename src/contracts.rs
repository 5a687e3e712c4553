pub mod options;
pub mod request_context;
