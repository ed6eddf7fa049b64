pub mod config;
pub mod data;
pub mod error;
pub mod report_builder;
