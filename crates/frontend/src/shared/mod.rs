pub mod api_utils;
pub mod export;
pub mod report_builder;
