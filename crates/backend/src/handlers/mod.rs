pub mod report_builder;
pub mod reports;
