pub mod connections;
pub mod introspect;
pub mod query_builder;
pub mod repository;
pub mod service;
