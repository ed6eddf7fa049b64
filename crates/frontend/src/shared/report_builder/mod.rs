//! Drag-and-drop report builder
//!
//! - `api` - discovery, preview and persistence clients
//! - `store` - builder session state and operations
//! - `debounce` - cancelable preview scheduling
//! - `dnd` - pointer/keyboard drag state machine
//! - `chart_model` - preview result to chart geometry
//! - `ui` - pages and components

pub mod api;
pub mod chart_model;
pub mod debounce;
pub mod dnd;
pub mod store;
pub mod ui;
