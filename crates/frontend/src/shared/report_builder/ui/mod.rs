pub mod builder_page;
pub mod charts;
pub mod data_source_form;
pub mod drag_layer;
pub mod fields_panel;
pub mod preview_panel;
pub mod reports_list;
pub mod slot_editors;
pub mod slots;
pub mod viewer;

pub use builder_page::ReportBuilderPage;
pub use reports_list::ReportsListPage;
pub use viewer::ReportViewerPage;
