use leptos::logging::log;
use leptos::prelude::*;

/// Page shown in the content area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppPage {
    #[default]
    Reports,
    Viewer(i64),
    /// Builder for a new report (`None`) or for editing an existing one
    Builder(Option<i64>),
}

impl AppPage {
    pub fn title(&self) -> String {
        match self {
            AppPage::Reports => "Reports".to_string(),
            AppPage::Viewer(id) => format!("Report #{}", id),
            AppPage::Builder(None) => "New report".to_string(),
            AppPage::Builder(Some(id)) => format!("Edit report #{}", id),
        }
    }
}

#[derive(Clone, Copy)]
pub struct AppGlobalContext {
    pub page: RwSignal<AppPage>,
}

impl AppGlobalContext {
    pub fn new() -> Self {
        Self {
            page: RwSignal::new(AppPage::default()),
        }
    }

    pub fn navigate(&self, page: AppPage) {
        log!("Navigate: {}", page.title());
        self.page.set(page);
    }

    pub fn open_reports(&self) {
        self.navigate(AppPage::Reports);
    }

    pub fn open_viewer(&self, id: i64) {
        self.navigate(AppPage::Viewer(id));
    }

    pub fn open_builder(&self, id: Option<i64>) {
        self.navigate(AppPage::Builder(id));
    }
}

impl Default for AppGlobalContext {
    fn default() -> Self {
        Self::new()
    }
}
