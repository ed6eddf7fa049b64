use crate::layout::global_context::{AppGlobalContext, AppPage};
use crate::layout::Shell;
use crate::shared::report_builder::ui::{ReportBuilderPage, ReportViewerPage, ReportsListPage};
use leptos::prelude::*;
use thaw::ConfigProvider;

#[component]
pub fn App() -> impl IntoView {
    // Page navigation for the whole app, provided via context.
    let ctx = AppGlobalContext::new();
    provide_context(ctx);

    view! {
        <ConfigProvider>
            <Shell>
                {move || match ctx.page.get() {
                    AppPage::Reports => view! { <ReportsListPage /> }.into_any(),
                    AppPage::Viewer(id) => view! { <ReportViewerPage report_id=id /> }.into_any(),
                    AppPage::Builder(id) => view! { <ReportBuilderPage report_id=id /> }.into_any(),
                }}
            </Shell>
        </ConfigProvider>
    }
}
