pub mod global_context;

use global_context::{AppGlobalContext, AppPage};
use leptos::prelude::*;

/// Application shell: top bar with navigation and the content area.
///
/// ```text
/// +------------------------------------------+
/// |  Reports                    [New report] |
/// +------------------------------------------+
/// |                 Content                  |
/// +------------------------------------------+
/// ```
#[component]
pub fn Shell(children: Children) -> impl IntoView {
    let ctx = use_context::<AppGlobalContext>().expect("AppGlobalContext not found");

    view! {
        <div class="app-layout">
            <header class="app-header">
                <a
                    class="app-header__title"
                    href="#"
                    on:click=move |ev| {
                        ev.prevent_default();
                        ctx.open_reports();
                    }
                >
                    "Report builder"
                </a>
                <span class="app-header__page">{move || ctx.page.get().title()}</span>
                <div class="app-header__actions">
                    <button
                        class="button button--primary"
                        disabled=move || ctx.page.get() == AppPage::Builder(None)
                        on:click=move |_| ctx.open_builder(None)
                    >
                        "New report"
                    </button>
                </div>
            </header>
            <main class="app-content">{children()}</main>
        </div>
    }
}
