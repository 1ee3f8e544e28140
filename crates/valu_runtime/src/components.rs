//! Page composition: top bar plus the panel for the current destination.

mod console;
mod documentation;
mod storage_panel;
mod top_bar;

use leptos::*;

pub use self::{
    console::{ConsolePanel, SampleApiCalls},
    documentation::DocumentationPanel,
    storage_panel::StoragePanel,
    top_bar::TopBar,
};
pub use crate::runtime_context::{use_valu_runtime, ValuProvider, ValuRuntimeContext};

use crate::model::Destination;

#[component]
/// Full page: identity and tabs on top, the routed destination below.
pub fn ValuShell() -> impl IntoView {
    let runtime = use_valu_runtime();
    let destination = create_memo(move |_| runtime.destination());

    view! {
        <div class="app-shell" data-embedding=runtime.embedding.as_str()>
            <TopBar />
            <main class="app-main">
                {move || match destination.get() {
                    Destination::Console => view! { <ConsolePanel /> }.into_view(),
                    Destination::Storage => view! { <StoragePanel /> }.into_view(),
                    Destination::Documentation => view! { <DocumentationPanel /> }.into_view(),
                }}
            </main>
        </div>
    }
}
