use leptos::*;

use crate::{model::Destination, runtime_context::use_valu_runtime};

#[component]
/// Identity, destination tabs, and the application title.
pub fn TopBar() -> impl IntoView {
    let runtime = use_valu_runtime();
    let user = runtime.user;
    let active = create_memo(move |_| runtime.destination());

    view! {
        <header class="top-bar">
            <div class="top-bar-inner">
                <div class="top-bar-user">
                    <div class="top-bar-avatar">
                        {move || match user.get().icon {
                            Some(icon) => {
                                view! { <img class="top-bar-avatar-image" src=icon alt="User Icon" /> }
                                    .into_view()
                            }
                            None => view! { <span class="spinner" aria-hidden="true"></span> }.into_view(),
                        }}
                    </div>
                    <div class="top-bar-identity">
                        <span class="top-bar-name">{move || user.get().name}</span>
                        <span class="top-bar-role">{move || user.get().role}</span>
                    </div>
                </div>

                <nav class="top-bar-tabs" aria-label="Sections">
                    {Destination::ALL
                        .into_iter()
                        .map(|destination| {
                            view! {
                                <button
                                    type="button"
                                    class="top-bar-tab"
                                    class:active=move || active.get() == destination
                                    aria-current=move || (active.get() == destination).then_some("page")
                                    on:click=move |_| runtime.navigate(destination)
                                >
                                    {destination.label()}
                                </button>
                            }
                        })
                        .collect_view()}
                </nav>

                <h1 class="top-bar-title">"Valu iFrame Sample App"</h1>
            </div>
        </header>
    }
}
