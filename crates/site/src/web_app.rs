use leptos::*;
use leptos_meta::*;
use leptos_router::*;
use valu_host::HostServices;
use valu_runtime::{use_valu_runtime, ValuProvider, ValuShell};

#[component]
pub fn SiteApp() -> impl IntoView {
    provide_meta_context();
    let host_services = valu_host_web::build_host_services();
    logging::log!(
        "starting in {} mode with the {} host strategy",
        host_services.embedding.as_str(),
        valu_host_web::host_strategy_name()
    );

    view! {
        <Title text="Valu iFrame Sample App" />
        <Meta
            name="description"
            content="Sample application that talks to the Valu host through the Valu API bridge."
        />

        {if host_services.embedding.is_embedded() {
            view! { <EmbeddedEntry host_services=host_services /> }.into_view()
        } else {
            view! { <StandaloneEntry host_services=host_services /> }.into_view()
        }}
    }
}

#[component]
/// Shell rendered inside a host iframe. The host owns the route, so no router is mounted.
pub fn EmbeddedEntry(host_services: HostServices) -> impl IntoView {
    view! {
        <ValuProvider host_services=host_services>
            <ValuShell />
        </ValuProvider>
    }
}

#[component]
/// Top-level page with address-bar routing.
pub fn StandaloneEntry(host_services: HostServices) -> impl IntoView {
    view! {
        <Router>
            <StandaloneShell host_services=host_services />
        </Router>
    }
}

#[component]
fn StandaloneShell(host_services: HostServices) -> impl IntoView {
    let navigate = use_navigate();
    let navigate = Callback::new(move |path: String| navigate(&path, NavigateOptions::default()));
    let initial_route = use_location().pathname.get_untracked();

    view! {
        <ValuProvider host_services=host_services navigate=navigate initial_route=initial_route>
            <LocationSync />
            <div class="site-root">
                <Routes>
                    <Route path="" view=|| view! { <Redirect path="/console" /> } />
                    <Route path="/*any" view=ValuShell />
                </Routes>
            </div>
        </ValuProvider>
    }
}

#[component]
fn LocationSync() -> impl IntoView {
    let runtime = use_valu_runtime();
    let location = use_location();
    create_effect(move |_| runtime.sync_location(&location.pathname.get()));
}
