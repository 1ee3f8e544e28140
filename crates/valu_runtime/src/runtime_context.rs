//! Runtime provider and context wiring for the Valu sample page.
//!
//! This module owns the long-lived orchestration objects (connection, storage, navigation) and
//! mirrors their state into Leptos signals. UI composition stays in [`crate::components`].

use std::rc::Rc;

use leptos::*;
use valu_host::{EmbeddingMode, HostServices, ValuBridge};

use crate::{
    config::AppConfig,
    connection::ConnectionProvider,
    model::{Destination, StorageViewState, UserInfo},
    navigation::NavigationCoordinator,
    storage::StorageManager,
    user_info::UserInfoLoader,
};

#[derive(Clone, Copy)]
/// Leptos context for reading runtime state and triggering storage and navigation workflows.
pub struct ValuRuntimeContext {
    /// Shared bridging-client handle.
    pub connection: StoredValue<ConnectionProvider>,
    /// Storage workflows over the local slot and the host resource service.
    pub storage: StoredValue<StorageManager>,
    /// Route ownership for the current embedding mode.
    pub navigation: StoredValue<NavigationCoordinator>,
    /// Whether the bridging client has completed its handshake.
    pub connected: RwSignal<bool>,
    /// Mirror of the storage view state.
    pub storage_state: RwSignal<StorageViewState>,
    /// Current normalized route.
    pub route: RwSignal<String>,
    /// Identity shown in the top bar.
    pub user: RwSignal<UserInfo>,
    /// How the page is hosted.
    pub embedding: EmbeddingMode,
}

impl ValuRuntimeContext {
    /// Returns the shared bridging client.
    pub fn bridge(&self) -> Rc<dyn ValuBridge> {
        self.connection.with_value(ConnectionProvider::acquire)
    }

    /// Returns the destination rendered for the current route.
    pub fn destination(&self) -> Destination {
        Destination::from_route(&self.route.get())
    }

    /// Navigates to `destination`, spawning the host route push when embedded.
    pub fn navigate(&self, destination: Destination) {
        if let Some(push) = self
            .navigation
            .with_value(|navigation| navigation.navigate(destination.path()))
        {
            spawn_local(push);
        }
    }

    /// Records the standalone router's location.
    pub fn sync_location(&self, path: &str) {
        self.navigation
            .with_value(|navigation| navigation.sync_location(path));
    }

    /// Re-lists files in the mode current at call time.
    pub fn refresh_files(&self) {
        let storage = self.storage.get_value();
        spawn_local(async move {
            storage.list_files().await;
        });
    }
}

fn build_navigation(
    embedding: EmbeddingMode,
    connection: &ConnectionProvider,
    initial_route: &str,
    navigate: Option<Callback<String>>,
) -> NavigationCoordinator {
    match embedding {
        EmbeddingMode::Embedded => NavigationCoordinator::embedded(connection.clone()),
        EmbeddingMode::Standalone => {
            NavigationCoordinator::standalone(initial_route, move |path| match navigate {
                Some(navigate) => navigate.call(path.to_string()),
                None => logging::warn!("no router installed for standalone navigation to {path}"),
            })
        }
    }
}

fn install_runtime_orchestration(runtime: ValuRuntimeContext) {
    let connected = runtime.connected;
    runtime.connection.with_value(|connection| {
        connection.when_ready(move |_| connected.set(true));
    });

    let storage_state = runtime.storage_state;
    runtime
        .storage
        .with_value(|storage| storage.subscribe(move |state| storage_state.set(state.clone())));

    let route = runtime.route;
    runtime.navigation.with_value(|navigation| {
        navigation.subscribe(move |next| route.set(next.to_string()));
        if navigation.install_inbound() {
            logging::log!("listening for host route changes");
        }
    });

    let user = runtime.user;
    let loader = runtime.connection.with_value(|c| UserInfoLoader::new(c.clone()));
    spawn_local(async move {
        loader.load(move |info| user.set(info.clone())).await;
    });
}

#[component]
/// Provides [`ValuRuntimeContext`] to descendant components and starts the connection workflows.
pub fn ValuProvider(
    /// Injected browser host bundle assembled by the entry layer.
    host_services: HostServices,
    /// Runtime configuration.
    #[prop(optional)]
    config: AppConfig,
    /// Router navigation used by standalone pages.
    #[prop(optional)]
    navigate: Option<Callback<String>>,
    /// Location at mount time for standalone pages.
    #[prop(optional, into)]
    initial_route: String,
    children: Children,
) -> impl IntoView {
    let HostServices {
        bridge_factory,
        slots,
        ui,
        sleeper,
        embedding,
    } = host_services;

    let connection = ConnectionProvider::new(bridge_factory);
    let storage = StorageManager::new(connection.clone(), slots, ui, sleeper, config.storage);
    let navigation = build_navigation(embedding, &connection, &initial_route, navigate);

    let runtime = ValuRuntimeContext {
        connected: create_rw_signal(connection.is_ready()),
        storage_state: create_rw_signal(storage.snapshot()),
        route: create_rw_signal(navigation.current_route()),
        user: create_rw_signal(UserInfo::default()),
        connection: store_value(connection),
        storage: store_value(storage),
        navigation: store_value(navigation),
        embedding,
    };

    provide_context(runtime);
    install_runtime_orchestration(runtime);

    children().into_view()
}

/// Returns the current [`ValuRuntimeContext`].
///
/// # Panics
///
/// Panics if called outside [`ValuProvider`].
pub fn use_valu_runtime() -> ValuRuntimeContext {
    use_context::<ValuRuntimeContext>().expect("ValuRuntimeContext not provided")
}
