use leptos::*;

use crate::{
    runtime_context::use_valu_runtime,
    sample_calls::{open_current_user_chat, open_video_chat},
};

#[component]
/// Connection status and the sample API calls.
pub fn ConsolePanel() -> impl IntoView {
    let runtime = use_valu_runtime();
    let connected = runtime.connected;

    view! {
        <section class="console-panel">
            <h2 class="panel-title">"Console"</h2>
            <dl class="console-status">
                <dt>"Connection"</dt>
                <dd class="console-connection" class:connected=move || connected.get()>
                    {move || {
                        if connected.get() {
                            "Connected to the Valu host"
                        } else {
                            "Waiting for the Valu host (demo mode)"
                        }
                    }}
                </dd>
                <dt>"Hosting"</dt>
                <dd>{runtime.embedding.as_str()}</dd>
                <dt>"Route"</dt>
                <dd>
                    <code>{move || runtime.route.get()}</code>
                </dd>
            </dl>
            <SampleApiCalls />
        </section>
    }
}

#[component]
/// Buttons sending demonstration intents. Disabled until the host connection is ready.
pub fn SampleApiCalls() -> impl IntoView {
    let runtime = use_valu_runtime();
    let disabled = move || !runtime.connected.get();

    let open_chat = move |_| {
        let bridge = runtime.bridge();
        spawn_local(async move {
            if let Err(err) = open_current_user_chat(bridge.as_ref()).await {
                logging::error!("open user chat failed: {err}");
            }
        });
    };
    let open_video = move |_| {
        let bridge = runtime.bridge();
        spawn_local(async move {
            if let Err(err) = open_video_chat(bridge.as_ref()).await {
                logging::error!("open video chat failed: {err}");
            }
        });
    };

    view! {
        <div class="sample-calls">
            <h2 class="panel-title">"Sample API Calls"</h2>
            <div class="sample-calls-grid">
                <button type="button" class="button" disabled=disabled on:click=open_chat>
                    "Open User Chat"
                </button>
                <button type="button" class="button" disabled=disabled on:click=open_video>
                    "Open Video Chat"
                </button>
            </div>
        </div>
    }
}
