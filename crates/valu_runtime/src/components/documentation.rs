use leptos::*;

const INTENTS: [(&str, &str); 7] = [
    ("ApplicationStorage / resource-search", "List stored resources, one page at a time."),
    ("ApplicationStorage / resource-upload", "Upload one or more files in a single request."),
    ("ApplicationStorage / resource-delete", "Delete a resource by id."),
    ("Resources / get-thumbnail-url", "Resolve a preview image for a resource."),
    ("Resources / generate-public-url", "Create a shareable link for a resource."),
    ("users / current, get-icon", "Read the signed-in user and their avatar."),
    ("textchat / open-channel, videochat", "Open chat or video applications in the host."),
];

#[component]
/// Static usage notes.
pub fn DocumentationPanel() -> impl IntoView {
    view! {
        <section class="documentation-panel">
            <h2 class="panel-title">"Documentation"</h2>
            <p>
                "This page talks to the Valu host through the bridging client. When it is opened "
                "inside a Valu iframe the host drives navigation and storage; opened on its own it "
                "runs in demo mode and keeps files in browser localStorage."
            </p>
            <h3>"Intents used by this sample"</h3>
            <table class="documentation-intents">
                <thead>
                    <tr>
                        <th>"Intent"</th>
                        <th>"Purpose"</th>
                    </tr>
                </thead>
                <tbody>
                    {INTENTS
                        .into_iter()
                        .map(|(intent, purpose)| {
                            view! {
                                <tr>
                                    <td>
                                        <code>{intent}</code>
                                    </td>
                                    <td>{purpose}</td>
                                </tr>
                            }
                        })
                        .collect_view()}
                </tbody>
            </table>
            <h3>"Routing"</h3>
            <p>
                "Standalone pages serve /console, /storage and /documentation. Embedded pages "
                "follow the route pushed by the host and report tab changes back to it."
            </p>
        </section>
    }
}
