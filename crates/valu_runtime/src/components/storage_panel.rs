use chrono::Local;
use leptos::*;
use valu_host::{FileRecord, RawFile};

use crate::{
    model::{format_file_size, FileKind, StorageMode},
    runtime_context::use_valu_runtime,
    storage::StorageManager,
};

#[cfg(target_arch = "wasm32")]
fn files_from_list(list: Option<web_sys::FileList>) -> Vec<RawFile> {
    list.map(|list| valu_host_web::raw_files_from_list(&list))
        .unwrap_or_default()
}

#[cfg(not(target_arch = "wasm32"))]
fn files_from_list(_list: Option<web_sys::FileList>) -> Vec<RawFile> {
    Vec::new()
}

fn image_preview(file: &FileRecord) -> Option<String> {
    file.has_image_preview()
        .then(|| file.payload.clone())
        .flatten()
}

#[component]
/// File manager over the storage workflows: grid, upload zone, and details of the selection.
pub fn StoragePanel() -> impl IntoView {
    let runtime = use_valu_runtime();
    let state = runtime.storage_state;
    let dragging = create_rw_signal(false);
    let file_input = create_node_ref::<html::Input>();
    let mode = move || StorageMode::from_connected(runtime.connected.get());

    // Loads on mount and again when the connection becomes ready.
    create_effect(move |_| {
        let _ = runtime.connected.get();
        runtime.refresh_files();
    });

    let upload = move |files: Vec<RawFile>| {
        if files.is_empty() {
            return;
        }
        let storage = runtime.storage.get_value();
        spawn_local(async move {
            storage.upload_files(files).await;
        });
    };

    view! {
        <section class="storage-panel">
            <h2 class="panel-title">"Application Storage"</h2>
            <p class="storage-caption">{move || mode().caption()}</p>

            <div class="storage-layout">
                <div class="storage-files">
                    <div class="storage-files-header">
                        <h3>{move || format!("Files ({})", state.get().files.len())}</h3>
                        <Show when=move || state.get().loading>
                            <span class="storage-loading">
                                <span class="spinner" aria-hidden="true"></span>
                                "Loading..."
                            </span>
                        </Show>
                    </div>

                    <Show
                        when=move || !state.get().files.is_empty()
                        fallback=move || view! { <EmptyFiles /> }
                    >
                        <div class="file-grid">
                            <For
                                each=move || state.get().files
                                key=|file| file.id.clone()
                                children=move |file| view! { <FileCard file=file /> }
                            />
                        </div>
                    </Show>
                </div>

                <div class="storage-sidebar">
                    <h3>"Upload Files"</h3>
                    <div
                        class="upload-zone"
                        class:dragging=move || dragging.get()
                        class:busy=move || state.get().uploading
                        on:dragover=move |ev: ev::DragEvent| {
                            ev.prevent_default();
                            dragging.set(true);
                        }
                        on:dragleave=move |_| dragging.set(false)
                        on:drop=move |ev: ev::DragEvent| {
                            ev.prevent_default();
                            dragging.set(false);
                            upload(files_from_list(ev.data_transfer().and_then(|t| t.files())));
                        }
                    >
                        {move || {
                            if state.get().uploading {
                                view! {
                                    <span class="spinner spinner-large" aria-hidden="true"></span>
                                    <p class="upload-zone-title">"Uploading files..."</p>
                                    <p class="upload-zone-hint">"Please wait"</p>
                                }
                                    .into_view()
                            } else {
                                view! {
                                    <p class="upload-zone-title">"Drag and drop files here"</p>
                                    <p class="upload-zone-hint">"or"</p>
                                    <button
                                        type="button"
                                        class="button"
                                        on:click=move |_| {
                                            if let Some(input) = file_input.get() {
                                                input.click();
                                            }
                                        }
                                    >
                                        "Browse Files"
                                    </button>
                                }
                                    .into_view()
                            }
                        }}
                        <input
                            node_ref=file_input
                            type="file"
                            multiple
                            class="hidden"
                            disabled=move || state.get().uploading
                            on:change=move |ev| {
                                let input = event_target::<web_sys::HtmlInputElement>(&ev);
                                upload(files_from_list(input.files()));
                                input.set_value("");
                            }
                        />
                    </div>

                    {move || {
                        state.get().selected_file().cloned().map(|file| view! { <FileDetails file=file /> })
                    }}
                </div>
            </div>
        </section>
    }
}

#[component]
fn EmptyFiles() -> impl IntoView {
    let state = use_valu_runtime().storage_state;
    view! {
        <div class="file-grid-empty">
            {move || {
                if state.get().loading {
                    view! {
                        <span class="spinner spinner-large" aria-hidden="true"></span>
                        <p>"Loading files..."</p>
                    }
                        .into_view()
                } else {
                    view! {
                        <span class="file-icon file-icon-generic" aria-hidden="true"></span>
                        <p>"No files uploaded yet"</p>
                        <p class="file-grid-empty-hint">"Drag and drop files or click the upload area"</p>
                    }
                        .into_view()
                }
            }}
        </div>
    }
}

#[component]
fn FileCard(file: FileRecord) -> impl IntoView {
    let runtime = use_valu_runtime();
    let state = runtime.storage_state;
    let preview = image_preview(&file);
    let kind = FileKind::from_mime(&file.mime_type);

    let selected = {
        let id = file.id.clone();
        move || state.get().is_selected(&id)
    };
    let on_select = {
        let id = file.id.clone();
        move |_| runtime.storage.with_value(|storage| storage.toggle_selection(&id))
    };
    let on_delete = {
        let id = file.id.clone();
        move |ev: ev::MouseEvent| {
            ev.stop_propagation();
            let storage = runtime.storage.get_value();
            let id = id.clone();
            spawn_local(async move {
                storage.delete_file(&id).await;
            });
        }
    };

    view! {
        <div class="file-card" class:selected=selected on:click=on_select>
            <div class="file-card-preview">
                {match preview {
                    Some(src) => {
                        view! { <img class="file-card-image" src=src alt=file.name.clone() /> }
                            .into_view()
                    }
                    None => view! { <span class=kind.icon_class() aria-hidden="true"></span> }.into_view(),
                }}
            </div>
            <p class="file-card-name" title=file.name.clone()>
                {file.name.clone()}
            </p>
            <p class="file-card-size">{format_file_size(file.size_bytes)}</p>
            <Show when=move || !state.get().loading>
                <div class="file-card-actions">
                    <button type="button" class="button button-danger" on:click=on_delete.clone()>
                        "Delete"
                    </button>
                </div>
            </Show>
        </div>
    }
}

#[component]
fn FileDetails(file: FileRecord) -> impl IntoView {
    let runtime = use_valu_runtime();
    let copying = move || runtime.storage_state.get().copying_url;
    let demo_mode = move || !runtime.connected.get();
    let preview = image_preview(&file);
    let mime_type = if file.mime_type.is_empty() {
        "Unknown".to_string()
    } else {
        file.mime_type.clone()
    };
    let uploaded = file
        .uploaded_at
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();

    let copy = move |_| {
        let storage = runtime.storage.get_value();
        spawn_local(async move {
            // Outcomes are alerted by the workflow.
            let _ = storage.copy_public_url().await;
        });
    };

    view! {
        <aside class="file-details">
            <div class="file-details-header">
                <h4>"File Information"</h4>
                <button
                    type="button"
                    class="button button-ghost"
                    aria-label="Close"
                    on:click=move |_| runtime.storage.with_value(StorageManager::clear_selection)
                >
                    "✕"
                </button>
            </div>
            {preview.map(|src| view! { <img class="file-details-preview" src=src alt=file.name.clone() /> })}
            <dl class="file-details-fields">
                <dt>"Name"</dt>
                <dd>{file.name.clone()}</dd>
                <dt>"Size"</dt>
                <dd>{format_file_size(file.size_bytes)}</dd>
                <dt>"Type"</dt>
                <dd>{mime_type}</dd>
                <dt>"Uploaded"</dt>
                <dd>{uploaded}</dd>
            </dl>
            <button type="button" class="button" disabled=copying on:click=copy>
                {move || if copying() { "Copying..." } else { "Copy Public URL" }}
            </button>
            <Show when=demo_mode>
                <p class="file-details-note">
                    "In demo mode this copies the underlying data URL if available."
                </p>
            </Show>
        </aside>
    }
}
