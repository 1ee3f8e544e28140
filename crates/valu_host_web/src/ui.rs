//! Clipboard, alert, and timer adapters for browser contexts.

use valu_host::{HostUiFuture, HostUiService, Sleeper, SleeperFuture};

#[derive(Debug, Clone, Copy, Default)]
/// Browser UI adapter backed by `navigator.clipboard` and `window.alert`.
pub struct WebHostUi;

#[cfg(target_arch = "wasm32")]
fn clipboard_object() -> Option<wasm_bindgen::JsValue> {
    let navigator = web_sys::window()?.navigator();
    let clipboard =
        js_sys::Reflect::get(&navigator, &wasm_bindgen::JsValue::from_str("clipboard")).ok()?;
    if clipboard.is_undefined() || clipboard.is_null() {
        None
    } else {
        Some(clipboard)
    }
}

impl HostUiService for WebHostUi {
    fn clipboard_available(&self) -> bool {
        #[cfg(target_arch = "wasm32")]
        {
            clipboard_object().is_some()
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            false
        }
    }

    fn write_clipboard<'a>(&'a self, text: &'a str) -> HostUiFuture<'a, Result<(), String>> {
        Box::pin(async move {
            #[cfg(target_arch = "wasm32")]
            {
                use wasm_bindgen::{JsCast, JsValue};

                let clipboard =
                    clipboard_object().ok_or_else(|| "clipboard unavailable".to_string())?;
                let write_text = js_sys::Reflect::get(&clipboard, &JsValue::from_str("writeText"))
                    .map_err(crate::bridge::js_error_to_string)?
                    .dyn_into::<js_sys::Function>()
                    .map_err(|_| "clipboard.writeText is not callable".to_string())?;
                let promise = write_text
                    .call1(&clipboard, &JsValue::from_str(text))
                    .map_err(crate::bridge::js_error_to_string)?
                    .dyn_into::<js_sys::Promise>()
                    .map_err(|_| "clipboard.writeText returned a non-promise".to_string())?;
                wasm_bindgen_futures::JsFuture::from(promise)
                    .await
                    .map_err(crate::bridge::js_error_to_string)?;
                Ok(())
            }

            #[cfg(not(target_arch = "wasm32"))]
            {
                let _ = text;
                Err("clipboard unavailable".to_string())
            }
        })
    }

    fn alert(&self, message: &str) {
        #[cfg(target_arch = "wasm32")]
        {
            if let Some(window) = web_sys::window() {
                let _ = window.alert_with_message(message);
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = message;
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Timer adapter backed by `window.setTimeout`. Resolves immediately off-browser.
pub struct WebSleeper;

impl Sleeper for WebSleeper {
    fn sleep<'a>(&'a self, delay_ms: u32) -> SleeperFuture<'a> {
        Box::pin(async move {
            #[cfg(target_arch = "wasm32")]
            {
                let promise = js_sys::Promise::new(&mut |resolve, _reject| {
                    let scheduled = web_sys::window().and_then(|window| {
                        window
                            .set_timeout_with_callback_and_timeout_and_arguments_0(
                                &resolve,
                                delay_ms.min(i32::MAX as u32) as i32,
                            )
                            .ok()
                    });
                    if scheduled.is_none() {
                        let _ = resolve.call0(&wasm_bindgen::JsValue::UNDEFINED);
                    }
                });
                let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
            }

            #[cfg(not(target_arch = "wasm32"))]
            {
                let _ = delay_ms;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn non_wasm_ui_has_no_clipboard() {
        let ui = WebHostUi;
        assert!(!ui.clipboard_available());
        assert!(block_on(ui.write_clipboard("x")).is_err());
        ui.alert("ignored");
        block_on(WebSleeper.sleep(1000));
    }
}
