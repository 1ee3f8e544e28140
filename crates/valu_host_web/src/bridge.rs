//! JS interop for the global Valu bridging client and frame detection.
//!
//! This module contains the WASM/JS glue and a non-WASM fallback shim. Higher-level adapters in
//! [`crate::valu_client`] wrap these functions behind [`valu_host::ValuBridge`].

use serde_json::Value;
use valu_host::RawFile;

#[cfg(target_arch = "wasm32")]
mod imp {
    use super::*;
    use js_sys::{Array, Function, Promise};
    use serde::Serialize;
    use serde_wasm_bindgen::{from_value, Serializer};
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    #[wasm_bindgen(inline_js = r#"
const CLIENT_SLOT = 'valuApi';

function client() {
  let api = globalThis[CLIENT_SLOT];
  if (!api) {
    const Ctor = globalThis.ValuApi;
    if (typeof Ctor !== 'function') {
      throw new Error('ValuApi client is not loaded on this page');
    }
    api = globalThis[CLIENT_SLOT] = new Ctor();
  }
  return api;
}

function eventName(key, fallback) {
  const Ctor = globalThis.ValuApi;
  return (Ctor && Ctor[key]) || fallback;
}

function makeIntent(appId, action, params) {
  const IntentCtor = globalThis.Intent;
  if (typeof IntentCtor === 'function') {
    return new IntentCtor(appId, action ?? undefined, params ?? undefined);
  }
  return { applicationId: appId, action: action ?? undefined, params: params ?? {} };
}

export function jsValuInit() {
  client();
}

export function jsValuConnected() {
  try {
    return !!client().connected;
  } catch (_) {
    return false;
  }
}

export function jsValuOnReady(callback, fallbackName) {
  client().addEventListener(eventName('API_READY', fallbackName), () => callback());
}

export function jsValuOnRoute(callback, fallbackName) {
  client().addEventListener(eventName('ON_ROUTE', fallbackName), (route) => {
    callback(typeof route === 'string' ? route : String(route ?? ''));
  });
}

export async function jsValuCallService(appId, action, params, files) {
  const payload = params ?? {};
  if (files.length > 0) {
    payload.files = files;
  }
  return await client().callService(makeIntent(appId, action, payload));
}

export async function jsValuSendIntent(appId, action, params) {
  await client().sendIntent(makeIntent(appId, action, params));
  return null;
}

export async function jsValuRunApi(apiName, command, args) {
  const api = await client().getApi(apiName);
  if (args === undefined || args === null) {
    return await api.run(command);
  }
  return await api.run(command, args);
}

export async function jsValuPushRoute(path) {
  await client().pushRoute(path);
  return null;
}

export function jsIsEmbedded() {
  try {
    return window.self !== window.top;
  } catch (_) {
    return true;
  }
}
"#)]
    extern "C" {
        #[wasm_bindgen(js_name = jsValuInit, catch)]
        fn js_valu_init() -> Result<(), JsValue>;
        #[wasm_bindgen(js_name = jsValuConnected)]
        fn js_valu_connected() -> bool;
        #[wasm_bindgen(js_name = jsValuOnReady, catch)]
        fn js_valu_on_ready(callback: &Function, fallback_name: &str) -> Result<(), JsValue>;
        #[wasm_bindgen(js_name = jsValuOnRoute, catch)]
        fn js_valu_on_route(callback: &Function, fallback_name: &str) -> Result<(), JsValue>;
        #[wasm_bindgen(js_name = jsValuCallService)]
        fn js_valu_call_service(
            app_id: &str,
            action: Option<String>,
            params: JsValue,
            files: Array,
        ) -> Promise;
        #[wasm_bindgen(js_name = jsValuSendIntent)]
        fn js_valu_send_intent(app_id: &str, action: Option<String>, params: JsValue) -> Promise;
        #[wasm_bindgen(js_name = jsValuRunApi)]
        fn js_valu_run_api(api: &str, command: &str, args: JsValue) -> Promise;
        #[wasm_bindgen(js_name = jsValuPushRoute)]
        fn js_valu_push_route(path: &str) -> Promise;
        #[wasm_bindgen(js_name = jsIsEmbedded)]
        fn js_is_embedded() -> bool;
    }

    pub(crate) fn js_error_to_string(err: JsValue) -> String {
        if let Some(text) = err.as_string() {
            return text;
        }
        if let Ok(message) = js_sys::Reflect::get(&err, &JsValue::from_str("message")) {
            if let Some(text) = message.as_string() {
                return text;
            }
        }
        format!("{err:?}")
    }

    async fn await_promise(promise: Promise) -> Result<JsValue, String> {
        JsFuture::from(promise).await.map_err(js_error_to_string)
    }

    fn to_js(value: &Value) -> Result<JsValue, String> {
        if value.is_null() {
            return Ok(JsValue::UNDEFINED);
        }
        value
            .serialize(&Serializer::json_compatible())
            .map_err(|e| e.to_string())
    }

    fn from_js(value: JsValue) -> Result<Value, String> {
        if value.is_null() || value.is_undefined() {
            return Ok(Value::Null);
        }
        from_value(value).map_err(|e| e.to_string())
    }

    pub fn init_client() -> Result<(), String> {
        js_valu_init().map_err(js_error_to_string)
    }

    pub fn is_connected() -> bool {
        js_valu_connected()
    }

    pub fn on_ready(listener: Box<dyn FnOnce()>, fallback_name: &str) -> Result<(), String> {
        let callback: Function = Closure::once_into_js(move || listener()).unchecked_into();
        js_valu_on_ready(&callback, fallback_name).map_err(js_error_to_string)
    }

    pub fn on_route(listener: Box<dyn Fn(String)>, fallback_name: &str) -> Result<(), String> {
        let closure = Closure::<dyn FnMut(String)>::new(move |route: String| listener(route));
        let result = js_valu_on_route(closure.as_ref().unchecked_ref(), fallback_name)
            .map_err(js_error_to_string);
        // The client exposes no unsubscribe contract; the listener lives for the page.
        closure.forget();
        result
    }

    fn attachments_to_js(attachments: &[RawFile]) -> Result<Array, String> {
        let files = Array::new();
        for attachment in attachments {
            let browser_file = attachment
                .source()
                .as_any()
                .downcast_ref::<crate::files::BrowserFile>()
                .ok_or_else(|| format!("`{}` is not a browser file", attachment.name))?;
            files.push(browser_file.file());
        }
        Ok(files)
    }

    pub async fn call_service(
        app_id: &str,
        action: Option<String>,
        params: &Value,
        attachments: &[RawFile],
    ) -> Result<Value, String> {
        let params = to_js(params)?;
        let files = attachments_to_js(attachments)?;
        from_js(await_promise(js_valu_call_service(app_id, action, params, files)).await?)
    }

    pub async fn send_intent(
        app_id: &str,
        action: Option<String>,
        params: &Value,
    ) -> Result<(), String> {
        let params = to_js(params)?;
        let _ = await_promise(js_valu_send_intent(app_id, action, params)).await?;
        Ok(())
    }

    pub async fn run_api(api: &str, command: &str, args: Option<&Value>) -> Result<Value, String> {
        let args = match args {
            Some(args) => to_js(args)?,
            None => JsValue::UNDEFINED,
        };
        from_js(await_promise(js_valu_run_api(api, command, args)).await?)
    }

    pub async fn push_route(path: &str) -> Result<(), String> {
        let _ = await_promise(js_valu_push_route(path)).await?;
        Ok(())
    }

    pub fn is_embedded() -> bool {
        js_is_embedded()
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    use super::*;

    fn unsupported() -> String {
        "Valu bridging client is only available when compiled for wasm32".to_string()
    }

    pub fn init_client() -> Result<(), String> {
        Err(unsupported())
    }

    pub fn is_connected() -> bool {
        false
    }

    pub fn on_ready(_listener: Box<dyn FnOnce()>, _fallback_name: &str) -> Result<(), String> {
        Err(unsupported())
    }

    pub fn on_route(_listener: Box<dyn Fn(String)>, _fallback_name: &str) -> Result<(), String> {
        Err(unsupported())
    }

    pub async fn call_service(
        _app_id: &str,
        _action: Option<String>,
        _params: &Value,
        _attachments: &[RawFile],
    ) -> Result<Value, String> {
        Err(unsupported())
    }

    pub async fn send_intent(
        _app_id: &str,
        _action: Option<String>,
        _params: &Value,
    ) -> Result<(), String> {
        Err(unsupported())
    }

    pub async fn run_api(
        _api: &str,
        _command: &str,
        _args: Option<&Value>,
    ) -> Result<Value, String> {
        Err(unsupported())
    }

    pub async fn push_route(_path: &str) -> Result<(), String> {
        Err(unsupported())
    }

    pub fn is_embedded() -> bool {
        false
    }
}

pub use imp::*;
