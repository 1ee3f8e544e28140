//! Picked or dropped browser files exposed as [`valu_host::RawFile`] values.

#[cfg(target_arch = "wasm32")]
mod imp {
    use std::{any::Any, cell::RefCell, rc::Rc};

    use futures::channel::oneshot;
    use valu_host::{FileReadFuture, FileSource, RawFile};
    use wasm_bindgen::{closure::Closure, JsCast};

    #[derive(Debug, Clone)]
    /// File source wrapping a `web_sys::File` handle.
    pub struct BrowserFile {
        file: web_sys::File,
    }

    impl BrowserFile {
        /// Wraps a browser file handle.
        pub fn new(file: web_sys::File) -> Self {
            Self { file }
        }

        /// Returns the wrapped handle, for forwarding to host upload intents.
        pub fn file(&self) -> web_sys::File {
            self.file.clone()
        }

        /// Converts the handle into a [`RawFile`] carrying its reported metadata.
        pub fn into_raw_file(self) -> RawFile {
            let name = self.file.name();
            let size = self.file.size().max(0.0) as u64;
            let mime_type = self.file.type_();
            RawFile::new(name, size, mime_type, Rc::new(self))
        }
    }

    impl FileSource for BrowserFile {
        fn read_data_url<'a>(
            &'a self,
            _mime_type: &'a str,
        ) -> FileReadFuture<'a, Result<String, String>> {
            Box::pin(read_file_as_data_url(&self.file))
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// Converts every entry of a `FileList` (input change or drop event) into a [`RawFile`].
    pub fn raw_files_from_list(list: &web_sys::FileList) -> Vec<RawFile> {
        (0..list.length())
            .filter_map(|idx| list.get(idx))
            .map(|file| BrowserFile::new(file).into_raw_file())
            .collect()
    }

    async fn read_file_as_data_url(file: &web_sys::File) -> Result<String, String> {
        let reader = web_sys::FileReader::new().map_err(|err| format!("{err:?}"))?;
        let (tx, rx) = oneshot::channel::<Result<String, String>>();
        let sender = Rc::new(RefCell::new(Some(tx)));

        let reader_for_load = reader.clone();
        let load_sender = sender.clone();
        let on_load = Closure::<dyn FnMut(web_sys::ProgressEvent)>::wrap(Box::new(move |_| {
            let result = reader_for_load
                .result()
                .map_err(|err| format!("failed to read file: {err:?}"))
                .and_then(|value| {
                    value
                        .as_string()
                        .ok_or_else(|| "file reader returned non-string result".to_string())
                });
            if let Some(tx) = load_sender.borrow_mut().take() {
                let _ = tx.send(result);
            }
        }));
        reader.set_onload(Some(on_load.as_ref().unchecked_ref()));

        let error_sender = sender.clone();
        let file_name = file.name();
        let on_error = Closure::<dyn FnMut(web_sys::ProgressEvent)>::wrap(Box::new(move |_| {
            if let Some(tx) = error_sender.borrow_mut().take() {
                let _ = tx.send(Err(format!("failed to load `{file_name}`")));
            }
        }));
        reader.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        reader
            .read_as_data_url(file)
            .map_err(|err| format!("failed to start file read: {err:?}"))?;

        let result = rx
            .await
            .map_err(|_| "file read was interrupted".to_string())?;
        on_load.forget();
        on_error.forget();
        result
    }
}

#[cfg(target_arch = "wasm32")]
pub use imp::{raw_files_from_list, BrowserFile};
