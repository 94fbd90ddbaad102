use js_sys::{Function, Reflect, Uint8Array};
use tracing::{error, warn};
use wasm_bindgen::prelude::*;

use crate::{
    assets::{remote::WebFetchClient, resource_cache::DynamicResourceCache},
    core::{
        config::CacheConfig,
        events::{CacheEvent, EventSink},
        state::init_trace,
    },
};

#[wasm_bindgen(start)]
pub fn start() {
    init_trace();
}

/// Forwards cache events to the functions of a JS object, e.g.
/// `{ FileLoaded(name) {}, BinaryFileLoaded(name, bytes) {} }`.
struct JsCallbacks {
    target: JsValue,
}

impl JsCallbacks {
    fn callback(&self, event: &str) -> Option<Function> {
        Reflect::get(&self.target, &JsValue::from_str(event))
            .ok()
            .and_then(|value| value.dyn_into::<Function>().ok())
    }

    fn call1(&self, event: &str, name: &str) -> Result<(), JsValue> {
        match self.callback(event) {
            Some(f) => f.call1(&JsValue::NULL, &JsValue::from_str(name)).map(|_| ()),
            None => Ok(()),
        }
    }
}

impl EventSink for JsCallbacks {
    fn send_event(&self, event: CacheEvent) {
        let (kind, result) = match &event {
            CacheEvent::FileLoaded(name) => ("FileLoaded", self.call1("FileLoaded", name)),
            CacheEvent::FileLoadFailed(name) => {
                ("FileLoadFailed", self.call1("FileLoadFailed", name))
            }
            CacheEvent::ListResource(name) => ("ListResource", self.call1("ListResource", name)),
            CacheEvent::BinaryFileLoaded { name, data } => (
                "BinaryFileLoaded",
                match self.callback("BinaryFileLoaded") {
                    Some(f) => f
                        .call2(
                            &JsValue::NULL,
                            &JsValue::from_str(name),
                            &Uint8Array::from(data.as_slice()),
                        )
                        .map(|_| ()),
                    None => Ok(()),
                },
            ),
        };

        if let Err(err) = result {
            warn!("{kind} callback threw {err:?}");
        }
    }
}

/// Browser-facing handle to the cache. The page calls `update` once per
/// animation frame.
#[wasm_bindgen]
pub struct ResourceModule {
    cache: DynamicResourceCache,
}

#[wasm_bindgen]
impl ResourceModule {
    #[wasm_bindgen(constructor)]
    pub fn new(callbacks: JsValue) -> ResourceModule {
        let mut cache =
            DynamicResourceCache::new(CacheConfig::default()).with_http_client(WebFetchClient);
        cache.set_event_sink(JsCallbacks { target: callbacks });

        ResourceModule { cache }
    }

    pub fn add_text_resource(&mut self, name: &str, content: &str) -> usize {
        self.cache.add_text_resource(name, content)
    }

    pub fn add_binary_file(&mut self, name: &str, data: &[u8]) {
        self.cache.add_binary_resource(name, data);
    }

    pub fn add_resource_from_base64(&mut self, name: &str, data: &str) -> bool {
        self.cache
            .add_resource_from_base64(name, data)
            .map_err(|err| error!("{err}"))
            .is_ok()
    }

    pub fn load_resource_from_url(&mut self, url: &str, name: &str) -> bool {
        self.cache
            .load_resource_from_url(url, name)
            .map_err(|err| error!("{err}"))
            .is_ok()
    }

    pub fn load_resource_list(&self) -> usize {
        self.cache.load_resource_list().len()
    }

    pub fn start_scripts(&mut self) {
        self.cache.start_scripts();
    }

    pub fn start_single_script(&mut self, name: &str) -> bool {
        self.cache
            .start_single_script(name)
            .map_err(|err| error!("{err}"))
            .is_ok()
    }

    /// Text of a resource file, or an empty string if it cannot be read.
    pub fn get_resource(&self, name: &str) -> String {
        self.cache.get_resource_content(name).unwrap_or_else(|err| {
            error!("{err}");
            String::new()
        })
    }

    /// Delivers a resource file through the `BinaryFileLoaded` callback.
    pub fn get_resource_binary(&self, name: &str) -> usize {
        self.cache
            .get_resource_content_binary(name)
            .unwrap_or_else(|err| {
                error!("{err}");
                0
            })
    }

    pub fn update(&mut self) {
        self.cache.update();
    }
}
