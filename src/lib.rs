pub mod assets;
pub mod core;
pub mod renderer;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub mod prelude {
    pub use crate::assets::{
        error::{CacheError, CacheResult},
        registry::ResourceRegistry,
        remote::{HttpClient, HttpRequest, HttpState},
        resource_cache::DynamicResourceCache,
        scripting::{ScriptEngine, ScriptModule},
        PendingItem, Resource, ResourceKind,
    };
    pub use crate::core::{
        app::App,
        config::CacheConfig,
        events::{CacheEvent, EventProxy, EventSink},
        state::State,
    };
}
