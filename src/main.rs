#[cfg(not(target_arch = "wasm32"))]
fn main() {
    dynamic_cache::core::state::State::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {}
