use std::collections::VecDeque;

use tracing::{error, info, warn};
use web_time::Instant;

use super::{error::CacheError, PendingItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpState {
    Initializing,
    Error,
    Open,
    Closed,
}

/// Non-blocking view of one in-flight HTTP transfer.
pub trait HttpRequest {
    fn url(&self) -> &str;
    fn state(&self) -> HttpState;
    fn error(&self) -> String;
    fn available_size(&self) -> usize;
    /// Appends every currently available byte to `out`, returning the count.
    fn read_available(&mut self, out: &mut Vec<u8>) -> usize;
}

pub trait HttpClient {
    fn make_request(&self, url: &str) -> Box<dyn HttpRequest>;
}

#[derive(Debug)]
pub enum FetchProgress {
    Pending,
    Complete(PendingItem),
    Failed(CacheError),
}

pub struct PendingHttpFetch {
    request: Box<dyn HttpRequest>,
    target: String,
    data: Vec<u8>,
    started: Instant,
}

impl PendingHttpFetch {
    pub fn new(request: Box<dyn HttpRequest>, target: &str) -> Self {
        PendingHttpFetch {
            request,
            target: target.to_owned(),
            data: vec![],
            started: Instant::now(),
        }
    }

    pub fn poll(&mut self) -> FetchProgress {
        match self.request.state() {
            HttpState::Initializing => FetchProgress::Pending,
            HttpState::Error => FetchProgress::Failed(CacheError::NetworkError {
                url: self.request.url().to_owned(),
                reason: self.request.error(),
            }),
            HttpState::Open => {
                self.request.read_available(&mut self.data);
                FetchProgress::Pending
            }
            HttpState::Closed => {
                if self.request.available_size() > 0 {
                    self.request.read_available(&mut self.data);
                }
                if self.request.available_size() > 0 {
                    return FetchProgress::Pending;
                }
                if self.data.is_empty() {
                    return FetchProgress::Failed(CacheError::NetworkError {
                        url: self.request.url().to_owned(),
                        reason: "connection closed without data".into(),
                    });
                }

                info!(
                    "Remote resource {} downloaded from {}, size = {} ({} ms)",
                    self.target,
                    self.request.url(),
                    self.data.len(),
                    self.started.elapsed().as_millis()
                );
                FetchProgress::Complete(PendingItem::remote(
                    self.target.clone(),
                    std::mem::take(&mut self.data),
                ))
            }
        }
    }
}

/// Tracks remote fetches and turns finished transfers into queue items.
#[derive(Default)]
pub struct FetchPoller {
    requested: VecDeque<(String, String)>,
    requests: Vec<PendingHttpFetch>,
}

impl FetchPoller {
    pub fn new() -> Self {
        FetchPoller::default()
    }

    pub fn request(&mut self, url: &str, target: &str) {
        self.requested.push_back((url.to_owned(), target.to_owned()));
    }

    pub fn in_flight(&self) -> usize {
        self.requested.len() + self.requests.len()
    }

    /// Issues queued requests, then polls every tracked transfer once.
    /// All transfers that reach a terminal state are resolved.
    pub fn poll(&mut self, client: &dyn HttpClient) -> Vec<PendingItem> {
        while let Some((url, target)) = self.requested.pop_front() {
            info!("Loading remote resource {target} from {url}");
            self.requests
                .push(PendingHttpFetch::new(client.make_request(&url), &target));
        }

        let mut finished = vec![];
        self.requests.retain_mut(|fetch| match fetch.poll() {
            FetchProgress::Pending => true,
            FetchProgress::Complete(item) => {
                finished.push(item);
                false
            }
            FetchProgress::Failed(err) => {
                error!("{err}");
                false
            }
        });

        finished
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::ReqwestClient;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::{
        io::Read,
        sync::{Arc, Mutex, PoisonError},
    };

    use super::*;

    #[derive(Default)]
    struct Transfer {
        state: Option<HttpState>,
        error: String,
        buffer: Vec<u8>,
    }

    /// Runs each transfer on its own thread with a blocking `reqwest`
    /// client; the tick side only inspects shared state.
    #[derive(Default)]
    pub struct ReqwestClient;

    pub struct ReqwestRequest {
        url: String,
        transfer: Arc<Mutex<Transfer>>,
    }

    impl ReqwestRequest {
        fn transfer(&self) -> std::sync::MutexGuard<'_, Transfer> {
            self.transfer.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    fn fetch(url: &str, transfer: &Mutex<Transfer>) -> Result<(), String> {
        let mut response = reqwest::blocking::get(url).map_err(|err| err.to_string())?;
        if !response.status().is_success() {
            return Err(format!("HTTP status {}", response.status()));
        }

        transfer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .state = Some(HttpState::Open);

        let mut chunk = [0u8; 16 * 1024];
        loop {
            let read = response.read(&mut chunk).map_err(|err| err.to_string())?;
            if read == 0 {
                return Ok(());
            }
            transfer
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .buffer
                .extend_from_slice(&chunk[..read]);
        }
    }

    impl HttpClient for ReqwestClient {
        fn make_request(&self, url: &str) -> Box<dyn HttpRequest> {
            let transfer = Arc::new(Mutex::new(Transfer::default()));

            let thread_transfer = transfer.clone();
            let thread_url = url.to_owned();
            std::thread::spawn(move || {
                let result = fetch(&thread_url, &thread_transfer);
                let mut transfer = thread_transfer
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                match result {
                    Ok(()) => transfer.state = Some(HttpState::Closed),
                    Err(err) => {
                        warn!("Request to {thread_url} failed: {err}");
                        transfer.error = err;
                        transfer.state = Some(HttpState::Error);
                    }
                }
            });

            Box::new(ReqwestRequest {
                url: url.to_owned(),
                transfer,
            })
        }
    }

    impl HttpRequest for ReqwestRequest {
        fn url(&self) -> &str {
            &self.url
        }

        fn state(&self) -> HttpState {
            self.transfer().state.unwrap_or(HttpState::Initializing)
        }

        fn error(&self) -> String {
            self.transfer().error.clone()
        }

        fn available_size(&self) -> usize {
            self.transfer().buffer.len()
        }

        fn read_available(&mut self, out: &mut Vec<u8>) -> usize {
            let mut transfer = self.transfer();
            let read = transfer.buffer.len();
            out.append(&mut transfer.buffer);
            read
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebFetchClient;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::{cell::RefCell, rc::Rc};

    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;

    use super::*;

    #[derive(Default)]
    struct Transfer {
        state: Option<HttpState>,
        error: String,
        buffer: Vec<u8>,
    }

    /// Uses the browser `fetch` API; completion is delivered by the JS event
    /// loop between ticks.
    #[derive(Default)]
    pub struct WebFetchClient;

    pub struct WebFetchRequest {
        url: String,
        transfer: Rc<RefCell<Transfer>>,
    }

    async fn fetch(url: String) -> Result<Vec<u8>, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;

        let opts = web_sys::RequestInit::new();
        opts.set_method("GET");
        opts.set_mode(web_sys::RequestMode::Cors);
        let request = web_sys::Request::new_with_str_and_init(&url, &opts)?;

        let response: web_sys::Response = JsFuture::from(window.fetch_with_request(&request))
            .await?
            .dyn_into()?;
        if !response.ok() {
            return Err(JsValue::from_str(&format!("HTTP status {}", response.status())));
        }

        let buffer = JsFuture::from(response.array_buffer()?).await?;
        Ok(js_sys::Uint8Array::new(&buffer).to_vec())
    }

    impl HttpClient for WebFetchClient {
        fn make_request(&self, url: &str) -> Box<dyn HttpRequest> {
            let transfer = Rc::new(RefCell::new(Transfer::default()));

            let task_transfer = transfer.clone();
            let task_url = url.to_owned();
            wasm_bindgen_futures::spawn_local(async move {
                let result = fetch(task_url).await;
                let mut transfer = task_transfer.borrow_mut();
                match result {
                    Ok(data) => {
                        transfer.buffer = data;
                        transfer.state = Some(HttpState::Closed);
                    }
                    Err(err) => {
                        transfer.error = format!("{err:?}");
                        transfer.state = Some(HttpState::Error);
                    }
                }
            });

            Box::new(WebFetchRequest {
                url: url.to_owned(),
                transfer,
            })
        }
    }

    impl HttpRequest for WebFetchRequest {
        fn url(&self) -> &str {
            &self.url
        }

        fn state(&self) -> HttpState {
            self.transfer.borrow().state.unwrap_or(HttpState::Initializing)
        }

        fn error(&self) -> String {
            self.transfer.borrow().error.clone()
        }

        fn available_size(&self) -> usize {
            self.transfer.borrow().buffer.len()
        }

        fn read_available(&mut self, out: &mut Vec<u8>) -> usize {
            let mut transfer = self.transfer.borrow_mut();
            let read = transfer.buffer.len();
            out.append(&mut transfer.buffer);
            read
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    /// Scripted transfer: each poll of `state()` pops the next state until
    /// one is left.
    pub struct FakeRequest {
        pub url: String,
        pub states: Rc<RefCell<VecDeque<HttpState>>>,
        pub chunks: Rc<RefCell<VecDeque<Vec<u8>>>>,
    }

    impl HttpRequest for FakeRequest {
        fn url(&self) -> &str {
            &self.url
        }

        fn state(&self) -> HttpState {
            let mut states = self.states.borrow_mut();
            if states.len() > 1 {
                states.pop_front().unwrap()
            } else {
                *states.front().unwrap()
            }
        }

        fn error(&self) -> String {
            "connection refused".into()
        }

        fn available_size(&self) -> usize {
            self.chunks.borrow().front().map_or(0, Vec::len)
        }

        fn read_available(&mut self, out: &mut Vec<u8>) -> usize {
            match self.chunks.borrow_mut().pop_front() {
                Some(chunk) => {
                    out.extend_from_slice(&chunk);
                    chunk.len()
                }
                None => 0,
            }
        }
    }

    /// Hands out requests scripted per URL.
    #[derive(Default)]
    pub struct FakeClient {
        pub scripts: RefCell<Vec<(String, Vec<HttpState>, Vec<Vec<u8>>)>>,
    }

    impl FakeClient {
        pub fn script(&self, url: &str, states: &[HttpState], chunks: &[&[u8]]) {
            self.scripts.borrow_mut().push((
                url.to_owned(),
                states.to_vec(),
                chunks.iter().map(|c| c.to_vec()).collect(),
            ));
        }
    }

    impl HttpClient for FakeClient {
        fn make_request(&self, url: &str) -> Box<dyn HttpRequest> {
            let mut scripts = self.scripts.borrow_mut();
            let index = scripts
                .iter()
                .position(|(u, _, _)| u == url)
                .expect("unscripted url");
            let (url, states, chunks) = scripts.remove(index);

            Box::new(FakeRequest {
                url,
                states: Rc::new(RefCell::new(states.into())),
                chunks: Rc::new(RefCell::new(chunks.into())),
            })
        }
    }

    #[test]
    fn straight_to_error_produces_nothing() {
        let client = FakeClient::default();
        client.script("http://host/a.json", &[HttpState::Error], &[]);

        let mut poller = FetchPoller::new();
        poller.request("http://host/a.json", "a.json");

        assert!(poller.poll(&client).is_empty());
        assert_eq!(poller.in_flight(), 0);
        assert!(poller.poll(&client).is_empty());
    }

    #[test]
    fn closed_transfer_becomes_remote_item() {
        let client = FakeClient::default();
        client.script(
            "http://host/a.json",
            &[HttpState::Initializing, HttpState::Open, HttpState::Closed],
            &[b"{\"a\":", b" 1}"],
        );

        let mut poller = FetchPoller::new();
        poller.request("http://host/a.json", "Data/a.json");

        assert!(poller.poll(&client).is_empty()); // initializing
        assert!(poller.poll(&client).is_empty()); // open, first chunk
        let items = poller.poll(&client);

        assert_eq!(
            items,
            vec![PendingItem::remote("Data/a.json", b"{\"a\": 1}".to_vec())]
        );
        assert_eq!(poller.in_flight(), 0);
    }

    #[test]
    fn several_transfers_resolve_in_one_tick() {
        let client = FakeClient::default();
        client.script("http://host/a", &[HttpState::Closed], &[b"a"]);
        client.script("http://host/b", &[HttpState::Closed], &[b"b"]);
        client.script("http://host/c", &[HttpState::Initializing], &[]);

        let mut poller = FetchPoller::new();
        poller.request("http://host/a", "a.json");
        poller.request("http://host/b", "b.json");
        poller.request("http://host/c", "c.json");

        let names: Vec<String> = poller.poll(&client).into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
        assert_eq!(poller.in_flight(), 1);
    }

    #[test]
    fn empty_closed_transfer_fails() {
        let client = FakeClient::default();
        client.script("http://host/empty", &[HttpState::Closed], &[]);

        let mut poller = FetchPoller::new();
        poller.request("http://host/empty", "empty.json");

        assert!(poller.poll(&client).is_empty());
        assert_eq!(poller.in_flight(), 0);
    }
}
