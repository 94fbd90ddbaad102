use std::sync::{Arc, RwLock};

use base64::Engine;
use tracing::{debug, error, info, warn};

use crate::{
    core::{
        app::App,
        command_queue::{Command, IngestQueue},
        config::CacheConfig,
        events::{CacheEvent, EventProxy, EventSink},
    },
    renderer::resources::{
        material::Material, model::Model, shader::Shader, technique::Technique, texture::Texture2D,
    },
};

use super::{
    error::{CacheError, CacheResult},
    json_file::JsonFile,
    package::PackageFile,
    read_lock,
    registry::ResourceRegistry,
    remote::{FetchPoller, HttpClient},
    resource_cmd::ResourceCommand,
    script_file::ScriptFile,
    scripting::ScriptEngine,
    write_lock,
    xml_file::{self, XmlFile},
    AssetType, ItemOrigin, PendingItem, Resource, ResourceKind, Shared, XmlKind,
};

const BASE64_MARKER: &str = ";base64,";

/// Accepts raw file bytes from the host and turns them into named resources,
/// one queued item per tick.
pub struct DynamicResourceCache {
    config: CacheConfig,
    registry: ResourceRegistry,
    queue: IngestQueue,
    // registration order, for start_scripts
    scripts: Vec<Shared<ScriptFile>>,
    script_engine: Option<Box<dyn ScriptEngine>>,
    http: Option<Box<dyn HttpClient>>,
    fetches: FetchPoller,
    proxy: Option<Box<dyn EventSink>>,
}

impl DynamicResourceCache {
    pub fn new(config: CacheConfig) -> Self {
        let mut registry = ResourceRegistry::new();

        for dir in &config.resource_dirs {
            registry.add_resource_dir(dir.clone());
        }
        for path in &config.packages {
            match PackageFile::open(path) {
                Ok(package) => registry.add_package(package),
                Err(err) => error!("Could not open package: {err}"),
            }
        }

        DynamicResourceCache {
            config,
            registry,
            queue: IngestQueue::new(),
            scripts: vec![],
            script_engine: None,
            http: None,
            fetches: FetchPoller::new(),
            proxy: None,
        }
    }

    pub fn with_script_engine(mut self, engine: impl ScriptEngine + 'static) -> Self {
        self.script_engine = Some(Box::new(engine));
        self
    }

    pub fn with_http_client(mut self, client: impl HttpClient + 'static) -> Self {
        self.http = Some(Box::new(client));
        self
    }

    pub fn set_event_sink(&mut self, sink: impl EventSink + 'static) {
        self.proxy = Some(Box::new(sink));
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ResourceRegistry {
        &mut self.registry
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn add_text_resource(&mut self, name: &str, content: &str) -> usize {
        self.queue.enqueue(PendingItem::new(name, content));
        content.len()
    }

    pub fn add_binary_resource(&mut self, name: &str, data: &[u8]) {
        self.queue.enqueue(PendingItem::new(name, data));
    }

    pub fn add_resource_from_base64(&mut self, name: &str, data_uri: &str) -> CacheResult<()> {
        let data = decode_data_uri(data_uri)?;
        self.queue.enqueue(PendingItem::new(name, data));
        Ok(())
    }

    pub fn load_resource_from_url(&mut self, url: &str, name: &str) -> CacheResult<()> {
        if self.http.is_none() {
            return Err(CacheError::UnsupportedFeature(
                "Engine built without network support!".into(),
            ));
        }

        self.fetches.request(url, name);
        Ok(())
    }

    /// Entry names of every loaded package; each is also reported to the host.
    pub fn load_resource_list(&self) -> Vec<String> {
        let names: Vec<String> = self
            .registry
            .packages()
            .iter()
            .flat_map(|package| package.entry_names())
            .map(str::to_owned)
            .collect();

        for name in &names {
            self.notify(CacheEvent::ListResource(name.clone()));
        }

        names
    }

    /// One tick: advance remote fetches, then materialize queued items.
    pub fn update(&mut self) {
        if let Some(http) = self.http.as_deref() {
            for item in self.fetches.poll(http) {
                self.queue.enqueue(item);
            }
        }

        for _ in 0..self.config.items_per_tick {
            if !self.drain_one() {
                break;
            }
        }
    }

    /// Materializes the oldest queued item. Returns false if the queue was empty.
    pub fn drain_one(&mut self) -> bool {
        let Some(item) = self.queue.pop() else {
            return false;
        };

        info!("Processing queue item: {}", item.name);
        let result = self.process_resource(&item.name, &item.content);

        if item.origin == ItemOrigin::Remote
            && self.config.start_remote_scripts
            && matches!(result, Ok(ResourceKind::Script))
        {
            if let Err(err) = self.start_single_script(&item.name) {
                warn!("{err}");
            }
        }

        true
    }

    /// Classifies and materializes `content` right away, reporting the
    /// outcome to the host.
    pub fn process_resource(&mut self, name: &str, content: &[u8]) -> CacheResult<ResourceKind> {
        let result = Self::classify(name, content)
            .and_then(|kind| self.materialize(kind, name, content).map(|_| kind));

        match &result {
            Ok(_) => self.notify(CacheEvent::FileLoaded(name.to_owned())),
            Err(err) => {
                error!("{err}");
                self.notify(CacheEvent::FileLoadFailed(name.to_owned()));
            }
        }

        result
    }

    pub fn classify(name: &str, content: &[u8]) -> CacheResult<ResourceKind> {
        let kind = match AssetType::from_name(name) {
            AssetType::Script => ResourceKind::Script,
            AssetType::LuaScript => ResourceKind::LuaScript,
            // unparsable XML still goes to the generic loader, which reports the error
            AssetType::Xml => ResourceKind::Xml(
                xml_file::root_name(name, content)
                    .map_or(XmlKind::Generic, |root| XmlKind::from_root(&root)),
            ),
            AssetType::Json => ResourceKind::Json,
            AssetType::Shader => ResourceKind::Shader,
            AssetType::Model => ResourceKind::Model,
            AssetType::Image => ResourceKind::Image,
            AssetType::JavaScript => ResourceKind::JavaScript,
            AssetType::Unknown => return Err(CacheError::UnrecognizedExtension(name.to_owned())),
        };

        Ok(kind)
    }

    pub fn materialize(&mut self, kind: ResourceKind, name: &str, content: &[u8]) -> CacheResult<()> {
        match kind {
            ResourceKind::Script => {
                let Some(engine) = self.script_engine.as_deref_mut() else {
                    return Err(CacheError::UnsupportedFeature(
                        "Engine built without script support!".into(),
                    ));
                };

                let file = get_or_create::<ScriptFile>(&mut self.registry, name);
                if !self.scripts.iter().any(|s| Arc::ptr_eq(s, &file)) {
                    self.scripts.push(file.clone());
                }

                let result = write_lock(&file).load(content, engine);
                result
            }
            ResourceKind::LuaScript => Err(CacheError::UnsupportedFeature(
                "Lua script dynamic loading is not yet supported!".into(),
            )),
            ResourceKind::Xml(XmlKind::Material) => {
                let text = std::str::from_utf8(content)
                    .map_err(|err| CacheError::parse(Material::type_name(), name, err))?;
                let doc = roxmltree::Document::parse(text)
                    .map_err(|err| CacheError::parse(Material::type_name(), name, err))?;

                self.load_into::<Material>(name, |file| file.load(doc.root_element()))
            }
            ResourceKind::Xml(XmlKind::Technique) => {
                self.load_into::<Technique>(name, |file| file.load(content))
            }
            ResourceKind::Xml(XmlKind::Generic) => {
                self.load_into::<XmlFile>(name, |file| file.load(content))
            }
            ResourceKind::Json => self.load_into::<JsonFile>(name, |file| file.load(content)),
            ResourceKind::Shader => self.load_into::<Shader>(name, |file| file.load(content)),
            ResourceKind::Model => self.load_into::<Model>(name, |file| file.load(content)),
            ResourceKind::Image => self.load_into::<Texture2D>(name, |file| file.load(content)),
            ResourceKind::JavaScript => run_javascript(name, content),
        }
    }

    fn load_into<T: Resource + Default>(
        &mut self,
        name: &str,
        load: impl FnOnce(&mut T) -> CacheResult<()>,
    ) -> CacheResult<()> {
        let file = get_or_create::<T>(&mut self.registry, name);
        let result = load(&mut write_lock(&file));
        result
    }

    pub fn start_scripts(&mut self) {
        let Some(engine) = self.script_engine.as_deref_mut() else {
            warn!("Engine built without script support!");
            return;
        };

        for script in &self.scripts {
            let file = read_lock(script);
            if !file.has_start(engine) {
                continue;
            }

            info!("Starting script {}", file.name);
            if let Err(err) = file.start(engine) {
                error!("{err}");
            }
        }
    }

    pub fn start_single_script(&mut self, name: &str) -> CacheResult<()> {
        let Some(engine) = self.script_engine.as_deref_mut() else {
            return Err(CacheError::UnsupportedFeature(
                "Engine built without script support!".into(),
            ));
        };

        let script = self
            .scripts
            .iter()
            .find(|script| read_lock(script).name == name)
            .ok_or_else(|| CacheError::NotFound(name.to_owned()))?;

        let file = read_lock(script);
        info!("Starting script {}", file.name);
        file.start(engine)
    }

    /// Text of a resource file, each line terminated by `\n`.
    pub fn get_resource_content(&self, name: &str) -> CacheResult<String> {
        let data = self
            .registry
            .read_file(name)
            .ok_or_else(|| CacheError::NotFound(name.to_owned()))?;

        let mut content = String::with_capacity(data.len() + 1);
        for line in String::from_utf8_lossy(&data).lines() {
            content.push_str(line);
            content.push('\n');
        }

        Ok(content)
    }

    /// Reads a resource file and delivers its bytes through a
    /// `BinaryFileLoaded` event. Returns the number of bytes delivered.
    pub fn get_resource_content_binary(&self, name: &str) -> CacheResult<usize> {
        let data = self
            .registry
            .read_file(name)
            .ok_or_else(|| CacheError::NotFound(name.to_owned()))?;

        let len = data.len();
        info!("Read {len} bytes of {name}");
        self.notify(CacheEvent::BinaryFileLoaded {
            name: name.to_owned(),
            data,
        });

        Ok(len)
    }

    pub fn execute(&mut self, command: ResourceCommand) -> CacheResult<()> {
        match command {
            ResourceCommand::AddText { name, content } => {
                self.add_text_resource(&name, &content);
            }
            ResourceCommand::AddFile { name, path } => {
                let data = std::fs::read(&path).map_err(|err| {
                    CacheError::InvalidPayload(format!("could not read {path}: {err}"))
                })?;
                self.add_binary_resource(&name, &data);
            }
            ResourceCommand::AddBase64 { name, data_uri } => {
                self.add_resource_from_base64(&name, &data_uri)?;
            }
            ResourceCommand::Fetch { url, name } => self.load_resource_from_url(&url, &name)?,
            ResourceCommand::List => {
                for name in self.load_resource_list() {
                    info!("{name}");
                }
            }
            ResourceCommand::StartAll => self.start_scripts(),
            ResourceCommand::Start(name) => self.start_single_script(&name)?,
            ResourceCommand::Get(name) => info!("{}", self.get_resource_content(&name)?),
            ResourceCommand::GetBinary(name) => {
                self.get_resource_content_binary(&name)?;
            }
            ResourceCommand::Help => ResourceCommand::display_help(),
        }

        Ok(())
    }

    fn notify(&self, event: CacheEvent) {
        match &self.proxy {
            Some(proxy) => proxy.send_event(event),
            None => debug!("No event sink, dropping {event:?}"),
        }
    }
}

impl App for DynamicResourceCache {
    fn init(&mut self, proxy: EventProxy) {
        self.proxy = Some(Box::new(proxy));
    }

    fn update(&mut self) {
        DynamicResourceCache::update(self);
    }

    fn process_command(&mut self, cmd: Command) {
        let result = ResourceCommand::from_command(&cmd).and_then(|command| self.execute(command));
        if let Err(err) = result {
            error!("{err}");
        }
    }
}

/// Returns the registered resource, or creates and registers a manual one.
fn get_or_create<T: Resource + Default>(registry: &mut ResourceRegistry, name: &str) -> Shared<T> {
    if let Some(res) = registry.get::<T>(name) {
        return res;
    }

    let res = Arc::new(RwLock::new(T::default()));
    write_lock(&res).set_name(name);
    registry.add_manual_resource(res.clone());
    info!("Creating new manual {} resource {name}", T::type_name());

    res
}

/// Decodes `data:<mime>;base64,<payload>` or a bare base64 payload.
pub fn decode_data_uri(data: &str) -> CacheResult<Vec<u8>> {
    let payload = match data.find(BASE64_MARKER) {
        Some(index) => &data[index + BASE64_MARKER.len()..],
        None if data.starts_with("data:") => {
            return Err(CacheError::InvalidPayload(
                "data URI is not base64 encoded".into(),
            ))
        }
        None => data,
    };

    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|err| CacheError::InvalidPayload(format!("invalid base64: {err}")))
}

#[cfg(target_arch = "wasm32")]
fn run_javascript(name: &str, content: &[u8]) -> CacheResult<()> {
    let source =
        std::str::from_utf8(content).map_err(|err| CacheError::parse("JavaScript", name, err))?;
    js_sys::eval(source)
        .map(|_| ())
        .map_err(|err| CacheError::parse("JavaScript", name, format!("{err:?}")))
}

#[cfg(not(target_arch = "wasm32"))]
fn run_javascript(name: &str, _content: &[u8]) -> CacheResult<()> {
    Err(CacheError::UnsupportedFeature(format!(
        "Cannot run {name}, JavaScript is only available in the browser"
    )))
}
