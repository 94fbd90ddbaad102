use std::collections::HashMap;

use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use tracing::{error, info, warn};

use crate::core::{
    app::App,
    command_queue::{Command, CommandType},
    events::{drain_events, CacheEvent, EventProxy},
};

/// Owns the apps of the host, routes console commands to them and reports
/// what they emit.
pub struct State {
    pub running: bool,
    pub apps: HashMap<String, Box<dyn App>>,
    command_sender: UnboundedSender<Command>,
    commands: UnboundedReceiver<Command>,
    proxy: EventProxy,
    events: UnboundedReceiver<CacheEvent>,
}

impl State {
    pub fn new() -> Self {
        let (command_sender, commands) = unbounded();
        let (proxy, events) = EventProxy::new();

        State {
            running: true,
            apps: HashMap::new(),
            command_sender,
            commands,
            proxy,
            events,
        }
    }

    /// Sending half for command sources such as the console thread.
    pub fn command_sender(&self) -> UnboundedSender<Command> {
        self.command_sender.clone()
    }

    pub fn insert_app(&mut self, app_name: &str, mut app: Box<dyn App>) {
        let app_name = app_name.to_ascii_lowercase();
        if self.apps.contains_key(app_name.as_str()) {
            warn!("State already contains app {app_name}!");
            return;
        }

        app.init(self.proxy.clone());
        self.apps.insert(app_name, app);
    }

    pub fn update(&mut self) -> Vec<CacheEvent> {
        while let Ok(command) = self.commands.try_recv() {
            self.process_command(command);
        }

        for app in self.apps.values_mut() {
            app.update();
        }

        let events = drain_events(&mut self.events);
        for event in &events {
            match event {
                CacheEvent::FileLoaded(name) => info!("Loaded {name}"),
                CacheEvent::FileLoadFailed(name) => warn!("Failed to load {name}"),
                CacheEvent::BinaryFileLoaded { name, data } => {
                    info!("Delivered {} bytes of {name}", data.len())
                }
                CacheEvent::ListResource(name) => info!("Resource {name}"),
            }
        }

        events
    }

    fn process_command(&mut self, command: Command) {
        if command.command_type == CommandType::Exit {
            self.running = false;
            return;
        }

        if command.app == "main" && command.command_type == CommandType::Help {
            info!("exit: Stop the host");
            for name in self.apps.keys() {
                info!("{name} help: Commands of {name}");
            }
            return;
        }

        match self.apps.get_mut(&command.app) {
            Some(app) => app.process_command(command),
            None => error!("No app found with name: {}", command.app),
        }
    }

    /// Native host loop: console commands in, one tick per `tick_interval`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn run() {
        use crate::{
            assets::{remote::ReqwestClient, resource_cache::DynamicResourceCache},
            core::{cli::run_cli, config::CacheConfig},
        };

        init_trace();

        let mut config = CacheConfig::from_env();
        let args: Vec<String> = std::env::args().skip(1).collect();
        config.apply_args(&args.join(" "));
        info!("{config:?}");

        let tick_interval = config.tick_interval;
        let cache = DynamicResourceCache::new(config).with_http_client(ReqwestClient::default());

        let mut state = State::new();
        state.insert_app("cache", Box::new(cache));

        let sender = state.command_sender();
        std::thread::spawn(move || {
            run_cli(sender);
        });

        while state.running {
            state.update();
            std::thread::sleep(tick_interval);
        }
    }
}

impl Default for State {
    fn default() -> Self {
        State::new()
    }
}

pub fn init_trace() {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            console_error_panic_hook::set_once();
            tracing_wasm::set_as_global_default_with_config(tracing_wasm::WASMLayerConfig::default());
        } else {
            let subscriber = tracing_subscriber::FmtSubscriber::builder()
                .with_max_level(tracing::Level::TRACE)
                .with_file(false)
                .with_line_number(true)
                .without_time()
                .finish();

            if tracing::subscriber::set_global_default(subscriber).is_err() {
                warn!("Trace subscriber was already set");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    #[derive(Default)]
    struct Recorder {
        commands: Rc<RefCell<Vec<String>>>,
        ticks: Rc<RefCell<usize>>,
        proxy: Option<EventProxy>,
    }

    impl App for Recorder {
        fn init(&mut self, proxy: EventProxy) {
            self.proxy = Some(proxy);
        }

        fn update(&mut self) {
            *self.ticks.borrow_mut() += 1;
            if let Some(proxy) = &self.proxy {
                use crate::core::events::EventSink;
                proxy.send_event(CacheEvent::FileLoaded(format!("tick{}", self.ticks.borrow())));
            }
        }

        fn process_command(&mut self, cmd: Command) {
            self.commands.borrow_mut().push(cmd.args.unwrap_or_default());
        }
    }

    #[test]
    fn commands_are_routed_by_app_name() {
        let recorder = Recorder::default();
        let commands = recorder.commands.clone();

        let mut state = State::new();
        state.insert_app("Cache", Box::new(recorder));

        let sender = state.command_sender();
        sender
            .unbounded_send(Command::from_line("cache get Data/a.json"))
            .unwrap();
        sender
            .unbounded_send(Command::from_line("nobody get Data/a.json"))
            .unwrap();

        let events = state.update();

        assert_eq!(*commands.borrow(), vec!["Data/a.json".to_owned()]);
        assert_eq!(events, vec![CacheEvent::FileLoaded("tick1".into())]);
        assert!(state.running);
    }

    #[test]
    fn exit_stops_the_host() {
        let mut state = State::new();
        state
            .command_sender()
            .unbounded_send(Command::from_line("exit"))
            .unwrap();

        state.update();
        assert!(!state.running);
    }

    #[test]
    fn duplicate_apps_are_ignored() {
        let first = Recorder::default();
        let first_ticks = first.ticks.clone();

        let mut state = State::new();
        state.insert_app("cache", Box::new(first));
        state.insert_app("CACHE", Box::new(Recorder::default()));
        state.update();

        assert_eq!(state.apps.len(), 1);
        assert_eq!(*first_ticks.borrow(), 1);
    }
}
