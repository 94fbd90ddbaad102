use crate::core::{command_queue::Command, events::EventProxy};

pub trait App {
    fn init(&mut self, proxy: EventProxy);
    /// Called once per host tick.
    fn update(&mut self);
    fn process_command(&mut self, cmd: Command);
}
