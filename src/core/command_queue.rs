use std::{collections::VecDeque, fmt::Debug};

use crate::assets::PendingItem;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum CommandType {
    Exit,
    Help,
    Add,
    AddFile,
    AddBase64,
    Fetch,
    List,
    Start,
    Get,
    GetBinary,
    Other,
}

impl CommandType {
    pub fn from_verb(verb: &str) -> CommandType {
        match verb.to_ascii_lowercase().as_str() {
            "exit" | "close" => CommandType::Exit,
            "help" | "-h" => CommandType::Help,
            "add" => CommandType::Add,
            "file" => CommandType::AddFile,
            "base64" => CommandType::AddBase64,
            "fetch" => CommandType::Fetch,
            "list" => CommandType::List,
            "start" => CommandType::Start,
            "get" => CommandType::Get,
            "getbin" => CommandType::GetBinary,
            _ => CommandType::Other,
        }
    }
}

// "cache add Data/a.json {"speed": 2}"
// "cache fetch https://example.com/Main.as Scripts/Main.as"
// "cache start Scripts/Main.as"
// "exit"
#[derive(Clone)]
pub struct Command {
    pub app: String,
    pub command_type: CommandType,
    pub args: Option<String>,
}

impl Command {
    pub fn new(app: &str, command_type: CommandType, args: Option<String>) -> Command {
        Command {
            app: app.to_owned(),
            command_type,
            args,
        }
    }

    /// Parses `<app> <verb> <args...>`. A bare `exit`/`close` addresses the
    /// host itself.
    pub fn from_line(line: &str) -> Command {
        let line = line.trim();
        let (first, rest) = line.split_once(' ').unwrap_or((line, ""));

        if CommandType::from_verb(first) == CommandType::Exit {
            return Command::new("main", CommandType::Exit, None);
        }

        let rest = rest.trim_start();
        let (verb, args) = rest.split_once(' ').unwrap_or((rest, ""));
        let args = args.trim();

        Command {
            app: first.to_ascii_lowercase(),
            command_type: CommandType::from_verb(verb),
            args: (!args.is_empty()).then(|| args.to_owned()),
        }
    }
}

impl Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("App", &self.app)
            .field("Type", &self.command_type)
            .field("args", &self.args)
            .finish()
    }
}

/// FIFO of items waiting to be materialized. Unbounded; filled by the host
/// and drained by the tick handler on the same thread.
#[derive(Default, Debug)]
pub struct IngestQueue {
    items: VecDeque<PendingItem>,
}

impl IngestQueue {
    pub fn new() -> IngestQueue {
        IngestQueue::default()
    }

    pub fn enqueue(&mut self, item: PendingItem) {
        self.items.push_back(item);
    }

    pub fn pop(&mut self) -> Option<PendingItem> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_is_fifo() {
        let mut queue = IngestQueue::new();
        queue.enqueue(PendingItem::new("a.json", "1"));
        queue.enqueue(PendingItem::new("b.json", "2"));

        assert_eq!(queue.pop().unwrap().name, "a.json");
        assert_eq!(queue.pop().unwrap().name, "b.json");
        assert!(queue.pop().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn parses_command_lines() {
        let cmd = Command::from_line("Cache add Data/a.json {\"speed\": 2}");
        assert_eq!(cmd.app, "cache");
        assert_eq!(cmd.command_type, CommandType::Add);
        assert_eq!(cmd.args.as_deref(), Some("Data/a.json {\"speed\": 2}"));

        let cmd = Command::from_line("cache list");
        assert_eq!(cmd.command_type, CommandType::List);
        assert_eq!(cmd.args, None);

        assert_eq!(Command::from_line("exit").command_type, CommandType::Exit);
        assert_eq!(Command::from_line("cache dance").command_type, CommandType::Other);
    }
}
