use tracing::info;

use crate::core::command_queue::{Command, CommandType};

use super::error::{CacheError, CacheResult};

/// Inbound host requests, parsed from console commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceCommand {
    AddText { name: String, content: String },
    AddFile { name: String, path: String },
    AddBase64 { name: String, data_uri: String },
    Fetch { url: String, name: String },
    List,
    StartAll,
    Start(String),
    Get(String),
    GetBinary(String),
    Help,
}

impl ResourceCommand {
    pub fn from_command(cmd: &Command) -> CacheResult<Self> {
        let args = cmd.args.as_deref().unwrap_or("");
        let (first, rest) = match args.split_once(' ') {
            Some((first, rest)) => (first, rest.trim()),
            None => (args, ""),
        };

        let one = |what: &str| -> CacheResult<String> {
            if first.is_empty() || !rest.is_empty() {
                return Err(CacheError::InvalidPayload(format!("expected <{what}>, got {args:?}")));
            }
            Ok(first.to_owned())
        };
        let two = |a: &str, b: &str| -> CacheResult<(String, String)> {
            if first.is_empty() || rest.is_empty() {
                return Err(CacheError::InvalidPayload(format!(
                    "expected <{a}> <{b}>, got {args:?}"
                )));
            }
            Ok((first.to_owned(), rest.to_owned()))
        };

        let command = match cmd.command_type {
            CommandType::Add => {
                let (name, content) = two("name", "content")?;
                ResourceCommand::AddText { name, content }
            }
            CommandType::AddFile => {
                let (name, path) = two("name", "path")?;
                ResourceCommand::AddFile { name, path }
            }
            CommandType::AddBase64 => {
                let (name, data_uri) = two("name", "data uri")?;
                ResourceCommand::AddBase64 { name, data_uri }
            }
            CommandType::Fetch => {
                let (url, name) = two("url", "name")?;
                ResourceCommand::Fetch { url, name }
            }
            CommandType::List => ResourceCommand::List,
            CommandType::Start if args.is_empty() => ResourceCommand::StartAll,
            CommandType::Start => ResourceCommand::Start(one("name")?),
            CommandType::Get => ResourceCommand::Get(one("name")?),
            CommandType::GetBinary => ResourceCommand::GetBinary(one("name")?),
            CommandType::Help => ResourceCommand::Help,
            other => {
                return Err(CacheError::InvalidPayload(format!(
                    "unsupported command {other:?}"
                )))
            }
        };

        Ok(command)
    }

    pub fn display_help() {
        info!("add <name> <content>: Queue a text resource");
        info!("file <name> <path>: Queue the bytes of a local file as resource <name>");
        info!("base64 <name> <data uri>: Queue a base64 encoded resource");
        info!("fetch <url> <name>: Download a resource and queue it as <name>");
        info!("list: List the entries of all loaded packages");
        info!("start [name]: Call `void Start()` on one or all scripts");
        info!("get <name>: Print the text of a resource file");
        info!("getbin <name>: Deliver the bytes of a resource file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> CacheResult<ResourceCommand> {
        ResourceCommand::from_command(&Command::from_line(line))
    }

    #[test]
    fn parses_add_with_spaces_in_content() {
        assert_eq!(
            parse("cache add UI/a.xml <element type=\"Text\"/>").unwrap(),
            ResourceCommand::AddText {
                name: "UI/a.xml".into(),
                content: "<element type=\"Text\"/>".into(),
            }
        );
    }

    #[test]
    fn start_with_and_without_name() {
        assert_eq!(parse("cache start").unwrap(), ResourceCommand::StartAll);
        assert_eq!(
            parse("cache start Scripts/Main.as").unwrap(),
            ResourceCommand::Start("Scripts/Main.as".into())
        );
    }

    #[test]
    fn missing_arguments_are_invalid() {
        assert!(matches!(
            parse("cache fetch http://host/a.json"),
            Err(CacheError::InvalidPayload(_))
        ));
        assert!(parse("cache get").is_err());
        assert!(parse("cache get a b").is_err());
        assert!(parse("cache dance").is_err());
    }
}
