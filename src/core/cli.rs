use futures::channel::mpsc::UnboundedSender;
use tracing::{error, info};

use crate::core::command_queue::{Command, CommandType};

fn get_cli_command() -> Option<Command> {
    let mut buffer = String::new();

    match std::io::stdin().read_line(&mut buffer) {
        // stdin closed
        Ok(0) => None,
        Ok(_) => {
            let command = buffer.trim_end();
            info!("Command: {}", command);
            Some(Command::from_line(command))
        }
        Err(err) => {
            error!("Could not read provided command: {err}");
            None
        }
    }
}

/// Reads console commands until `exit` or end of input and forwards them to
/// the host loop. End of input is forwarded as `exit`.
pub fn run_cli(sender: UnboundedSender<Command>) {
    loop {
        let command = get_cli_command()
            .unwrap_or_else(|| Command::new("main", CommandType::Exit, None));
        let exit = command.command_type == CommandType::Exit;

        if sender.unbounded_send(command).is_err() || exit {
            break;
        }
    }
}
