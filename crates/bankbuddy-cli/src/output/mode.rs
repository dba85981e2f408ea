use crate::cli::{AccountCommand, Commands, ImportCommand};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputMode {
    Text,
    Json,
}

impl OutputMode {
    fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }
}

pub fn mode_for_command(command: &Commands) -> OutputMode {
    let json = match command {
        Commands::Account {
            command: AccountCommand::List { json },
        } => *json,
        Commands::Import { command } => match command {
            ImportCommand::Create { json, .. } | ImportCommand::List { json } => *json,
        },
        Commands::Analyze { json, .. } | Commands::Report { json, .. } => *json,
    };
    OutputMode::from_flag(json)
}
