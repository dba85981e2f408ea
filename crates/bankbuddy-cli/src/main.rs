mod cli;
mod dispatch;
mod output;
mod stdout_io;

use std::process::ExitCode;

use bankbuddy_client::ClientError;
use clap::{Parser, error::ErrorKind};
use stdout_io::write_stdout_text;

const ROOT_HELP: &str = "BankBuddy - local ledger for your bank exports

Usage:
  buddy <command>

Start here:
  buddy import create --help
  buddy account list
  buddy report
";

const TOP_LEVEL_HELP: &str = "BankBuddy - local ledger for your bank exports

USAGE: buddy [--home <dir>] <command>

Import your transactions:
  1. buddy import create --help                           Read accepted CSV headers and workflow
  2. buddy import create --dry-run <path>                 Validate and dedupe without writing
  3. buddy import create <path>                           Import transactions

Review and split:
  buddy account list                                      Show imported accounts and net amounts
  buddy analyze                                           Summaries, cash flow and expense split
  buddy report                                            Write the Markdown transaction report

Split options (analyze and report):
  --person1-name <name> --person2-name <name>             Names used in split tables
  --person1-percentage <0-100>                            Person 1's share (default 50)
  --days <n>                                              Recent-activity window (default 30)
  --as-of <YYYY-MM-DD>                                    Reference date (default latest import)

Other commands:
  buddy import list                                       List past imports

The ledger lives in $BANKBUDDY_HOME (default ~/.bankbuddy).
Set RUST_LOG=info to see import and report progress on stderr.
";

fn main() -> ExitCode {
    init_logging();
    match run() {
        Ok(code) => code,
        Err(code) => code,
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .try_init();
}

fn run() -> Result<ExitCode, ExitCode> {
    let raw_args = std::env::args().collect::<Vec<String>>();
    if raw_args.len() == 1 {
        if write_stdout_text(ROOT_HELP).is_err() {
            return Err(ExitCode::from(2));
        }
        return Ok(ExitCode::SUCCESS);
    }

    let cli = match cli::Cli::try_parse() {
        Ok(value) => value,
        Err(err) => return handle_parse_error(&err, &raw_args),
    };
    let mode = output::mode_for_command(&cli.command);

    match dispatch::dispatch(&cli) {
        Ok(success) => {
            if output::print_success(&success, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            log::debug!("{} failed with {}", success_label(&cli.command), error.code);
            if output::print_failure(&error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Err(exit_code_for_error(&error))
        }
    }
}

fn handle_parse_error(err: &clap::Error, raw_args: &[String]) -> Result<ExitCode, ExitCode> {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            let text = if is_top_level_help_request(raw_args) {
                TOP_LEVEL_HELP.to_string()
            } else {
                err.to_string()
            };
            if write_stdout_text(&text).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        ErrorKind::DisplayVersion => {
            if write_stdout_text(&err.to_string()).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        kind => {
            let command_hint = if matches!(
                kind,
                ErrorKind::MissingRequiredArgument
                    | ErrorKind::InvalidValue
                    | ErrorKind::ValueValidation
                    | ErrorKind::WrongNumberOfValues
                    | ErrorKind::UnknownArgument
                    | ErrorKind::InvalidSubcommand
            ) {
                command_path_from_args(raw_args)
            } else {
                None
            };
            let clean_message = strip_clap_boilerplate(&err.to_string());
            let parse_error =
                ClientError::invalid_argument_for_command(&clean_message, command_hint.as_deref());
            let mode = infer_requested_output_mode(raw_args);
            if output::print_failure(&parse_error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Err(ExitCode::from(1))
        }
    }
}

fn success_label(command: &cli::Commands) -> &'static str {
    match command {
        cli::Commands::Account { .. } => "account list",
        cli::Commands::Import {
            command: cli::ImportCommand::Create { .. },
        } => "import create",
        cli::Commands::Import {
            command: cli::ImportCommand::List { .. },
        } => "import list",
        cli::Commands::Analyze { .. } => "analyze",
        cli::Commands::Report { .. } => "report",
    }
}

fn is_top_level_help_request(raw_args: &[String]) -> bool {
    raw_args.len() == 2 && matches!(raw_args[1].as_str(), "--help" | "-h")
}

/// Drops clap's trailing usage line and "For more information" hint; the
/// failure renderer prints its own next steps.
fn strip_clap_boilerplate(message: &str) -> String {
    let trimmed = if let Some(pos) = message.find("\n\nUsage:") {
        &message[..pos]
    } else if let Some(pos) = message.find("\nFor more information") {
        &message[..pos]
    } else {
        message
    };
    trimmed.trim_end().to_string()
}

/// Subcommand path for help hints, e.g. "import create".
fn command_path_from_args(raw_args: &[String]) -> Option<String> {
    let mut non_flags = Vec::new();
    let mut skip_value = false;
    for value in raw_args.iter().skip(1) {
        if skip_value {
            skip_value = false;
            continue;
        }
        if value == "--home" {
            skip_value = true;
            continue;
        }
        if !value.starts_with('-') {
            non_flags.push(value.as_str());
        }
    }

    let hint = match non_flags.as_slice() {
        ["account", "list", ..] => Some("account list"),
        ["account", ..] => Some("account"),
        ["import", "create", ..] => Some("import create"),
        ["import", "list", ..] => Some("import list"),
        ["import", ..] => Some("import"),
        ["analyze", ..] => Some("analyze"),
        ["report", ..] => Some("report"),
        _ => None,
    };
    hint.map(std::string::ToString::to_string)
}

fn exit_code_for_error(error: &ClientError) -> ExitCode {
    if error.is_internal() {
        ExitCode::from(2)
    } else {
        ExitCode::from(1)
    }
}

fn infer_requested_output_mode(raw_args: &[String]) -> output::OutputMode {
    if raw_args.iter().skip(1).any(|value| value == "--json") {
        return output::OutputMode::Json;
    }
    output::OutputMode::Text
}

#[cfg(test)]
mod tests {
    use super::{command_path_from_args, is_top_level_help_request, strip_clap_boilerplate};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn command_paths_ignore_flags_and_home_value() {
        assert_eq!(
            command_path_from_args(&args(&["buddy", "import", "create", "--dry-run"])),
            Some("import create".to_string())
        );
        assert_eq!(
            command_path_from_args(&args(&["buddy", "--home", "/tmp/x", "report"])),
            Some("report".to_string())
        );
        assert_eq!(
            command_path_from_args(&args(&["buddy", "account", "--json"])),
            Some("account".to_string())
        );
        assert_eq!(command_path_from_args(&args(&["buddy", "frobnicate"])), None);
    }

    #[test]
    fn clap_boilerplate_is_removed() {
        let message = "error: unexpected argument '--nope' found\n\nUsage: buddy report\n\nFor more information, try '--help'.\n";
        assert_eq!(
            strip_clap_boilerplate(message),
            "error: unexpected argument '--nope' found"
        );
    }

    #[test]
    fn only_bare_help_flag_is_top_level() {
        assert!(is_top_level_help_request(&args(&["buddy", "--help"])));
        assert!(is_top_level_help_request(&args(&["buddy", "-h"])));
        assert!(!is_top_level_help_request(&args(&["buddy", "report", "--help"])));
    }
}
