//! Command-line surface of the `launchpad` binary.

use clap::Parser;
use launchpad_config::ConfigArgs;

/// Container entry process: applies the environment profile, waits for
/// dependencies and hands control to the application or its shim.
#[derive(Parser, Debug)]
#[command(
    name = "launchpad",
    version,
    about,
    after_help = "Everything after the options (or after `--`) is the application command."
)]
pub struct Cli {
    /// Validate configuration and print the launch plan as JSON without
    /// waiting or launching.
    #[arg(long)]
    pub check: bool,
    /// Launch configuration.
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn application_arguments_are_not_mistaken_for_flags() {
        let cli = Cli::try_parse_from([
            "launchpad", "--check", "python", "-u", "main.py", "--port", "80",
        ])
        .expect("arguments parse");
        assert!(cli.check);
        assert_eq!(cli.config.command, ["python", "-u", "main.py", "--port", "80"]);
    }
}
