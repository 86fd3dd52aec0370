use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "postpick")]
#[command(bin_name = "postpick")]
#[command(version)]
#[command(about = "Pick a post from a remote list and keep the choice across restarts")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "Write a diagnostics log under ~/.config/postpick/diagnostics"
    )]
    pub diagnostics: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "Print the saved selection without opening the picker")]
    Show,
    #[command(about = "Run environment and configuration checks")]
    Doctor,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn no_subcommand_opens_the_picker() {
        let cli = Cli::try_parse_from(["postpick"]).expect("parse");
        assert!(cli.command.is_none());
        assert!(!cli.diagnostics);
    }

    #[test]
    fn diagnostics_flag_is_accepted_after_subcommand() {
        let cli = Cli::try_parse_from(["postpick", "show", "--diagnostics"]).expect("parse");
        assert!(matches!(cli.command, Some(Command::Show)));
        assert!(cli.diagnostics);
    }
}
