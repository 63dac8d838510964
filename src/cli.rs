//! Command-line arguments and choose-mode output.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::info;

use crate::app::RunOutcome;
use crate::config::QuerySource;

/// Environment variable naming the choose-mode output file.
pub const CHOOSE_FILE_ENV: &str = "JAYRAH_TUI_CHOOSE_FILE";

/// Browse Jira issues from the terminal.
#[derive(Debug, Parser)]
#[command(name = "jayrah-tui", version, about)]
pub struct Cli {
    /// Board to open, by name from the configuration.
    #[arg(long, conflicts_with = "query")]
    pub board: Option<String>,

    /// Raw JQL query instead of a board.
    #[arg(long)]
    pub query: Option<String>,

    /// Return the selected issue key on Enter instead of opening it.
    #[arg(long)]
    pub choose: bool,

    /// Where choose mode writes the selected key. Stdout when unset.
    #[arg(long, env = CHOOSE_FILE_ENV)]
    pub choose_file: Option<PathBuf>,

    /// Use built-in sample data instead of a Jira server.
    #[arg(long)]
    pub mock: bool,

    /// Configuration file (defaults to ~/.config/jayrah/config.yaml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Check credentials against the server before starting.
    #[arg(long)]
    pub validate: bool,
}

impl Cli {
    /// What the issue list starts with.
    pub fn source(&self) -> QuerySource {
        match (&self.query, &self.board) {
            (Some(query), _) => QuerySource::Query(query.clone()),
            (None, board) => QuerySource::Board(board.clone()),
        }
    }
}

/// Act on how the session ended. Only a confirmed choice writes anything.
pub fn finish(outcome: RunOutcome, path: Option<&Path>) -> io::Result<()> {
    match outcome {
        RunOutcome::Chosen(key) => {
            info!(key = %key, "issue chosen");
            write_choice(path, &key)
        }
        RunOutcome::Quit => {
            info!("quit");
            Ok(())
        }
    }
}

/// Deliver a chosen key: the file gets exactly the key, stdout gets a line.
pub fn write_choice(path: Option<&Path>, key: &str) -> io::Result<()> {
    match path {
        Some(path) => fs::write(path, key),
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", key)?;
            stdout.flush()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serial_test::serial;
    use tempfile::tempdir;
    use tokio_test::{assert_err, assert_ok};

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("jayrah-tui").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    #[serial]
    fn test_board_and_query_conflict() {
        assert_err!(parse(&["--board", "ops", "--query", "project = OPS"]));
    }

    #[test]
    #[serial]
    fn test_source_selection() {
        let cli = assert_ok!(parse(&["--query", "project = OPS"]));
        assert_eq!(cli.source(), QuerySource::Query("project = OPS".to_string()));

        let cli = assert_ok!(parse(&["--board", "ops"]));
        assert_eq!(cli.source(), QuerySource::Board(Some("ops".to_string())));

        let cli = assert_ok!(parse(&[]));
        assert_eq!(cli.source(), QuerySource::Board(None));
        assert!(!cli.choose);
    }

    #[test]
    #[serial]
    fn test_choose_file_from_environment() {
        std::env::set_var(CHOOSE_FILE_ENV, "/tmp/jayrah-choice");
        let cli = parse(&["--choose"]);
        std::env::remove_var(CHOOSE_FILE_ENV);

        let cli = assert_ok!(cli);
        assert_eq!(cli.choose_file, Some(PathBuf::from("/tmp/jayrah-choice")));
    }

    #[test]
    fn test_write_choice_writes_only_the_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("choice");
        assert_ok!(write_choice(Some(&path), "JAY-102"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "JAY-102");
    }

    #[test]
    fn test_quit_leaves_choice_file_unwritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("choice");
        assert_ok!(finish(RunOutcome::Quit, Some(&path)));
        assert!(!path.exists());

        assert_ok!(finish(RunOutcome::Chosen("JAY-104".to_string()), Some(&path)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "JAY-104");
    }
}
