//! Shared CLI definitions for leadgrid.
//!
//! Used by the main application and by the build script (manpage
//! generation via clap_mangen).

use clap::{CommandFactory, Parser};

/// Command-line arguments for leadgrid
#[derive(Clone, Parser, Debug)]
#[command(
    name = "leadgrid",
    version,
    about = "Sales-lead enrichment tables in the terminal",
    long_about = include_str!("../long_about.txt")
)]
pub struct Args {
    /// Path to the table snapshot to open (not required with --generate-config or --clear-cache)
    #[arg(required_unless_present_any = ["generate_config", "clear_cache"], value_name = "PATH")]
    pub path: Option<std::path::PathBuf>,

    /// Open a specific view by name instead of the table's active view
    #[arg(long = "view", value_name = "NAME")]
    pub view: Option<String>,

    /// Open the table read-only: cell edits and column mutations are disabled
    #[arg(long = "read-only", action)]
    pub read_only: bool,

    /// Show row numbers in the reserved selector column
    #[arg(long = "row-numbers", action)]
    pub row_numbers: bool,

    /// Index to start counting rows from (default from config, normally 1)
    #[arg(long = "row-start-index", value_name = "N")]
    pub row_start_index: Option<usize>,

    /// Default column width in terminal cells for columns without a stored width
    #[arg(long = "column-width", value_name = "CELLS")]
    pub column_width: Option<u16>,

    /// Enable debug mode to show operational information
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Generate a default config file and exit
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Overwrite an existing config file when generating
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,

    /// Clear all cache data (input history) and exit
    #[arg(long = "clear-cache", action)]
    pub clear_cache: bool,
}

impl Args {
    /// Expose the clap command for the manpage build script.
    pub fn command_for_manpage() -> clap::Command {
        Args::command()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_required_without_early_exit_flags() {
        assert!(Args::try_parse_from(["leadgrid"]).is_err());
        assert!(Args::try_parse_from(["leadgrid", "--generate-config"]).is_ok());
        assert!(Args::try_parse_from(["leadgrid", "--clear-cache"]).is_ok());
    }

    #[test]
    fn test_parse_basic() {
        let args = Args::try_parse_from([
            "leadgrid",
            "accounts.table.json",
            "--view",
            "Outreach",
            "--read-only",
        ])
        .unwrap();
        assert_eq!(
            args.path.as_deref(),
            Some(std::path::Path::new("accounts.table.json"))
        );
        assert_eq!(args.view.as_deref(), Some("Outreach"));
        assert!(args.read_only);
        assert!(!args.debug);
    }
}
