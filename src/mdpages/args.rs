use clap::{Parser, Subcommand};
use mdpages::export::{ArtifactKind, Orientation, PageFormat, Strategy};
use std::path::PathBuf;

/// Returns the version string, including git hash and commit date for non-release builds.
/// Format: "0.3.2" for releases, "0.3.2@abc1234 2024-01-15 14:30" for dev builds
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            VERSION.to_string()
        } else {
            format!("{}@{} {}", VERSION, GIT_HASH, GIT_COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(name = "mdpages", bin_name = "mdpages", version = get_version())]
#[command(about = "Multi-document Markdown workspace with paginated export", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List documents
    #[command(alias = "ls")]
    List,

    /// Create a new document and make it active
    #[command(alias = "n")]
    New {
        /// Name of the document (auto-generated when omitted)
        name: Option<String>,

        /// Initial Markdown content
        #[arg(short, long)]
        content: Option<String>,
    },

    /// Rename a document
    #[command(alias = "mv")]
    Rename {
        /// Position (e.g. 2) or id prefix
        selector: String,

        /// New name; blank keeps the current one
        name: String,
    },

    /// Duplicate a document, inserting the copy right after it
    #[command(alias = "cp")]
    Clone {
        /// Position or id prefix (defaults to the active document)
        selector: Option<String>,
    },

    /// Remove a document
    Rm {
        /// Position or id prefix (defaults to the active document)
        selector: Option<String>,
    },

    /// Make a document active
    #[command(alias = "u")]
    Use {
        /// Position or id prefix
        selector: String,
    },

    /// Replace the active document's content
    #[command(alias = "e")]
    Edit {
        /// Read the new content from a file
        #[arg(short, long, conflicts_with = "stdin")]
        file: Option<PathBuf>,

        /// Read the new content from standard input
        #[arg(long)]
        stdin: bool,
    },

    /// Print a document's Markdown
    #[command(alias = "v")]
    Show {
        /// Position or id prefix (defaults to the active document)
        selector: Option<String>,
    },

    /// Render a document to HTML
    Preview {
        /// Position or id prefix (defaults to the active document)
        selector: Option<String>,

        /// Write the page to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Export a document as fixed-size pages
    #[command(alias = "x")]
    Export {
        /// Position or id prefix (defaults to the active document)
        selector: Option<String>,

        /// Pagination strategy: whole or content
        #[arg(short, long)]
        strategy: Option<Strategy>,

        /// Page format: a4, a5, letter, legal or WxH in millimetres
        #[arg(short, long)]
        format: Option<PageFormat>,

        /// Page orientation: portrait or landscape
        #[arg(long)]
        orientation: Option<Orientation>,

        /// Artifact: pdf or archive (page images in a .tar.gz)
        #[arg(short, long)]
        artifact: Option<ArtifactKind>,

        /// Output directory (defaults to the current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show or set whether the document list is open
    Sidebar {
        /// on or off
        state: Option<String>,
    },

    /// Get or set configuration
    Config {
        /// Configuration key (e.g. page-format)
        key: Option<String>,

        /// Value to set
        value: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_flags_parse_into_typed_values() {
        let cli = Cli::try_parse_from([
            "mdpages", "export", "2", "--strategy", "whole", "--format", "letter",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Export {
                selector,
                strategy,
                format,
                ..
            }) => {
                assert_eq!(selector.as_deref(), Some("2"));
                assert_eq!(strategy, Some(Strategy::Whole));
                assert_eq!(format, Some(PageFormat::Letter));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn edit_sources_are_exclusive() {
        assert!(Cli::try_parse_from(["mdpages", "edit", "--file", "a.md", "--stdin"]).is_err());
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let cli = Cli::try_parse_from(["mdpages", "-v"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.verbose);
    }
}
