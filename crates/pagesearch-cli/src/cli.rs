//! Command-line arguments.

use clap::{Parser, Subcommand, ValueEnum};
use pagesearch_core::NodeId;
use pagesearch_fts::SearchMode;

/// Pagesearch - full-text search over rendered CMS pages
#[derive(Parser, Debug)]
#[command(name = "pagesearch", author, version)]
#[command(about = "Build, inspect and query Pagesearch indexes", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Configuration file management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Print the query a search would run, without running it
    Query {
        /// What the visitor typed
        term: String,

        #[command(flatten)]
        shape: QueryShape,
    },

    /// Search a Tantivy index and print one page of results
    Search {
        /// What the visitor typed
        term: String,

        /// Index directory
        #[arg(long)]
        index: String,

        #[command(flatten)]
        shape: QueryShape,

        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Results per page; 0 returns everything
        #[arg(long, default_value_t = 10)]
        page_length: usize,

        /// Output document format
        #[arg(long, value_enum, default_value_t = OutputFormat::Xml)]
        format: OutputFormat,
    },

    /// Write a content tree export into a Tantivy index
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },

    /// Inspect or fill the rendered-HTML cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

/// Query shape shared by `query` and `search`.
#[derive(clap::Args, Debug, Clone)]
pub struct QueryShape {
    /// Ranking strategy
    #[arg(long, value_enum, default_value_t = ModeArg::MultiRelevance)]
    pub mode: ModeArg,

    /// Comma-separated root node ids restricting the search
    #[arg(long, default_value = "")]
    pub roots: String,

    /// Fuzziness between 0 and 1; 1 is exact
    #[arg(long, default_value = "0.8")]
    pub fuzziness: String,

    /// Also match words that start with each term
    #[arg(long)]
    pub wildcard: bool,
}

/// Ranking strategy names accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    MultiRelevance,
    MultiAnd,
    SimpleOr,
    AsEntered,
}

impl From<ModeArg> for SearchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::MultiRelevance => SearchMode::MultiRelevance,
            ModeArg::MultiAnd => SearchMode::MultiAnd,
            ModeArg::SimpleOr => SearchMode::SimpleOr,
            ModeArg::AsEntered => SearchMode::AsEntered,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Xml,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path
    Path,

    /// Print one configuration value by dotted key
    Get {
        /// Key such as `summary_length`
        key: String,
    },

    /// Print the effective configuration as TOML
    Show,

    /// Write a default configuration file
    Init {
        /// Target file instead of the platform default
        #[arg(long)]
        file: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Where pages and HTML come from for the index commands.
#[derive(clap::Args, Debug, Clone)]
pub struct SiteSource {
    /// JSON export of the content tree
    #[arg(long)]
    pub site: String,

    /// Index directory
    #[arg(long)]
    pub index: String,

    /// redb file holding rendered HTML; in-memory when omitted
    #[arg(long)]
    pub cache: Option<String>,

    /// Read HTML from the cache only, never render
    #[arg(long, requires = "cache")]
    pub cache_only: bool,
}

#[derive(Subcommand, Debug)]
pub enum IndexAction {
    /// Empty the index and index every page again
    Rebuild {
        #[command(flatten)]
        source: SiteSource,
    },

    /// Reindex the given pages
    Reindex {
        #[command(flatten)]
        source: SiteSource,

        /// Also reindex every descendant
        #[arg(long)]
        descendants: bool,

        /// Node ids
        #[arg(required = true, num_args = 1..)]
        ids: Vec<NodeId>,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Render pages into the cache
    Render {
        /// JSON export of the content tree
        #[arg(long)]
        site: String,

        /// redb cache file
        #[arg(long)]
        cache: String,

        /// Render only this page and its descendants
        #[arg(long)]
        node: Option<NodeId>,
    },

    /// Print the cached HTML of one page
    Get {
        /// redb cache file
        #[arg(long)]
        cache: String,

        /// Node id
        id: NodeId,
    },

    /// Print the number of cached pages
    Count {
        /// redb cache file
        #[arg(long)]
        cache: String,
    },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_search() {
        let args = Args::try_parse_from([
            "pagesearch",
            "search",
            "electric guitars",
            "--index",
            "/tmp/idx",
            "--mode",
            "multi-and",
            "--roots",
            "1050,1060",
            "--format",
            "json",
        ])
        .unwrap();
        match args.command {
            Command::Search {
                term,
                shape,
                page,
                page_length,
                format,
                ..
            } => {
                assert_eq!(term, "electric guitars");
                assert_eq!(SearchMode::from(shape.mode), SearchMode::MultiAnd);
                assert_eq!(shape.roots, "1050,1060");
                assert_eq!(page, 1);
                assert_eq!(page_length, 10);
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_reindex_requires_ids() {
        let result = Args::try_parse_from([
            "pagesearch",
            "index",
            "reindex",
            "--site",
            "site.json",
            "--index",
            "idx",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cache_only_requires_cache() {
        let result = Args::try_parse_from([
            "pagesearch",
            "index",
            "rebuild",
            "--site",
            "site.json",
            "--index",
            "idx",
            "--cache-only",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_config_flag() {
        let args =
            Args::try_parse_from(["pagesearch", "config", "path", "--config", "/etc/ps.toml"])
                .unwrap();
        assert_eq!(args.config.as_deref(), Some("/etc/ps.toml"));
        assert!(matches!(
            args.command,
            Command::Config {
                action: ConfigAction::Path
            }
        ));
    }
}
