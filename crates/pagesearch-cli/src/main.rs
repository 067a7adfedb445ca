//! Pagesearch CLI
//!
//! Builds and queries page indexes offline: config management, query
//! previews, searches against a Tantivy index, and index and cache
//! maintenance from a JSON export of the content tree.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod cli;
mod config_handlers;
mod index_handlers;
mod search_handlers;
mod site;

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use pagesearch_core::SearchConfig;

use cli::{Args, Command};
use index_handlers::CacheOutcome;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "info,pagesearch=debug,pagesearch_core=debug,pagesearch_fts=debug,pagesearch_index=debug"
    } else {
        "warn,pagesearch=info,pagesearch_index=info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let config_path = args.config.as_deref();
    match args.command {
        Command::Config { action } => {
            config_handlers::handle_config_command(config_path, action)?;
        }
        Command::Query { term, shape } => {
            let config = SearchConfig::load(config_path)?;
            println!("{}", search_handlers::cmd_query(config, &term, &shape)?);
        }
        Command::Search {
            term,
            index,
            shape,
            page,
            page_length,
            format,
        } => {
            let config = SearchConfig::load(config_path)?;
            let output = search_handlers::cmd_search(
                config,
                Path::new(&index),
                &term,
                &shape,
                page,
                page_length,
                format,
            )
            .await?;
            println!("{output}");
        }
        Command::Index { action } => {
            let config = SearchConfig::load(config_path)?;
            let report = index_handlers::handle_index_command(config, action).await?;
            tracing::info!(
                indexed = report.indexed,
                skipped = report.skipped,
                failed = report.failed,
                "Index run finished"
            );
            println!("{}", index_handlers::describe_index_report(&report));
        }
        Command::Cache { action } => {
            let config = SearchConfig::load(config_path)?;
            match index_handlers::handle_cache_command(config, action).await? {
                CacheOutcome::Rendered(report) => {
                    println!(
                        "Rendered {} pages to cache ({} without HTML, {} failed)",
                        report.cached, report.not_cached, report.failed
                    );
                }
                CacheOutcome::Html(Some(html)) => println!("{html}"),
                CacheOutcome::Html(None) => anyhow::bail!("Page is not cached"),
                CacheOutcome::Count(count) => println!("{count}"),
            }
        }
    }

    Ok(())
}
