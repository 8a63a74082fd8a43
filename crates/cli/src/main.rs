// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{value_parser, Arg, Command};
use restapis_config::{Config, ConfigManager};
use restapis_list_sync::DEFAULT_PAGE_SIZE;
use std::path::PathBuf;

mod commands;

fn build_cli() -> Command {
    Command::new("restapis")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Advanced REST Client authors")
        .about("Browse, search and manage the REST APIs index")
        .arg(
            Arg::new("data")
                .short('d')
                .long("data")
                .value_name("FILE")
                .help("JSON file holding the index records")
                .default_value("apis.json")
                .global(true),
        )
        .arg(
            Arg::new("page-size")
                .long("page-size")
                .value_name("COUNT")
                .help("Records fetched per page")
                .value_parser(value_parser!(usize))
                .default_value("25")
                .global(true),
        )
        .arg(
            Arg::new("config-dir")
                .long("config-dir")
                .value_name("DIR")
                .help("Directory holding config.toml")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(Command::new("list").about("List every API in display order"))
        .subcommand(
            Command::new("search")
                .about("Filter the list by id, title or description")
                .arg(Arg::new("query").required(true).value_name("QUERY").help("Search query")),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete an API from the index")
                .arg(Arg::new("id").required(true).value_name("API_ID").help("API id to delete"))
                .arg(Arg::new("force").short('f').long("force").help("Skip confirmation prompt").action(clap::ArgAction::SetTrue)),
        )
        .subcommand(
            Command::new("open")
                .about("Print the navigation request for the API at a list position")
                .arg(
                    Arg::new("index")
                        .required(true)
                        .value_name("INDEX")
                        .help("Zero-based position in the list")
                        .value_parser(value_parser!(usize)),
                ),
        )
        .subcommand(Command::new("explore").about("Print the navigation request for the API catalog"))
}

fn load_config(config_dir: Option<&PathBuf>) -> Result<Config> {
    let manager = match config_dir {
        Some(dir) => ConfigManager::with_directory(dir.clone()),
        None => ConfigManager::new(),
    }
    .context("Failed to open configuration directory")?;

    manager
        .load_with_env_overrides()
        .context("Failed to load configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    let config = load_config(matches.get_one::<PathBuf>("config-dir"))?;

    // RUST_LOG, when set, takes precedence over the configured level
    env_logger::Builder::new()
        .filter_level(config.app.log_level.as_filter())
        .parse_default_env()
        .init();

    let data = matches
        .get_one::<String>("data")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("apis.json"));
    let page_size = matches
        .get_one::<usize>("page-size")
        .copied()
        .unwrap_or(DEFAULT_PAGE_SIZE);
    let session = commands::Session::new(data, page_size, config);

    match matches.subcommand() {
        Some(("list", _)) => commands::list_apis(&session).await,
        Some(("search", sub_matches)) => commands::search_apis(&session, sub_matches).await,
        Some(("delete", sub_matches)) => commands::delete_api(&session, sub_matches).await,
        Some(("open", sub_matches)) => commands::open_api(&session, sub_matches).await,
        Some(("explore", _)) => commands::open_explore(&session).await,
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}
