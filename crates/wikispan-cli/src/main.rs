use anyhow::{Context, Result, bail};
use std::{env, fs, path::PathBuf, process, sync::Arc};
use wikispan_config::Config;
use wikispan_engine::{Document, NodeKind, PlainTextOptions, WikiNode, snapshot};

const USAGE: &str = "\
Usage:
  wikispan [--config <path>] outline <file>
  wikispan [--config <path>] text <file>
  wikispan [--config <path>] list <kind> <file>
  wikispan [--config <path>] config";

enum Command {
    Outline(PathBuf),
    Text(PathBuf),
    List(NodeKind, PathBuf),
    Config,
}

struct Args {
    config: Option<PathBuf>,
    command: Command,
}

fn parse_args(mut args: Vec<String>) -> Result<Args> {
    let mut config = None;
    if let Some(i) = args.iter().position(|a| a == "--config") {
        if i + 1 >= args.len() {
            bail!("--config needs a path");
        }
        config = Some(PathBuf::from(args.remove(i + 1)));
        args.remove(i);
    }

    let command = match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["outline", file] => Command::Outline(PathBuf::from(file)),
        ["text", file] => Command::Text(PathBuf::from(file)),
        ["list", kind, file] => Command::List(
            kind.parse().map_err(anyhow::Error::msg)?,
            PathBuf::from(file),
        ),
        ["config"] => Command::Config,
        _ => bail!("unrecognized arguments: {args:?}"),
    };
    Ok(Args { config, command })
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            log::info!("Loading config from {}", path.display());
            Config::load_from_path(path)?
                .with_context(|| format!("no config file at {}", path.display()))
        }
        None => {
            log::info!("Config path: {}", Config::config_path().display());
            Ok(Config::load()?.unwrap_or_else(|| {
                log::info!("No config file found, using built-in lists");
                Config::default()
            }))
        }
    }
}

fn read_document(path: &PathBuf, config: Config) -> Result<Document> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    log::info!("Parsing {} ({} bytes)", path.display(), text.len());
    Ok(Document::parse_with_config(&text, Arc::new(config)))
}

fn run(args: Args) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    match args.command {
        Command::Outline(path) => {
            let doc = read_document(&path, config)?;
            print!("{}", snapshot::outline(&doc)?);
        }
        Command::Text(path) => {
            let doc = read_document(&path, config)?;
            print!("{}", doc.plain_text(&PlainTextOptions::default())?);
        }
        Command::List(kind, path) => {
            let doc = read_document(&path, config)?;
            let nodes = doc.descendants(kind)?;
            log::info!("Found {} {kind} nodes", nodes.len());
            for node in nodes {
                let span = node.span()?;
                println!("{}..{}\t{:?}", span.start, span.end, node.string()?);
            }
        }
        Command::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = match parse_args(env::args().skip(1).collect()) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{USAGE}");
            process::exit(2);
        }
    };
    run(args)
}
