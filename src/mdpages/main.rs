use clap::Parser;
use directories::ProjectDirs;
use mdpages::api::{ConfigAction, MdPagesApi};
use mdpages::config::MdPagesConfig;
use mdpages::editor::edit_markdown;
use mdpages::error::{MdPagesError, Result};
use mdpages::session::SystemClock;
use mdpages::store::FsBackend;
use std::io::Read;
use std::path::PathBuf;

mod args;
mod print;
use args::{Cli, Commands};
use print::{print_config, print_document, print_documents, print_messages};

/// Overrides the data directory (documents and config.json).
const HOME_ENV: &str = "MDPAGES_HOME";

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

struct AppContext {
    api: MdPagesApi<FsBackend, SystemClock>,
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut ctx = init_context(&cli)?;

    let outcome = match cli.command {
        Some(Commands::List) | None => handle_list(&mut ctx),
        Some(Commands::New { name, content }) => handle_new(&mut ctx, name, content),
        Some(Commands::Rename { selector, name }) => handle_rename(&mut ctx, &selector, &name),
        Some(Commands::Clone { selector }) => handle_clone(&mut ctx, selector),
        Some(Commands::Rm { selector }) => handle_rm(&mut ctx, selector),
        Some(Commands::Use { selector }) => handle_use(&mut ctx, &selector),
        Some(Commands::Edit { file, stdin }) => handle_edit(&mut ctx, file, stdin),
        Some(Commands::Show { selector }) => handle_show(&mut ctx, selector),
        Some(Commands::Preview { selector, out }) => handle_preview(&mut ctx, selector, out),
        Some(Commands::Export { selector, out, .. }) => handle_export(&mut ctx, selector, out),
        Some(Commands::Sidebar { state }) => handle_sidebar(&mut ctx, state),
        Some(Commands::Config { key, value }) => handle_config(&ctx, key, value),
    };

    // Pending edits are committed even when the command itself failed.
    print_messages(&ctx.api.shutdown());
    outcome
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn data_dir() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    ProjectDirs::from("com", "mdpages", "mdpages")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| MdPagesError::Api("Could not determine data directory".into()))
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let data_dir = data_dir()?;
    log::debug!("data directory: {}", data_dir.display());

    let mut config = MdPagesConfig::load(&data_dir).unwrap_or_else(|e| {
        log::warn!("ignoring unreadable config: {}", e);
        MdPagesConfig::default()
    });
    if let Some(Commands::Export {
        strategy,
        format,
        orientation,
        artifact,
        ..
    }) = &cli.command
    {
        config.export_strategy = strategy.unwrap_or(config.export_strategy);
        config.page_format = format.unwrap_or(config.page_format);
        config.orientation = orientation.unwrap_or(config.orientation);
        config.export_artifact = artifact.unwrap_or(config.export_artifact);
    }

    let backend = FsBackend::new(data_dir.clone());
    let api = MdPagesApi::new(backend, SystemClock::default(), &config, data_dir);
    Ok(AppContext { api })
}

fn handle_list(ctx: &mut AppContext) -> Result<()> {
    let result = ctx.api.list_documents()?;
    print_documents(&result.listed_documents);
    print_messages(&result.messages);
    Ok(())
}

fn handle_new(ctx: &mut AppContext, name: Option<String>, content: Option<String>) -> Result<()> {
    let result = ctx
        .api
        .create_document(name.as_deref(), content.as_deref().unwrap_or_default())?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_rename(ctx: &mut AppContext, selector: &str, name: &str) -> Result<()> {
    let result = ctx.api.rename_document(selector, name)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_clone(ctx: &mut AppContext, selector: Option<String>) -> Result<()> {
    let result = ctx.api.clone_document(selector.as_deref())?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_rm(ctx: &mut AppContext, selector: Option<String>) -> Result<()> {
    let result = ctx.api.remove_document(selector.as_deref())?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_use(ctx: &mut AppContext, selector: &str) -> Result<()> {
    let result = ctx.api.select_document(selector)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_edit(ctx: &mut AppContext, file: Option<PathBuf>, stdin: bool) -> Result<()> {
    let content = if let Some(path) = file {
        std::fs::read_to_string(&path)?
    } else if stdin {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        let current = ctx.api.view_document(None)?;
        let initial = current
            .affected_documents
            .first()
            .map(|d| d.content.clone())
            .unwrap_or_default();
        edit_markdown(&initial)?
    };

    let result = ctx.api.update_active(&content)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_show(ctx: &mut AppContext, selector: Option<String>) -> Result<()> {
    let result = ctx.api.view_document(selector.as_deref())?;
    for document in &result.affected_documents {
        print_document(document);
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_preview(ctx: &mut AppContext, selector: Option<String>, out: Option<PathBuf>) -> Result<()> {
    let result = ctx.api.preview_document(selector.as_deref())?;
    if let Some(html) = &result.html {
        match out {
            Some(path) => {
                std::fs::write(&path, html)?;
                println!("Wrote {}", path.display());
            }
            None => print!("{}", html),
        }
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_export(ctx: &mut AppContext, selector: Option<String>, out: Option<PathBuf>) -> Result<()> {
    let out_dir = match out {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let result = ctx.api.export_document(selector.as_deref(), &out_dir)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_sidebar(ctx: &mut AppContext, state: Option<String>) -> Result<()> {
    let open = state.as_deref().map(parse_toggle).transpose()?;
    let result = ctx.api.sidebar(open)?;
    print_messages(&result.messages);
    Ok(())
}

fn parse_toggle(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "on" | "open" | "true" => Ok(true),
        "off" | "closed" | "false" => Ok(false),
        other => Err(MdPagesError::Api(format!(
            "Expected on or off, got '{}'",
            other
        ))),
    }
}

fn handle_config(ctx: &AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(key), None) => ConfigAction::ShowKey(key),
        (Some(key), Some(value)) => ConfigAction::Set(key, value),
    };
    let show_all = matches!(action, ConfigAction::ShowAll);

    let result = ctx.api.config(action)?;
    if show_all {
        if let Some(config) = &result.config {
            print_config(config);
        }
    }
    print_messages(&result.messages);
    Ok(())
}
