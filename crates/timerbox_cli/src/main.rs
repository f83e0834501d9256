use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::sync::Arc;
use timerbox_cli::cli::{Cli, Command};
use timerbox_cli::render;
use timerbox_core::config::{Config, ConfigOverrides, Palette, load_config_with_fallback, merge_overrides};
use timerbox_core::error::AppError;
use timerbox_core::export::{ExportFormat, local_offset};
use timerbox_core::model::Timer;
use timerbox_core::notify::notifier_for;
use timerbox_core::runtime::{CompletionEvent, StartOutcome};
use timerbox_core::scheduler::Tick;
use timerbox_core::storage::FileStore;
use timerbox_core::timer_api::parse_duration;
use timerbox_core::{TimerApi, TimerEdit};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "TIMERBOX_LOG";

struct Session {
    api: TimerApi,
    config: Config,
    palette: Palette,
    data_dir: PathBuf,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(format!("timerbox_core={level},timerbox={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn open_session(config_overrides: &[String]) -> Result<Session, AppError> {
    let loaded = load_config_with_fallback();
    if let Some(err) = loaded.error.as_ref() {
        warn!(error = %err, "using default configuration");
    }
    let overrides = ConfigOverrides::parse(config_overrides)?;
    let config = merge_overrides(&loaded.config, &overrides);

    let store = FileStore::open_default()?;
    let data_dir = store.dir().to_path_buf();
    let notifier = notifier_for(config.notifications_enabled());
    let api = TimerApi::open(Arc::new(store), notifier)
        .await
        .with_default_category(config.default_category());
    debug!(data_dir = %data_dir.display(), "session opened");

    Ok(Session {
        api,
        palette: config.palette(),
        config,
        data_dir,
    })
}

fn print_timer(verb: &str, timer: &Timer, json: bool) {
    if json {
        println!("{}", serde_json::json!(timer));
    } else {
        println!("{}", render::timer_line(verb, timer));
    }
}

fn print_missing(id: &str, json: bool) {
    if json {
        println!("{}", serde_json::Value::Null);
    } else {
        println!("No timer matches {id}");
    }
}

fn print_completion(event: &CompletionEvent, json: bool, palette: &Palette) {
    if json {
        println!("{}", serde_json::json!({ "completed": event }));
    } else {
        println!("{}", render::completion_plain(event, palette));
    }
}

fn resolve_id(session: &Session, needle: &str) -> Option<String> {
    session.api.resolve(needle).map(|timer| timer.id.clone())
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

/// Splits an interactive line into arguments. Double or single quotes group
/// words; a backslash escapes the next character inside double quotes.
fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match quote {
            Some('"') if ch == '\\' => match chars.next() {
                Some(next) => current.push(next),
                None => current.push('\\'),
            },
            Some(open) if ch == open => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_word = true;
            }
            None if ch.is_whitespace() => {
                if in_word {
                    args.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(ch);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }
    if in_word {
        args.push(current);
    }
    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

async fn run_command(session: &mut Session, cli: Cli) -> Result<(), AppError> {
    let json = cli.json;
    match cli.command {
        Command::Add {
            name,
            duration,
            category,
            halfway_alert,
        } => {
            let name = match name {
                Some(value) if !value.trim().is_empty() => value,
                _ => return Err(AppError::invalid_input("name is required")),
            };
            let duration = match duration {
                Some(value) => parse_duration(&value)?,
                None => return Err(AppError::invalid_input("duration is required")),
            };
            let timer = session
                .api
                .create_timer(&name, duration, category.as_deref(), halfway_alert)
                .await?;
            print_timer("Added timer", &timer, json);
        }
        Command::Edit {
            id,
            name,
            duration,
            category,
            halfway_alert,
        } => {
            let edit = TimerEdit {
                name,
                duration: duration.as_deref().map(parse_duration).transpose()?,
                category,
                halfway_alert,
            };
            let Some(full_id) = resolve_id(session, &id) else {
                print_missing(&id, json);
                return Ok(());
            };
            match session.api.edit_timer(&full_id, edit).await? {
                Some(timer) => print_timer("Updated timer", &timer, json),
                None => print_missing(&id, json),
            }
        }
        Command::Delete { id } => {
            let removed = match resolve_id(session, &id) {
                Some(full_id) => session.api.delete_timer(&full_id).await,
                None => None,
            };
            match removed {
                Some(timer) => print_timer("Deleted timer", &timer, json),
                None => print_missing(&id, json),
            }
        }
        Command::List { category } => {
            let groups = session.api.grouped(category.as_deref());
            if json {
                println!("{}", render::timer_groups_json(&groups));
            } else {
                println!("{}", render::timer_groups_plain(&groups, &session.palette));
            }
        }
        Command::Start { id } => {
            let Some(full_id) = resolve_id(session, &id) else {
                print_missing(&id, json);
                return Ok(());
            };
            let outcome = session.api.start(&full_id).await;
            let Some(timer) = session.api.timer(&full_id).cloned() else {
                print_missing(&id, json);
                return Ok(());
            };
            match outcome {
                Some(StartOutcome::Started) => print_timer("Started timer", &timer, json),
                Some(StartOutcome::AlreadyRunning) => {
                    print_timer("Timer already running", &timer, json)
                }
                Some(StartOutcome::NothingRemaining) | None => {
                    print_timer("No time remaining, reset first", &timer, json)
                }
            }
        }
        Command::Pause { id } => {
            let paused = match resolve_id(session, &id) {
                Some(full_id) => session.api.pause(&full_id).await,
                None => None,
            };
            match paused {
                Some(timer) => print_timer("Paused timer", &timer, json),
                None => print_missing(&id, json),
            }
        }
        Command::Reset { id } => {
            let reset = match resolve_id(session, &id) {
                Some(full_id) => session.api.reset(&full_id).await,
                None => None,
            };
            match reset {
                Some(timer) => print_timer("Reset timer", &timer, json),
                None => print_missing(&id, json),
            }
        }
        Command::Bulk { action, category } => {
            let affected = session.api.bulk(&category, action.into()).await;
            if json {
                println!("{}", serde_json::json!(affected));
            } else {
                println!(
                    "{:?} applied to {} timer(s) in {}",
                    action,
                    affected.len(),
                    category
                );
            }
        }
        Command::History => {
            let entries = session.api.history();
            if json {
                println!("{}", serde_json::json!(entries));
            } else {
                println!(
                    "{}",
                    render::history_plain(&entries, local_offset(), &session.palette)
                );
            }
        }
        Command::ClearHistory => {
            let count = session.api.history().len();
            session.api.clear_history().await;
            if json {
                println!("{}", serde_json::json!({ "cleared": count }));
            } else {
                println!("Cleared {count} history entries");
            }
        }
        Command::Export { format, output } => {
            let format = ExportFormat::from(format);
            let destination = output.unwrap_or_else(|| {
                session
                    .config
                    .export_dir
                    .clone()
                    .unwrap_or_else(|| session.data_dir.clone())
                    .join(format.default_file_name())
            });
            let path = session.api.export_history(format, &destination).await?;
            if json {
                println!("{}", serde_json::json!({ "path": path }));
            } else {
                println!("Exported history to {}", path.display());
            }
        }
    }

    Ok(())
}

/// Counts down running timers until they finish or Ctrl-C arrives, then
/// flushes everything.
async fn run_foreground(session: &mut Session, json: bool) {
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    while session.api.has_running() {
        let tick = tokio::select! {
            tick = session.api.next_tick() => tick,
            _ = &mut interrupt => {
                eprintln!("Interrupted, pausing running timers");
                break;
            }
        };
        let Some(tick) = tick else {
            break;
        };
        if let Some(event) = session.api.apply_tick(tick).await {
            print_completion(&event, json, &session.palette);
        }
    }

    session.api.shutdown().await;
}

enum Input {
    Line(Option<String>),
    Tick(Option<Tick>),
}

async fn run_interactive(session: &mut Session) -> Result<(), AppError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let input = tokio::select! {
            line = lines.next_line() => {
                Input::Line(line.map_err(|err| AppError::io(err.to_string()))?)
            }
            tick = session.api.next_tick() => Input::Tick(tick),
        };

        let line = match input {
            Input::Tick(Some(tick)) => {
                if let Some(event) = session.api.apply_tick(tick).await {
                    print_completion(&event, false, &session.palette);
                }
                continue;
            }
            Input::Tick(None) | Input::Line(None) => break,
            Input::Line(Some(line)) => line,
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("timerbox".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if !cli.config_override.is_empty() {
            eprintln!("ERROR: invalid_input - config overrides apply at startup only");
            continue;
        }

        if let Err(err) = run_command(session, cli).await {
            eprintln!("ERROR: {}", err);
        }
    }

    session.api.shutdown().await;
    Ok(())
}

#[tokio::main]
async fn main() {
    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        init_tracing(false);
        let result = match open_session(&[]).await {
            Ok(mut session) => run_interactive(&mut session).await,
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{err}");
            return;
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    init_tracing(cli.verbose);
    let json = cli.json;
    let mut session = match open_session(&cli.config_override).await {
        Ok(session) => session,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = run_command(&mut session, cli).await {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }

    run_foreground(&mut session, json).await;
}
