use anyhow::{Context, Result as AnyhowResult};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tessera::app::{OpenMode, WindowAction, WindowServer};
use tessera::config::Config;
use tessera::model::ids::{Orientation, PaneId, WindowId};
use tessera::services::dialogs::{
    BatchChoice, Dialogs, FileChange, FileChangeChoice, HeadlessDialogs, SaveChoice,
};
use tessera::services::fs::LocalFileSystem;
use tracing_subscriber::EnvFilter;

/// Multi-window, multi-pane editor core driven from a command prompt
#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(about = "Multi-window split-pane editor core", long_about = None)]
#[command(version)]
struct Args {
    /// Files to open at startup
    #[arg(value_name = "FILES")]
    files: Vec<PathBuf>,

    /// Open each file in a window of its own
    #[arg(long)]
    new_window: bool,

    /// Open files side by side, splitting horizontally (h) or vertically (v)
    #[arg(long, value_name = "h|v")]
    split: Option<Orientation>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Path to log file (default: system temp dir)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print the JSON Schema of the configuration file and exit
    #[arg(long)]
    print_config_schema: bool,

    /// Decline every prompt instead of asking (scripted sessions)
    #[arg(long)]
    headless: bool,
}

/// Dialogs answered on the terminal
struct StdinDialogs;

impl StdinDialogs {
    fn ask(&self, question: &str) -> String {
        print!("{} ", question);
        let _ = io::stdout().flush();
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return String::new();
        }
        line.trim().to_string()
    }

    fn yes(&self, question: &str) -> bool {
        matches!(self.ask(question).as_str(), "y" | "yes")
    }
}

impl Dialogs for StdinDialogs {
    fn confirm_save(&mut self, name: &str) -> SaveChoice {
        match self
            .ask(&format!("Save changes to {}? [s]ave/[d]iscard/[c]ancel", name))
            .as_str()
        {
            "s" | "save" => SaveChoice::Save,
            "d" | "discard" => SaveChoice::Discard,
            _ => SaveChoice::Cancel,
        }
    }

    fn confirm_batch(&mut self, names: &[String]) -> BatchChoice {
        println!("Unsaved documents:");
        for (i, name) in names.iter().enumerate() {
            println!("  {}. {}", i + 1, name);
        }
        let answer = self.ask("[s]ave all/[d]iscard all/numbers to save/[c]ancel");
        match answer.as_str() {
            "s" | "save" => BatchChoice::SaveAll,
            "d" | "discard" => BatchChoice::DiscardAll,
            "" | "c" | "cancel" => BatchChoice::Cancel,
            other => {
                let selected: Vec<String> = other
                    .split_whitespace()
                    .filter_map(|n| n.parse::<usize>().ok())
                    .filter_map(|n| names.get(n.wrapping_sub(1)).cloned())
                    .collect();
                if selected.is_empty() {
                    BatchChoice::Cancel
                } else {
                    BatchChoice::SaveSelected(selected)
                }
            }
        }
    }

    fn confirm_create(&mut self, path: &Path) -> bool {
        self.yes(&format!("{} does not exist. Create it? [y/n]", path.display()))
    }

    fn confirm_move_here(&mut self, path: &Path) -> bool {
        self.yes(&format!(
            "{} is open in another window. Move it here? [y/n]",
            path.display()
        ))
    }

    fn file_changed(&mut self, name: &str, change: FileChange) -> FileChangeChoice {
        let what = match change {
            FileChange::Altered => "was changed on disk",
            FileChange::Removed => "was removed from disk",
        };
        let answer = self.ask(&format!(
            "{} {}. [r]eload/[s]ave again/save [a]s PATH/[i]gnore/[c]lose",
            name, what
        ));
        let mut words = answer.splitn(2, ' ');
        match (words.next().unwrap_or(""), words.next()) {
            ("r", _) => FileChangeChoice::Reload,
            ("s", _) => FileChangeChoice::SaveAgain,
            ("a", Some(path)) => FileChangeChoice::SaveAs(PathBuf::from(path.trim())),
            ("c", _) => FileChangeChoice::Close,
            _ => FileChangeChoice::Ignore,
        }
    }

    fn ask_save_path(&mut self, name: &str) -> Option<PathBuf> {
        let answer = self.ask(&format!("Save {} as (empty to cancel):", name));
        (!answer.is_empty()).then(|| PathBuf::from(answer))
    }

    fn report(&mut self, message: &str) {
        eprintln!("! {}", message);
    }
}

fn init_tracing(log_file: &Path) -> AnyhowResult<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tessera=info")),
        )
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))
}

fn load_config(path: Option<&Path>) -> AnyhowResult<Config> {
    match path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(Config::load_or_default()),
    }
}

fn real_main() -> AnyhowResult<()> {
    let args = Args::parse();

    if args.print_config_schema {
        println!("{}", Config::json_schema());
        return Ok(());
    }

    let log_file = args
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("tessera.log"));
    init_tracing(&log_file)?;

    let config = load_config(args.config.as_deref())?;
    tracing::info!("starting with {} file(s)", args.files.len());

    let dialogs: Box<dyn Dialogs> = if args.headless {
        Box::new(HeadlessDialogs)
    } else {
        Box::new(StdinDialogs)
    };
    let mut server = WindowServer::new(config, dialogs, Arc::new(LocalFileSystem::new()));

    let mode = if args.new_window {
        OpenMode::NewWindow
    } else {
        server.config().layout.open_mode
    };
    for file in &args.files {
        let result = match args.split {
            Some(orientation) => server.open_in_direction(file, orientation).map(|_| ()),
            None => server.open(file, mode).map(|_| ()),
        };
        if let Err(e) = result {
            eprintln!("{}: {}", file.display(), e);
        }
    }
    if server.window_count() == 0 {
        server.new_window();
    }

    run_prompt(&mut server)
}

const HELP: &str = "\
commands:
  list                      show windows, views and panes
  split h|v [clone]         split the active pane
  close                     close the active pane
  close-window              close the active window
  close-all                 close everything and quit
  detach                    move the active pane into a new window
  to-main                   move the active pane into the main window
  move PANE WINDOW          move a pane into a window's front view
  focus PANE                focus a pane
  next | prev               cycle panes in the active view
  view                      add a view to the active window
  open PATH [h|v]           open a file, optionally beside the active pane
  edit TEXT                 replace the active pane's text
  save [PATH]               save the active pane, optionally under PATH
  save-all                  save every modified document
  check                     look for files changed on disk
  quit                      close everything and exit";

fn run_prompt(server: &mut WindowServer) -> AnyhowResult<()> {
    let stdin = io::stdin();
    loop {
        server.process_async_messages();
        if server.window_count() == 0 {
            return Ok(());
        }
        print!("{}> ", prompt_title(server));
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).context("Failed to read command")? == 0 {
            return Ok(());
        }
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let rest: Vec<&str> = words.collect();

        let active = server.active_pane();
        let window = server.active_window();
        let result = match (command, rest.as_slice(), active, window) {
            ("help", _, _, _) => {
                println!("{}", HELP);
                Ok(())
            }
            ("list", _, _, _) => {
                print_layout(server);
                Ok(())
            }
            ("split", [o, flags @ ..], _, _) => match o.parse::<Orientation>() {
                Ok(o) => server
                    .split_active_pane(o, flags.first() == Some(&"clone"))
                    .map(|_| ()),
                Err(e) => {
                    eprintln!("{}", e);
                    Ok(())
                }
            },
            ("close", _, Some(_), Some(w)) => server.dispatch(w, WindowAction::CloseActivePane),
            ("close-window", _, _, Some(w)) => server.dispatch(w, WindowAction::Close),
            ("detach", _, Some(_), Some(w)) => server.dispatch(w, WindowAction::DetachActivePane),
            ("to-main", _, Some(_), Some(w)) => {
                server.dispatch(w, WindowAction::MoveActivePaneToMain)
            }
            ("move", [pane, window], _, _) => match (parse_id(pane), parse_id(window)) {
                (Some(p), Some(w)) => server.reparent_to_main(PaneId(p), WindowId(w)).map(|_| ()),
                _ => {
                    eprintln!("usage: move PANE WINDOW");
                    Ok(())
                }
            },
            ("focus", [pane], _, _) => {
                if let Some(p) = parse_id(pane) {
                    server.focus_pane(PaneId(p));
                }
                Ok(())
            }
            ("next", _, _, Some(w)) => server.dispatch(w, WindowAction::NextPane),
            ("prev", _, _, Some(w)) => server.dispatch(w, WindowAction::PrevPane),
            ("view", _, _, Some(w)) => server.dispatch(w, WindowAction::NewView),
            ("open", [path], _, _) => {
                let mode = server.config().layout.open_mode;
                server.open(Path::new(path), mode).map(|_| ())
            }
            ("open", [path, o], _, _) => match o.parse::<Orientation>() {
                Ok(o) => server.open_in_direction(Path::new(path), o).map(|_| ()),
                Err(e) => {
                    eprintln!("{}", e);
                    Ok(())
                }
            },
            ("edit", text, Some(p), _) => server.edit(p, &text.join(" ")),
            ("save", [], Some(p), _) => server.save_pane(p),
            ("save", [path], Some(p), _) => server.save_pane_as(p, Path::new(path)),
            ("save-all", _, _, _) => server.save_all().map(|n| println!("saved {}", n)),
            ("check", _, _, _) => {
                server.check_files_now();
                Ok(())
            }
            ("close-all" | "quit", _, _, _) => match server.close_all() {
                Ok(()) => return Ok(()),
                Err(e) => Err(e),
            },
            _ => {
                eprintln!("unknown command; try 'help'");
                Ok(())
            }
        };
        if let Err(e) = result {
            tracing::debug!("{} failed: {}", command, e);
            eprintln!("{}", e);
        }
    }
}

fn parse_id(word: &str) -> Option<usize> {
    word.trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .parse()
        .ok()
}

fn prompt_title(server: &WindowServer) -> String {
    server
        .active_window()
        .and_then(|w| server.window_title(w).map(|t| format!("{} {}", w, t)))
        .unwrap_or_default()
}

fn print_layout(server: &WindowServer) {
    let main = server.main_window();
    for window in server.windows() {
        let marker = if Some(window) == main { " (main)" } else { "" };
        println!("{}{}", window, marker);
        for view in server.views_of(window) {
            let layout = server
                .layout_of(view)
                .map(|l| l.to_string())
                .unwrap_or_default();
            println!("  {} {}", view, layout);
            for pane in server.panes_of(view) {
                let name = server
                    .document_of_pane(pane)
                    .map(|d| d.display_name())
                    .unwrap_or_default();
                let modified = if server.is_modified(pane) { "*" } else { "" };
                let clones = server.clone_peers(pane);
                let active = if server.active_pane_of(view) == Some(pane) {
                    ">"
                } else {
                    " "
                };
                println!("   {}{} {}{} clones={:?}", active, pane, name, modified, clones);
            }
        }
    }
}

fn main() -> AnyhowResult<()> {
    real_main()
}
