use clap::Parser;
use color_eyre::Result;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use leadgrid::{App, AppConfig, AppEvent, OpenOptions, Theme};
use leadgrid_cli::Args;
use ratatui::DefaultTerminal;
use std::sync::mpsc::channel;

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(mut terminal: DefaultTerminal, args: &Args, config: AppConfig, theme: Theme) -> Result<()> {
    let (tx, rx) = channel::<AppEvent>();
    let poll_interval = std::time::Duration::from_millis(config.performance.event_poll_interval_ms);
    let mut app = App::new_with_config(tx.clone(), theme, config.clone());
    if args.debug {
        app.enable_debug();
    }
    let opts = OpenOptions::from_args_and_config(args, &config);
    render(&mut terminal, &mut app)?;
    if let Some(path) = &args.path {
        tx.send(AppEvent::Open(path.clone(), opts))?;
    }

    loop {
        if crossterm::event::poll(poll_interval)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Mouse(mouse) => tx.send(AppEvent::Mouse(mouse))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let mut updated = match rx.recv_timeout(std::time::Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    AppEvent::Crash(msg) => {
                        return Err(color_eyre::eyre::eyre!(msg));
                    }
                    event => {
                        if let Some(event) = app.event(&event) {
                            tx.send(event)?;
                        }
                    }
                }
                true
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => false,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };

        // Debounced side effects (rename, field search) fire between events
        if app.tick() {
            updated = true;
        }

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
    Ok(())
}

/// Handle flags that complete without entering the TUI. Returns Some(())
/// when the process should exit.
fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.clear_cache {
        match leadgrid::CacheManager::new(leadgrid::APP_NAME) {
            Ok(cache) => {
                if let Err(e) = cache.clear_all() {
                    eprintln!("Error clearing cache: {}", e);
                    std::process::exit(1);
                }
                println!("Cache cleared successfully");
                return Ok(Some(()));
            }
            Err(_e) => {
                println!("No cache to clear");
                return Ok(Some(()));
            }
        }
    }

    if args.generate_config {
        match leadgrid::ConfigManager::new(leadgrid::APP_NAME) {
            Ok(config_manager) => match config_manager.write_default_config(args.force) {
                Ok(path) => {
                    println!("Wrote default config to {}", path.display());
                    return Ok(Some(()));
                }
                Err(e) => {
                    eprintln!("Error writing config: {}", e);
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("Error initializing config manager: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(None)
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    if handle_early_exit_flags(&args)?.is_some() {
        return Ok(());
    }

    let config = match AppConfig::load(leadgrid::APP_NAME) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {}. Using default configuration.", e);
            AppConfig::default()
        }
    };

    let theme = match Theme::from_config(&config.theme) {
        Ok(theme) => theme,
        Err(e) => {
            eprintln!("Warning: {}. Using default theme.", e);
            Theme::from_config(&AppConfig::default().theme).unwrap_or_else(|_| Theme {
                colors: std::collections::HashMap::new(),
            })
        }
    };

    let terminal = ratatui::init();
    execute!(std::io::stdout(), EnableMouseCapture)?;
    let result = run(terminal, &args, config, theme);
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();
    result
}
