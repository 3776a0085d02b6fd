mod app;
mod event;
mod ui;

use anyhow::Result;
use crossterm::{
    event::{
        DisableBracketedPaste, DisableFocusChange, DisableMouseCapture, EnableBracketedPaste,
        EnableFocusChange, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;

use livecode_config::Config;
use livecode_logger::LogLevel;

use app::{App, Document};

fn init_logging(config: &Config) {
    let logging = &config.logging;
    let path = match &logging.file_path {
        Some(path) => PathBuf::from(path),
        None => match Config::default_log_path() {
            Ok(path) => path,
            Err(e) => {
                eprintln!("Logging disabled: {}", e);
                return;
            }
        },
    };
    let level = logging.min_level.parse().unwrap_or(LogLevel::Info);
    livecode_logger::init(path, logging.max_entries, level);
}

fn main() -> Result<()> {
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Using default configuration: {:#}", e);
        Config::default()
    });
    init_logging(&config);

    let document = match std::env::args_os().nth(1) {
        Some(path) => Document::open(PathBuf::from(path))?,
        None => Document::scratch(),
    };
    let mut app = App::new(&config, document)?;

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();

    // Kitty protocol: needed to tell Ctrl+Shift+D from Ctrl+D
    let keyboard_enhanced = supports_keyboard_enhancement().unwrap_or(false);

    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange,
        EnableBracketedPaste
    )?;

    if keyboard_enhanced {
        // REPORT_ALL_KEYS_AS_ESCAPE_CODES would turn bare modifiers into key events
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_ALTERNATE_KEYS
            )
        )?;
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    if keyboard_enhanced {
        let _ = execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags);
    }
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableFocusChange,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    report(result)
}

/// Log a failed editor loop; the error still becomes the exit status
fn report(result: Result<()>) -> Result<()> {
    if let Err(err) = &result {
        log::error!("Editor loop failed: {:#}", err);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_run_is_returned() {
        let err = report(Err(anyhow::anyhow!("terminal gone"))).unwrap_err();
        assert_eq!(err.to_string(), "terminal gone");
        assert!(report(Ok(())).is_ok());
    }
}
