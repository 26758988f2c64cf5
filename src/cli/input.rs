//! Keyboard and interrupt input for the interactive loop

use std::io::BufRead;
use std::thread;

use tokio::sync::mpsc;
use tracing::debug;

/// Something the user did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A line was entered
    Enter,
    /// `q` was entered
    Quit,
    /// Ctrl-C
    Interrupt,
}

/// Interpret one line typed by the user
pub fn parse_line(line: &str) -> InputEvent {
    match line.trim().to_ascii_lowercase().as_str() {
        "q" | "quit" | "exit" => InputEvent::Quit,
        _ => InputEvent::Enter,
    }
}

/// Start listening for keyboard lines and Ctrl-C.
///
/// Stdin is read on a detached thread: a blocking read cannot be cancelled
/// and must not hold up runtime shutdown.
pub fn spawn_input() -> mpsc::UnboundedReceiver<InputEvent> {
    let (tx, rx) = mpsc::unbounded_channel();

    let keyboard = tx.clone();
    let spawned = thread::Builder::new()
        .name("audioprint-stdin".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if keyboard.send(parse_line(&line)).is_err() {
                    break;
                }
            }
            debug!("Stdin closed");
        });
    if let Err(e) = spawned {
        debug!(error = %e, "Keyboard input unavailable");
    }

    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if tx.send(InputEvent::Interrupt).is_err() {
                break;
            }
        }
    });

    rx
}
