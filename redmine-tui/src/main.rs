//! Redmine assistant terminal client entry point.

use crossterm::{
    event::{self, Event as CrosstermEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use redmine_tui::api_client::ApiClient;
use redmine_tui::config::TuiConfig;
use redmine_tui::error::TuiError;
use redmine_tui::events::TuiEvent;
use redmine_tui::keys::{map_key, Action};
use redmine_tui::notifications::NotificationLevel;
use redmine_tui::state::App;
use redmine_tui::view::render_view;
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;

const PAGE_LINES: u16 = 10;

#[tokio::main]
async fn main() -> Result<(), TuiError> {
    let config = TuiConfig::load()?;
    let api = ApiClient::new(&config)?;
    let mut app = App::new(config, api);

    let mut terminal = setup_terminal()?;
    let _guard = TerminalGuard;

    let (event_tx, mut event_rx) = mpsc::channel::<TuiEvent>(256);
    spawn_input_reader(event_tx.clone());

    let mut ticker = tokio::time::interval(Duration::from_millis(250));

    loop {
        terminal.draw(|f| render_view(f, &mut app))?;

        tokio::select! {
            _ = ticker.tick() => {
                expire_notifications(&mut app);
            }
            Some(event) = event_rx.recv() => {
                if handle_event(&mut app, event, &event_tx) {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen);
    }
}

fn spawn_input_reader(sender: mpsc::Sender<TuiEvent>) {
    std::thread::spawn(move || loop {
        if let Ok(true) = event::poll(Duration::from_millis(200)) {
            if let Ok(evt) = event::read() {
                let sent = match evt {
                    CrosstermEvent::Key(key) => sender.blocking_send(TuiEvent::Input(key)),
                    CrosstermEvent::Resize(width, height) => {
                        sender.blocking_send(TuiEvent::Resize { width, height })
                    }
                    _ => Ok(()),
                };
                if sent.is_err() {
                    break;
                }
            }
        }
    });
}

fn expire_notifications(app: &mut App) {
    let now = chrono::Utc::now();
    app.notifications.retain(|n| !n.is_stale(now, 8));
}

/// Returns true when the app should exit.
fn handle_event(app: &mut App, event: TuiEvent, sender: &mpsc::Sender<TuiEvent>) -> bool {
    match event {
        TuiEvent::Input(key) => {
            if let Some(action) = map_key(key) {
                return handle_action(app, action, sender);
            }
        }
        TuiEvent::ChatReplied(response) => app.apply_reply(response),
        TuiEvent::ChatFailed { query, error } => {
            app.apply_failure(&query, format!("Assistant unreachable: {}", error));
        }
        TuiEvent::SessionReset(Ok(session_id)) => {
            app.notify(NotificationLevel::Info, format!("Session {} cleared", session_id));
        }
        TuiEvent::SessionReset(Err(error)) => {
            app.notify(NotificationLevel::Error, format!("Session reset failed: {}", error));
        }
        TuiEvent::Resize { .. } => {}
    }
    false
}

fn handle_action(app: &mut App, action: Action, sender: &mpsc::Sender<TuiEvent>) -> bool {
    match action {
        Action::Quit => return true,
        Action::Send => {
            if let Some(request) = app.submit_input() {
                let api = app.api.clone();
                let sender = sender.clone();
                tokio::spawn(async move {
                    let event = match api.chat(&request).await {
                        Ok(response) => TuiEvent::ChatReplied(response),
                        Err(err) => TuiEvent::ChatFailed {
                            query: request.query,
                            error: err.to_string(),
                        },
                    };
                    let _ = sender.send(event).await;
                });
            }
        }
        Action::ClearChat => {
            if let Some(session_id) = app.clear_chat() {
                let api = app.api.clone();
                let sender = sender.clone();
                tokio::spawn(async move {
                    let result = api
                        .reset_session(&session_id)
                        .await
                        .map(|r| r.session_id)
                        .map_err(|e| e.to_string());
                    let _ = sender.send(TuiEvent::SessionReset(result)).await;
                });
            }
        }
        Action::ScrollUp => app.scroll_up(1),
        Action::ScrollDown => app.scroll_down(1),
        Action::PageUp => app.scroll_up(PAGE_LINES),
        Action::PageDown => app.scroll_down(PAGE_LINES),
        Action::Edit(key) => app.edit(key),
    }
    false
}
