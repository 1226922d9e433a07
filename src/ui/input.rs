//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{
    can_add_field_char, can_add_identity_char, can_add_password_char, can_add_query_char, App,
    AppState, ConnectField, LoginFocus, SignupFocus, Tab, PAGE_SCROLL_SIZE,
};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Overlays take input before anything else
    match app.state {
        AppState::LoggingIn => return handle_login_input(app, key),
        AppState::SigningUp => return handle_signup_input(app, key),
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::Quitting => return Ok(true),
        AppState::Normal => {}
    }

    // Typing contexts swallow printable keys
    if app.current_tab == Tab::Query && app.query_editing {
        return handle_query_edit_input(app, key);
    }
    if app.current_tab == Tab::Connect {
        return handle_connect_input(app, key);
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return Ok(false);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        KeyCode::Char('l') => {
            app.logout();
            return Ok(false);
        }
        KeyCode::Char('1') => switch_tab(app, Tab::Query),
        KeyCode::Char('2') => switch_tab(app, Tab::Connect),
        KeyCode::Char('3') => switch_tab(app, Tab::Connections),
        KeyCode::Left => {
            let prev = app.current_tab.prev();
            switch_tab(app, prev);
        }
        KeyCode::Right => {
            let next = app.current_tab.next();
            switch_tab(app, next);
        }
        _ => {}
    }

    match app.current_tab {
        Tab::Query => handle_query_input(app, key),
        Tab::Connections => handle_connections_input(app, key),
        Tab::Connect => {}
    }

    Ok(false)
}

fn switch_tab(app: &mut App, tab: Tab) {
    app.current_tab = tab;
    // Lazily fetch saved connections the first time the tab is opened
    if tab == Tab::Connections && !app.connections_loaded {
        app.load_connections();
    }
}

// ============================================================================
// Query Tab
// ============================================================================

fn handle_query_input(app: &mut App, key: KeyEvent) {
    let row_count = app
        .query_response
        .as_ref()
        .map(|r| r.results.len())
        .unwrap_or(0);

    match key.code {
        KeyCode::Char('e') | KeyCode::Char('i') | KeyCode::Enter => {
            app.query_editing = true;
        }
        KeyCode::Char('t') => {
            app.query_db_type = app.query_db_type.toggle();
        }
        KeyCode::Up => {
            app.results_selection = app.results_selection.saturating_sub(1);
        }
        KeyCode::Down => {
            if row_count > 0 {
                app.results_selection = (app.results_selection + 1).min(row_count - 1);
            }
        }
        KeyCode::PageUp => {
            app.results_selection = app.results_selection.saturating_sub(PAGE_SCROLL_SIZE);
        }
        KeyCode::PageDown => {
            if row_count > 0 {
                app.results_selection =
                    (app.results_selection + PAGE_SCROLL_SIZE).min(row_count - 1);
            }
        }
        _ => {}
    }
}

fn handle_query_edit_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.query_editing = false;
        }
        KeyCode::Enter => {
            app.query_editing = false;
            app.submit_query();
        }
        KeyCode::Backspace => {
            app.query_text.pop();
        }
        KeyCode::Char(c) => {
            if can_add_query_char(app.query_text.len(), c) {
                app.query_text.push(c);
            }
        }
        _ => {}
    }
    Ok(false)
}

// ============================================================================
// Connect Tab
// ============================================================================

fn connect_text_field(app: &mut App) -> Option<&mut String> {
    match app.connect_field {
        ConnectField::Host => Some(&mut app.connect_host),
        ConnectField::Port => Some(&mut app.connect_port),
        ConnectField::Username => Some(&mut app.connect_username),
        ConnectField::Password => Some(&mut app.connect_password),
        ConnectField::Database => Some(&mut app.connect_database),
        ConnectField::DbType | ConnectField::Button => None,
    }
}

fn handle_connect_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Tab | KeyCode::Down => {
            app.connect_field = app.connect_field.next();
            return Ok(false);
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.connect_field = app.connect_field.prev();
            return Ok(false);
        }
        KeyCode::Esc => {
            app.connect_field = ConnectField::Button;
            return Ok(false);
        }
        KeyCode::Enter => {
            match app.connect_field {
                ConnectField::Button => app.submit_connect(),
                ConnectField::DbType => toggle_connect_db_type(app),
                _ => app.connect_field = app.connect_field.next(),
            }
            return Ok(false);
        }
        KeyCode::Left | KeyCode::Right => {
            match app.connect_field {
                ConnectField::DbType => toggle_connect_db_type(app),
                // Leaving the form is possible from the button row
                ConnectField::Button => {
                    let tab = if key.code == KeyCode::Left {
                        app.current_tab.prev()
                    } else {
                        app.current_tab.next()
                    };
                    switch_tab(app, tab);
                }
                _ => {}
            }
            return Ok(false);
        }
        KeyCode::Backspace => {
            if let Some(field) = connect_text_field(app) {
                field.pop();
            }
            return Ok(false);
        }
        KeyCode::Char(c) => {
            if let Some(field) = connect_text_field(app) {
                if can_add_field_char(field.len(), c) {
                    field.push(c);
                }
                return Ok(false);
            }
            // Non-typing rows fall through to shortcut keys
            match c {
                ' ' | 't' => {
                    if app.connect_field == ConnectField::DbType {
                        toggle_connect_db_type(app);
                    }
                }
                'q' => app.state = AppState::ConfirmingQuit,
                '?' => app.state = AppState::ShowingHelp,
                'l' => app.logout(),
                '1' => switch_tab(app, Tab::Query),
                '2' => switch_tab(app, Tab::Connect),
                '3' => switch_tab(app, Tab::Connections),
                _ => {}
            }
            return Ok(false);
        }
        _ => {}
    }
    Ok(false)
}

/// Toggling the backend also swaps in its conventional port when the
/// user has not customized it.
fn toggle_connect_db_type(app: &mut App) {
    let old = app.connect_db_type;
    app.connect_db_type = old.toggle();
    if app.connect_port == old.default_port() {
        app.connect_port = app.connect_db_type.default_port().to_string();
    }
}

// ============================================================================
// Connections Tab
// ============================================================================

fn handle_connections_input(app: &mut App, key: KeyEvent) {
    let count = app.connections.len();
    match key.code {
        KeyCode::Char('u') => app.load_connections(),
        KeyCode::Up => {
            app.connections_selection = app.connections_selection.saturating_sub(1);
        }
        KeyCode::Down => {
            if count > 0 {
                app.connections_selection = (app.connections_selection + 1).min(count - 1);
            }
        }
        _ => {}
    }
}

// ============================================================================
// Login / Signup Overlays
// ============================================================================

fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Tab | KeyCode::Down => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::SignupLink,
                LoginFocus::SignupLink => LoginFocus::Email,
            };
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::SignupLink,
                LoginFocus::Password => LoginFocus::Email,
                LoginFocus::Button => LoginFocus::Password,
                LoginFocus::SignupLink => LoginFocus::Button,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => app.submit_login(),
            LoginFocus::SignupLink => app.start_signup(),
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Email => {
                app.login_email.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            _ => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Email => {
                if can_add_identity_char(app.login_email.len(), c) {
                    app.login_email.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.len(), c) {
                    app.login_password.push(c);
                }
            }
            _ => {}
        },
        _ => {}
    }
    Ok(false)
}

fn handle_signup_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.start_login();
        }
        KeyCode::Tab | KeyCode::Down => {
            app.signup_focus = match app.signup_focus {
                SignupFocus::Username => SignupFocus::Email,
                SignupFocus::Email => SignupFocus::Password,
                SignupFocus::Password => SignupFocus::Button,
                SignupFocus::Button => SignupFocus::LoginLink,
                SignupFocus::LoginLink => SignupFocus::Username,
            };
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.signup_focus = match app.signup_focus {
                SignupFocus::Username => SignupFocus::LoginLink,
                SignupFocus::Email => SignupFocus::Username,
                SignupFocus::Password => SignupFocus::Email,
                SignupFocus::Button => SignupFocus::Password,
                SignupFocus::LoginLink => SignupFocus::Button,
            };
        }
        KeyCode::Enter => match app.signup_focus {
            SignupFocus::Username => app.signup_focus = SignupFocus::Email,
            SignupFocus::Email => app.signup_focus = SignupFocus::Password,
            SignupFocus::Password | SignupFocus::Button => app.submit_signup(),
            SignupFocus::LoginLink => app.start_login(),
        },
        KeyCode::Backspace => match app.signup_focus {
            SignupFocus::Username => {
                app.signup_username.pop();
            }
            SignupFocus::Email => {
                app.signup_email.pop();
            }
            SignupFocus::Password => {
                app.signup_password.pop();
            }
            _ => {}
        },
        KeyCode::Char(c) => match app.signup_focus {
            SignupFocus::Username => {
                if can_add_identity_char(app.signup_username.len(), c) {
                    app.signup_username.push(c);
                }
            }
            SignupFocus::Email => {
                if can_add_identity_char(app.signup_email.len(), c) {
                    app.signup_email.push(c);
                }
            }
            SignupFocus::Password => {
                if can_add_password_char(app.signup_password.len(), c) {
                    app.signup_password.push(c);
                }
            }
            _ => {}
        },
        _ => {}
    }
    Ok(false)
}
