use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{char_to_byte_index, App, FocusPane, InputMode, PathPurpose};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Speech(event) => app.on_speech_event(event),
        AppEvent::PlaybackEnded => app.on_playback_ended(),
    }
    app.poll_turn().await;
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // An alert is modal: any key dismisses it
    if app.alert.is_some() {
        app.alert = None;
        return;
    }

    if app.path_prompt.is_some() {
        handle_path_prompt(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusPane::Services => FocusPane::Chat,
                FocusPane::Chat => FocusPane::Services,
            };
        }

        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            FocusPane::Services => app.service_down(),
            FocusPane::Chat => app.scroll_chat_down(1),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            FocusPane::Services => app.service_up(),
            FocusPane::Chat => app.scroll_chat_up(1),
        },
        KeyCode::PageDown => app.scroll_chat_down(app.chat_height.max(2) / 2),
        KeyCode::PageUp => app.scroll_chat_up(app.chat_height.max(2) / 2),
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),

        KeyCode::Enter => match app.focus {
            FocusPane::Services => app.select_service(),
            FocusPane::Chat => start_editing(app),
        },
        KeyCode::Char('i') | KeyCode::Char('/') => start_editing(app),

        KeyCode::Char('v') => app.toggle_voice(),
        KeyCode::Char('u') => app.open_path_prompt(PathPurpose::Upload),
        KeyCode::Char('a') => app.open_path_prompt(PathPurpose::Stage),
        KeyCode::Char('L') => app.toggle_display_language(),

        _ => {}
    }
}

fn start_editing(app: &mut App) {
    if app.controller.input_enabled() {
        app.focus = FocusPane::Chat;
        app.input_mode = InputMode::Editing;
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => app.submit_input(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

fn handle_path_prompt(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.path_prompt = None,
        KeyCode::Enter => app.confirm_path_prompt(),
        _ => {
            let Some(prompt) = app.path_prompt.as_mut() else {
                return;
            };
            match key.code {
                KeyCode::Backspace => {
                    if prompt.cursor > 0 {
                        prompt.cursor -= 1;
                        let byte_pos = char_to_byte_index(&prompt.input, prompt.cursor);
                        prompt.input.remove(byte_pos);
                    }
                }
                KeyCode::Left => prompt.cursor = prompt.cursor.saturating_sub(1),
                KeyCode::Right => {
                    prompt.cursor = (prompt.cursor + 1).min(prompt.input.chars().count());
                }
                KeyCode::Char(c) => {
                    let byte_pos = char_to_byte_index(&prompt.input, prompt.cursor);
                    prompt.input.insert(byte_pos, c);
                    prompt.cursor += 1;
                }
                _ => {}
            }
        }
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    let in_services = app.services_area.is_some_and(|r| point_in_rect(x, y, r));
    let in_chat = app.chat_area.is_some_and(|r| point_in_rect(x, y, r));

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if in_chat {
                app.scroll_chat_down(3);
            } else if in_services {
                app.service_down();
            }
        }
        MouseEventKind::ScrollUp => {
            if in_chat {
                app.scroll_chat_up(3);
            } else if in_services {
                app.service_up();
            }
        }
        _ => {}
    }
}
