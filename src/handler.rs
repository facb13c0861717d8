use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{char_to_byte_index, App, FocusPane, InputMode};
use crate::config::Config;
use crate::controller::Trigger;
use crate::editor::Language;
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick_animation();
            if app.controller.poll_finished() {
                app.controller.resolve().await;
                app.scroll_chat_to_bottom();
            }
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.show_language_picker {
        handle_language_picker(app, key);
        return;
    }
    if app.show_convert_picker {
        handle_convert_picker(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Focus switching; the chat input is always editable when focused
        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusPane::Editor => {
                    app.input_mode = InputMode::Editing;
                    app.chat_cursor = app.chat_input.chars().count();
                    FocusPane::Chat
                }
                FocusPane::Chat => FocusPane::Editor,
            };
        }

        // Enter code editing
        KeyCode::Char('i') | KeyCode::Enter => {
            if app.focus == FocusPane::Editor {
                app.input_mode = InputMode::Editing;
            }
        }

        // Triggers
        KeyCode::Char('d') if key.modifiers.is_empty() => fire(app, Trigger::Debug),
        KeyCode::Char('a') => fire(app, Trigger::Analyze),
        KeyCode::Char('o') => fire(app, Trigger::AllInOne),
        KeyCode::Char('c') => open_convert_picker(app),

        // Language picker
        KeyCode::Char('l') => {
            let current = Language::all()
                .iter()
                .position(|l| *l == app.editor.language())
                .unwrap_or(0);
            app.language_state.select(Some(current));
            app.show_language_picker = true;
        }

        // Toggle problem description panel
        KeyCode::Char('p') => app.show_description = !app.show_description,

        // Navigation by focus
        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            FocusPane::Editor => app.editor_down(),
            FocusPane::Chat => app.chat_scroll_down(1),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            FocusPane::Editor => app.editor_up(),
            FocusPane::Chat => app.chat_scroll_up(1),
        },
        KeyCode::Char('h') | KeyCode::Left => {
            if app.focus == FocusPane::Editor {
                app.editor_left();
            }
        }
        KeyCode::Char('L') | KeyCode::Right => {
            if app.focus == FocusPane::Editor {
                app.editor_right();
            }
        }

        // Half-page chat scroll
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.chat_scroll_up(app.chat_height / 2);
        }
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.chat_scroll_down(app.chat_height / 2);
        }

        KeyCode::Char('g') => app.chat_scroll_up(u16::MAX),
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match app.focus {
        FocusPane::Editor => handle_editor_editing(app, key),
        FocusPane::Chat => handle_chat_editing(app, key),
    }
}

fn handle_editor_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => app.editor_insert('\n'),
        KeyCode::Tab => {
            app.editor_insert(' ');
            app.editor_insert(' ');
        }
        KeyCode::Backspace => app.editor_backspace(),
        KeyCode::Delete => app.editor_delete(),
        KeyCode::Left => app.editor_left(),
        KeyCode::Right => app.editor_right(),
        KeyCode::Up => app.editor_up(),
        KeyCode::Down => app.editor_down(),
        KeyCode::Home => app.editor_home(),
        KeyCode::End => app.editor_end(),
        KeyCode::Char(c) => app.editor_insert(c),
        _ => {}
    }
}

fn handle_chat_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            if !app.chat_input.is_empty() {
                let text = std::mem::take(&mut app.chat_input);
                app.chat_cursor = 0;
                fire(app, Trigger::Send(text));
            }
        }
        KeyCode::Backspace => {
            if app.chat_cursor > 0 {
                app.chat_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
                app.chat_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.chat_input.chars().count();
            if app.chat_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
                app.chat_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.chat_cursor = app.chat_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.chat_input.chars().count();
            app.chat_cursor = (app.chat_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.chat_cursor = 0;
        }
        KeyCode::End => {
            app.chat_cursor = app.chat_input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
            app.chat_input.insert(byte_pos, c);
            app.chat_cursor += 1;
        }
        _ => {}
    }
}

fn handle_language_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.show_language_picker = false;
        }
        KeyCode::Char('j') | KeyCode::Down => app.language_picker_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.language_picker_nav_up(),
        KeyCode::Enter => {
            if let Some(i) = app.language_state.selected() {
                if let Some(&language) = Language::all().get(i) {
                    app.editor.set_language(language);
                    let _ = Config::save_default_language(language.as_str());
                }
            }
            app.show_language_picker = false;
        }
        _ => {}
    }
}

fn handle_convert_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.show_convert_picker = false;
        }
        KeyCode::Char('j') | KeyCode::Down => app.convert_picker_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.convert_picker_nav_up(),
        KeyCode::Enter => {
            let target = app
                .convert_state
                .selected()
                .and_then(|i| app.convert_targets().get(i).copied());
            app.show_convert_picker = false;
            if let Some(target) = target {
                fire(app, Trigger::Convert(target));
            }
        }
        _ => {}
    }
}

fn open_convert_picker(app: &mut App) {
    if app.convert_targets().is_empty() {
        return;
    }
    app.convert_state.select(Some(0));
    app.show_convert_picker = true;
}

/// Snapshot the editor and hand the trigger to the controller. A rejection
/// while a request is in flight leaves everything untouched.
fn fire(app: &mut App, trigger: Trigger) {
    let snapshot = app.editor.snapshot();
    match app.controller.trigger(trigger, snapshot) {
        Ok(()) => {
            app.animation_frame = 0;
            app.scroll_chat_to_bottom();
        }
        Err(rejection) => {
            tracing::debug!(%rejection, "trigger dropped");
        }
    }
}
