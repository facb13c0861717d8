use ratatui::widgets::ListState;

use crate::controller::Controller;
use crate::editor::{EditorState, Language};

/// Starter buffer shown before the user loads or types anything.
pub const DEFAULT_CODE: &str = "// Write your code here\n\nfunction example() {\n  console.log(\"Hello, Code Mentor!\");\n}\n\nexample();";

pub const DEFAULT_PROBLEM: &str = "# Binary Search Implementation\n\nImplement a binary search algorithm that finds the position of a target value within a sorted array.\n\n## Requirements:\n- The function should return the index of the target if found\n- If the target is not found, return -1\n- The array is sorted in ascending order\n- Optimize for time complexity";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Editor,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
pub(crate) fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Per-line (start, length) in characters, newline excluded.
fn line_spans(code: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut len = 0;
    let mut idx = 0;
    for c in code.chars() {
        if c == '\n' {
            spans.push((start, len));
            start = idx + 1;
            len = 0;
        } else {
            len += 1;
        }
        idx += 1;
    }
    spans.push((start, len));
    spans
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub focus: FocusPane,
    pub input_mode: InputMode,

    // Editor pane
    pub editor: EditorState,
    pub editor_cursor: usize, // char index into the code buffer
    pub editor_scroll: u16,
    pub editor_height: u16,
    pub show_description: bool,
    pub problem_description: String,

    // Chat pane
    pub chat_input: String,
    pub chat_cursor: usize,
    pub chat_scroll: u16,
    pub chat_height: u16, // inner chat area, set during render
    pub chat_width: u16,

    // Conversation state machine
    pub controller: Controller,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Picker state
    pub show_language_picker: bool,
    pub language_state: ListState,
    pub show_convert_picker: bool,
    pub convert_state: ListState,
}

impl App {
    pub fn new(code: String, language: Language, controller: Controller) -> Self {
        Self {
            should_quit: false,
            focus: FocusPane::Editor,
            input_mode: InputMode::Normal,

            editor: EditorState::new(code, language),
            editor_cursor: 0,
            editor_scroll: 0,
            editor_height: 0,
            show_description: true,
            problem_description: DEFAULT_PROBLEM.to_string(),

            chat_input: String::new(),
            chat_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            controller,

            animation_frame: 0,

            show_language_picker: false,
            language_state: ListState::default(),
            show_convert_picker: false,
            convert_state: ListState::default(),
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.controller.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Convert targets exclude the current source language, mirroring the
    /// editor dropdown.
    pub fn convert_targets(&self) -> Vec<Language> {
        Language::all()
            .into_iter()
            .filter(|l| *l != self.editor.language())
            .collect()
    }

    // Editor cursor movement. All indices are character offsets.

    pub fn cursor_line_col(&self) -> (usize, usize) {
        let mut line = 0;
        let mut col = 0;
        for (i, c) in self.editor.code().chars().enumerate() {
            if i == self.editor_cursor {
                break;
            }
            if c == '\n' {
                line += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (line, col)
    }

    pub fn editor_insert(&mut self, c: char) {
        let mut code = self.editor.code().to_string();
        let byte_pos = char_to_byte_index(&code, self.editor_cursor);
        code.insert(byte_pos, c);
        self.editor.set_code(code);
        self.editor_cursor += 1;
    }

    pub fn editor_backspace(&mut self) {
        if self.editor_cursor == 0 {
            return;
        }
        self.editor_cursor -= 1;
        let mut code = self.editor.code().to_string();
        let byte_pos = char_to_byte_index(&code, self.editor_cursor);
        code.remove(byte_pos);
        self.editor.set_code(code);
    }

    pub fn editor_delete(&mut self) {
        let mut code = self.editor.code().to_string();
        if self.editor_cursor < code.chars().count() {
            let byte_pos = char_to_byte_index(&code, self.editor_cursor);
            code.remove(byte_pos);
            self.editor.set_code(code);
        }
    }

    pub fn editor_left(&mut self) {
        self.editor_cursor = self.editor_cursor.saturating_sub(1);
    }

    pub fn editor_right(&mut self) {
        let count = self.editor.code().chars().count();
        self.editor_cursor = (self.editor_cursor + 1).min(count);
    }

    pub fn editor_up(&mut self) {
        let spans = line_spans(self.editor.code());
        let (line, col) = self.cursor_line_col();
        if line > 0 {
            let (start, len) = spans[line - 1];
            self.editor_cursor = start + col.min(len);
        }
    }

    pub fn editor_down(&mut self) {
        let spans = line_spans(self.editor.code());
        let (line, col) = self.cursor_line_col();
        if line + 1 < spans.len() {
            let (start, len) = spans[line + 1];
            self.editor_cursor = start + col.min(len);
        }
    }

    pub fn editor_home(&mut self) {
        let spans = line_spans(self.editor.code());
        let (line, _) = self.cursor_line_col();
        self.editor_cursor = spans[line].0;
    }

    pub fn editor_end(&mut self) {
        let spans = line_spans(self.editor.code());
        let (line, _) = self.cursor_line_col();
        let (start, len) = spans[line];
        self.editor_cursor = start + len;
    }

    // Chat scrollback

    /// Total rendered chat lines at the current wrap width, attachments
    /// included.
    pub fn chat_line_count(&self) -> u16 {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in self.controller.messages() {
            total_lines += 1; // Role line ("You:" or "Mentor:")
            for line in msg.content.lines() {
                total_lines += wrapped_height(line, wrap_width);
            }
            for attachment in &msg.attachments {
                total_lines += 1; // language tag line
                for line in attachment.code.lines() {
                    total_lines += wrapped_height(line, wrap_width);
                }
            }
            total_lines += 1; // Blank line after message
        }

        if self.controller.is_busy() {
            total_lines += 2; // "Mentor:" + "Thinking..."
        }

        total_lines
    }

    /// Scroll chat so the latest message (or "Thinking...") is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        let total_lines = self.chat_line_count();
        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        } else {
            self.chat_scroll = 0;
        }
    }

    pub fn chat_scroll_up(&mut self, n: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(n);
    }

    pub fn chat_scroll_down(&mut self, n: u16) {
        let max = self.chat_line_count().saturating_sub(self.chat_height);
        self.chat_scroll = self.chat_scroll.saturating_add(n).min(max);
    }

    // Picker navigation

    pub fn language_picker_nav_down(&mut self) {
        nav_down(&mut self.language_state, Language::all().len());
    }

    pub fn language_picker_nav_up(&mut self) {
        nav_up(&mut self.language_state);
    }

    pub fn convert_picker_nav_down(&mut self) {
        let len = self.convert_targets().len();
        nav_down(&mut self.convert_state, len);
    }

    pub fn convert_picker_nav_up(&mut self) {
        nav_up(&mut self.convert_state);
    }
}

fn nav_down(state: &mut ListState, len: usize) {
    if len > 0 {
        let i = state.selected().unwrap_or(0);
        state.select(Some((i + 1).min(len - 1)));
    }
}

fn nav_up(state: &mut ListState) {
    let i = state.selected().unwrap_or(0);
    state.select(Some(i.saturating_sub(1)));
}

/// Rows a single source line occupies once wrapped. Character count, not
/// byte length, for proper UTF-8 handling.
fn wrapped_height(line: &str, wrap_width: usize) -> u16 {
    let char_count = line.chars().count();
    if char_count == 0 {
        1
    } else {
        ((char_count - 1) / wrap_width + 1) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_to_byte_index_multibyte() {
        let s = "héllo";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 2), 3); // after the two-byte é
        assert_eq!(char_to_byte_index(s, 99), s.len());
    }

    #[test]
    fn test_line_spans() {
        assert_eq!(line_spans(""), vec![(0, 0)]);
        assert_eq!(line_spans("ab\ncd"), vec![(0, 2), (3, 2)]);
        assert_eq!(line_spans("ab\n"), vec![(0, 2), (3, 0)]);
    }

    #[test]
    fn test_wrapped_height() {
        assert_eq!(wrapped_height("", 10), 1);
        assert_eq!(wrapped_height("short", 10), 1);
        // A line of exactly the wrap width stays on one row
        assert_eq!(wrapped_height("a".repeat(10).as_str(), 10), 1);
        assert_eq!(wrapped_height("a".repeat(11).as_str(), 10), 2);
        assert_eq!(wrapped_height("a".repeat(20).as_str(), 10), 2);
        assert_eq!(wrapped_height("a".repeat(25).as_str(), 10), 3);
    }

    #[test]
    fn test_editor_up_down_clamps_column() {
        let code = "long first line\nab\nanother long line".to_string();
        let controller = test_controller();
        let mut app = App::new(code, Language::JavaScript, controller);

        app.editor_cursor = 10; // middle of first line
        app.editor_down();
        let (line, col) = app.cursor_line_col();
        assert_eq!((line, col), (1, 2)); // clamped to "ab"

        app.editor_down();
        app.editor_up();
        app.editor_up();
        let (line, _) = app.cursor_line_col();
        assert_eq!(line, 0);
    }

    #[test]
    fn test_editor_insert_and_backspace_multibyte() {
        let controller = test_controller();
        let mut app = App::new("é".to_string(), Language::Rust, controller);

        app.editor_right();
        app.editor_insert('x');
        assert_eq!(app.editor.code(), "éx");
        app.editor_backspace();
        app.editor_backspace();
        assert_eq!(app.editor.code(), "");
        assert_eq!(app.editor_cursor, 0);
    }

    #[test]
    fn test_convert_targets_exclude_source() {
        let controller = test_controller();
        let app = App::new(String::new(), Language::Python, controller);
        let targets = app.convert_targets();
        assert_eq!(targets.len(), Language::all().len() - 1);
        assert!(!targets.contains(&Language::Python));
    }

    fn test_controller() -> Controller {
        use crate::api::{Action, Dispatcher, Outcome, RequestPayload};
        use async_trait::async_trait;
        use std::sync::Arc;

        struct NullDispatcher;

        #[async_trait]
        impl Dispatcher for NullDispatcher {
            async fn send(&self, _action: Action, _payload: RequestPayload) -> Outcome {
                Outcome::Failure("unreachable".to_string())
            }
        }

        Controller::new(Arc::new(NullDispatcher))
    }
}
