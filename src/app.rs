//! Application state management for L1 Chat
//!
//! This module contains the chat transcript, the input line editor, and the
//! keyboard handling for the terminal front end.

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::chat::Reply;

/// Lines moved by PageUp/PageDown
const PAGE_SCROLL: u16 = 10;

/// Upper bound on the scroll offset; the renderer clamps to the real height
const MAX_SCROLL: u16 = 10_000;

const WELCOME: &str = "Hi! Ask me about **fees**, **gas**, **prices**, or **governance** for \
Ethereum, Bitcoin, BNB Smart Chain, Tron, and Base. Try \"which chain has the lowest fees?\" \
or press F1 for keys.";

/// Who wrote a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One entry in the chat transcript
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    /// Markdown for assistant messages, plain text for user messages
    pub content: String,
    pub at: DateTime<Local>,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            at: Local::now(),
        }
    }
}

/// Main application struct managing state
pub struct App {
    /// Conversation so far, oldest first
    pub messages: Vec<ChatMessage>,
    /// Text being typed
    pub input: String,
    /// Cursor position in `input`, in characters
    pub cursor: usize,
    /// Lines scrolled up from the bottom of the transcript
    pub scroll: u16,
    /// A question has been sent and the answer has not arrived yet
    pub pending: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Submitted question waiting to be handed to the worker
    outgoing: Option<String>,
}

impl App {
    /// Creates a new App with a welcome message
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::new(Role::Assistant, WELCOME)],
            input: String::new(),
            cursor: 0,
            scroll: 0,
            pending: false,
            show_help: false,
            should_quit: false,
            outgoing: None,
        }
    }

    /// Handles a key press
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        let ctrl = key_event.modifiers.contains(KeyModifiers::CONTROL);

        // Ctrl-C always quits, even with help open
        if ctrl && key_event.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        // Handle help overlay - intercepts all keys when shown
        if self.show_help {
            match key_event.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::F(1) => {
                    self.show_help = false;
                }
                _ => {} // Ignore other keys when help is shown
            }
            return;
        }

        match key_event.code {
            KeyCode::Char('l') if ctrl => self.clear_transcript(),
            KeyCode::Char(_) if ctrl => {}
            KeyCode::F(1) => self.show_help = true,
            KeyCode::Char('?') if self.input.is_empty() => self.show_help = true,
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Esc => {
                if self.input.is_empty() {
                    self.should_quit = true;
                } else {
                    self.clear_input();
                }
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => self.delete_before_cursor(),
            KeyCode::Delete => self.delete_at_cursor(),
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.input_len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.input_len(),
            KeyCode::Up => self.scroll_up(1),
            KeyCode::Down => self.scroll_down(1),
            KeyCode::PageUp => self.scroll_up(PAGE_SCROLL),
            KeyCode::PageDown => self.scroll_down(PAGE_SCROLL),
            _ => {}
        }
    }

    fn input_len(&self) -> usize {
        self.input.chars().count()
    }

    /// Byte offset of the cursor in `input`
    fn cursor_byte(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    fn insert_char(&mut self, c: char) {
        let at = self.cursor_byte();
        self.input.insert(at, c);
        self.cursor += 1;
    }

    fn delete_before_cursor(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.cursor_byte();
        self.input.remove(at);
    }

    fn delete_at_cursor(&mut self) {
        if self.cursor < self.input_len() {
            let at = self.cursor_byte();
            self.input.remove(at);
        }
    }

    fn clear_input(&mut self) {
        self.input.clear();
        self.cursor = 0;
    }

    /// Moves the typed question into the transcript and queues it
    ///
    /// Ignored while an answer is pending or when the input is blank.
    pub fn submit(&mut self) {
        if self.pending {
            return;
        }
        let question = self.input.trim().to_string();
        if question.is_empty() {
            return;
        }
        self.messages.push(ChatMessage::new(Role::User, question.clone()));
        self.outgoing = Some(question);
        self.pending = true;
        self.scroll = 0;
        self.clear_input();
    }

    /// Takes the submitted question, if any, for the worker
    pub fn take_outgoing(&mut self) -> Option<String> {
        self.outgoing.take()
    }

    /// Appends an answer and re-enables input
    pub fn receive_reply(&mut self, reply: Reply) {
        self.messages
            .push(ChatMessage::new(Role::Assistant, reply.markdown));
        self.pending = false;
        self.scroll = 0;
    }

    /// Shows a failure to reach the worker in the transcript
    pub fn receive_error(&mut self, message: impl Into<String>) {
        self.messages
            .push(ChatMessage::new(Role::Assistant, format!("⚠️ {}", message.into())));
        self.pending = false;
        self.outgoing = None;
    }

    /// Empties the transcript, keeping any pending question
    pub fn clear_transcript(&mut self) {
        self.messages.clear();
        self.scroll = 0;
    }

    /// Scrolls towards older messages
    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(MAX_SCROLL);
    }

    /// Scrolls towards the newest message
    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
