use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::TableState;
use tui_textarea::{CursorMove, TextArea};

use crate::model::{self, Store, Task, TaskError};
use crate::theme::{ThemeRegistry, WidgetId};

/// Which part of the window receives key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    User,
    Description,
    StartButton,
    EndButton,
    ThemeButton,
    Table,
}

impl Focus {
    const ORDER: [Focus; 6] = [
        Focus::User,
        Focus::Description,
        Focus::StartButton,
        Focus::EndButton,
        Focus::ThemeButton,
        Focus::Table,
    ];

    fn position(self) -> usize {
        Focus::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Focus {
        Focus::ORDER[(self.position() + 1) % Focus::ORDER.len()]
    }

    pub fn previous(self) -> Focus {
        Focus::ORDER[(self.position() + Focus::ORDER.len() - 1) % Focus::ORDER.len()]
    }

    pub fn widget(self) -> WidgetId {
        match self {
            Focus::User => WidgetId::UserInput,
            Focus::Description => WidgetId::DescriptionInput,
            Focus::StartButton => WidgetId::StartButton,
            Focus::EndButton => WidgetId::EndButton,
            Focus::ThemeButton => WidgetId::ThemeButton,
            Focus::Table => WidgetId::Table,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Info,
    Error,
}

/// A blocking message box. While one is open every key but Enter and Esc
/// is ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct Dialog {
    pub kind: DialogKind,
    pub title: String,
    pub message: String,
}

impl Dialog {
    fn info(message: &str) -> Dialog {
        Dialog {
            kind: DialogKind::Info,
            title: "Success".to_string(),
            message: message.to_string(),
        }
    }

    fn error(title: &str, message: String) -> Dialog {
        Dialog {
            kind: DialogKind::Error,
            title: title.to_string(),
            message,
        }
    }
}

pub struct App {
    store: Store,
    pub user_input: TextArea<'static>,
    pub description_input: TextArea<'static>,
    pub tasks: Vec<Task>,
    pub table_state: TableState,
    pub focus: Focus,
    pub theme: ThemeRegistry,
    pub dialog: Option<Dialog>,
    /// Set when the last reload failed; the table is empty until a reload works.
    pub stale: bool,
    should_quit: bool,
}

impl App {
    /// Build the window state around an open store and load the table.
    pub fn new(store: Store) -> Result<App> {
        let mut app = App {
            store,
            user_input: TextArea::default(),
            description_input: TextArea::default(),
            tasks: Vec::new(),
            table_state: TableState::default(),
            focus: Focus::User,
            theme: ThemeRegistry::for_window(),
            dialog: None,
            stale: false,
            should_quit: false,
        };
        app.user_input.set_placeholder_text("Who is working on it");
        app.description_input.set_placeholder_text("What is being done");
        app.reload_table()?;
        Ok(app)
    }

    /// Give the store back, so the caller can close it.
    pub fn into_store(self) -> Store {
        self.store
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Re-read every task from the store. Clears the selection. On failure
    /// the table is emptied and marked stale rather than left showing old rows.
    pub fn reload_table(&mut self) -> Result<()> {
        self.table_state.select(None);
        match self.store.list_all() {
            Ok(tasks) => {
                self.tasks = tasks;
                self.stale = false;
                Ok(())
            }
            Err(err) => {
                self.tasks.clear();
                self.stale = true;
                Err(err)
            }
        }
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.table_state.selected().and_then(|i| self.tasks.get(i))
    }

    pub fn open_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_ended()).count()
    }

    pub fn start_task_action(&mut self) {
        let outcome = self.start_task();
        self.report(outcome, "Task started successfully!");
    }

    pub fn end_task_action(&mut self) {
        let outcome = self.end_task();
        self.report(outcome, "Task ended successfully!");
    }

    pub fn toggle_theme(&mut self) {
        self.theme.toggle();
        tracing::debug!(theme = ?self.theme.theme(), "theme toggled");
    }

    /// Validate the form and insert a new task. Returns its id.
    pub(crate) fn start_task(&mut self) -> Result<i64> {
        let user = self.user_input.lines().join("\n");
        let description = self.description_input.lines().join("\n");
        let (user, description) = model::validate_fields(&user, &description)?;

        self.store.insert(user, description, model::now())
    }

    /// End the task on the selected row. Returns its id.
    pub(crate) fn end_task(&mut self) -> Result<i64> {
        let id = self.selected_task().ok_or(TaskError::NoSelection)?.id;
        self.store.update_end(id, model::now())?;
        Ok(id)
    }

    /// Turn the outcome of a mutation into the dialog the user sees. The
    /// table is reloaded only after a mutation went through, and a failing
    /// reload does not hide that it did.
    fn report(&mut self, outcome: Result<i64>, success: &str) {
        self.dialog = Some(match outcome {
            Ok(id) => match self.reload_table() {
                Ok(()) => Dialog::info(success),
                Err(err) => {
                    tracing::error!(id, error = ?err, "task list reload failed");
                    Dialog::error(
                        "Storage error",
                        format!("{} The task list could not be reloaded: {:#}", success, err),
                    )
                }
            },
            Err(err) => match err.downcast_ref::<TaskError>() {
                Some(task_error) => {
                    tracing::debug!(%task_error, "action rejected");
                    Dialog::error("Error", task_error.to_string())
                }
                None => {
                    tracing::error!(error = ?err, "storage failure");
                    Dialog::error("Storage error", format!("{:#}", err))
                }
            },
        });
    }

    /// Route a key press. Returns false once the app should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.dialog.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.dialog = None;
            }
            return true;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('s') => self.start_task_action(),
                KeyCode::Char('e') => self.end_task_action(),
                KeyCode::Char('t') => self.toggle_theme(),
                _ => {}
            }
            return !self.should_quit;
        }

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            _ => match self.focus {
                Focus::User => edit(&mut self.user_input, key),
                Focus::Description => edit(&mut self.description_input, key),
                Focus::StartButton => {
                    if is_press(key) {
                        self.start_task_action()
                    }
                }
                Focus::EndButton => {
                    if is_press(key) {
                        self.end_task_action()
                    }
                }
                Focus::ThemeButton => {
                    if is_press(key) {
                        self.toggle_theme()
                    }
                }
                Focus::Table => self.navigate_table(key),
            },
        }
        !self.should_quit
    }

    fn navigate_table(&mut self, key: KeyEvent) {
        if self.tasks.is_empty() {
            return;
        }
        let last = self.tasks.len() - 1;
        match key.code {
            KeyCode::Down => {
                let next = self.table_state.selected().map_or(0, |i| (i + 1).min(last));
                self.table_state.select(Some(next));
            }
            KeyCode::Up => {
                let previous = self.table_state.selected().map_or(last, |i| i.saturating_sub(1));
                self.table_state.select(Some(previous));
            }
            KeyCode::Home => self.table_state.select(Some(0)),
            KeyCode::End => self.table_state.select(Some(last)),
            KeyCode::Char(' ') => self.table_state.select(None),
            _ => {}
        }
    }
}

fn is_press(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Enter | KeyCode::Char(' '))
}

fn edit(textarea: &mut TextArea<'static>, key: KeyEvent) {
    match key.code {
        KeyCode::Char(c) => textarea.insert_char(c),
        KeyCode::Enter => textarea.insert_newline(),
        KeyCode::Backspace => {
            textarea.delete_char();
        }
        KeyCode::Delete => {
            textarea.delete_next_char();
        }
        KeyCode::Left => textarea.move_cursor(CursorMove::Back),
        KeyCode::Right => textarea.move_cursor(CursorMove::Forward),
        KeyCode::Up => textarea.move_cursor(CursorMove::Up),
        KeyCode::Down => textarea.move_cursor(CursorMove::Down),
        KeyCode::Home => textarea.move_cursor(CursorMove::Head),
        KeyCode::End => textarea.move_cursor(CursorMove::End),
        _ => {}
    }
}
