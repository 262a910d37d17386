use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};
use tui_textarea::TextArea;

use crate::app::{App, DialogKind, Focus};
use crate::theme::WidgetId;

const COLUMNS: [&str; 5] = ["ID", "User", "Description", "Start", "End"];

/// Draw the whole window: form, buttons, task table, status line and,
/// on top of everything, the open dialog if there is one.
pub fn render(f: &mut Frame, app: &mut App) {
    let window = app.theme.style(WidgetId::Window);
    f.render_widget(Block::default().style(window), f.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(6),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_form(f, app, chunks[0], chunks[1], chunks[2]);
    render_table(f, app, chunks[3]);
    render_status(f, app, chunks[4]);

    if app.dialog.is_some() {
        render_dialog(f, app);
    }
}

fn render_form(f: &mut Frame, app: &mut App, user_area: Rect, description_area: Rect, buttons_area: Rect) {
    let split = |area: Rect| {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(19), Constraint::Min(10)])
            .split(area)
    };
    let user_row = split(user_area);
    let description_row = split(description_area);

    f.render_widget(
        Paragraph::new("User:").style(app.theme.style(WidgetId::UserLabel)),
        padded(user_row[0]),
    );
    f.render_widget(
        Paragraph::new("Task Description:").style(app.theme.style(WidgetId::DescriptionLabel)),
        padded(description_row[0]),
    );

    let user_style = app.theme.style(WidgetId::UserInput);
    let description_style = app.theme.style(WidgetId::DescriptionInput);
    style_input(&mut app.user_input, user_style, app.focus == Focus::User);
    style_input(&mut app.description_input, description_style, app.focus == Focus::Description);
    f.render_widget(&app.user_input, user_row[1]);
    f.render_widget(&app.description_input, description_row[1]);

    let buttons = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(buttons_area);

    let theme_caption = app.theme.theme().toggle_caption();
    let captions = [
        ("Start Task", Focus::StartButton),
        ("End Task", Focus::EndButton),
        (theme_caption, Focus::ThemeButton),
    ];
    for (i, (caption, focus)) in captions.iter().enumerate() {
        let mut style = app.theme.style(focus.widget());
        if app.focus == *focus {
            style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
        }
        let button = Paragraph::new(*caption)
            .alignment(Alignment::Center)
            .style(style)
            .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded));
        f.render_widget(button, buttons[i]);
    }
}

fn style_input(textarea: &mut TextArea<'static>, style: Style, focused: bool) {
    let border = if focused {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };
    textarea.set_style(style);
    textarea.set_cursor_line_style(Style::default());
    textarea.set_cursor_style(if focused {
        style.add_modifier(Modifier::REVERSED)
    } else {
        style
    });
    textarea.set_block(Block::default().borders(Borders::ALL).border_style(border));
}

fn render_table(f: &mut Frame, app: &mut App, area: Rect) {
    let style = app.theme.style(WidgetId::Table);
    let header = Row::new(COLUMNS.iter().map(|c| Cell::from(*c)))
        .style(style.add_modifier(Modifier::BOLD))
        .bottom_margin(1);

    let rows = app.tasks.iter().map(|task| {
        Row::new(vec![
            Cell::from(task.id.to_string()),
            Cell::from(single_line(&task.user)),
            Cell::from(single_line(&task.description)),
            Cell::from(task.fmt_start()),
            Cell::from(task.fmt_end()),
        ])
    });

    let border = if app.focus == Focus::Table {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Percentage(20),
            Constraint::Min(20),
            Constraint::Length(19),
            Constraint::Length(19),
        ],
    )
    .header(header)
    .style(style)
    .row_highlight_style(style.add_modifier(Modifier::REVERSED))
    .block(
        Block::default()
            .title(if app.stale {
                " Task Manager (reload failed) "
            } else {
                " Task Manager "
            })
            .borders(Borders::ALL)
            .border_style(border),
    );

    f.render_stateful_widget(table, area, &mut app.table_state);
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let text = format!(
        " {} tasks, {} open | Tab: move  Ctrl-S: start  Ctrl-E: end  Ctrl-T: theme  Esc: quit",
        app.tasks.len(),
        app.open_count()
    );
    f.render_widget(
        Paragraph::new(text).style(app.theme.style(WidgetId::StatusLine)),
        area,
    );
}

fn render_dialog(f: &mut Frame, app: &App) {
    let dialog = match &app.dialog {
        Some(dialog) => dialog,
        None => return,
    };
    let area = centered_rect(50, 30, f.area());
    f.render_widget(Clear, area);

    let mut border = app.theme.style(WidgetId::Window);
    if dialog.kind == DialogKind::Error {
        border = border.add_modifier(Modifier::BOLD);
    }
    let block = Block::default()
        .title(format!(" {} ", dialog.title))
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(border)
        .style(app.theme.style(WidgetId::Window));

    let text = vec![
        Line::from(dialog.message.as_str()),
        Line::from(""),
        Line::from("[ OK ]").alignment(Alignment::Center),
    ];
    f.render_widget(
        Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}

/// Table cells are one line high.
fn single_line(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join(" ")
}

fn padded(area: Rect) -> Rect {
    Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(1),
        height: area.height.saturating_sub(1),
    }
}

/// A rectangle of the given percentages, centred in `r`.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Store;
    use ratatui::{backend::TestBackend, Terminal};

    fn screen(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let width = buffer.area.width as usize;
        let mut text = String::new();
        for (i, cell) in buffer.content().iter().enumerate() {
            text.push_str(cell.symbol());
            if (i + 1) % width == 0 {
                text.push('\n');
            }
        }
        text
    }

    #[test]
    fn test_renders_form_and_table() {
        let store = Store::open_in_memory().unwrap();
        store.insert("Alice", "Write report", crate::model::now()).unwrap();
        let mut app = App::new(store).unwrap();

        let text = screen(&mut app);
        for expected in ["Task Manager", "User:", "Task Description:", "Start Task", "End Task", "Dark Mode"] {
            assert!(text.contains(expected), "missing {:?}", expected);
        }
        for column in COLUMNS.iter() {
            assert!(text.contains(column));
        }
        assert!(text.contains("Alice"));
        assert!(text.contains("Write report"));
        assert!(text.contains("1 tasks, 1 open"));
    }

    #[test]
    fn test_renders_dialog_and_theme_caption() {
        let mut app = App::new(Store::open_in_memory().unwrap()).unwrap();
        app.toggle_theme();
        app.end_task_action();

        let text = screen(&mut app);
        assert!(text.contains("Light Mode"));
        assert!(text.contains("No task selected!"));
    }

    #[test]
    fn test_stale_table_is_marked() {
        let mut app = App::new(Store::open_in_memory().unwrap()).unwrap();
        app.stale = true;
        assert!(screen(&mut app).contains("Task Manager (reload failed)"));
    }

    #[test]
    fn test_single_line() {
        assert_eq!(single_line("Write report\nand send it"), "Write report and send it");
    }
}
