use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::{App, ConnectField};
use crate::ui::styles;

/// Render the Connect tab: connection form on the left, collections
/// reported by the last successful connect on the right.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_form(frame, app, chunks[0]);
    render_collections(frame, app, chunks[1]);
}

fn field_line<'a>(label: &'a str, value: String, focused: bool, masked: bool) -> Line<'a> {
    let shown = if masked {
        "*".repeat(value.chars().count())
    } else {
        value
    };
    let cursor = if focused { "▌" } else { "" };
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    Line::from(vec![
        Span::raw(" "),
        Span::styled(format!("{:<10}", label), styles::muted_style()),
        Span::styled("[", styles::muted_style()),
        Span::styled(format!("{:<24}", format!("{}{}", shown, cursor)), style),
        Span::styled("]", styles::muted_style()),
    ])
}

fn render_form(frame: &mut Frame, app: &App, area: Rect) {
    let focus = app.connect_field;

    let mut lines = vec![
        Line::from(""),
        field_line("Host", app.connect_host.clone(), focus == ConnectField::Host, false),
        field_line("Port", app.connect_port.clone(), focus == ConnectField::Port, false),
        field_line(
            "Username",
            app.connect_username.clone(),
            focus == ConnectField::Username,
            false,
        ),
        field_line(
            "Password",
            app.connect_password.clone(),
            focus == ConnectField::Password,
            true,
        ),
        field_line(
            "Database",
            app.connect_database.clone(),
            focus == ConnectField::Database,
            false,
        ),
    ];

    // DbType row toggles with left/right or space
    let db_type_style = if focus == ConnectField::DbType {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    lines.push(Line::from(vec![
        Span::raw(" "),
        Span::styled(format!("{:<10}", "Type"), styles::muted_style()),
        Span::styled("< ", styles::muted_style()),
        Span::styled(app.connect_db_type.label(), db_type_style),
        Span::styled(" >", styles::muted_style()),
    ]));

    lines.push(Line::from(""));
    let button_focused = focus == ConnectField::Button;
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let button = if button_focused {
        " ▶ Connect ◀ "
    } else {
        "   Connect   "
    };
    lines.push(Line::from(vec![
        Span::raw("      ["),
        Span::styled(button, button_style),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.connect_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .title(" Connect a Database ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_collections(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!(" Collections ({}) ", app.available_collections.len());
    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    if app.available_collections.is_empty() {
        let placeholder = Paragraph::new(Line::from(Span::styled(
            " Connect to list collections/tables",
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let items: Vec<ListItem> = app
        .available_collections
        .iter()
        .map(|name| ListItem::new(format!(" {}", name)).style(styles::list_item_style()))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(styles::selected_style());

    let mut state = ListState::default();
    state.select(Some(app.collections_selection));

    frame.render_stateful_widget(list, area, &mut state);
}
