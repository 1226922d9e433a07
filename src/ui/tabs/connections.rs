use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::ui::styles;
use crate::utils::format_date;

/// Render the Connections tab: saved connection descriptors from the
/// server.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!(" Saved Connections ({}) - [u]pdate ", app.connections.len());
    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if app.connections.is_empty() {
        let placeholder = Paragraph::new(Line::from(Span::styled(
            " No saved connections yet",
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let header = Row::new(vec![
        Cell::from("Type"),
        Cell::from("Target"),
        Cell::from("Created"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = app
        .connections
        .iter()
        .map(|conn| {
            Row::new(vec![
                Cell::from(conn.display_db_type()),
                Cell::from(conn.display_target()),
                Cell::from(
                    conn.created_at
                        .as_deref()
                        .map(format_date)
                        .unwrap_or_else(|| "-".to_string()),
                ),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Fill(3),
        Constraint::Length(14),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.connections_selection));

    frame.render_stateful_widget(table, area, &mut state);
}
