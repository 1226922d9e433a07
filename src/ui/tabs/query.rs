use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::app::App;
use crate::ui::styles;
use crate::utils::truncate;

/// Render the Query tab: editor on top, results table and the AI
/// optimization panel below.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(8)])
        .split(area);

    render_editor(frame, app, chunks[0]);

    let has_optimization = app
        .query_response
        .as_ref()
        .map(|r| r.optimization_details.is_some())
        .unwrap_or(false);

    if has_optimization {
        let lower = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);
        render_results(frame, app, lower[0]);
        render_optimization(frame, app, lower[1]);
    } else {
        render_results(frame, app, chunks[1]);
    }
}

fn render_editor(frame: &mut Frame, app: &App, area: Rect) {
    let cursor = if app.query_editing { "▌" } else { "" };
    let mut lines = vec![Line::from(vec![
        Span::styled(format!(" {} ", app.query_db_type.label()), styles::highlight_style()),
        Span::styled("(t to switch)", styles::muted_style()),
    ])];

    lines.push(Line::from(vec![
        Span::raw(" "),
        Span::styled(
            format!("{}{}", app.query_text, cursor),
            if app.query_editing {
                styles::list_item_style()
            } else {
                styles::muted_style()
            },
        ),
    ]));

    if let Some(ref error) = app.query_error {
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let title = if app.query_editing {
        " Query - Enter to run, Esc to stop editing "
    } else {
        " Query - press e to edit "
    };

    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(app.query_editing));

    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

fn render_results(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Results ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(!app.query_editing));

    let Some(ref response) = app.query_response else {
        let placeholder = Paragraph::new(Line::from(Span::styled(
            " Run a query to see results",
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(placeholder, area);
        return;
    };

    let columns = response.columns();
    if columns.is_empty() {
        let placeholder = Paragraph::new(Line::from(Span::styled(
            " Query returned no rows",
            styles::muted_style(),
        )))
        .block(block.title(format!(" Results ({}) ", response.results.len())));
        frame.render_widget(placeholder, area);
        return;
    }

    let header = Row::new(
        columns
            .iter()
            .map(|c| Cell::from(c.as_str()))
            .collect::<Vec<_>>(),
    )
    .style(styles::title_style())
    .height(1);

    let max_cell_width = (area.width as usize / columns.len().max(1)).max(8);

    let rows: Vec<Row> = response
        .results
        .iter()
        .map(|row| {
            let cells: Vec<Cell> = columns
                .iter()
                .map(|col| {
                    Cell::from(truncate(
                        &crate::models::QueryResponse::cell(row, col),
                        max_cell_width,
                    ))
                })
                .collect();
            Row::new(cells).style(styles::list_item_style())
        })
        .collect();

    let widths: Vec<Constraint> = columns.iter().map(|_| Constraint::Fill(1)).collect();

    let table = Table::new(rows, widths)
        .header(header)
        .block(block.title(format!(" Results ({} rows) ", response.results.len())))
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.results_selection));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_optimization(frame: &mut Frame, app: &App, area: Rect) {
    let Some(details) = app
        .query_response
        .as_ref()
        .and_then(|r| r.optimization_details.as_ref())
    else {
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled("Optimized query", styles::highlight_style())),
        Line::from(Span::styled(
            details.optimized_query.clone(),
            styles::success_style(),
        )),
        Line::from(""),
        Line::from(Span::styled("Original", styles::highlight_style())),
        Line::from(Span::styled(
            details.original_query.clone(),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled("Explanation", styles::highlight_style())),
    ];
    for part in details.explanation.lines() {
        lines.push(Line::from(Span::raw(part.to_string())));
    }

    let block = Block::default()
        .title(" AI Optimization ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}
