//! Interactive terminal dashboard over one run's transactions.
//!
//! Keys: Tab switches grouping, Left/Right cycle the filter, Up/Down move the
//! cursor, Space toggles a row, `a` toggles select-all, `e` exports the
//! visible rows, `q` quits.

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Terminal,
};
use statement_core::{Dashboard, Filter, UNASSIGNED_PROJECT};
use std::io::{self, Stdout};
use std::path::{Path, PathBuf};

use crate::report::{export_csv, money};

pub fn run_dashboard(dashboard: &mut Dashboard, export_path: PathBuf) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = dashboard_loop(&mut terminal, dashboard, &export_path);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn dashboard_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    dashboard: &mut Dashboard,
    export_path: &Path,
) -> Result<()> {
    let mut table_state = TableState::default();
    let mut status = String::from("Tab=group  ←/→=filter  ↑/↓=move  Space=select  a=select all  e=export  q=quit");

    loop {
        let view = dashboard.snapshot();
        let visible_ids: Vec<_> = view.visible.iter().map(|t| t.id).collect();
        if visible_ids.is_empty() {
            table_state.select(None);
        } else {
            let i = table_state.selected().unwrap_or(0).min(visible_ids.len() - 1);
            table_state.select(Some(i));
        }

        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Length(3),
                    Constraint::Min(5),
                    Constraint::Length(3),
                ])
                .split(f.area());

            let summary = &view.summary;
            let stats = Paragraph::new(Line::from(vec![
                Span::styled("Total spend ", Style::default().fg(Color::Gray)),
                Span::styled(money(summary.total), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw("   "),
                Span::styled("Suppliers ", Style::default().fg(Color::Gray)),
                Span::raw(summary.unique_suppliers().to_string()),
                Span::raw("   "),
                Span::styled("Active projects ", Style::default().fg(Color::Gray)),
                Span::raw(summary.active_projects().to_string()),
            ]))
            .block(Block::default().borders(Borders::ALL).title("Statement AI"));
            f.render_widget(stats, chunks[0]);

            let filter_text = match &view.filter {
                Filter::ShowAll => format!("All {}s ({})", view.grouping.label(), money(summary.total)),
                Filter::Group(name) => {
                    let amount = view
                        .options
                        .iter()
                        .find(|o| &o.name == name)
                        .map(|o| o.amount)
                        .unwrap_or(0.0);
                    format!("{name} ({})", money(amount))
                }
            };
            let total_label = if view.filter.is_show_all() { "Total" } else { "Filtered" };
            let selected_style = if view.selected_count > 0 {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default().fg(Color::Gray)
            };
            let controls = Paragraph::new(Line::from(vec![
                Span::styled(
                    format!("Group by {} ", view.grouping.label()),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw(format!("| Filter: {filter_text} ")),
                Span::raw(format!("| {total_label}: {} ", money(view.visible_total))),
                Span::styled(format!(" Selected: {} ", money(view.selected_total)), selected_style),
            ]))
            .block(Block::default().borders(Borders::ALL));
            f.render_widget(controls, chunks[1]);

            let header = Row::new(vec![
                Cell::from(if view.all_visible_selected { "[x]" } else { "[ ]" }),
                Cell::from("Date"),
                Cell::from("Description"),
                Cell::from("Supplier"),
                Cell::from("Project"),
                Cell::from("Amount"),
            ])
            .style(Style::default().add_modifier(Modifier::BOLD));

            let rows = view.visible.iter().map(|t| {
                let selected = dashboard.is_selected(t.id);
                let project_style = if t.project.is_some() {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                let row = Row::new(vec![
                    Cell::from(if selected { "[x]" } else { "[ ]" }),
                    Cell::from(if t.date.is_empty() { "-".to_string() } else { t.date.clone() }),
                    Cell::from(t.original_description.clone()),
                    Cell::from(t.supplier.clone()),
                    Cell::from(t.project.clone().unwrap_or_else(|| UNASSIGNED_PROJECT.to_string()))
                        .style(project_style),
                    Cell::from(money(t.amount)),
                ]);
                if selected {
                    row.style(Style::default().bg(Color::Rgb(30, 30, 70)))
                } else {
                    row
                }
            });

            let table = Table::new(
                rows,
                [
                    Constraint::Length(3),
                    Constraint::Length(10),
                    Constraint::Percentage(40),
                    Constraint::Percentage(20),
                    Constraint::Percentage(15),
                    Constraint::Length(12),
                ],
            )
            .header(header)
            .block(Block::default().borders(Borders::ALL).title("Transactions"))
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

            if view.visible.is_empty() {
                let empty = Paragraph::new("No transactions found matching this filter.")
                    .block(Block::default().borders(Borders::ALL).title("Transactions"));
                f.render_widget(empty, chunks[2]);
            } else {
                f.render_stateful_widget(table, chunks[2], &mut table_state);
            }

            let footer = Paragraph::new(status.as_str())
                .style(Style::default().fg(Color::Gray))
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(footer, chunks[3]);
        })?;
        drop(view);

        if !event::poll(std::time::Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Tab => {
                let next = dashboard.state().grouping.toggled();
                dashboard.set_grouping(next);
                table_state.select(Some(0));
            }
            KeyCode::Right => {
                dashboard.cycle_filter(true);
                table_state.select(Some(0));
            }
            KeyCode::Left => {
                dashboard.cycle_filter(false);
                table_state.select(Some(0));
            }
            KeyCode::Down => {
                if let Some(i) = table_state.selected() {
                    table_state.select(Some((i + 1).min(visible_ids.len().saturating_sub(1))));
                }
            }
            KeyCode::Up => {
                if let Some(i) = table_state.selected() {
                    table_state.select(Some(i.saturating_sub(1)));
                }
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some(id) = table_state.selected().and_then(|i| visible_ids.get(i)) {
                    dashboard.toggle(*id)?;
                }
            }
            KeyCode::Char('a') => dashboard.toggle_select_all(),
            KeyCode::Char('e') => {
                status = match export_csv(dashboard, export_path) {
                    Ok(()) => format!("Exported visible rows to {}", export_path.display()),
                    Err(e) => format!("Export failed: {e:#}"),
                };
            }
            _ => {}
        }
    }

    Ok(())
}
