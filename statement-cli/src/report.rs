//! Plain-text and CSV renderings of the dashboard

use anyhow::{Context, Result};
use statement_core::{Dashboard, DashboardView, Filter, UNASSIGNED_PROJECT};
use std::io::Write;
use std::path::Path;

pub fn money(v: f64) -> String {
    format!("${v:.2}")
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Header figures, filter options and the visible rows
pub fn render_text(dashboard: &Dashboard, out: &mut impl Write) -> Result<()> {
    let view = dashboard.snapshot();
    let summary = &view.summary;

    writeln!(out, "Total spend:      {}", money(summary.total))?;
    writeln!(out, "Unique suppliers: {}", summary.unique_suppliers())?;
    writeln!(out, "Active projects:  {}", summary.active_projects())?;
    writeln!(out)?;

    writeln!(out, "By {}:", view.grouping.label().to_lowercase())?;
    for opt in &view.options {
        let marker = match &view.filter {
            Filter::Group(name) if name == &opt.name => ">",
            _ => " ",
        };
        writeln!(
            out,
            " {marker} {:<32} {:>12}  ({} txns)",
            truncate(&opt.name, 32),
            money(opt.amount),
            opt.count
        )?;
    }
    writeln!(out)?;

    render_rows(dashboard, &view, out)?;
    writeln!(out)?;

    let total_label = if view.filter.is_show_all() {
        "Total amount"
    } else {
        "Filtered total"
    };
    writeln!(out, "{total_label}: {}", money(view.visible_total))?;
    writeln!(
        out,
        "Selected: {} ({} txns)",
        money(view.selected_total),
        view.selected_count
    )?;
    Ok(())
}

fn render_rows(dashboard: &Dashboard, view: &DashboardView<'_>, out: &mut impl Write) -> Result<()> {
    if view.visible.is_empty() {
        writeln!(out, "No transactions found matching this filter.")?;
        return Ok(());
    }

    let all = if view.all_visible_selected { "[x]" } else { "[ ]" };
    writeln!(
        out,
        "{all} {:>4}  {:<10}  {:<36}  {:<20}  {:<16}  {:>10}",
        "#", "Date", "Description", "Supplier", "Project", "Amount"
    )?;
    for t in &view.visible {
        let mark = if dashboard.is_selected(t.id) { "[x]" } else { "[ ]" };
        let date = if t.date.is_empty() { "-" } else { t.date.as_str() };
        writeln!(
            out,
            "{mark} {:>4}  {:<10}  {:<36}  {:<20}  {:<16}  {:>10}",
            t.id,
            truncate(date, 10),
            truncate(&t.original_description, 36),
            truncate(&t.supplier, 20),
            truncate(t.project.as_deref().unwrap_or(UNASSIGNED_PROJECT), 16),
            money(t.amount)
        )?;
    }
    Ok(())
}

/// Write the visible rows as CSV, with a column flagging the selection.
pub fn write_csv(dashboard: &Dashboard, out: impl Write) -> Result<()> {
    let view = dashboard.snapshot();
    let mut w = csv::Writer::from_writer(out);
    w.write_record(["id", "date", "description", "supplier", "project", "amount", "selected"])?;
    for t in &view.visible {
        w.write_record([
            t.id.to_string(),
            t.date.clone(),
            t.original_description.clone(),
            t.supplier_key().to_string(),
            t.project_key().to_string(),
            format!("{:.2}", t.amount),
            dashboard.is_selected(t.id).to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

pub fn export_csv(dashboard: &Dashboard, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_csv(dashboard, file).with_context(|| format!("write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use statement_core::{assign_ids, ExtractedTransaction, Grouping, TransactionId};

    fn dashboard() -> Dashboard {
        Dashboard::new(assign_ids(vec![
            ExtractedTransaction::new("2024-03-01", "AMZN Mktp US*13423 Alpha Upgrade", "AMZN Mktp US", Some("Alpha Upgrade".into()), 42.5),
            ExtractedTransaction::new("", "ACME, Inc 12", "ACME, Inc", None, 7.0),
        ]))
    }

    #[test]
    fn test_csv_quotes_and_flags() {
        let mut d = dashboard();
        d.toggle(TransactionId(1)).unwrap();
        let mut buf = Vec::new();
        write_csv(&d, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id,date,description,supplier,project,amount,selected");
        assert_eq!(lines[1], "0,2024-03-01,AMZN Mktp US*13423 Alpha Upgrade,AMZN Mktp US,Alpha Upgrade,42.50,false");
        assert_eq!(lines[2], "1,,\"ACME, Inc 12\",\"ACME, Inc\",Unassigned,7.00,true");
    }

    #[test]
    fn test_csv_respects_filter() {
        let mut d = dashboard();
        d.set_grouping(Grouping::Project);
        d.set_filter("Unassigned").unwrap();
        let mut buf = Vec::new();
        write_csv(&d, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_text_report_totals() {
        let mut d = dashboard();
        d.toggle_select_all();
        let mut buf = Vec::new();
        render_text(&d, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Total spend:      $49.50"));
        assert!(text.contains("Active projects:  1"));
        assert!(text.contains("Selected: $49.50 (2 txns)"));
    }

    #[test]
    fn test_text_report_empty_filter_message() {
        let d = Dashboard::default();
        let mut buf = Vec::new();
        render_text(&d, &mut buf).unwrap();
        assert!(String::from_utf8(buf).unwrap().contains("No transactions found"));
    }
}
