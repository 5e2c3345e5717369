use anyhow::{Context, Result};
use statement_core::{Dashboard, Grouping, RunState};
use statement_extract::{
    Extractor, LlmExtractor, LlmSettings, Orchestrator, RuleExtractor, RunOutcome,
};
use statement_ingest::{read_statement, BatchSize};
use std::io::{self, Write};
use std::path::PathBuf;

use crate::auth;
use crate::config::Config;
use crate::dashboard::run_dashboard;
use crate::projects_cmd::open_projects;
use crate::report::{export_csv, render_text};

#[derive(Debug, Clone, Default)]
pub struct AnalyzeArgs {
    pub csv: PathBuf,
    pub offline: bool,
    pub group_by: Grouping,
    pub filter: Option<String>,
    pub select_all: bool,
    pub tui: bool,
    pub report: Option<PathBuf>,
    pub batch_size: Option<usize>,
}

pub async fn run_analyze(cfg: &Config, args: AnalyzeArgs) -> Result<()> {
    let text = read_statement(&args.csv, None)?;
    let projects = open_projects(cfg)?;
    let known = projects.names().to_vec();

    let batch_size = match args.batch_size {
        Some(n) => BatchSize::new(n).context("invalid --batch-size")?,
        None => cfg.run.batch_size()?,
    };

    let mut state = RunState::new();
    state.begin();

    let outcome = if args.offline {
        log::info!("extracting with built-in rules");
        extract(RuleExtractor::new(), cfg, batch_size, &text, &known, &mut state).await
    } else {
        let settings = match llm_settings(cfg) {
            Ok(s) => s,
            Err(e) => {
                state.fail();
                return Err(e);
            }
        };
        log::info!("extracting with {} ({})", settings.provider, settings.model);
        extract(LlmExtractor::new(settings), cfg, batch_size, &text, &known, &mut state).await
    };
    eprintln!();

    let report = &outcome.report;
    if !report.is_complete() {
        eprintln!(
            "warning: {} of {} batches failed; {} of {} rows were skipped",
            report.failures.len(),
            report.batches,
            report.rows_dropped(),
            report.rows_total
        );
    }

    state.finish(outcome.transactions);
    let mut dashboard = Dashboard::new(state.take_transactions());
    dashboard.set_grouping(args.group_by);
    if let Some(name) = &args.filter {
        if let Err(warning) = apply_filter(&mut dashboard, name) {
            eprintln!("warning: {warning}");
        }
    }
    if args.select_all {
        dashboard.toggle_select_all();
    }

    if args.tui {
        let export_path = args
            .report
            .clone()
            .unwrap_or_else(|| PathBuf::from("statement_report.csv"));
        run_dashboard(&mut dashboard, export_path)?;
    } else {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        render_text(&dashboard, &mut out)?;
        out.flush()?;
        if let Some(path) = &args.report {
            export_csv(&dashboard, path)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

/// Apply `--filter`. An unknown name leaves "show all" in place and yields a
/// message listing the groups that do exist.
fn apply_filter(dashboard: &mut Dashboard, name: &str) -> Result<(), String> {
    let Err(e) = dashboard.set_filter(name) else {
        return Ok(());
    };
    let names: Vec<String> = dashboard.options().into_iter().map(|o| o.name).collect();
    if names.is_empty() {
        Err(format!("{e}; showing all transactions"))
    } else {
        Err(format!("{e}; showing all transactions (available: {})", names.join(", ")))
    }
}

fn llm_settings(cfg: &Config) -> Result<LlmSettings> {
    let provider = cfg.llm.provider;
    let mut settings = LlmSettings::new(provider, auth::api_key(provider)?);
    if !cfg.llm.model.trim().is_empty() {
        settings.model = cfg.llm.model.trim().to_string();
    }
    if !cfg.llm.base_url.trim().is_empty() {
        settings.base_url = cfg.llm.base_url.trim().trim_end_matches('/').to_string();
    }
    settings.temperature = cfg.llm.temperature;
    settings.max_tokens = cfg.llm.max_tokens;
    Ok(settings)
}

async fn extract<E: Extractor>(
    extractor: E,
    cfg: &Config,
    batch_size: BatchSize,
    text: &str,
    known: &[String],
    state: &mut RunState,
) -> RunOutcome {
    let orchestrator = Orchestrator::new(extractor)
        .with_batch_size(batch_size)
        .with_batch_timeout(cfg.run.batch_timeout());

    orchestrator
        .run(text, known, |p| {
            state.report(p);
            eprint!("\rAnalyzing statement... {:>3}%", state.progress());
            io::stderr().flush().ok();
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use statement_core::{assign_ids, ExtractedTransaction, Filter};

    fn dashboard() -> Dashboard {
        Dashboard::new(assign_ids(vec![
            ExtractedTransaction::new("", "ACME 1", "ACME", None, 10.0),
            ExtractedTransaction::new("", "Globex 2", "Globex", None, 2.5),
        ]))
    }

    #[test]
    fn test_known_filter_applies() {
        let mut d = dashboard();
        assert!(apply_filter(&mut d, "Globex").is_ok());
        assert_eq!(d.state().filter, Filter::Group("Globex".into()));
    }

    #[test]
    fn test_unknown_filter_keeps_results() {
        let mut d = dashboard();
        let warning = apply_filter(&mut d, "Initech").unwrap_err();
        assert!(warning.contains("'Initech'"));
        assert!(warning.ends_with("(available: ACME, Globex)"));
        assert_eq!(d.state().filter, Filter::ShowAll);
        assert_eq!(d.snapshot().visible.len(), 2);
    }
}
