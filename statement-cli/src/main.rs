use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use statement_core::Grouping;
use statement_extract::Provider;
use std::path::PathBuf;

mod analyze;
mod auth;
mod config;
mod dashboard;
mod projects_cmd;
mod report;
mod state;

#[derive(Parser, Debug)]
#[command(
    name = "statement-ai",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("STATEMENT_AI_BUILD_SHA"), ")"),
    about = "Turn a bank statement CSV into categorized, filterable spend"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract transactions from a statement CSV and show the dashboard
    Analyze {
        /// Statement export (*.csv)
        csv: PathBuf,

        /// Use the built-in column rules instead of a language model
        #[arg(long)]
        offline: bool,

        /// Grouping dimension for the breakdown and filter
        #[arg(long, value_enum, default_value_t = GroupBy::Supplier)]
        group_by: GroupBy,

        /// Only show rows in this supplier/project group
        #[arg(long)]
        filter: Option<String>,

        /// Start with every visible row selected
        #[arg(long)]
        select_all: bool,

        /// Open the interactive dashboard
        #[arg(long)]
        tui: bool,

        /// Write the visible rows to this CSV file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Rows per extraction call (overrides config)
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Manage the known project list
    Projects {
        #[command(subcommand)]
        command: ProjectsCommand,
    },

    /// Inspect or create ~/.statement-ai/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Store API keys for the extraction providers
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ProjectsCommand {
    /// Print the current projects
    List,

    /// Add a project name
    Add { name: String },

    /// Remove a project name
    Remove { name: String },

    /// Remove every project
    Clear {
        /// Confirm removal
        #[arg(long)]
        yes: bool,
    },

    /// Replace the list with a JSON array of names
    Import { file: PathBuf },

    /// Write the list as a JSON array (default: ./project_config.json)
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,

    /// Print the effective config
    Show,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Prompt for and save an API key (gemini, openai, anthropic)
    SetKey { provider: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GroupBy {
    Supplier,
    Project,
}

impl From<GroupBy> for Grouping {
    fn from(g: GroupBy) -> Self {
        match g {
            GroupBy::Supplier => Grouping::Supplier,
            GroupBy::Project => Grouping::Project,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Analyze {
            csv,
            offline,
            group_by,
            filter,
            select_all,
            tui,
            report,
            batch_size,
        } => {
            let cfg = config::load_config()?;
            let args = analyze::AnalyzeArgs {
                csv,
                offline,
                group_by: group_by.into(),
                filter,
                select_all,
                tui,
                report,
                batch_size,
            };
            analyze::run_analyze(&cfg, args).await?;
        }

        Command::Projects { command } => {
            let cfg = config::load_config()?;
            let mut projects = projects_cmd::open_projects(&cfg)?;
            match command {
                ProjectsCommand::List => projects_cmd::list(&projects),
                ProjectsCommand::Add { name } => projects_cmd::add(&mut projects, &name)?,
                ProjectsCommand::Remove { name } => projects_cmd::remove(&mut projects, &name)?,
                ProjectsCommand::Clear { yes } => projects_cmd::clear(&mut projects, yes)?,
                ProjectsCommand::Import { file } => projects_cmd::import(&mut projects, &file)?,
                ProjectsCommand::Export { out } => projects_cmd::export(&projects, out)?,
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
        },

        Command::Auth { command } => match command {
            AuthCommand::SetKey { provider } => {
                let provider: Provider = provider.parse()?;
                auth::set_key(provider)?;
            }
        },
    }

    Ok(())
}
