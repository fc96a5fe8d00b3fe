use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "carelink")]
#[command(about = "carelink: query a managed FHIR store through the clinical gateway")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the configuration file (default: ./carelink.toml)
    #[arg(short, long, global = true, env = "CARELINK_CONFIG")]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Log level (overrides logging.level; RUST_LOG wins over both)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the dataset and FHIR store if they do not exist
    Bootstrap,
    /// Read a resource by reference (e.g. Patient/123)
    Get(GetArgs),
    /// Search for resources
    Search(SearchArgs),
    /// Show every record tied to one encounter
    Visit(VisitArgs),
    /// Show a patient's visits, newest first, as allowed by an episode of care
    Timeline(TimelineArgs),
    /// List a patient's active, confirmed problems
    Problems(PatientArgs),
    /// List a patient's active, confirmed allergies
    Allergies(PatientArgs),
    /// Print the effective configuration
    Config,
}

#[derive(clap::Args)]
pub struct GetArgs {
    /// Resource reference (e.g. Patient/123)
    pub reference: String,
}

#[derive(clap::Args)]
pub struct SearchArgs {
    /// Resource type (e.g. Condition)
    pub resource_type: String,
    /// Search parameters as key=value pairs
    pub params: Vec<String>,
    /// Maximum number of results
    #[arg(short = 'n', long)]
    pub count: Option<usize>,
}

#[derive(clap::Args)]
pub struct VisitArgs {
    /// Encounter id
    pub encounter_id: String,
    /// Records per resource type
    #[arg(short = 'n', long, default_value_t = carelink_gateway::MAX_CLINICAL_RECORD_PAGE_SIZE)]
    pub count: usize,
}

#[derive(clap::Args)]
pub struct TimelineArgs {
    /// Episode of care id
    pub episode_id: String,
    /// Explicit encounter count; bypasses the episode's access level
    #[arg(short = 'n', long)]
    pub count: Option<usize>,
}

#[derive(clap::Args)]
pub struct PatientArgs {
    /// Patient id
    pub patient_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from([
            "carelink",
            "search",
            "Condition",
            "patient=Patient/1",
            "clinical-status=active",
            "-n",
            "10",
            "--format",
            "table",
        ])
        .unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Table));
        let Commands::Search(args) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.resource_type, "Condition");
        assert_eq!(args.params.len(), 2);
        assert_eq!(args.count, Some(10));
    }

    #[test]
    fn test_visit_count_defaults_to_page_size() {
        let cli = Cli::try_parse_from(["carelink", "visit", "enc-1"]).unwrap();
        let Commands::Visit(args) = cli.command else {
            panic!("expected visit");
        };
        assert_eq!(args.count, carelink_gateway::MAX_CLINICAL_RECORD_PAGE_SIZE);
    }
}
