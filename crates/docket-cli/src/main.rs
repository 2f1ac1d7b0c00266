mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use docket_core::types::{EntityKind, Priority};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "docket",
    about = "Markdown project tracker: tickets, stories, PRDs and issues as files",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from docket.yaml, tickets/ or .git/)
    #[arg(long, global = true, env = "DOCKET_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create storage directories, default templates and docket.yaml
    Init,

    /// Create a PRD in docs/prd/active
    CreatePrd {
        title: String,
        /// low, medium, high or critical
        #[arg(long, default_value = "medium")]
        priority: Priority,
    },

    /// Create a ticket
    CreateTicket {
        title: String,
        description: String,
        /// low, medium, high or critical
        #[arg(default_value = "medium")]
        priority: Priority,
    },

    /// Create an issue
    CreateIssue {
        title: String,
        /// low, medium, high or critical
        #[arg(default_value = "medium")]
        severity: Priority,
        #[arg(long)]
        description: Option<String>,
    },

    /// Create one story per story block of a PRD
    GenerateStories { prd_id: String },

    /// List active tickets
    ListTickets {
        #[arg(long)]
        status: Option<String>,
    },

    /// List active stories
    ListStories {
        #[arg(long)]
        status: Option<String>,
    },

    /// List active issues
    ListIssues {
        #[arg(long)]
        status: Option<String>,
    },

    /// List PRDs
    ListPrds {
        #[arg(long)]
        status: Option<String>,
        /// Include docs/prd/archive
        #[arg(long)]
        archived: bool,
    },

    /// Move a ticket to In Progress (default: highest-priority Not Started)
    PickTicket {
        #[arg(long)]
        ticket: Option<String>,
    },

    /// Move a story to In Progress (default: highest-priority Not Started)
    PickStory {
        #[arg(long)]
        story: Option<String>,
    },

    /// Change a ticket's status, title, description or id
    UpdateTicket {
        #[arg(long)]
        id: String,
        #[arg(long)]
        status: Option<String>,
        /// New title
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Renumber the ticket
        #[arg(long)]
        newid: Option<String>,
    },

    /// Set the status of any entity
    SetStatus { id: String, status: String },

    /// Completion summary of every entity kind
    StatusReport,

    /// Tickets, stories and issues with version control, checks and recommendations
    SprintReport,

    /// Delete one ticket or ALL active tickets
    ClearTickets {
        /// Ticket id, or ALL
        target: String,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
        /// Delete without keeping a copy in tickets/archive
        #[arg(long)]
        no_archive: bool,
    },

    /// Move a PRD to docs/prd/archive
    ArchivePrd { id: String },

    /// Show one entity
    Show { id: String },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let json = cli.json;

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, json),
        Commands::CreatePrd { title, priority } => cmd::create::prd(&root, &title, priority, json),
        Commands::CreateTicket {
            title,
            description,
            priority,
        } => cmd::create::ticket(&root, &title, &description, priority, json),
        Commands::CreateIssue {
            title,
            severity,
            description,
        } => cmd::create::issue(&root, &title, severity, description.as_deref(), json),
        Commands::GenerateStories { prd_id } => cmd::create::generate_stories(&root, &prd_id, json),
        Commands::ListTickets { status } => {
            cmd::list::run(&root, EntityKind::Ticket, status.as_deref(), false, json)
        }
        Commands::ListStories { status } => {
            cmd::list::run(&root, EntityKind::Story, status.as_deref(), false, json)
        }
        Commands::ListIssues { status } => {
            cmd::list::run(&root, EntityKind::Issue, status.as_deref(), false, json)
        }
        Commands::ListPrds { status, archived } => {
            cmd::list::run(&root, EntityKind::Prd, status.as_deref(), archived, json)
        }
        Commands::PickTicket { ticket } => {
            cmd::pick::run(&root, EntityKind::Ticket, ticket.as_deref(), json)
        }
        Commands::PickStory { story } => {
            cmd::pick::run(&root, EntityKind::Story, story.as_deref(), json)
        }
        Commands::UpdateTicket {
            id,
            status,
            name,
            description,
            newid,
        } => cmd::update::ticket(
            &root,
            &id,
            cmd::update::TicketArgs {
                status,
                name,
                description,
                newid,
            },
            json,
        ),
        Commands::SetStatus { id, status } => cmd::update::set_status(&root, &id, &status, json),
        Commands::StatusReport => cmd::report::status(&root, json),
        Commands::SprintReport => cmd::report::sprint(&root, json),
        Commands::ClearTickets {
            target,
            yes,
            no_archive,
        } => cmd::remove::clear_tickets(&root, &target, yes, !no_archive, json),
        Commands::ArchivePrd { id } => cmd::remove::archive_prd(&root, &id, json),
        Commands::Show { id } => cmd::show::run(&root, &id, json),
    };

    if let Err(e) = cmd::recover_not_found(result) {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
