//! Clap derive structures for the `boardstack` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// boardstack -- post boards and provision VMs from the command line
#[derive(Debug, Parser)]
#[command(
    name = "boardstack",
    version,
    about = "Manage board posts and OpenStack VM deployments from the command line",
    long_about = "A command-line client for the boardstack service.\n\n\
        Reads are served from a client-side cache, destructive commands ask\n\
        for confirmation, and the dashboard refreshes deployments on a timer.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend API base URL (overrides config)
    #[arg(long, short = 'u', env = "BOARDSTACK_API_BASE_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "BOARDSTACK_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides config)
    #[arg(long, env = "BOARDSTACK_TIMEOUT_SECS", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read and write board posts
    #[command(alias = "b")]
    Boards(BoardsArgs),

    /// Deploy and manage OpenStack VMs
    #[command(alias = "deployments")]
    Vms(VmsArgs),

    /// Show integrated system status
    Status,

    /// Live deployment dashboard
    #[command(alias = "dash")]
    Dashboard(DashboardArgs),

    /// Log in and store the access token
    Login(LoginArgs),

    /// Forget the stored access token
    Logout,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Boards ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct BoardsArgs {
    #[command(subcommand)]
    pub command: BoardsCommand,
}

#[derive(Debug, Subcommand)]
pub enum BoardsCommand {
    /// List all posts
    #[command(alias = "ls")]
    List,

    /// Search posts by keyword
    Search {
        /// Keyword matched against title and content
        keyword: String,
    },

    /// Show one post
    Get {
        /// Post ID
        id: i64,
    },

    /// Create a post
    Create(BoardCreateArgs),

    /// Update a post's title, content or VM request
    Update {
        /// Post ID
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        content: Option<String>,

        #[command(flatten)]
        vm: VmRequestArgs,
    },

    /// Delete a post
    #[command(alias = "rm")]
    Delete {
        /// Post ID
        id: i64,
    },
}

#[derive(Debug, Args)]
pub struct BoardCreateArgs {
    #[arg(long)]
    pub title: String,

    /// Post body (use --content-file for longer text)
    #[arg(long, conflicts_with = "content_file", required_unless_present = "content_file")]
    pub content: Option<String>,

    /// Read the post body from a file
    #[arg(long)]
    pub content_file: Option<PathBuf>,

    #[arg(long, env = "USER")]
    pub author: String,

    #[command(flatten)]
    pub vm: VmRequestArgs,
}

/// Optional VM request attached to a post.
#[derive(Debug, Args)]
pub struct VmRequestArgs {
    /// Requested VM name (enables the VM request)
    #[arg(long, requires_all = ["flavor", "image", "network"])]
    pub vm_name: Option<String>,

    #[arg(long)]
    pub flavor: Option<String>,

    #[arg(long)]
    pub image: Option<String>,

    #[arg(long)]
    pub network: Option<String>,

    /// Security group (repeatable)
    #[arg(long = "security-group")]
    pub security_groups: Vec<String>,

    #[arg(long)]
    pub key_pair: Option<String>,

    /// Cloud-init user data file
    #[arg(long)]
    pub user_data_file: Option<PathBuf>,
}

// ── VMs ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct VmsArgs {
    #[command(subcommand)]
    pub command: VmsCommand,
}

#[derive(Debug, Subcommand)]
pub enum VmsCommand {
    /// Request a new VM deployment
    Deploy(DeployArgs),

    /// List deployments
    #[command(alias = "ls")]
    List,

    /// Show one deployment
    Get {
        /// Deployment ID
        id: String,
    },

    /// Destroy a deployed VM
    Destroy {
        /// Deployment ID
        id: String,
    },

    /// Cancel a pending or in-progress deployment
    Cancel {
        /// Deployment ID
        id: String,
    },

    /// OpenStack connectivity check
    Health,
}

#[derive(Debug, Args)]
pub struct DeployArgs {
    /// VM name (3-50 characters: letters, digits, '-', '_')
    pub vm_name: String,

    #[arg(long)]
    pub instance_type: String,

    #[arg(long)]
    pub image_id: String,

    #[arg(long)]
    pub network_id: String,

    #[arg(long, default_value = "default")]
    pub security_group: String,

    #[arg(long)]
    pub key_pair: String,

    /// Disk size in GB (10-1000)
    #[arg(long, default_value = "20")]
    pub disk_size: u32,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long, env = "USER")]
    pub requested_by: String,
}

// ── Dashboard ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DashboardArgs {
    /// Refresh period, e.g. "30s" or "2m" [default: from config]
    #[arg(long, short = 'i', value_parser = humantime::parse_duration)]
    pub interval: Option<Duration>,

    /// Render a single refresh and exit
    #[arg(long)]
    pub once: bool,
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Username (prompted if omitted)
    #[arg(long)]
    pub username: Option<String>,

    /// Read the password from stdin instead of prompting
    #[arg(long)]
    pub password_stdin: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create the config file with guided setup
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display the resolved configuration
    Show,

    /// Set a single key in the config file
    Set {
        /// Key name, e.g. api_base_url or timeout_secs
        key: String,

        value: String,
    },

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
