//! Clap derive structures for the `stocker` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// stocker -- count warehouse stock from the command line
#[derive(Debug, Parser)]
#[command(
    name = "stocker",
    version,
    about = "Count warehouse stock from the command line",
    long_about = "Client for the stocker inventory service.\n\n\
        Log in once with the company QR payload, pick a warehouse and shelf,\n\
        then look up items and record stock entries.",
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
    /// Server URL (overrides the one from the QR login)
    #[arg(long, env = "STOCKER_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "STOCKER_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

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

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (defaults to the config file value)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
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

#[derive(Debug, Clone, ValueEnum)]
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
    /// Log in with a company QR payload
    Login(LoginArgs),

    /// Forget the login, token and selection
    Logout,

    /// Show the logged-in user, server and selection
    Whoami,

    /// Fetch a fresh access token and show its expiry
    Token,

    /// List warehouses
    #[command(alias = "wh")]
    Warehouses(WarehousesArgs),

    /// Select the working warehouse and shelf
    Use(UseArgs),

    /// Look up items
    #[command(alias = "i")]
    Items(ItemsArgs),

    /// Manage stock entries
    #[command(alias = "e")]
    Entries(EntriesArgs),

    /// Manage CLI configuration and credentials
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LOGIN
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Base64 QR payload as scanned
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    pub payload: Option<String>,

    /// Read the payload from a file (`-` for stdin)
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WAREHOUSES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WarehousesArgs {
    #[command(subcommand)]
    pub command: WarehousesCommand,
}

#[derive(Debug, Subcommand)]
pub enum WarehousesCommand {
    /// List warehouses visible to the logged-in user
    #[command(alias = "ls")]
    List,
}

#[derive(Debug, Args)]
pub struct UseArgs {
    /// Warehouse ID or name
    #[arg(required_unless_present = "clear")]
    pub warehouse: Option<String>,

    /// Shelf being counted
    #[arg(long, short = 's')]
    pub shelf: Option<String>,

    /// Clear the warehouse and shelf selection
    #[arg(long, conflicts_with_all = ["warehouse", "shelf"])]
    pub clear: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ITEMS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ItemsArgs {
    #[command(subcommand)]
    pub command: ItemsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ItemsCommand {
    /// List items, flattened across item groups
    #[command(alias = "ls")]
    List {
        /// Warehouse ID (defaults to the selected warehouse)
        #[arg(long, short = 'w')]
        warehouse: Option<String>,

        /// Only items carrying this barcode
        #[arg(long, short = 'b')]
        barcode: Option<String>,
    },

    /// Show stock details for a scanned barcode
    Show {
        /// Barcode as scanned
        barcode: String,

        /// Warehouse ID (defaults to the selected warehouse)
        #[arg(long, short = 'w')]
        warehouse: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ENTRIES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct EntriesArgs {
    #[command(subcommand)]
    pub command: EntriesCommand,
}

#[derive(Debug, Subcommand)]
pub enum EntriesCommand {
    /// List stock entries
    #[command(alias = "ls")]
    List {
        /// Only entries dated today
        #[arg(long)]
        today: bool,

        /// Warehouse ID (defaults to the selected warehouse)
        #[arg(long, short = 'w')]
        warehouse: Option<String>,
    },

    /// Record a counted quantity for a barcode
    Create(CreateEntryArgs),

    /// Replace the fields of an existing entry
    Update(UpdateEntryArgs),

    /// Delete an entry
    #[command(alias = "rm")]
    Delete {
        /// Entry ID
        entry_id: String,
    },
}

#[derive(Debug, Args)]
pub struct CreateEntryArgs {
    /// Barcode as scanned
    #[arg(long, short = 'b')]
    pub barcode: String,

    /// Counted quantity
    #[arg(long)]
    pub qty: f64,

    /// Unit of measure (defaults to the item's unit)
    #[arg(long)]
    pub uom: Option<String>,

    /// Item ID; skips the barcode lookup when given together with --uom
    #[arg(long, requires = "uom")]
    pub item_id: Option<String>,

    /// Warehouse ID (defaults to the selected warehouse)
    #[arg(long, short = 'w')]
    pub warehouse: Option<String>,

    /// Shelf (defaults to the selected shelf)
    #[arg(long, short = 's')]
    pub shelf: Option<String>,
}

#[derive(Debug, Args)]
pub struct UpdateEntryArgs {
    /// Entry ID
    pub entry_id: String,

    /// Barcode
    #[arg(long, short = 'b')]
    pub barcode: String,

    /// Item code
    #[arg(long)]
    pub item_code: String,

    /// Unit of measure
    #[arg(long)]
    pub uom: String,

    /// Counted quantity
    #[arg(long)]
    pub qty: f64,

    /// Warehouse ID (defaults to the selected warehouse)
    #[arg(long, short = 'w')]
    pub warehouse: Option<String>,

    /// Shelf (defaults to the selected shelf)
    #[arg(long, short = 's')]
    pub shelf: Option<String>,

    /// Entry time as `YYYY-MM-DD HH:MM:SS` (defaults to now)
    #[arg(long)]
    pub date: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the current configuration (secrets redacted)
    Show,

    /// Print the config file path
    Path,

    /// Store an app credential (api_key, api_secret or app_key)
    SetCredential {
        /// Credential field
        #[arg(value_parser = ["api_key", "api_secret", "app_key"])]
        field: String,

        /// Value; prompted for when omitted
        #[arg(long)]
        value: Option<String>,

        /// Write to the config file instead of the system keyring
        #[arg(long)]
        plaintext: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
