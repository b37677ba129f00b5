use anyhow::Result;
use bullion::core::holding::{FormType, HoldingUpdate, NewHolding};
use bullion::core::log::init_logging;
use bullion::core::notification::NotificationUpdate;
use bullion::core::price::Metal;
use bullion::core::pricing::{DEFAULT_HISTORY_DAYS, HistoryQuery};
use bullion::{AppCommand, HoldingsCommand, NotifyCommand};
use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// User whose holdings and settings to use
    #[arg(short, long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show current gold and silver spot prices
    Prices {
        /// Show the cache as stored, without refreshing
        #[arg(long)]
        cached: bool,
    },
    /// Show daily price history
    History {
        /// gold or silver
        #[arg(short, long)]
        metal: Option<Metal>,
        /// Lookback in days (1-365)
        #[arg(short, long, default_value_t = DEFAULT_HISTORY_DAYS)]
        days: u32,
    },
    /// Manage holdings
    #[command(subcommand)]
    Holdings(HoldingsCommands),
    /// Display portfolio summary
    Summary,
    /// Display allocation and per-holding performance
    Analytics,
    /// Manage notification settings
    #[command(subcommand)]
    Notify(NotifyCommands),
    /// Send the daily digest to every subscribed user
    Digest,
}

#[derive(Subcommand)]
enum HoldingsCommands {
    /// List holdings, newest first
    List {
        #[arg(short, long)]
        metal: Option<Metal>,
    },
    /// Add a holding
    Add(AddArgs),
    /// Change fields of a holding
    Update {
        id: Uuid,
        #[command(flatten)]
        fields: UpdateArgs,
    },
    /// Remove a holding
    Remove { id: Uuid },
}

#[derive(Args)]
struct AddArgs {
    #[arg(long)]
    metal: Metal,
    /// Troy ounces per unit
    #[arg(long)]
    weight: Decimal,
    /// bar or coin
    #[arg(long)]
    form: FormType,
    #[arg(long)]
    denomination: String,
    #[arg(long, default_value_t = 1)]
    quantity: u32,
    /// Price paid per unit
    #[arg(long)]
    price: Option<Decimal>,
    /// Purchase date (YYYY-MM-DD)
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Args)]
struct UpdateArgs {
    #[arg(long)]
    metal: Option<Metal>,
    #[arg(long)]
    weight: Option<Decimal>,
    #[arg(long)]
    form: Option<FormType>,
    #[arg(long)]
    denomination: Option<String>,
    #[arg(long)]
    quantity: Option<u32>,
    #[arg(long)]
    price: Option<Decimal>,
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Subcommand)]
enum NotifyCommands {
    /// Show notification settings
    Show,
    /// Change notification settings
    Set {
        /// Enable the daily digest
        #[arg(long, conflicts_with = "disable")]
        enable: bool,
        /// Disable the daily digest
        #[arg(long)]
        disable: bool,
        /// Webhook URL; an empty value removes it
        #[arg(long)]
        webhook: Option<String>,
    },
    /// Send a test message to the saved webhook
    Test,
}

impl From<AddArgs> for NewHolding {
    fn from(args: AddArgs) -> Self {
        NewHolding {
            metal: args.metal,
            weight_oz: args.weight,
            form: args.form,
            denomination: args.denomination,
            quantity: args.quantity,
            purchase_price: args.price,
            purchase_date: args.date,
            notes: args.notes,
        }
    }
}

impl From<UpdateArgs> for HoldingUpdate {
    fn from(args: UpdateArgs) -> Self {
        HoldingUpdate {
            metal: args.metal,
            weight_oz: args.weight,
            form: args.form,
            denomination: args.denomination,
            quantity: args.quantity,
            purchase_price: args.price,
            purchase_date: args.date,
            notes: args.notes,
        }
    }
}

impl From<Commands> for AppCommand {
    fn from(cmd: Commands) -> AppCommand {
        match cmd {
            Commands::Prices { cached: false } => AppCommand::Prices,
            Commands::Prices { cached: true } => AppCommand::CachedPrices,
            Commands::History { metal, days } => AppCommand::History(HistoryQuery { metal, days }),
            Commands::Holdings(cmd) => AppCommand::Holdings(match cmd {
                HoldingsCommands::List { metal } => HoldingsCommand::List { metal },
                HoldingsCommands::Add(args) => HoldingsCommand::Add(args.into()),
                HoldingsCommands::Update { id, fields } => HoldingsCommand::Update {
                    id,
                    update: fields.into(),
                },
                HoldingsCommands::Remove { id } => HoldingsCommand::Remove { id },
            }),
            Commands::Summary => AppCommand::Summary,
            Commands::Analytics => AppCommand::Analytics,
            Commands::Notify(cmd) => AppCommand::Notify(match cmd {
                NotifyCommands::Show => NotifyCommand::Show,
                NotifyCommands::Set {
                    enable,
                    disable,
                    webhook,
                } => NotifyCommand::Set(NotificationUpdate {
                    daily_digest_enabled: (enable || disable).then_some(enable),
                    webhook_url: webhook,
                }),
                NotifyCommands::Test => NotifyCommand::Test,
            }),
            Commands::Digest => AppCommand::Digest,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => bullion::cli::setup::setup(),
        Some(cmd) => {
            bullion::run_command(cmd.into(), cli.config_path.as_deref(), cli.user.as_deref())
                .await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
