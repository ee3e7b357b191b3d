use clap::Parser;
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ratecard")]
#[command(version, about = "Validate and evaluate catalog rate plans")]
#[command(allow_negative_numbers = true)]
pub struct Cli {
    /// Rate plan or pricing model JSON file
    #[arg(short = 'p', long = "plan", value_name = "FILE")]
    pub plan: Option<PathBuf>,

    /// Load the named rate plan from the catalog backend
    #[arg(short = 'f', long = "fetch", value_name = "NAME", conflicts_with = "plan")]
    pub fetch: Option<String>,

    /// Usage quantity to evaluate
    #[arg(short = 'u', long = "usage", value_name = "QUANTITY")]
    pub usage: Option<Decimal>,

    /// Print the per-tier breakdown of the charge
    #[arg(short = 'b', long = "breakdown")]
    pub breakdown: bool,

    /// Only validate the pricing model
    #[arg(long = "validate")]
    pub validate: bool,

    /// Currency for rounding and display (defaults to the plan's, then the config's)
    #[arg(long = "currency", value_name = "CODE")]
    pub currency: Option<String>,

    /// List rate plans from the catalog backend
    #[arg(long = "list")]
    pub list: bool,

    /// List products from the catalog backend
    #[arg(long = "products")]
    pub products: bool,

    /// Check whether a product name is already taken
    #[arg(long = "check-name", value_name = "NAME")]
    pub check_name: Option<String>,

    /// Initialize config file
    #[arg(long = "init")]
    pub init: bool,

    /// Print current configuration
    #[arg(long = "print")]
    pub print: bool,

    /// Check configuration
    #[arg(long = "check")]
    pub check: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
