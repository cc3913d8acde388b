//! Command-line arguments

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sfsync_domain::Record;

#[derive(Debug, Parser)]
#[command(name = "sfsync")]
#[command(about = "Create, update, list and bulk-synchronize Salesforce accounts")]
#[command(version)]
#[command(after_help = "Examples:\n  \
    sfsync create --name \"Acme Corp\" --type Customer\n  \
    sfsync update --id 001XX000003DHP0 --name \"New Name\"\n  \
    sfsync list --limit 5\n  \
    sfsync sync accounts.json")]
pub struct Cli {
    /// Path to a TOML or JSON configuration file
    #[arg(long, global = true, env = "SFSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Preview operations without making changes
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a new account
    Create(CreateArgs),
    /// Update an existing account
    Update(UpdateArgs),
    /// List accounts
    List(ListArgs),
    /// Show the field metadata of an object type
    Describe(DescribeArgs),
    /// Validate and submit a batch of records from a JSON file
    Sync(SyncArgs),
}

/// Optional account fields shared by `create` and `update`
#[derive(Debug, Clone, Default, Args)]
pub struct AccountFields {
    /// Account type (e.g. Customer, Prospect)
    #[arg(long = "type")]
    pub account_type: Option<String>,
    #[arg(long)]
    pub industry: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    /// Website URL
    #[arg(long)]
    pub website: Option<String>,
    #[arg(long)]
    pub billing_street: Option<String>,
    #[arg(long)]
    pub billing_city: Option<String>,
    #[arg(long)]
    pub billing_state: Option<String>,
    #[arg(long)]
    pub billing_postal_code: Option<String>,
    #[arg(long)]
    pub billing_country: Option<String>,
}

impl AccountFields {
    /// Non-empty values under their Salesforce field names
    pub fn apply(self, mut record: Record) -> Record {
        let mapping = [
            ("Type", self.account_type),
            ("Industry", self.industry),
            ("Phone", self.phone),
            ("Website", self.website),
            ("BillingStreet", self.billing_street),
            ("BillingCity", self.billing_city),
            ("BillingState", self.billing_state),
            ("BillingPostalCode", self.billing_postal_code),
            ("BillingCountry", self.billing_country),
        ];
        for (field, value) in mapping {
            if let Some(value) = value.filter(|value| !value.is_empty()) {
                record.insert(field, value);
            }
        }
        record
    }
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Account name (required)
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub account_number: Option<String>,
    #[command(flatten)]
    pub fields: AccountFields,
}

impl CreateArgs {
    pub fn into_record(self) -> Record {
        let mut record = Record::new().with("Name", self.name);
        if let Some(number) = self.account_number.filter(|number| !number.is_empty()) {
            record.insert("AccountNumber", number);
        }
        self.fields.apply(record)
    }
}

/// Exactly one way of finding the account
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct UpdateTarget {
    /// Account ID
    #[arg(long)]
    pub id: Option<String>,
    /// Account Number
    #[arg(long)]
    pub account_number: Option<String>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub target: UpdateTarget,
    /// Account name
    #[arg(long)]
    pub name: Option<String>,
    #[command(flatten)]
    pub fields: AccountFields,
}

impl UpdateArgs {
    /// Changes to apply; empty when no field was given
    pub fn changes(&self) -> Record {
        let mut record = Record::new();
        if let Some(name) = self.name.clone().filter(|name| !name.is_empty()) {
            record.insert("Name", name);
        }
        self.fields.clone().apply(record)
    }
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Number of records to return (0 for all)
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
    /// SOQL WHERE clause filter
    #[arg(long)]
    pub filter: Option<String>,
    /// Write results to a text file, one record per line
    #[arg(long)]
    pub output_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DescribeArgs {
    /// Object type API name
    #[arg(default_value = "Account")]
    pub object_type: String,
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// JSON batch file: `{"object_type", "operation", "records", ...}`
    pub file: PathBuf,
    /// Write the per-record outcomes as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,
}
