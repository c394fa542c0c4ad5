//! kvtable CLI
//!
//! Command-line access to the tables in a log store directory.

use std::cmp::Ordering;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use kvtable::{Config, LogStore, OrderBy, OrderedRetrieval, TableError, TableRegistry};
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

/// kvtable CLI
#[derive(Parser, Debug)]
#[command(name = "kvtable-cli")]
#[command(about = "Auto-incrementing tables over a persistent key-value log")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./kvtable_data")]
    data_dir: String,

    /// Table to operate on
    #[arg(short, long, default_value = "default")]
    table: String,

    /// Log entries between automatic compactions (0 disables)
    #[arg(long, default_value = "10000")]
    compaction_threshold: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Insert a JSON record and print its pkey
    Create {
        /// Record data as JSON
        data: String,
    },

    /// Print the record at a pkey
    Read {
        pkey: u64,
    },

    /// Overwrite the record at a pkey
    Update {
        pkey: u64,

        /// Record data as JSON
        data: String,
    },

    /// Delete the record at a pkey
    Delete {
        /// Primary key
        pkey: String,
    },

    /// Print a page of records
    Slot {
        #[arg(short, long, default_value = "0")]
        offset: usize,

        #[arg(short, long, default_value = "10")]
        count: usize,

        /// asc or desc (pkey order)
        #[arg(long, default_value = "asc")]
        order: String,

        /// Sort by this top-level field of the record instead of by pkey
        #[arg(long, conflicts_with = "order")]
        sort_field: Option<String>,
    },

    /// Print the number of records
    Count,

    /// Delete every record, keeping the pkey counter
    Truncate,

    /// List tables present in the store
    Tables,

    /// Rewrite the log down to the live key set
    Compact,
}

/// Filter used when RUST_LOG is unset
const DEFAULT_FILTER: &str = "info,kvtable=debug";

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> kvtable::Result<()> {
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .compaction_threshold(args.compaction_threshold)
        .build();

    let store = Arc::new(LogStore::open(config)?);
    let registry = TableRegistry::new(store.clone());

    let table = || registry.table::<Value>(&args.table);

    match args.command {
        Commands::Create { data } => {
            let pkey = table()?.create(&parse_json(&data)?)?;
            println!("{}", pkey);
        }
        Commands::Read { pkey } => match table()?.read(pkey)? {
            Some(value) => println!("{}", value),
            None => println!("null"),
        },
        Commands::Update { pkey, data } => table()?.update(pkey, &parse_json(&data)?)?,
        Commands::Delete { pkey } => table()?.delete_raw(&pkey)?,
        Commands::Slot { offset, count, order, sort_field } => {
            let order_by = match sort_field {
                Some(field) => OrderBy::custom(move |a: &Value, b: &Value| {
                    compare_json(&a[field.as_str()], &b[field.as_str()])
                }),
                None => order.parse()?,
            };
            for record in table()?.slot(offset, count, &order_by)? {
                println!("{}\t{}", record.pkey, record.data);
            }
        }
        Commands::Count => println!("{}", table()?.count()?),
        Commands::Truncate => table()?.truncate()?,
        Commands::Tables => {
            for name in registry.persisted_table_names()? {
                println!("{}", name);
            }
        }
        Commands::Compact => store.compact()?,
    }

    store.sync()
}

fn parse_json(data: &str) -> kvtable::Result<Value> {
    serde_json::from_str(data)
        .map_err(|e| TableError::InvalidArgument(format!("record data is not JSON: {}", e)))
}

/// Order JSON values: nulls first, then numbers, then strings, then the rest
/// by their rendered text
fn compare_json(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a)
            .cmp(&rank(b))
            .then_with(|| a.to_string().cmp(&b.to_string())),
    }
}
