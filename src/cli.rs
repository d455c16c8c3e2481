use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "citation-linkage")]
#[command(about = "Link citing reference lists to cited records and tally yearly citation counts")]
#[command(version = "1.0.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Match every citing table against every cited table and write linkage tables
    Link(LinkArgs),

    /// Write the canonical signature of every usable record in a cited table
    Signatures(SignaturesArgs),
}

#[derive(Parser, Clone, Debug)]
pub struct LinkArgs {
    /// Directory holding the <table>.parquet files
    #[arg(short, long)]
    pub data_dir: Option<String>,

    /// Citing tables (repeat or comma separate)
    #[arg(short = 'c', long, value_delimiter = ',')]
    pub citing: Vec<String>,

    /// Cited tables (repeat or comma separate)
    #[arg(short = 't', long, value_delimiter = ',')]
    pub cited: Vec<String>,

    /// Result table name template, e.g. "{citing_table}_cite_{cited_table}"
    #[arg(short, long)]
    pub result_template: Option<String>,

    /// TOML file with data_dir, citing_tables, cited_tables, result_table_template
    #[arg(long)]
    pub config: Option<String>,

    /// Also write each matcher's linkages as JSONL into this directory
    #[arg(long)]
    pub keep_intermediates: Option<String>,

    /// Worker threads for reference matching (0 = all cores)
    #[arg(long, default_value = "0")]
    pub threads: usize,

    /// Logging level (DEBUG, INFO, WARN, ERROR)
    #[arg(short, long, default_value = "INFO")]
    pub log_level: String,
}

#[derive(Parser, Clone, Debug)]
pub struct SignaturesArgs {
    /// Directory holding the <table>.parquet files
    #[arg(short, long, default_value = ".")]
    pub data_dir: String,

    /// Cited table to sign
    #[arg(short, long, required = true)]
    pub table: String,

    /// Output JSONL file
    #[arg(short, long, default_value = "signatures.jsonl")]
    pub output: String,

    /// Logging level (DEBUG, INFO, WARN, ERROR)
    #[arg(short, long, default_value = "INFO")]
    pub log_level: String,
}
