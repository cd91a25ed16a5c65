use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cpgraph",
    version,
    about = "Read-only queries over a code property graph store",
    after_help = r#"Examples:
  cpgraph overview --db cpg.sqlite
  cpgraph request --method search_functions --params '{"query":"Handle"}'
  cpgraph request --method get_neighborhood --params '{"id":"main.go:main"}'
  cpgraph request --method get_source --params '{"id":"main.go:main"}'
  cpgraph serve --db cpg.sqlite
"#
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run JSONL RPC server over stdin/stdout.
    Serve {
        /// Path to the store produced by the analysis pass.
        #[arg(long, env = "CPGRAPH_DB", default_value = "cpg.sqlite")]
        db: PathBuf,
    },
    /// Run a single JSONL request and exit.
    Request {
        #[arg(long, env = "CPGRAPH_DB", default_value = "cpg.sqlite")]
        db: PathBuf,
        #[arg(long)]
        method: String,
        #[arg(long, default_value = "{}")]
        params: String,
        #[arg(long, value_name = "PATH")]
        params_file: Option<PathBuf>,
        #[arg(long, default_value = "1")]
        id: String,
    },
    /// Print node, edge and source file counts.
    Overview {
        #[arg(long, env = "CPGRAPH_DB", default_value = "cpg.sqlite")]
        db: PathBuf,
    },
}
