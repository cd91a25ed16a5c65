use anyhow::Result;
use clap::Parser;
use cpgraph::{cli, db, rpc};

fn main() -> Result<()> {
    // stdout carries the protocol; logs go to stderr.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let args = cli::Args::parse();

    match args.command {
        cli::Command::Serve { db } => rpc::serve(&db),
        cli::Command::Request {
            db,
            method,
            params,
            params_file,
            id,
        } => {
            let params_raw = if let Some(path) = params_file {
                std::fs::read_to_string(&path)?
            } else {
                params
            };
            let response = rpc::call(&db, method, &params_raw, &id)?;
            println!("{response}");
            Ok(())
        }
        cli::Command::Overview { db: db_path } => {
            let db = db::Db::open(&db_path)?;
            db.check_schema()?;
            let overview = db.overview()?;
            println!("{}", serde_json::to_string_pretty(&overview)?);
            Ok(())
        }
    }
}
