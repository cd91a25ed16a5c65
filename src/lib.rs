pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod neighborhood;
pub mod rpc;
pub mod search;
pub mod source;
pub mod subgraph;
pub mod util;
pub mod validate;

pub use error::{QueryError, QueryResult, UnavailableSource};
