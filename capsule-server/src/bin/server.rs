use std::sync::Arc;

use anyhow::Context;
use capsule_server::{serve, ObjectTable};
use capsule_server::builtin::Counter;
use capsule_server::value::ServerValue;
use clap::Parser;

/// Reference capsule protocol server.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:9090")]
    listen: String,

    /// Initial value for the demo `counter` object exported at startup.
    #[arg(long, default_value_t = 0)]
    counter_seed: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let table = Arc::new(ObjectTable::new());
    table.export("counter", ServerValue::object(Counter::new(args.counter_seed)));

    serve(&args.listen, table).await.context("server loop exited")?;
    Ok(())
}
