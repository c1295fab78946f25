use std::net::TcpStream;

use anyhow::Context;
use capsule_client::ClientProxy;
use capsule_types::Capsule;
use clap::Parser;

/// Reference capsule protocol client: fetches an exported object, reads
/// its `value` attribute and calls `method(amount)` on it.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Server address to connect to.
    #[arg(long, default_value = "127.0.0.1:9090")]
    connect: String,

    /// Exported object name to fetch.
    #[arg(long, default_value = "counter")]
    name: String,

    /// Amount to add via `method(amount)`.
    #[arg(long, default_value_t = 1)]
    amount: i64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let stream = TcpStream::connect(&args.connect).with_context(|| format!("connecting to {}", args.connect))?;
    let proxy = ClientProxy::new(stream);

    let counter = proxy.fetch(&args.name).context("fetching exported object")?;
    let before = counter.get_attr("value")?.as_int()?;
    println!("{}.value = {before}", args.name);

    let method = counter.get_attr("method")?;
    let after = method
        .call([Capsule::integer(args.amount)], Vec::<(String, Capsule)>::new())
        .context("calling method")?
        .as_int()?;
    println!("{}.method({}) -> {after}", args.name, args.amount);

    Ok(())
}
