use clap::Parser;
use client::{local, net};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Server address to connect to
    #[arg(short, long, default_value = "127.0.0.1:6969")]
    server: String,
    /// Two players on this keyboard instead of connecting to a server
    #[arg(short, long)]
    local: bool,
    /// Single-player game, no server
    #[arg(long)]
    solo: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    if args.local {
        local::run_local().await
    } else if args.solo {
        local::run_solo().await
    } else {
        net::run(&args.server).await
    }
}
