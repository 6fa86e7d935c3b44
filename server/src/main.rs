use clap::Parser;
use log::{error, info};
use server::net::{self, GridSize};
use server::session::Session;
use shared::{GRID_COLS, GRID_ROWS, MIN_GRID_COLS, MIN_GRID_ROWS, TICK_INTERVAL_MS};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Port to listen on
    #[arg(short, long, default_value = "6969")]
    port: u16,
    /// Simulation tick period in milliseconds
    #[arg(short, long, default_value_t = TICK_INTERVAL_MS)]
    tick_ms: u64,
    /// Grid rows, border ring included
    #[arg(long, default_value_t = GRID_ROWS)]
    rows: u16,
    /// Grid columns, border ring included
    #[arg(long, default_value_t = GRID_COLS)]
    cols: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    if args.rows < MIN_GRID_ROWS || args.cols < MIN_GRID_COLS {
        return Err(format!(
            "grid must be at least {}x{}, got {}x{}",
            MIN_GRID_ROWS, MIN_GRID_COLS, args.rows, args.cols
        )
        .into());
    }
    if args.tick_ms == 0 {
        return Err("tick period must be at least 1 ms".into());
    }
    // Grid coordinates are i16 on the wire and in the engine.
    let max_dim = i16::MAX as u16;
    if args.rows > max_dim || args.cols > max_dim {
        return Err(format!("grid dimensions are capped at {}", max_dim).into());
    }

    let (session, cmd_tx, snapshot_tx) =
        Session::new(args.rows, args.cols, Duration::from_millis(args.tick_ms))?;

    let listener = TcpListener::bind((args.host.as_str(), args.port)).await?;
    info!(
        "listening on {} ({}x{} grid, {} ms tick)",
        listener.local_addr()?,
        args.rows,
        args.cols,
        args.tick_ms
    );

    let grid = GridSize {
        rows: args.rows,
        cols: args.cols,
    };
    let session_handle = tokio::spawn(session.run());
    let listener_handle = tokio::spawn(net::run_listener(listener, cmd_tx, snapshot_tx, grid));

    tokio::select! {
        result = session_handle => {
            if let Err(e) = result {
                error!("session task panicked: {}", e);
            }
        }
        result = listener_handle => {
            if let Err(e) = result {
                error!("listener task panicked: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received ctrl-c, shutting down");
        }
    }

    Ok(())
}
