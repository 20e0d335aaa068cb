#![cfg(not(tarpaulin_include))]

use std::path::PathBuf;

use timetable::app;

/// Main entry point for the web application
///
/// Starts the timetable editor server. Optional arguments: the port to
/// listen on (default 3000) and the path of the snapshot file the editor
/// persists to between sessions (default `timetable.json` in the working
/// directory).
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    let port: u16 = args.get(1).and_then(|p| p.parse().ok()).unwrap_or(3000);
    let data_path = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("timetable.json"));

    app::run(data_path, port).await
}
