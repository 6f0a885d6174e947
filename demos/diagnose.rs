//! Dump every joystick the Windows backend discovers, with its control layout, as JSON.
//!
//! ```text
//! RUST_LOG=rawstick=debug cargo run --example diagnose
//! ```

#[cfg(windows)]
fn main() {
    use rawstick::{Manager, ManagerConfig};
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rawstick=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match ManagerConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{path}: {e}");
                std::process::exit(2);
            }
        },
        None => ManagerConfig::default(),
    };

    let manager = Manager::windows(config);
    let report: Vec<serde_json::Value> = manager
        .devices()
        .into_iter()
        .enumerate()
        .map(|(index, summary)| {
            serde_json::json!({
                "index": index,
                "device": summary,
                "controls": manager.describe(index),
            })
        })
        .collect();

    match serde_json::to_string_pretty(&report) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("serialize: {e}"),
    }
}

#[cfg(not(windows))]
fn main() {
    eprintln!("diagnose needs the Windows raw input backend");
}
