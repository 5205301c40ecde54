//! Interactive mode for the server.
//!
//! Prompts the user for the data directory, bind address, and port before
//! starting the server.

use dialoguer::{Confirm, Input};

use crate::config::ServerConfig;

/// Runs the server in interactive mode, prompting for configuration.
///
/// Asks the user for a data directory, bind address, and port (defaulting
/// to the current environment), sets the corresponding environment
/// variables (`FARM_MAP_DATA_DIR`, `BIND_ADDR`, `PORT`), and delegates to
/// [`super::run_server`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the underlying server fails to
/// start.
#[allow(clippy::future_not_send)]
pub async fn run() -> std::io::Result<()> {
    println!("Farm Map Server");
    println!();

    let current = ServerConfig::from_env();
    let default_dir = current.data_dir.display().to_string();

    let data_dir: String = Input::new()
        .with_prompt("Survey data directory")
        .default(default_dir.clone())
        .interact_text()
        .unwrap_or(default_dir);

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default(current.bind_addr.clone())
        .interact_text()
        .unwrap_or(current.bind_addr);

    let port_str: String = Input::new()
        .with_prompt("Port")
        .default(current.port.to_string())
        .interact_text()
        .unwrap_or_else(|_| current.port.to_string());

    // SAFETY: We are single-threaded at this point (before server starts) and
    // these variables are only read once during server initialisation.
    unsafe {
        std::env::set_var("FARM_MAP_DATA_DIR", &data_dir);
        std::env::set_var("BIND_ADDR", &bind_addr);
        std::env::set_var("PORT", &port_str);
    }

    if !Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port_str}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server().await
}
