use crate::cli::NicksCommands;
use crate::ui;
use hermod_memory::IdentityStore;
use std::path::Path;

/// Offline administration of the nickname store.
///
/// Shares the store with a running bridge only through the backing file or
/// database, so changes made here are seen by the bridge after a restart.
pub fn cmd_nicks(config_path: Option<&Path>, command: NicksCommands) -> Result<(), String> {
    let config = hermod_kernel::config::load_config(config_path).map_err(|e| e.to_string())?;
    let store = hermod_memory::open_store(&config.identity).map_err(|e| e.to_string())?;

    match command {
        NicksCommands::List => list(&store),
        NicksCommands::Set { sender, name } => set(&store, &sender, &name),
        NicksCommands::Resolve { sender } => {
            println!("{}", store.resolve(&sender));
            Ok(())
        }
    }
}

fn list(store: &IdentityStore) -> Result<(), String> {
    if store.is_empty() {
        ui::hint("No nicknames stored yet");
        return Ok(());
    }
    for (sender, nick) in store.entries() {
        println!("{sender:<40} {nick}");
    }
    Ok(())
}

fn set(store: &IdentityStore, sender: &str, name: &str) -> Result<(), String> {
    let old = store.resolve(sender);
    match store.set_name(sender, name) {
        Some(new) => {
            ui::check_ok(&format!("{old} is now known as {new}"));
            Ok(())
        }
        None => Err(format!("nickname for {sender} was not changed")),
    }
}
