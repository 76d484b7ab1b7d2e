/// Four-relay HAT control library
///
/// Shared by the `quadrelay` binary and its tests

pub mod commands;
pub mod config_loader;
pub mod gpio;
pub mod relay;
pub mod watcher;

#[cfg(test)]
mod testing;
