use anyhow::Result;
use quadrelay::commands::{self, Session};
use quadrelay::gpio::LazyBoard;
use quadrelay::watcher::KeyWatcher;
use std::env;
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::debug!("{:#}", e);
            // Usage listings already end in a newline
            let message = e.to_string();
            if message.ends_with('\n') {
                print!("{}", message);
            } else {
                println!("{}", message);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<()> {
    // Settings and backend are only resolved by commands that drive relays
    let mut boards = LazyBoard::new();
    let mut operator = KeyWatcher::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut session = Session {
        boards: &mut boards,
        operator: &mut operator,
        out: &mut out,
    };
    commands::dispatch(args, &mut session)
}
