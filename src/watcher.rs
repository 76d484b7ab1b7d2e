/// Operator key watcher
///
/// A background thread waits for a single key press and publishes the
/// operator's answer. The main thread polls without blocking so it can keep
/// toggling relays while waiting.

use anyhow::{Context, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io::{self, IsTerminal, Read};
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Pending,
    Yes,
    No,
}

impl Answer {
    /// `y`/`Y` is affirmative; any other key (Ctrl-C included), EOF or a read error is negative.
    pub fn from_key(key: Option<u8>) -> Self {
        match key {
            Some(b'y') | Some(b'Y') => Answer::Yes,
            _ => Answer::No,
        }
    }

    pub fn is_definitive(self) -> bool {
        self != Answer::Pending
    }
}

/// Receiving end of the operator's answer.
/// The first definitive answer sticks; later ones are ignored.
#[derive(Debug)]
pub struct AnswerSlot {
    rx: Receiver<Answer>,
    answer: Answer,
}

impl AnswerSlot {
    /// Capacity 1: publishers use `try_send`, so the first answer wins and nobody blocks.
    pub fn channel() -> (Sender<Answer>, AnswerSlot) {
        let (tx, rx) = bounded(1);
        (tx, AnswerSlot { rx, answer: Answer::Pending })
    }

    pub fn poll(&mut self) -> Answer {
        if self.answer == Answer::Pending {
            match self.rx.try_recv() {
                Ok(answer) => self.answer = answer,
                Err(TryRecvError::Empty) => {}
                // Every publisher is gone without answering; nobody is left to say yes.
                Err(TryRecvError::Disconnected) => self.answer = Answer::No,
            }
        }
        self.answer
    }
}

/// Source of the operator's verdict during the self-test
pub trait Operator {
    fn listen(&mut self) -> Result<AnswerSlot>;
}

/// Reads one key from stdin on a background thread.
/// On a terminal the key is taken raw, so Ctrl-C arrives as a key and counts
/// as "no"; otherwise a Ctrl-C handler publishes the "no".
#[derive(Default)]
pub struct KeyWatcher {
    raw_mode: Option<RawMode>,
}

impl KeyWatcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Operator for KeyWatcher {
    fn listen(&mut self) -> Result<AnswerSlot> {
        let (tx, slot) = AnswerSlot::channel();

        if io::stdin().is_terminal() {
            match RawMode::enable() {
                Ok(guard) => self.raw_mode = Some(guard),
                Err(e) => log::warn!(target: "watcher", "raw terminal mode unavailable: {}", e),
            }
        }

        let interrupt = tx.clone();
        ctrlc::set_handler(move || {
            let _ = interrupt.try_send(Answer::No);
        })
        .ok();

        let raw = self.raw_mode.is_some();
        thread::Builder::new()
            .name("key-watcher".to_string())
            .spawn(move || {
                let mut byte = [0u8; 1];
                let key = match io::stdin().lock().read(&mut byte) {
                    Ok(1) => Some(byte[0]),
                    Ok(_) => None,
                    Err(e) => {
                        log::warn!(target: "watcher", "stdin read failed: {}", e);
                        None
                    }
                };
                // Restore the terminal as soon as the key is in
                if raw {
                    let _ = disable_raw_mode();
                }
                log::debug!(target: "watcher", "key {:?}", key);
                let _ = tx.try_send(Answer::from_key(key));
            })
            .context("Failed to start key watcher thread")?;

        Ok(slot)
    }
}

/// Terminal in raw mode; restored on drop
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(RawMode)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            log::warn!(target: "watcher", "restoring terminal: {}", e);
        }
    }
}
