/// Test doubles for the relay lines, the board source and the operator

use anyhow::{anyhow, Result};
use crossbeam_channel::Sender;
use std::collections::{HashMap, HashSet};
use std::io::{self, Write};

use crate::relay::{BoardSource, RelayIo, RelayValue};
use crate::watcher::{Answer, AnswerSlot, Operator};

/// Records every write; pins in `failing` reject access.
#[derive(Default)]
pub struct FakeBoard {
    pub writes: Vec<(u32, RelayValue)>,
    pub reads: Vec<u32>,
    pub levels: HashMap<u32, u8>,
    pub failing: HashSet<u32>,
    /// Publish an answer once this many writes have been attempted
    pub answer_after: Option<(usize, Sender<Answer>, Answer)>,
}

impl FakeBoard {
    pub fn level(&self, pin: u32) -> Option<u8> {
        self.levels.get(&pin).copied()
    }
}

impl RelayIo for FakeBoard {
    fn write(&mut self, pin: u32, value: RelayValue) -> Result<()> {
        self.writes.push((pin, value));
        if let Some((count, tx, answer)) = &self.answer_after {
            if self.writes.len() == *count {
                let _ = tx.try_send(*answer);
            }
        }
        if self.failing.contains(&pin) {
            return Err(anyhow!("gpio{} stuck", pin));
        }
        self.levels.insert(pin, value.level());
        Ok(())
    }

    fn read(&mut self, pin: u32) -> Result<u8> {
        self.reads.push(pin);
        if self.failing.contains(&pin) {
            return Err(anyhow!("gpio{} stuck", pin));
        }
        Ok(self.level(pin).unwrap_or(0))
    }
}

/// Hands out a prepared answer slot
pub struct ScriptedOperator {
    slot: Option<AnswerSlot>,
}

impl ScriptedOperator {
    pub fn new(slot: AnswerSlot) -> Self {
        Self { slot: Some(slot) }
    }

    /// Operator that already answered
    pub fn answered(answer: Answer) -> Self {
        let (tx, slot) = AnswerSlot::channel();
        tx.try_send(answer).unwrap();
        Self::new(slot)
    }

    pub fn silent() -> Self {
        Self { slot: None }
    }
}

impl Operator for ScriptedOperator {
    fn listen(&mut self) -> Result<AnswerSlot> {
        self.slot.take().ok_or_else(|| anyhow!("operator not scripted"))
    }
}

impl BoardSource for FakeBoard {
    fn board(&mut self) -> Result<&mut dyn RelayIo> {
        Ok(self)
    }
}

/// Board source whose settings never load
pub struct MissingBoard;

impl BoardSource for MissingBoard {
    fn board(&mut self) -> Result<&mut dyn RelayIo> {
        Err(anyhow!("Missing settings file at \"/nonexistent\""))
    }
}

/// Writer that accepts `limit` bytes and then reports a broken pipe
pub struct BrokenPipe {
    pub written: Vec<u8>,
    pub limit: usize,
}

impl BrokenPipe {
    pub fn after(limit: usize) -> Self {
        Self { written: Vec::new(), limit }
    }
}

impl Write for BrokenPipe {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let room = self.limit - self.written.len();
        if room == 0 {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"));
        }
        let take = buf.len().min(room);
        self.written.extend_from_slice(&buf[..take]);
        Ok(take)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
