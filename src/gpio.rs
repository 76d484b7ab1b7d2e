/// GPIO backends for the relay lines
///
/// Sysfs is always available. The character-device backend uses libgpiod's
/// kernel ABI through gpiocdev and is only compiled with the `gpiod` feature.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::config_loader::{self, Backend, Settings};
use crate::relay::{BoardSource, RelayIo, RelayValue};

#[cfg(feature = "gpiod")]
use gpiocdev::line::Value;
#[cfg(feature = "gpiod")]
use gpiocdev::request::Request;

/// Polls waiting for udev to publish a freshly exported line
const EXPORT_POLLS: u32 = 20;
const EXPORT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Open the backend selected in settings
pub fn open_board(settings: &Settings) -> Result<Box<dyn RelayIo>> {
    match settings.backend {
        Backend::Sysfs => Ok(Box::new(SysfsBoard::new(&settings.sysfs_root))),
        Backend::Gpiod => open_cdev(settings),
    }
}

/// Backend opened on first use from the settings file, or from the given settings
#[derive(Default)]
pub struct LazyBoard {
    settings: Option<Settings>,
    board: Option<Box<dyn RelayIo>>,
}

impl LazyBoard {
    /// Settings come from `config_loader::load_settings` when first needed
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self { settings: Some(settings), board: None }
    }
}

impl BoardSource for LazyBoard {
    fn board(&mut self) -> Result<&mut dyn RelayIo> {
        let board = match self.board.take() {
            Some(board) => board,
            None => {
                let settings = match &self.settings {
                    Some(settings) => settings.clone(),
                    None => config_loader::load_settings()?,
                };
                open_board(&settings)?
            }
        };
        Ok(self.board.insert(board).as_mut())
    }
}

#[cfg(feature = "gpiod")]
fn open_cdev(settings: &Settings) -> Result<Box<dyn RelayIo>> {
    Ok(Box::new(CdevBoard::new(&settings.chip, &settings.consumer)))
}

#[cfg(not(feature = "gpiod"))]
fn open_cdev(_settings: &Settings) -> Result<Box<dyn RelayIo>> {
    Err(anyhow!("GPIO character device support not compiled in. Enable 'gpiod' feature."))
}

/// Relay lines driven through /sys/class/gpio
#[derive(Debug)]
pub struct SysfsBoard {
    root: PathBuf,
}

impl SysfsBoard {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    fn line_dir(&self, pin: u32) -> PathBuf {
        self.root.join(format!("gpio{}", pin))
    }

    /// Export the pin if the kernel has not published it yet
    fn exported(&self, pin: u32) -> Result<PathBuf> {
        let dir = self.line_dir(pin);
        if dir.join("value").exists() {
            return Ok(dir);
        }

        log::debug!(target: "gpio", "exporting gpio{}", pin);
        fs::write(self.root.join("export"), pin.to_string())
            .with_context(|| format!("Failed to export gpio{}", pin))?;

        for _ in 0..EXPORT_POLLS {
            if dir.join("value").exists() {
                return Ok(dir);
            }
            thread::sleep(EXPORT_POLL_INTERVAL);
        }

        Err(anyhow!("gpio{} did not appear under {:?} after export", pin, self.root))
    }
}

impl RelayIo for SysfsBoard {
    fn write(&mut self, pin: u32, value: RelayValue) -> Result<()> {
        let dir = self.exported(pin)?;
        let direction = fs::read_to_string(dir.join("direction"))
            .with_context(|| format!("Failed to read direction of gpio{}", pin))?;

        if direction.trim() == "out" {
            fs::write(dir.join("value"), value.level().to_string())
                .with_context(|| format!("Failed to write value of gpio{}", pin))?;
        } else {
            // "high"/"low" switch to output with the level applied atomically
            let mode = match value {
                RelayValue::On => "high",
                RelayValue::Off => "low",
            };
            fs::write(dir.join("direction"), mode)
                .with_context(|| format!("Failed to set gpio{} as output", pin))?;
        }

        log::debug!(target: "gpio", "gpio{} <- {}", pin, value.level());
        Ok(())
    }

    fn read(&mut self, pin: u32) -> Result<u8> {
        let dir = self.exported(pin)?;
        let raw = fs::read_to_string(dir.join("value"))
            .with_context(|| format!("Failed to read value of gpio{}", pin))?;
        let level = raw
            .trim()
            .parse::<u8>()
            .with_context(|| format!("Unexpected value {:?} from gpio{}", raw.trim(), pin))?;

        log::debug!(target: "gpio", "gpio{} -> {}", pin, level);
        Ok(level)
    }
}

/// Relay lines driven through a GPIO character device.
/// Each access is a short-lived line request; the kernel keeps the output level after release.
#[cfg(feature = "gpiod")]
#[derive(Debug)]
pub struct CdevBoard {
    chip: PathBuf,
    consumer: String,
}

#[cfg(feature = "gpiod")]
impl CdevBoard {
    pub fn new(chip: impl AsRef<Path>, consumer: &str) -> Self {
        Self {
            chip: chip.as_ref().to_path_buf(),
            consumer: consumer.to_string(),
        }
    }
}

#[cfg(feature = "gpiod")]
impl RelayIo for CdevBoard {
    fn write(&mut self, pin: u32, value: RelayValue) -> Result<()> {
        let level = match value {
            RelayValue::On => Value::Active,
            RelayValue::Off => Value::Inactive,
        };
        let _request = Request::builder()
            .on_chip(&self.chip)
            .with_consumer(&self.consumer)
            .with_line(pin)
            .as_output(level)
            .request()
            .with_context(|| format!("Failed to drive line {} on {:?}", pin, self.chip))?;

        log::debug!(target: "gpio", "{:?} line {} <- {}", self.chip, pin, value.level());
        Ok(())
    }

    fn read(&mut self, pin: u32) -> Result<u8> {
        // as_is keeps the line an output so reading does not release the relay
        let request = Request::builder()
            .on_chip(&self.chip)
            .with_consumer(&self.consumer)
            .with_line(pin)
            .as_is()
            .request()
            .with_context(|| format!("Failed to request line {} on {:?}", pin, self.chip))?;
        let level = match request.value(pin)? {
            Value::Active => 1,
            Value::Inactive => 0,
        };

        log::debug!(target: "gpio", "{:?} line {} -> {}", self.chip, pin, level);
        Ok(level)
    }
}
