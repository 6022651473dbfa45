//! Change-notification lifecycle.
//!
//! Owns the set of active subscriptions (at most one per symbol name) and
//! the CSV sink their change events append to. The controller delivers
//! events from its own context, possibly concurrent with the command loop,
//! so every log append happens under a shared mutex.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::DateTime;
use parking_lot::Mutex;

use crate::error::Result;
use crate::plc::{NotificationEvent, NotificationHandle, Plc, PlcValue};

/// Seconds between 1601-01-01 and 1970-01-01.
const FILETIME_UNIX_OFFSET_SECS: i64 = 11_644_473_600;

#[derive(Debug, PartialEq, Eq)]
pub enum StartOutcome {
    Registered(NotificationHandle),
    AlreadyRegistered,
}

pub struct NotificationManager {
    log_path: PathBuf,
    active: HashMap<String, NotificationHandle>,
    log_lock: Arc<Mutex<()>>,
}

impl NotificationManager {
    pub fn new(log_path: PathBuf) -> Self {
        Self {
            log_path,
            active: HashMap::new(),
            log_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn is_active(&self, symbol: &str) -> bool {
        self.active.contains_key(symbol)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Registers a change subscription for `symbol`. Registering a symbol
    /// that is already subscribed is a no-op, not an error.
    pub fn start(&mut self, plc: &mut dyn Plc, symbol: &str) -> Result<StartOutcome> {
        if self.active.contains_key(symbol) {
            return Ok(StartOutcome::AlreadyRegistered);
        }

        // Resolve first so an unknown symbol fails before anything is registered.
        plc.get_symbol(symbol)?;

        let log_path = self.log_path.clone();
        let log_lock = Arc::clone(&self.log_lock);
        let handle = plc.add_device_notification(
            symbol,
            Arc::new(move |event| {
                if let Err(err) = append_event(&log_path, &log_lock, &event) {
                    tracing::warn!(
                        symbol = %event.symbol,
                        "failed to append notification event: {err}"
                    );
                }
            }),
        )?;

        self.active.insert(symbol.to_string(), handle);
        Ok(StartOutcome::Registered(handle))
    }

    /// Unregisters the subscription for `symbol`; returns `false` when none
    /// was active ("Nothing to do").
    pub fn stop(&mut self, plc: &mut dyn Plc, symbol: &str) -> Result<bool> {
        let Some(handle) = self.active.remove(symbol) else {
            return Ok(false);
        };
        plc.clear_device_notifications(symbol, handle)?;
        Ok(true)
    }

    /// Releases every live subscription. Runs on every exit path; failures
    /// are logged rather than propagated so one bad unregister cannot leak
    /// the rest.
    pub fn cleanup(&mut self, plc: &mut dyn Plc) {
        for (symbol, handle) in self.active.drain() {
            if let Err(err) = plc.clear_device_notifications(&symbol, handle) {
                tracing::warn!(%symbol, "failed to clear notification: {err}");
            }
        }
    }
}

fn append_event(log_path: &Path, log_lock: &Mutex<()>, event: &NotificationEvent) -> Result<()> {
    let row = [
        format_ticks(event.timestamp_ticks),
        event.symbol.clone(),
        render_value(event),
    ];

    let _guard = log_lock.lock();
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer.write_record(row)?;
    writer.flush()?;
    Ok(())
}

/// Converts the controller's 100-nanosecond ticks since 1601-01-01 into a
/// human-readable timestamp with millisecond precision.
pub fn format_ticks(ticks: u64) -> String {
    let unix_micros = (ticks / 10) as i64 - FILETIME_UNIX_OFFSET_SECS * 1_000_000;
    let datetime = DateTime::from_timestamp_micros(unix_micros).unwrap_or_default();
    datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// String-typed values arrive as the full fixed-size buffer; everything from
/// the first NUL byte on is padding and gets dropped.
fn render_value(event: &NotificationEvent) -> String {
    match &event.value {
        PlcValue::Bytes(bytes) => {
            let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
            String::from_utf8_lossy(&bytes[..end]).into_owned()
        }
        other => other.to_string(),
    }
}
