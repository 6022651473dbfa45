//! Controller capability seam.
//!
//! The console never speaks the ADS wire protocol itself; everything it needs
//! from the controller goes through the [`Plc`] trait. The in-memory
//! [`sim::SimPlc`] backend stands behind the same trait for development runs
//! and tests.

use std::{fmt, sync::Arc};

use crate::error::Result;
use crate::value::WireShape;

pub mod sim;

/// A named, typed variable exposed by the controller.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub comment: String,
    pub symbol_type: String,
    pub array_size: u32,
    pub auto_update: bool,
    pub index_group: u32,
    pub index_offset: u32,
    pub value: Option<PlcValue>,
}

impl Symbol {
    /// A symbol with an empty type name has no readable payload (type
    /// containers, instance roots); reads are skipped for those.
    pub fn has_plc_type(&self) -> bool {
        !self.symbol_type.is_empty()
    }
}

/// Snapshot of a controller-side scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum PlcValue {
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    /// Raw string buffer as delivered by the controller, NUL padding intact.
    Bytes(Vec<u8>),
}

impl fmt::Display for PlcValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlcValue::Bool(v) => write!(f, "{v}"),
            PlcValue::I8(v) => write!(f, "{v}"),
            PlcValue::U8(v) => write!(f, "{v}"),
            PlcValue::I16(v) => write!(f, "{v}"),
            PlcValue::U16(v) => write!(f, "{v}"),
            PlcValue::I32(v) => write!(f, "{v}"),
            PlcValue::U32(v) => write!(f, "{v}"),
            PlcValue::I64(v) => write!(f, "{v}"),
            PlcValue::U64(v) => write!(f, "{v}"),
            PlcValue::F32(v) => write!(f, "{v}"),
            PlcValue::F64(v) => write!(f, "{v}"),
            PlcValue::String(v) => write!(f, "{v}"),
            PlcValue::Bytes(v) => {
                let end = v.iter().position(|b| *b == 0).unwrap_or(v.len());
                write!(f, "{}", String::from_utf8_lossy(&v[..end]))
            }
        }
    }
}

/// One change event delivered by the controller for a subscribed symbol.
///
/// `timestamp_ticks` counts 100-nanosecond intervals since 1601-01-01
/// (the controller's native epoch).
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub timestamp_ticks: u64,
    pub symbol: String,
    pub symbol_type: String,
    pub value: PlcValue,
}

/// Opaque handle returned when a device notification is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationHandle(pub u32);

impl fmt::Display for NotificationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Callback invoked from the controller-driven delivery context. It may run
/// concurrently with the command loop, so implementations must be safe to
/// call from another thread.
pub type NotificationSink = Arc<dyn Fn(NotificationEvent) + Send + Sync>;

/// Operations the console needs from a connected controller.
pub trait Plc: Send {
    /// Address the connection was opened against, for display only.
    fn address(&self) -> String;

    fn get_all_symbols(&mut self) -> Result<Vec<Symbol>>;

    fn get_symbol(&mut self, name: &str) -> Result<Symbol>;

    fn read_by_name(&mut self, name: &str) -> Result<PlcValue>;

    fn write_by_name(&mut self, name: &str, value: PlcValue) -> Result<()>;

    fn add_device_notification(
        &mut self,
        name: &str,
        sink: NotificationSink,
    ) -> Result<NotificationHandle>;

    fn clear_device_notifications(
        &mut self,
        name: &str,
        handle: NotificationHandle,
    ) -> Result<()>;

    /// Invokes a controller-side method on a function block, passing
    /// pre-converted argument values and expecting `returns` output slots.
    fn call_method(
        &mut self,
        symbol_path: &str,
        method: &str,
        args: Vec<PlcValue>,
        returns: &WireShape,
    ) -> Result<Vec<PlcValue>>;
}
