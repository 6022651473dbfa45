//! In-memory controller backend.
//!
//! Serves a fixed symbol table from process memory and delivers change
//! notifications synchronously on write. Used for development runs without a
//! reachable controller and for the test suite.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;

use crate::error::{ConsoleError, Result};
use crate::plc::{
    NotificationEvent, NotificationHandle, NotificationSink, Plc, PlcValue, Symbol,
};
use crate::value::WireShape;

/// Seconds between 1601-01-01 and 1970-01-01.
const FILETIME_UNIX_OFFSET_SECS: i64 = 11_644_473_600;

type MethodFn = Box<dyn FnMut(Vec<PlcValue>) -> Result<Vec<PlcValue>> + Send>;

pub struct SimPlc {
    address: String,
    symbols: BTreeMap<String, Symbol>,
    notifications: HashMap<String, (NotificationHandle, NotificationSink)>,
    methods: HashMap<String, MethodFn>,
    next_handle: u32,
}

impl SimPlc {
    pub fn connect(ams_net_id: &str, port: u16) -> Self {
        Self {
            address: format!("{ams_net_id}:{port}"),
            symbols: BTreeMap::new(),
            notifications: HashMap::new(),
            methods: HashMap::new(),
            next_handle: 1,
        }
    }

    /// Backend seeded with a handful of symbols so the console has something
    /// to show out of the box.
    pub fn demo(ams_net_id: &str, port: u16) -> Self {
        let mut plc = Self::connect(ams_net_id, port);
        plc.insert_symbol("MAIN.counter", "INT", "cycle counter", PlcValue::I16(0));
        plc.insert_symbol("MAIN.setpoint", "LREAL", "target value", PlcValue::F64(21.5));
        plc.insert_symbol(
            "MAIN.running",
            "BOOL",
            "machine running flag",
            PlcValue::Bool(false),
        );
        plc.insert_symbol(
            "MAIN.station",
            "STRING(80)",
            "station label",
            PlcValue::Bytes(b"idle\0\0\0\0".to_vec()),
        );
        plc
    }

    pub fn insert_symbol(&mut self, name: &str, symbol_type: &str, comment: &str, value: PlcValue) {
        let index_offset = self.symbols.len() as u32 * 0x10;
        self.symbols.insert(
            name.to_string(),
            Symbol {
                name: name.to_string(),
                comment: comment.to_string(),
                symbol_type: symbol_type.to_string(),
                array_size: 1,
                auto_update: false,
                index_group: 0x4040,
                index_offset,
                value: Some(value),
            },
        );
    }

    /// Registers a callable method for `symbol_path`, keyed as
    /// `path#method` the way the controller addresses function block calls.
    pub fn register_method(
        &mut self,
        symbol_path: &str,
        method: &str,
        body: impl FnMut(Vec<PlcValue>) -> Result<Vec<PlcValue>> + Send + 'static,
    ) {
        self.methods
            .insert(format!("{symbol_path}#{method}"), Box::new(body));
    }

    pub fn active_notification_count(&self) -> usize {
        self.notifications.len()
    }

    fn fire_notification(&self, name: &str) {
        let Some((_, sink)) = self.notifications.get(name) else {
            return;
        };
        let Some(symbol) = self.symbols.get(name) else {
            return;
        };
        let Some(value) = symbol.value.clone() else {
            return;
        };
        sink(NotificationEvent {
            timestamp_ticks: filetime_ticks_now(),
            symbol: symbol.name.clone(),
            symbol_type: symbol.symbol_type.clone(),
            value,
        });
    }

    fn symbol_mut(&mut self, name: &str) -> Result<&mut Symbol> {
        self.symbols
            .get_mut(name)
            .ok_or_else(|| ConsoleError::NotFound(format!("symbol '{name}' not found")))
    }
}

impl Plc for SimPlc {
    fn address(&self) -> String {
        self.address.clone()
    }

    fn get_all_symbols(&mut self) -> Result<Vec<Symbol>> {
        Ok(self.symbols.values().cloned().collect())
    }

    fn get_symbol(&mut self, name: &str) -> Result<Symbol> {
        self.symbols
            .get(name)
            .cloned()
            .ok_or_else(|| ConsoleError::NotFound(format!("symbol '{name}' not found")))
    }

    fn read_by_name(&mut self, name: &str) -> Result<PlcValue> {
        let symbol = self.get_symbol(name)?;
        symbol
            .value
            .ok_or_else(|| ConsoleError::Protocol(format!("symbol '{name}' has no value")))
    }

    fn write_by_name(&mut self, name: &str, value: PlcValue) -> Result<()> {
        self.symbol_mut(name)?.value = Some(value);
        self.fire_notification(name);
        Ok(())
    }

    fn add_device_notification(
        &mut self,
        name: &str,
        sink: NotificationSink,
    ) -> Result<NotificationHandle> {
        self.symbol_mut(name)?.auto_update = true;
        let handle = NotificationHandle(self.next_handle);
        self.next_handle += 1;
        self.notifications.insert(name.to_string(), (handle, sink));
        Ok(handle)
    }

    fn clear_device_notifications(
        &mut self,
        name: &str,
        handle: NotificationHandle,
    ) -> Result<()> {
        match self.notifications.get(name) {
            Some((registered, _)) if *registered == handle => {
                self.notifications.remove(name);
                if let Some(symbol) = self.symbols.get_mut(name) {
                    symbol.auto_update = false;
                }
                Ok(())
            }
            _ => Err(ConsoleError::Protocol(format!(
                "no notification registered for '{name}' with handle {handle}"
            ))),
        }
    }

    fn call_method(
        &mut self,
        symbol_path: &str,
        method: &str,
        args: Vec<PlcValue>,
        _returns: &WireShape,
    ) -> Result<Vec<PlcValue>> {
        let key = format!("{symbol_path}#{method}");
        let body = self.methods.get_mut(&key).ok_or_else(|| {
            ConsoleError::Protocol(format!("controller refused call to {symbol_path}.{method}"))
        })?;
        body(args)
    }
}

/// Current time expressed in the controller's native epoch: 100-nanosecond
/// ticks since 1601-01-01.
pub fn filetime_ticks_now() -> u64 {
    let now = Utc::now();
    let micros = now.timestamp_micros() + FILETIME_UNIX_OFFSET_SECS * 1_000_000;
    (micros as u64) * 10
}
