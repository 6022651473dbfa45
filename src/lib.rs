//! Interactive console for inspecting and manipulating named variables
//! ("symbols") on an ADS automation controller.
//!
//! The console maps a fixed vocabulary of typed commands onto controller
//! operations: symbol enumeration and read/write, persisted ignore/watch/
//! notification/hint lists, change-notification subscriptions with a CSV
//! audit log, schema-validated RPC invocation and bulk recipe transfer. The
//! wire protocol itself lives behind the [`plc::Plc`] trait.

pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod lists;
pub mod notify;
pub mod plc;
pub mod recipe;
pub mod rpc;
pub mod session;
pub mod symbols;
pub mod value;
