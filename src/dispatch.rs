//! Command dispatch.
//!
//! One exhaustive match over [`CommandKind`] maps each command to the symbol
//! store, list files, notification manager or RPC layer. The dispatcher owns
//! no routing state of its own; every command is evaluated independently and
//! every failure is printed here instead of propagating to the session loop.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use crate::command::{Command, CommandKind};
use crate::config::Paths;
use crate::error::{ConsoleError, Result};
use crate::lists;
use crate::notify::{NotificationManager, StartOutcome};
use crate::plc::Plc;
use crate::recipe;
use crate::rpc;
use crate::symbols;

/// Interactive yes/no prompt seam; the session wires in the input thread,
/// tests wire in a fixed answer.
pub trait Confirm: Send {
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// What the session loop should do after a command was evaluated.
#[derive(Debug)]
pub enum Outcome {
    Continue,
    /// Start tailing the notification log until cancelled.
    TailLog(PathBuf),
    Quit,
}

pub struct Dispatcher {
    plc: Box<dyn Plc>,
    paths: Paths,
    notifications: NotificationManager,
    confirm: Box<dyn Confirm>,
}

impl Dispatcher {
    pub fn new(plc: Box<dyn Plc>, paths: Paths, confirm: Box<dyn Confirm>) -> Self {
        let notifications = NotificationManager::new(paths.notification_log.clone());
        Self {
            plc,
            paths,
            notifications,
            confirm,
        }
    }

    pub fn notifications(&self) -> &NotificationManager {
        &self.notifications
    }

    pub fn plc_mut(&mut self) -> &mut dyn Plc {
        self.plc.as_mut()
    }

    /// Evaluates one command. Errors never escape: they are printed and the
    /// session continues; only `Quit` ends it.
    pub fn eval(&mut self, command: &mut Command) -> Outcome {
        if command.is_stop() {
            self.cleanup();
            return Outcome::Quit;
        }
        match self.run(command) {
            Ok(outcome) => outcome,
            Err(err) => {
                println!("ERR: {err}");
                Outcome::Continue
            }
        }
    }

    /// Releases every controller-side subscription. Mandatory on every exit
    /// path, not best-effort tidying.
    pub fn cleanup(&mut self) {
        self.notifications.cleanup(self.plc.as_mut());
    }

    fn run(&mut self, command: &mut Command) -> Result<Outcome> {
        let kind = command.kind();
        let payload = command.take_payload();
        match kind {
            CommandKind::GetAllSymbols => self.get_all_symbols()?,
            CommandKind::GetSymbol => {
                let name = required_symbol(&payload, kind)?;
                let symbol = symbols::read_symbol(self.plc.as_mut(), name)?;
                println!("{}", symbols::render_symbols(&[symbol]));
            }
            CommandKind::SetSymbol => {
                if payload.len() < 2 {
                    return Err(ConsoleError::Validation(
                        "SetSymbol requires a symbol name and a value".to_string(),
                    ));
                }
                let value_text = payload[1..].join(" ");
                let symbol = symbols::write_symbol(self.plc.as_mut(), &payload[0], &value_text)?;
                println!("{}", symbols::render_symbols(&[symbol]));
            }
            CommandKind::IgnoreList => {
                self.show_list(&self.paths.ignore_list.clone(), "ADS symbols in ignore list")?
            }
            CommandKind::Watchlist => self.show_watchlist()?,
            CommandKind::NotificationList => self.show_list(
                &self.paths.notification_list.clone(),
                "ADS symbols in notification list",
            )?,
            CommandKind::HintList => {
                self.show_list(&self.paths.hint_list.clone(), "ADS symbols in hint list")?
            }
            CommandKind::AddToIgnore => {
                let name = required_symbol(&payload, kind)?;
                self.add_to_list(&self.paths.ignore_list.clone(), name)?;
            }
            CommandKind::AddToWatchlist => {
                let name = required_symbol(&payload, kind)?;
                self.add_to_list(&self.paths.watchlist.clone(), name)?;
                let symbol = symbols::read_symbol(self.plc.as_mut(), name)?;
                println!("{}", symbols::render_symbols(&[symbol]));
            }
            CommandKind::AddToNotificationList => {
                let name = required_symbol(&payload, kind)?;
                self.add_to_list(&self.paths.notification_list.clone(), name)?;
            }
            CommandKind::AddToHintList => {
                let name = required_symbol(&payload, kind)?;
                self.add_to_list(&self.paths.hint_list.clone(), name)?;
            }
            CommandKind::RemoveFromIgnore => {
                let name = required_symbol(&payload, kind)?;
                lists::remove_line(&self.paths.ignore_list, name)?;
            }
            CommandKind::RemoveFromWatchlist => {
                let name = required_symbol(&payload, kind)?;
                lists::remove_line(&self.paths.watchlist, name)?;
            }
            CommandKind::RemoveFromNotificationList => {
                let name = required_symbol(&payload, kind)?;
                lists::remove_line(&self.paths.notification_list, name)?;
            }
            CommandKind::RemoveFromHintList => {
                let name = required_symbol(&payload, kind)?;
                lists::remove_line(&self.paths.hint_list, name)?;
            }
            CommandKind::ClearIgnoreList => self.clear_list(
                &self.paths.ignore_list.clone(),
                "Are you sure you want to clear the ignore list?",
            )?,
            CommandKind::ClearWatchlist => self.clear_list(
                &self.paths.watchlist.clone(),
                "Are you sure you want to clear the watchlist?",
            )?,
            CommandKind::ClearNotificationList => self.clear_list(
                &self.paths.notification_list.clone(),
                "Are you sure you want to clear the notification list?",
            )?,
            CommandKind::ClearHintList => self.clear_list(
                &self.paths.hint_list.clone(),
                "Are you sure you want to clear the hint list?",
            )?,
            CommandKind::Notify => {
                let name = required_symbol(&payload, kind)?;
                self.start_notification(name)?;
            }
            CommandKind::StopNotification => {
                let name = required_symbol(&payload, kind)?;
                if self.notifications.stop(self.plc.as_mut(), name)? {
                    println!("Done");
                } else {
                    println!("Nothing to do");
                }
            }
            CommandKind::StartNotifications => {
                let Some(entries) = lists::read_list(&self.paths.notification_list)? else {
                    println!(
                        "No notification list at {}.",
                        self.paths.notification_list.display()
                    );
                    return Ok(Outcome::Continue);
                };
                for entry in entries {
                    self.start_notification(&entry)?;
                }
            }
            CommandKind::StopNotifications => {
                let Some(entries) = lists::read_list(&self.paths.notification_list)? else {
                    println!(
                        "No notification list at {}.",
                        self.paths.notification_list.display()
                    );
                    return Ok(Outcome::Continue);
                };
                for entry in entries {
                    if self.notifications.stop(self.plc.as_mut(), &entry)? {
                        println!("Notification for {entry} symbol stopped");
                    }
                }
            }
            CommandKind::ShowNotifications => {
                return Ok(Outcome::TailLog(
                    self.notifications.log_path().to_path_buf(),
                ));
            }
            CommandKind::Rpc => self.invoke_rpc(&payload)?,
            CommandKind::DownloadRecipe => {
                let written = recipe::download(self.plc.as_mut(), &self.paths.recipe)?;
                println!("Wrote {written} recipe value(s) to the controller");
            }
            CommandKind::UploadRecipe => {
                let captured = recipe::upload(self.plc.as_mut(), &self.paths.recipe)?;
                println!(
                    "Captured {captured} value(s) into {}",
                    self.paths.recipe.display()
                );
            }
            CommandKind::Quit => unreachable!("Quit is handled before dispatch"),
        }
        Ok(Outcome::Continue)
    }

    fn get_all_symbols(&mut self) -> Result<()> {
        let ignore: HashSet<String> = lists::read_list(&self.paths.ignore_list)?
            .unwrap_or_default()
            .into_iter()
            .collect();
        let symbols = symbols::enumerate(self.plc.as_mut(), &ignore)?;
        for symbol in &symbols {
            lists::append_unique(&self.paths.hint_list, &symbol.name)?;
        }
        println!("{}", symbols::render_symbols(&symbols));
        Ok(())
    }

    /// Every add-to-list operation also mirrors the name into the hint list
    /// so previously seen symbols feed autocomplete, whichever list they
    /// entered through.
    fn add_to_list(&mut self, path: &Path, name: &str) -> Result<()> {
        lists::append_unique(path, name)?;
        if path != self.paths.hint_list {
            lists::append_unique(&self.paths.hint_list, name)?;
        }
        Ok(())
    }

    fn show_list(&mut self, path: &Path, header: &str) -> Result<()> {
        match lists::read_list(path)? {
            Some(entries) => println!("{}", symbols::render_names(header, &entries)),
            None => println!("No entries at {}.", path.display()),
        }
        Ok(())
    }

    /// The watchlist view resolves each entry and shows live values instead
    /// of bare names.
    fn show_watchlist(&mut self) -> Result<()> {
        let Some(entries) = lists::read_list(&self.paths.watchlist)? else {
            println!("No entries at {}.", self.paths.watchlist.display());
            return Ok(());
        };
        let mut resolved = Vec::with_capacity(entries.len());
        for entry in &entries {
            resolved.push(symbols::read_symbol(self.plc.as_mut(), entry)?);
        }
        println!("{}", symbols::render_symbols(&resolved));
        Ok(())
    }

    fn clear_list(&mut self, path: &Path, prompt: &str) -> Result<()> {
        if !path.is_file() {
            println!("Nothing to do");
            return Ok(());
        }
        if self.confirm.confirm(prompt) {
            fs::remove_file(path)?;
            println!("Done");
        }
        Ok(())
    }

    fn start_notification(&mut self, name: &str) -> Result<()> {
        match self.notifications.start(self.plc.as_mut(), name)? {
            StartOutcome::Registered(handle) => {
                println!("Notification callback for symbol {name} setup successfully {handle}");
            }
            StartOutcome::AlreadyRegistered => {
                println!("Notification for {name} already registered");
            }
        }
        Ok(())
    }

    /// Definitions are re-read from disk on every invocation so edits to the
    /// file take effect without restarting the console.
    fn invoke_rpc(&mut self, payload: &[String]) -> Result<()> {
        let [symbol_path, method_name, args @ ..] = payload else {
            return Err(ConsoleError::Validation(
                "RPC requires a symbol path and a method name".to_string(),
            ));
        };

        if !self.paths.rpc_definitions.is_file() {
            return Err(ConsoleError::NotFound(format!(
                "rpc definitions file {} not found",
                self.paths.rpc_definitions.display()
            )));
        }
        let doc = fs::read_to_string(&self.paths.rpc_definitions)?;
        let Some(definitions) = rpc::parse_definitions(&doc, &self.paths.rpc_schema_out)? else {
            return Ok(());
        };

        let definition = rpc::find_definition(&definitions, symbol_path)?;
        let method = rpc::find_method(definition, method_name)?;
        let plan = rpc::plan_call(method, args)?;

        let results = self.plc.call_method(
            symbol_path,
            method_name,
            plan.args,
            &plan.returns,
        )?;

        if results.is_empty() {
            println!("{symbol_path}.{method_name} returned");
        } else {
            let rendered: Vec<String> = results.iter().map(ToString::to_string).collect();
            println!("{symbol_path}.{method_name} returned {}", rendered.join(", "));
        }
        Ok(())
    }
}

fn required_symbol(payload: &[String], kind: CommandKind) -> Result<&str> {
    payload
        .first()
        .map(String::as_str)
        .ok_or_else(|| ConsoleError::Validation(format!("{kind} requires a symbol name")))
}
