//! Command vocabulary and line parsing.
//!
//! Each input line is one command name followed by whitespace-separated
//! arguments. The kinds form a tagged enum so the dispatcher's `match` is
//! exhaustive; adding a command without handling it fails to compile.

use std::fmt;

/// Every operation the console can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    GetAllSymbols,
    GetSymbol,
    SetSymbol,
    IgnoreList,
    AddToIgnore,
    RemoveFromIgnore,
    ClearIgnoreList,
    Watchlist,
    AddToWatchlist,
    RemoveFromWatchlist,
    ClearWatchlist,
    Notify,
    StopNotification,
    StartNotifications,
    StopNotifications,
    ShowNotifications,
    NotificationList,
    AddToNotificationList,
    RemoveFromNotificationList,
    ClearNotificationList,
    HintList,
    AddToHintList,
    RemoveFromHintList,
    ClearHintList,
    Rpc,
    DownloadRecipe,
    UploadRecipe,
    Quit,
}

impl CommandKind {
    pub const ALL: [CommandKind; 28] = [
        CommandKind::GetAllSymbols,
        CommandKind::GetSymbol,
        CommandKind::SetSymbol,
        CommandKind::IgnoreList,
        CommandKind::AddToIgnore,
        CommandKind::RemoveFromIgnore,
        CommandKind::ClearIgnoreList,
        CommandKind::Watchlist,
        CommandKind::AddToWatchlist,
        CommandKind::RemoveFromWatchlist,
        CommandKind::ClearWatchlist,
        CommandKind::Notify,
        CommandKind::StopNotification,
        CommandKind::StartNotifications,
        CommandKind::StopNotifications,
        CommandKind::ShowNotifications,
        CommandKind::NotificationList,
        CommandKind::AddToNotificationList,
        CommandKind::RemoveFromNotificationList,
        CommandKind::ClearNotificationList,
        CommandKind::HintList,
        CommandKind::AddToHintList,
        CommandKind::RemoveFromHintList,
        CommandKind::ClearHintList,
        CommandKind::Rpc,
        CommandKind::DownloadRecipe,
        CommandKind::UploadRecipe,
        CommandKind::Quit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CommandKind::GetAllSymbols => "GetAllSymbols",
            CommandKind::GetSymbol => "GetSymbol",
            CommandKind::SetSymbol => "SetSymbol",
            CommandKind::IgnoreList => "IgnoreList",
            CommandKind::AddToIgnore => "AddToIgnore",
            CommandKind::RemoveFromIgnore => "RemoveFromIgnore",
            CommandKind::ClearIgnoreList => "ClearIgnoreList",
            CommandKind::Watchlist => "Watchlist",
            CommandKind::AddToWatchlist => "AddToWatchlist",
            CommandKind::RemoveFromWatchlist => "RemoveFromWatchlist",
            CommandKind::ClearWatchlist => "ClearWatchlist",
            CommandKind::Notify => "Notify",
            CommandKind::StopNotification => "StopNotification",
            CommandKind::StartNotifications => "StartNotifications",
            CommandKind::StopNotifications => "StopNotifications",
            CommandKind::ShowNotifications => "ShowNotifications",
            CommandKind::NotificationList => "NotificationList",
            CommandKind::AddToNotificationList => "AddToNotificationList",
            CommandKind::RemoveFromNotificationList => "RemoveFromNotificationList",
            CommandKind::ClearNotificationList => "ClearNotificationList",
            CommandKind::HintList => "HintList",
            CommandKind::AddToHintList => "AddToHintList",
            CommandKind::RemoveFromHintList => "RemoveFromHintList",
            CommandKind::ClearHintList => "ClearHintList",
            CommandKind::Rpc => "RPC",
            CommandKind::DownloadRecipe => "DownloadRecipe",
            CommandKind::UploadRecipe => "UploadRecipe",
            CommandKind::Quit => "Quit",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One dispatched command: a kind plus its (take-once) argument payload.
#[derive(Debug)]
pub struct Command {
    kind: CommandKind,
    payload: Option<Vec<String>>,
}

impl Command {
    pub fn new(kind: CommandKind, payload: Vec<String>) -> Self {
        Self {
            kind,
            payload: Some(payload),
        }
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Consumes the payload; a second call yields nothing. Each handler
    /// reads its arguments at most once per command instance.
    pub fn take_payload(&mut self) -> Vec<String> {
        self.payload.take().unwrap_or_default()
    }

    pub fn is_stop(&self) -> bool {
        self.kind == CommandKind::Quit
    }
}

/// Parses one input line. Empty lines and unknown command names yield `None`;
/// the session reports the latter without treating it as an error.
pub fn parse_line(line: &str) -> Option<Command> {
    let mut tokens = line.split_whitespace();
    let name = tokens.next()?;
    let kind = CommandKind::ALL
        .into_iter()
        .find(|kind| kind.name() == name)?;
    Some(Command::new(kind, tokens.map(str::to_string).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_and_payload() {
        let mut command = parse_line("SetSymbol MAIN.setpoint -12.5").unwrap();
        assert_eq!(command.kind(), CommandKind::SetSymbol);
        assert_eq!(
            command.take_payload(),
            vec!["MAIN.setpoint".to_string(), "-12.5".to_string()]
        );
    }

    #[test]
    fn payload_is_consumed_at_most_once() {
        let mut command = parse_line("GetSymbol MAIN.counter").unwrap();
        assert_eq!(command.take_payload(), vec!["MAIN.counter".to_string()]);
        assert!(command.take_payload().is_empty());
    }

    #[test]
    fn quit_carries_the_stop_flag() {
        let command = parse_line("Quit").unwrap();
        assert!(command.is_stop());
        assert!(!parse_line("GetAllSymbols").unwrap().is_stop());
    }

    #[test]
    fn unknown_and_empty_lines_do_not_parse() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   ").is_none());
        assert!(parse_line("getallsymbols").is_none());
        assert!(parse_line("Bogus arg").is_none());
    }

    #[test]
    fn rpc_command_uses_uppercase_name() {
        assert_eq!(parse_line("RPC MAIN.fbDoor Open").unwrap().kind(), CommandKind::Rpc);
    }
}
