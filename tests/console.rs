use std::fs;
use std::path::PathBuf;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use tempfile::TempDir;

use adscope::command::parse_line;
use adscope::config::Paths;
use adscope::dispatch::{Confirm, Dispatcher, Outcome};
use adscope::lists;
use adscope::plc::{Plc, PlcValue, sim::SimPlc};

/// Answers every confirmation prompt the same way and counts how often it
/// was asked.
struct ScriptedConfirm {
    answer: bool,
    asked: Arc<AtomicUsize>,
}

impl Confirm for ScriptedConfirm {
    fn confirm(&mut self, _prompt: &str) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}

struct Fixture {
    _tmp: TempDir,
    paths: Paths,
    dispatcher: Dispatcher,
    asked: Arc<AtomicUsize>,
}

impl Fixture {
    fn new(confirm_answer: bool) -> Self {
        Self::with_plc(SimPlc::demo("127.0.0.1.1.1", 851), confirm_answer)
    }

    fn with_plc(plc: SimPlc, confirm_answer: bool) -> Self {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let root = tmp.path();
        let paths = Paths {
            ignore_list: root.join("ignore.txt"),
            watchlist: root.join("watchlist.txt"),
            notification_list: root.join("notification_list.txt"),
            hint_list: root.join("hints.txt"),
            notification_log: root.join("notifications.csv"),
            rpc_definitions: root.join("rpc_definitions.json"),
            rpc_schema_out: root.join("rpc_definitions_schema.json"),
            recipe: root.join("recipe.json"),
        };
        let asked = Arc::new(AtomicUsize::new(0));
        let confirm = ScriptedConfirm {
            answer: confirm_answer,
            asked: Arc::clone(&asked),
        };
        let dispatcher = Dispatcher::new(Box::new(plc), paths.clone(), Box::new(confirm));
        Self {
            _tmp: tmp,
            paths,
            dispatcher,
            asked,
        }
    }

    fn eval(&mut self, line: &str) -> Outcome {
        let mut cmd = parse_line(line).expect("line must parse");
        self.dispatcher.eval(&mut cmd)
    }

    fn hint_list(&self) -> Vec<String> {
        lists::read_list(&self.paths.hint_list)
            .expect("read hint list")
            .unwrap_or_default()
    }
}

fn bare_plc() -> SimPlc {
    let mut plc = SimPlc::connect("127.0.0.1.1.1", 851);
    plc.insert_symbol("A", "INT", "", PlcValue::I16(1));
    plc.insert_symbol("B", "INT", "", PlcValue::I16(2));
    plc.insert_symbol("C", "INT", "", PlcValue::I16(3));
    plc
}

#[test]
fn get_all_symbols_feeds_hint_list() {
    let mut fx = Fixture::with_plc(bare_plc(), true);
    fx.eval("GetAllSymbols");
    assert_eq!(fx.hint_list(), vec!["A", "B", "C"]);

    // Re-running stays idempotent.
    fx.eval("GetAllSymbols");
    assert_eq!(fx.hint_list(), vec!["A", "B", "C"]);
}

#[test]
fn get_all_symbols_respects_ignore_list() {
    let mut fx = Fixture::with_plc(bare_plc(), true);
    lists::append_unique(&fx.paths.ignore_list, "B").unwrap();
    fx.eval("GetAllSymbols");
    assert_eq!(fx.hint_list(), vec!["A", "C"]);
}

#[test]
fn set_symbol_coerces_to_float() {
    let mut fx = Fixture::new(true);
    fx.eval("SetSymbol MAIN.setpoint -12.5");
    assert_eq!(
        fx.dispatcher.plc_mut().read_by_name("MAIN.setpoint").unwrap(),
        PlcValue::F64(-12.5)
    );
}

#[test]
fn set_symbol_without_value_is_rejected_and_harmless() {
    let mut fx = Fixture::new(true);
    let before = fx
        .dispatcher
        .plc_mut()
        .read_by_name("MAIN.setpoint")
        .unwrap();
    assert!(matches!(fx.eval("SetSymbol MAIN.setpoint"), Outcome::Continue));
    assert_eq!(
        fx.dispatcher.plc_mut().read_by_name("MAIN.setpoint").unwrap(),
        before
    );
}

#[test]
fn add_to_lists_mirrors_into_hint_list() {
    let mut fx = Fixture::new(true);
    fx.eval("AddToIgnore MAIN.counter");
    fx.eval("AddToNotificationList MAIN.running");
    assert_eq!(
        lists::read_list(&fx.paths.ignore_list).unwrap().unwrap(),
        vec!["MAIN.counter"]
    );
    assert_eq!(fx.hint_list(), vec!["MAIN.counter", "MAIN.running"]);
}

#[test]
fn clear_list_honors_a_no_answer() {
    let mut fx = Fixture::new(false);
    fx.eval("AddToIgnore MAIN.counter");
    fx.eval("ClearIgnoreList");
    assert_eq!(fx.asked.load(Ordering::SeqCst), 1);
    assert!(fx.paths.ignore_list.is_file());

    let mut fx = Fixture::new(true);
    fx.eval("AddToIgnore MAIN.counter");
    fx.eval("ClearIgnoreList");
    assert!(!fx.paths.ignore_list.is_file());
}

#[test]
fn clear_missing_list_asks_nothing() {
    let mut fx = Fixture::new(true);
    fx.eval("ClearWatchlist");
    assert_eq!(fx.asked.load(Ordering::SeqCst), 0);
}

#[test]
fn notify_registers_once_and_quit_cleans_up() {
    let mut fx = Fixture::new(true);
    fx.eval("Notify MAIN.counter");
    fx.eval("Notify MAIN.counter");

    assert!(fx.dispatcher.notifications().is_active("MAIN.counter"));
    assert_eq!(fx.dispatcher.notifications().active_count(), 1);

    assert!(matches!(fx.eval("Quit"), Outcome::Quit));
    assert_eq!(fx.dispatcher.notifications().active_count(), 0);
}

#[test]
fn notification_events_land_in_the_csv_log() {
    let mut fx = Fixture::new(true);
    fx.eval("Notify MAIN.counter");
    fx.dispatcher
        .plc_mut()
        .write_by_name("MAIN.counter", PlcValue::I16(9))
        .unwrap();

    let log = fs::read_to_string(&fx.paths.notification_log).unwrap();
    assert!(log.contains("MAIN.counter"));
    assert!(log.trim_end().ends_with(",9"));
}

#[test]
fn bulk_notifications_follow_the_persisted_list() {
    let mut fx = Fixture::new(true);
    lists::append_unique(&fx.paths.notification_list, "MAIN.counter").unwrap();
    lists::append_unique(&fx.paths.notification_list, "MAIN.running").unwrap();

    fx.eval("StartNotifications");
    assert_eq!(fx.dispatcher.notifications().active_count(), 2);

    fx.eval("StopNotifications");
    assert_eq!(fx.dispatcher.notifications().active_count(), 0);
}

#[test]
fn stop_notification_on_unknown_symbol_is_a_noop() {
    let mut fx = Fixture::new(true);
    assert!(matches!(
        fx.eval("StopNotification MAIN.counter"),
        Outcome::Continue
    ));
    assert_eq!(fx.dispatcher.notifications().active_count(), 0);
}

#[test]
fn show_notifications_requests_a_tail() {
    let mut fx = Fixture::new(true);
    match fx.eval("ShowNotifications") {
        Outcome::TailLog(path) => assert_eq!(path, fx.paths.notification_log),
        other => panic!("expected tail request, got {other:?}"),
    }
}

fn write_rpc_definitions(path: &PathBuf) {
    fs::write(
        path,
        r#"[
            {
                "symbol_path": "MAIN.fbDoor",
                "methods": [
                    { "name": "Open", "arguments": [], "return_types": ["bool"] },
                    {
                        "name": "SetSpeed",
                        "arguments": [ { "type": "uint16", "required": true } ],
                        "return_types": []
                    }
                ]
            }
        ]"#,
    )
    .unwrap();
}

#[test]
fn rpc_no_arg_call_reaches_the_controller() {
    let invoked = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&invoked);
    let mut plc = bare_plc();
    plc.register_method("MAIN.fbDoor", "Open", move |args| {
        assert!(args.is_empty());
        seen.store(true, Ordering::SeqCst);
        Ok(vec![PlcValue::Bool(true)])
    });

    let mut fx = Fixture::with_plc(plc, true);
    write_rpc_definitions(&fx.paths.rpc_definitions);
    assert!(matches!(fx.eval("RPC MAIN.fbDoor Open"), Outcome::Continue));
    assert!(invoked.load(Ordering::SeqCst));
}

#[test]
fn rpc_arity_mismatch_never_reaches_the_controller() {
    let invoked = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&invoked);
    let mut plc = bare_plc();
    plc.register_method("MAIN.fbDoor", "SetSpeed", move |_| {
        seen.store(true, Ordering::SeqCst);
        Ok(vec![])
    });

    let mut fx = Fixture::with_plc(plc, true);
    write_rpc_definitions(&fx.paths.rpc_definitions);
    // Declared arity is 1; two values must fail validation, not the session.
    assert!(matches!(
        fx.eval("RPC MAIN.fbDoor SetSpeed 10 20"),
        Outcome::Continue
    ));
    assert!(!invoked.load(Ordering::SeqCst));
}

#[test]
fn malformed_rpc_definitions_emit_a_schema_file() {
    let mut fx = Fixture::new(true);
    fs::write(
        &fx.paths.rpc_definitions,
        r#"[ { "symbol_path": "MAIN.fbDoor" } ]"#,
    )
    .unwrap();

    assert!(matches!(fx.eval("RPC MAIN.fbDoor Open"), Outcome::Continue));
    assert!(fx.paths.rpc_schema_out.is_file());
}

#[test]
fn recipe_round_trip_preserves_extra_fields() {
    let mut fx = Fixture::new(true);
    fs::write(
        &fx.paths.recipe,
        r#"[ { "symbol_path": "MAIN.setpoint", "value": 30.25, "unit": "degC" } ]"#,
    )
    .unwrap();

    fx.eval("DownloadRecipe");
    assert_eq!(
        fx.dispatcher.plc_mut().read_by_name("MAIN.setpoint").unwrap(),
        PlcValue::F64(30.25)
    );

    fx.eval("SetSymbol MAIN.setpoint 99.5");
    fx.eval("UploadRecipe");
    let document: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&fx.paths.recipe).unwrap()).unwrap();
    assert_eq!(document[0]["value"], 99.5);
    assert_eq!(document[0]["unit"], "degC");
}

#[test]
fn unknown_symbol_errors_do_not_end_the_session() {
    let mut fx = Fixture::new(true);
    assert!(matches!(fx.eval("GetSymbol NOPE.missing"), Outcome::Continue));
    assert!(matches!(fx.eval("Notify NOPE.missing"), Outcome::Continue));
    assert_eq!(fx.dispatcher.notifications().active_count(), 0);
}
