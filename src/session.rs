//! Interactive session loop.
//!
//! Input capture and command execution are two independently scheduled
//! contexts that communicate only through a FIFO queue: a blocking stdin
//! thread parses lines into commands and never waits on the consumer; the
//! consumer takes commands strictly in submission order, polling with a
//! short idle backoff when the queue is empty. The controller connection is
//! only ever touched from the consumer, so it needs no locking.

use std::{
    io::{self, Write as _},
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc as std_mpsc,
    },
    thread,
    time::Duration,
};

use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::command::{self, Command};
use crate::config::Paths;
use crate::dispatch::{Confirm, Dispatcher, Outcome};
use crate::error::Result;
use crate::plc::Plc;

const IDLE_BACKOFF: Duration = Duration::from_millis(100);
const TAIL_POLL: Duration = Duration::from_millis(250);

/// Runs the console until `Quit` or Ctrl-C. Subscriptions are released on
/// every exit path.
pub async fn run(plc: Box<dyn Plc>, paths: Paths) -> Result<()> {
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<Command>();
    let (reply_tx, reply_rx) = std_mpsc::channel::<bool>();
    let confirm_pending = Arc::new(AtomicBool::new(false));

    let producer_pending = Arc::clone(&confirm_pending);
    thread::spawn(move || input_loop(cmd_tx, reply_tx, producer_pending));

    let confirm = SessionConfirm {
        pending: confirm_pending,
        reply_rx,
    };
    let mut dispatcher = Dispatcher::new(plc, paths, Box::new(confirm));
    let mut tail: Option<(CancellationToken, JoinHandle<()>)> = None;

    loop {
        let mut cmd = match cmd_rx.try_recv() {
            Ok(cmd) => cmd,
            Err(TryRecvError::Empty) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        if let Some(active) = tail.take() {
                            stop_tail(active).await;
                            continue;
                        }
                        println!();
                        break;
                    }
                    _ = tokio::time::sleep(IDLE_BACKOFF) => continue,
                }
            }
            Err(TryRecvError::Disconnected) => break,
        };

        // Any new command supersedes an active tail.
        if let Some(active) = tail.take() {
            stop_tail(active).await;
        }

        match dispatcher.eval(&mut cmd) {
            Outcome::Continue => {}
            Outcome::TailLog(path) => {
                println!("Tailing {} (Ctrl-C to stop)", path.display());
                let token = CancellationToken::new();
                let handle = tokio::spawn(tail_log(path, token.clone()));
                tail = Some((token, handle));
            }
            Outcome::Quit => break,
        }
    }

    if let Some(active) = tail.take() {
        stop_tail(active).await;
    }
    dispatcher.cleanup();
    Ok(())
}

/// Blocking stdin producer. Parses each line into a command and queues it;
/// while a confirmation is pending the next line is routed to the consumer
/// as a yes/no answer instead.
fn input_loop(
    cmd_tx: mpsc::UnboundedSender<Command>,
    reply_tx: std_mpsc::Sender<bool>,
    confirm_pending: Arc<AtomicBool>,
) {
    let stdin = io::stdin();
    loop {
        if !confirm_pending.load(Ordering::SeqCst) {
            print!("> ");
            let _ = io::stdout().flush();
        }

        let mut line = String::new();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        if confirm_pending.swap(false, Ordering::SeqCst) {
            let answer = line.trim();
            let yes = answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes");
            if reply_tx.send(yes).is_err() {
                break;
            }
            continue;
        }

        match command::parse_line(&line) {
            Some(cmd) => {
                let stop = cmd.is_stop();
                if cmd_tx.send(cmd).is_err() || stop {
                    break;
                }
            }
            None => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    println!("Unknown command: {trimmed}");
                }
            }
        }
    }
}

/// Yes/no prompt answered through the input thread, so a single reader owns
/// stdin for the whole session.
struct SessionConfirm {
    pending: Arc<AtomicBool>,
    reply_rx: std_mpsc::Receiver<bool>,
}

impl Confirm for SessionConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        self.pending.store(true, Ordering::SeqCst);
        print!("{prompt} [y/N] ");
        let _ = io::stdout().flush();
        self.reply_rx.recv().unwrap_or(false)
    }
}

async fn stop_tail((token, handle): (CancellationToken, JoinHandle<()>)) {
    token.cancel();
    let _ = handle.await;
}

/// Follows the notification log, printing appended rows until cancelled.
/// Starts at the current end of file; a log that does not exist yet is
/// simply waited on.
async fn tail_log(path: PathBuf, token: CancellationToken) {
    let mut offset = match tokio::fs::metadata(&path).await {
        Ok(metadata) => metadata.len(),
        Err(_) => 0,
    };

    loop {
        if let Ok(mut file) = tokio::fs::File::open(&path).await {
            if file.seek(io::SeekFrom::Start(offset)).await.is_ok() {
                let mut chunk = Vec::new();
                if let Ok(read) = file.read_to_end(&mut chunk).await {
                    if read > 0 {
                        offset += read as u64;
                        print!("{}", String::from_utf8_lossy(&chunk));
                        let _ = io::stdout().flush();
                    }
                }
            }
        }

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(TAIL_POLL) => {}
        }
    }
}
