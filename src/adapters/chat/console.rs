//! Console front end for chat commands
//!
//! Reads command lines, answers `!help` immediately and runs each `!scan`
//! on its own task. Replies go out through a channel so the reader keeps
//! accepting commands while scans are in flight.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinSet};

use crate::application::{acknowledgement, render_reply, ScanParams, ScanService};
use super::command::{parse_command, ChatCommand, HELP_TEXT};

/// What to do with one input line
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Reply(String),
    StartScan { ack: String, params: ScanParams },
    Ignore,
}

pub fn dispatch(line: &str) -> Dispatch {
    match parse_command(line) {
        Ok(Some(ChatCommand::Help)) => Dispatch::Reply(HELP_TEXT.to_string()),
        Ok(Some(ChatCommand::Scan(params))) => Dispatch::StartScan {
            ack: acknowledgement(&params),
            params,
        },
        Ok(None) => Dispatch::Ignore,
        Err(e) => Dispatch::Reply(e.to_string()),
    }
}

pub struct Console {
    service: Arc<ScanService>,
}

impl Console {
    pub fn new(service: Arc<ScanService>) -> Self {
        Self { service }
    }

    /// Serve commands from `input` until it ends or shutdown is signalled.
    /// At end of input, in-flight scans are allowed to finish; on shutdown
    /// they are aborted.
    pub async fn serve<R>(
        &self,
        input: R,
        replies: mpsc::UnboundedSender<String>,
        mut shutdown: watch::Receiver<bool>,
    ) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut scans = JoinSet::new();

        loop {
            let line = tokio::select! {
                line = lines.next_line() => line?,
                Some(joined) = scans.join_next(), if !scans.is_empty() => {
                    reap(joined);
                    continue;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Shutdown requested, aborting {} running scans", scans.len());
                        scans.shutdown().await;
                        return Ok(());
                    }
                    continue;
                }
            };

            let Some(line) = line else {
                break;
            };

            match dispatch(&line) {
                Dispatch::Ignore => {}
                Dispatch::Reply(text) => send(&replies, text),
                Dispatch::StartScan { ack, params } => {
                    send(&replies, ack);
                    let service = Arc::clone(&self.service);
                    let replies = replies.clone();
                    scans.spawn(async move {
                        let result = service.run(params).await;
                        send(&replies, render_reply(&result));
                    });
                }
            }
        }

        while let Some(joined) = scans.join_next().await {
            reap(joined);
        }
        Ok(())
    }
}

fn reap(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        tracing::warn!("Scan task ended abnormally: {}", e);
    }
}

fn send(replies: &mpsc::UnboundedSender<String>, text: String) {
    if replies.send(text).is_err() {
        tracing::warn!("Reply channel closed, dropping reply");
    }
}
