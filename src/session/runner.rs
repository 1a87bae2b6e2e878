use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::ledger::{PlayerProgress, SessionLedger};
use super::practice::{PracticeSession, Transition};
use super::snapshot::SessionSnapshot;
use crate::error::PracticeError;
use crate::scoring::Dialect;

pub type CommandReply = oneshot::Sender<Result<Transition, PracticeError>>;

/// Requests accepted by the runner
#[derive(Debug)]
pub enum SessionCommand {
    StartCapture(CommandReply),
    StopCapture(CommandReply),
    ToggleCapture(CommandReply),
    SetDialect(Dialect, CommandReply),
    FreeSpeak {
        prompt: String,
        expected: Vec<String>,
        reply: CommandReply,
    },
    Lessons(CommandReply),
    Restart(CommandReply),
}

/// Foreground loop: sole owner of the practice session and the ledger
pub struct SessionRunner {
    session: PracticeSession,
    ledger: SessionLedger,
    commands: mpsc::Receiver<SessionCommand>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    tick: Duration,
}

impl SessionRunner {
    pub fn new(session: PracticeSession, ledger: SessionLedger, tick: Duration) -> (Self, SessionHandle) {
        let (command_tx, commands) = mpsc::channel(32);
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot(ledger.progress()));

        let runner = Self {
            session,
            ledger,
            commands,
            snapshot_tx,
            tick,
        };
        let handle = SessionHandle {
            commands: command_tx,
            snapshot: snapshot_rx,
        };

        (runner, handle)
    }

    pub fn spawn(self) -> JoinHandle<PlayerProgress> {
        tokio::spawn(self.run())
    }

    /// Run until every [`SessionHandle`] is dropped. Returns the final
    /// progress.
    pub async fn run(mut self) -> PlayerProgress {
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Session runner started (tick {}ms)", self.tick.as_millis());

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                _ = ticker.tick() => {
                    if let Some(outcome) = self.session.tick(Instant::now()).await {
                        self.ledger.record(&outcome);
                    }
                    self.publish();
                }
            }
        }

        info!("Session runner stopped after {} runs", self.ledger.runs());
        self.ledger.progress()
    }

    async fn handle(&mut self, command: SessionCommand) {
        debug!("Session command: {:?}", command);

        let (result, reply) = match command {
            SessionCommand::StartCapture(reply) => (self.session.start_capture().await, reply),
            SessionCommand::StopCapture(reply) => (Ok(self.session.stop_capture().await), reply),
            SessionCommand::ToggleCapture(reply) => (self.session.toggle_capture().await, reply),
            SessionCommand::SetDialect(dialect, reply) => (Ok(self.session.set_dialect(dialect)), reply),
            SessionCommand::FreeSpeak {
                prompt,
                expected,
                reply,
            } => (Ok(self.session.enter_free_speak(prompt, expected)), reply),
            SessionCommand::Lessons(reply) => (Ok(self.session.back_to_lessons()), reply),
            SessionCommand::Restart(reply) => (Ok(self.session.restart()), reply),
        };

        // Callers see the new state as soon as they get their reply
        self.publish();
        let _ = reply.send(result);
    }

    fn publish(&self) {
        let snapshot = self.session.snapshot(self.ledger.progress());
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

/// Cloneable client of a running [`SessionRunner`]
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    pub async fn start_capture(&self) -> Result<Transition, PracticeError> {
        self.request(SessionCommand::StartCapture).await
    }

    pub async fn stop_capture(&self) -> Result<Transition, PracticeError> {
        self.request(SessionCommand::StopCapture).await
    }

    pub async fn toggle_capture(&self) -> Result<Transition, PracticeError> {
        self.request(SessionCommand::ToggleCapture).await
    }

    pub async fn set_dialect(&self, dialect: Dialect) -> Result<Transition, PracticeError> {
        self.request(|reply| SessionCommand::SetDialect(dialect, reply)).await
    }

    pub async fn free_speak(
        &self,
        prompt: String,
        expected: Vec<String>,
    ) -> Result<Transition, PracticeError> {
        self.request(|reply| SessionCommand::FreeSpeak {
            prompt,
            expected,
            reply,
        })
        .await
    }

    pub async fn back_to_lessons(&self) -> Result<Transition, PracticeError> {
        self.request(SessionCommand::Lessons).await
    }

    pub async fn restart(&self) -> Result<Transition, PracticeError> {
        self.request(SessionCommand::Restart).await
    }

    /// Wait until a published snapshot satisfies `predicate`
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Result<SessionSnapshot, PracticeError> {
        let mut rx = self.snapshot.clone();
        let snapshot = rx
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| PracticeError::SessionClosed)?;
        Ok(snapshot.clone())
    }

    async fn request(
        &self,
        build: impl FnOnce(CommandReply) -> SessionCommand,
    ) -> Result<Transition, PracticeError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .await
            .map_err(|_| PracticeError::SessionClosed)?;
        rx.await.map_err(|_| PracticeError::SessionClosed)?
    }
}
