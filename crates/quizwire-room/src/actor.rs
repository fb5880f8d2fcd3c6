//! Room actor: an isolated tokio task that owns one quiz session.
//!
//! Every mutation of a room's state — joins, host controls, answer
//! submissions, timer events, disconnects — flows through this actor's
//! mailbox or its countdown, so the [`GameRoom`] state machine is
//! single-threaded by construction. The actor also owns the room's one
//! [`Countdown`] slot and keeps it in lockstep with the phase after
//! every transition.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use quizwire_countdown::{Countdown, CountdownEvent};
use quizwire_protocol::{
    ConnectionId, Question, QuizParams, RoomCode, RoomSnapshot, ServerEvent,
};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{GameRoom, Outbound, Phase, Recipient, RoomError, RoomRegistry};

/// Channel on which a connection receives its server events.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Mailbox depth per room; senders briefly wait if a room falls this
/// far behind.
const MAILBOX_SIZE: usize = 64;

/// Commands sent to a room actor through its mailbox.
pub(crate) enum RoomCommand {
    /// Add a participant. Replies with the room snapshot for the ack.
    Join {
        conn: ConnectionId,
        name: String,
        sender: EventSender,
        reply: oneshot::Sender<Result<RoomSnapshot, RoomError>>,
    },

    /// Authorize a generation request and resolve its parameters:
    /// fresh ones are stored, `None` recalls the stored set.
    PrepareGeneration {
        conn: ConnectionId,
        params: Option<QuizParams>,
        reply: oneshot::Sender<Result<QuizParams, RoomError>>,
    },

    /// A spawned generation task completed (either way).
    GenerationFinished {
        result: Result<Vec<Question>, String>,
    },

    /// A spawned single-question regeneration completed.
    ReplacementFinished {
        index: usize,
        result: Result<Question, String>,
    },

    /// Host-supplied question set; stores it and starts the game.
    UploadQuiz {
        conn: ConnectionId,
        questions: Vec<Question>,
        timer_duration: u32,
    },

    /// Host-edited question set replacing the current quiz.
    OverwriteQuiz {
        conn: ConnectionId,
        questions: Vec<Question>,
    },

    /// Leave review and start the timed question loop.
    StartQuiz {
        conn: ConnectionId,
        timer_duration: u32,
    },

    /// A participant answered the live question.
    SubmitAnswer {
        conn: ConnectionId,
        question_index: usize,
        answer: String,
    },

    /// Host ends the live question early.
    SkipQuestion { conn: ConnectionId },

    /// Host aborts the remaining questions.
    EndQuiz { conn: ConnectionId },

    /// A connection (host or participant) went away.
    Disconnect { conn: ConnectionId },

    /// Snapshot of room metadata (does not count as activity).
    GetStatus {
        reply: oneshot::Sender<RoomStatus>,
    },

    /// Tear the room down (idle sweep).
    Shutdown,
}

/// Metadata snapshot used by listings and the idle sweep.
#[derive(Debug, Clone)]
pub struct RoomStatus {
    pub code: RoomCode,
    pub phase: Phase,
    pub participant_count: usize,
    /// Time since the last command was processed.
    pub idle: Duration,
}

// ---------------------------------------------------------------------------
// RoomHandle
// ---------------------------------------------------------------------------

/// Handle to a running room actor. Cheap to clone — it's an
/// `mpsc::Sender` wrapper.
///
/// All methods report [`RoomError::Unavailable`] when the actor has
/// already stopped (host left, idle sweep).
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// The room's join code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Adds a participant and returns the snapshot for the join ack.
    pub async fn join(
        &self,
        conn: ConnectionId,
        name: String,
        sender: EventSender,
    ) -> Result<RoomSnapshot, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Join {
            conn,
            name,
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?
    }

    /// Authorizes a generation request; returns the parameters the
    /// spawned task should generate with.
    pub async fn prepare_generation(
        &self,
        conn: ConnectionId,
        params: Option<QuizParams>,
    ) -> Result<QuizParams, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::PrepareGeneration {
            conn,
            params,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?
    }

    /// Delivers the outcome of a generation task.
    pub async fn generation_finished(
        &self,
        result: Result<Vec<Question>, String>,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::GenerationFinished { result }).await
    }

    /// Delivers the outcome of a single-question regeneration task.
    pub async fn replacement_finished(
        &self,
        index: usize,
        result: Result<Question, String>,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::ReplacementFinished { index, result })
            .await
    }

    /// Installs an uploaded quiz and starts the game.
    pub async fn upload_quiz(
        &self,
        conn: ConnectionId,
        questions: Vec<Question>,
        timer_duration: u32,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::UploadQuiz {
            conn,
            questions,
            timer_duration,
        })
        .await
    }

    /// Replaces the quiz with host-edited questions.
    pub async fn overwrite_quiz(
        &self,
        conn: ConnectionId,
        questions: Vec<Question>,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::OverwriteQuiz { conn, questions }).await
    }

    /// Starts the timed question loop.
    pub async fn start_quiz(
        &self,
        conn: ConnectionId,
        timer_duration: u32,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::StartQuiz {
            conn,
            timer_duration,
        })
        .await
    }

    /// Submits an answer for the live question.
    pub async fn submit_answer(
        &self,
        conn: ConnectionId,
        question_index: usize,
        answer: String,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::SubmitAnswer {
            conn,
            question_index,
            answer,
        })
        .await
    }

    /// Ends the live question as if the timer expired.
    pub async fn skip_question(
        &self,
        conn: ConnectionId,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::SkipQuestion { conn }).await
    }

    /// Aborts the remaining questions and publishes final standings.
    pub async fn end_quiz(&self, conn: ConnectionId) -> Result<(), RoomError> {
        self.send(RoomCommand::EndQuiz { conn }).await
    }

    /// Routes a transport disconnect into the room.
    pub async fn disconnect(
        &self,
        conn: ConnectionId,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Disconnect { conn }).await
    }

    /// Queries room metadata.
    pub async fn status(&self) -> Result<RoomStatus, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::GetStatus { reply: reply_tx }).await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Tears the room down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }
}

// ---------------------------------------------------------------------------
// RoomActor
// ---------------------------------------------------------------------------

enum Flow {
    Continue,
    Stop,
}

struct RoomActor {
    game: GameRoom,
    countdown: Countdown,
    results_delay: Duration,
    host_sender: EventSender,
    /// Outbound channels of current participants.
    senders: HashMap<ConnectionId, EventSender>,
    mailbox: mpsc::Receiver<RoomCommand>,
    registry: Arc<RoomRegistry>,
    last_activity: Instant,
}

impl RoomActor {
    async fn run(mut self) {
        info!(room = %self.game.code(), "room actor started");

        loop {
            tokio::select! {
                maybe_cmd = self.mailbox.recv() => {
                    match maybe_cmd {
                        Some(cmd) => {
                            if !matches!(cmd, RoomCommand::GetStatus { .. }) {
                                self.last_activity = Instant::now();
                            }
                            if let Flow::Stop = self.handle_command(cmd) {
                                break;
                            }
                        }
                        // Every handle dropped — nothing can reach the
                        // room any more.
                        None => break,
                    }
                }
                event = self.countdown.wait() => {
                    self.handle_countdown(event);
                }
            }
        }

        self.registry.remove(self.game.code());
        info!(room = %self.game.code(), "room actor stopped");
    }

    fn handle_command(&mut self, cmd: RoomCommand) -> Flow {
        match cmd {
            RoomCommand::Join {
                conn,
                name,
                sender,
                reply,
            } => match self.game.join(conn, &name) {
                Ok(out) => {
                    self.senders.insert(conn, sender);
                    let snapshot = self.game.snapshot();
                    self.dispatch(out);
                    let _ = reply.send(Ok(snapshot));
                }
                Err(e) => {
                    let _ = reply.send(Err(e));
                }
            },

            RoomCommand::PrepareGeneration {
                conn,
                params,
                reply,
            } => {
                let result = match params {
                    Some(p) => self.game.store_params(conn, p),
                    None => self.game.stored_params(conn),
                };
                let _ = reply.send(result);
            }

            RoomCommand::GenerationFinished { result } => match result {
                Ok(questions) => {
                    let host = self.game.host();
                    match self.game.set_quiz_content(host, questions) {
                        Ok(out) => self.dispatch(out),
                        Err(e) => self.report(host, e),
                    }
                }
                Err(message) => {
                    warn!(room = %self.game.code(), %message, "quiz generation failed");
                    self.send_error(self.game.host(), message);
                }
            },

            RoomCommand::ReplacementFinished { index, result } => match result {
                Ok(question) => {
                    let host = self.game.host();
                    match self.game.replace_question(host, index, question) {
                        Ok(out) => self.dispatch(out),
                        Err(e) => self.report(host, e),
                    }
                }
                Err(message) => {
                    warn!(room = %self.game.code(), index, %message, "question regeneration failed");
                    self.send_error(self.game.host(), message);
                }
            },

            RoomCommand::UploadQuiz {
                conn,
                questions,
                timer_duration,
            } => match self.game.set_quiz_content(conn, questions) {
                Ok(out) => {
                    self.dispatch(out);
                    match self.game.start_quiz(conn, timer_duration) {
                        Ok(()) => self.drive(),
                        Err(e) => self.report(conn, e),
                    }
                }
                Err(e) => self.report(conn, e),
            },

            RoomCommand::OverwriteQuiz { conn, questions } => {
                match self.game.overwrite_quiz(conn, questions) {
                    Ok(out) => self.dispatch(out),
                    Err(e) => {
                        // The ack channel is the quiz-update ack itself.
                        self.send_to(conn, ServerEvent::QuizUpdateAck {
                            success: false,
                        });
                        self.report(conn, e);
                    }
                }
            }

            RoomCommand::StartQuiz {
                conn,
                timer_duration,
            } => match self.game.start_quiz(conn, timer_duration) {
                Ok(()) => self.drive(),
                Err(e) => self.report(conn, e),
            },

            RoomCommand::SubmitAnswer {
                conn,
                question_index,
                answer,
            } => match self.game.submit_answer(conn, question_index, answer) {
                Ok(out) => self.dispatch(out),
                Err(e) => self.report(conn, e),
            },

            RoomCommand::SkipQuestion { conn } => {
                match self.game.skip_question(conn) {
                    Ok(out) => {
                        self.dispatch(out);
                        self.sync_timer();
                    }
                    Err(e) => self.report(conn, e),
                }
            }

            RoomCommand::EndQuiz { conn } => match self.game.end_quiz(conn) {
                Ok(out) => {
                    self.dispatch(out);
                    self.sync_timer();
                }
                Err(e) => self.report(conn, e),
            },

            RoomCommand::Disconnect { conn } => {
                if conn == self.game.host() {
                    // The session cannot continue without its host.
                    self.countdown.cancel();
                    self.broadcast(ServerEvent::HostDisconnected);
                    info!(room = %self.game.code(), "host disconnected, tearing down");
                    return Flow::Stop;
                }
                let out = self.game.remove_participant(conn);
                self.senders.remove(&conn);
                self.dispatch(out);
            }

            RoomCommand::GetStatus { reply } => {
                let _ = reply.send(RoomStatus {
                    code: self.game.code().clone(),
                    phase: self.game.phase(),
                    participant_count: self.game.participant_count(),
                    idle: self.last_activity.elapsed(),
                });
            }

            RoomCommand::Shutdown => {
                self.countdown.cancel();
                self.broadcast(ServerEvent::Error {
                    message: "Room closed after inactivity.".to_string(),
                });
                info!(room = %self.game.code(), "room shut down");
                return Flow::Stop;
            }
        }

        Flow::Continue
    }

    fn handle_countdown(&mut self, event: CountdownEvent) {
        match event {
            CountdownEvent::Tick { remaining } => {
                if self.game.phase() == Phase::Question {
                    self.broadcast(ServerEvent::TimerTick {
                        remaining_time: remaining,
                    });
                }
            }
            CountdownEvent::Elapsed => match self.game.phase() {
                Phase::Question | Phase::Results => self.drive(),
                phase => {
                    debug!(room = %self.game.code(), %phase, "timer elapsed outside an active phase");
                }
            },
        }
    }

    /// Runs one state-machine transition and realigns the timer with
    /// the phase it produced.
    fn drive(&mut self) {
        let out = self.game.advance();
        self.dispatch(out);
        self.sync_timer();
    }

    /// The countdown always mirrors the phase: a live question runs
    /// the question countdown, results run the fixed delay, everything
    /// else is timerless.
    fn sync_timer(&mut self) {
        match self.game.phase() {
            Phase::Question => {
                self.countdown.start_question(self.game.timer_duration());
            }
            Phase::Results => {
                self.countdown.start_delay(self.results_delay);
            }
            Phase::Lobby | Phase::Review | Phase::Finished => {
                self.countdown.cancel();
            }
        }
    }

    /// Logs a failed precondition and reports it to the offender.
    fn report(&mut self, conn: ConnectionId, err: RoomError) {
        debug!(room = %self.game.code(), %conn, error = %err, "operation rejected");
        self.send_error(conn, err.to_string());
    }

    fn send_error(&self, conn: ConnectionId, message: String) {
        self.send_to(conn, ServerEvent::Error { message });
    }

    fn broadcast(&self, event: ServerEvent) {
        self.dispatch(vec![(Recipient::Room, event)]);
    }

    /// Fans out state-machine events. Sends to connections that have
    /// vanished are silently dropped — their disconnect is already in
    /// the mailbox.
    fn dispatch(&self, out: Outbound) {
        for (recipient, event) in out {
            match recipient {
                Recipient::Room => {
                    let _ = self.host_sender.send(event.clone());
                    for sender in self.senders.values() {
                        let _ = sender.send(event.clone());
                    }
                }
                Recipient::Host => {
                    let _ = self.host_sender.send(event);
                }
                Recipient::Conn(conn) => self.send_to(conn, event),
            }
        }
    }

    fn send_to(&self, conn: ConnectionId, event: ServerEvent) {
        if conn == self.game.host() {
            let _ = self.host_sender.send(event);
        } else if let Some(sender) = self.senders.get(&conn) {
            let _ = sender.send(event);
        }
    }
}

/// Spawns a room actor and returns the handle to reach it.
pub(crate) fn spawn_room(
    code: RoomCode,
    host: ConnectionId,
    host_sender: EventSender,
    results_delay: Duration,
    registry: Arc<RoomRegistry>,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(MAILBOX_SIZE);

    let actor = RoomActor {
        game: GameRoom::new(code.clone(), host),
        countdown: Countdown::new(),
        results_delay,
        host_sender,
        senders: HashMap::new(),
        mailbox: rx,
        registry,
        last_activity: Instant::now(),
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
