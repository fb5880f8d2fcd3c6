//! The per-room game state machine.
//!
//! [`GameRoom`] owns everything a quiz session tracks — roster, quiz
//! content, phase, scores, the current round — and exposes the
//! operations the gateway and timer can apply to it. Every operation
//! mutates state and returns the events to deliver, as
//! `(Recipient, ServerEvent)` pairs; it never touches a channel or a
//! timer itself. That keeps the whole state machine testable without
//! any async wiring.
//!
//! [`GameRoom::advance`] is the game loop driver: it performs exactly
//! one phase transition per call and has exactly two callers — the
//! room actor's countdown arm and host actions (skip, start).

use std::collections::HashMap;

use quizwire_protocol::{
    ConnectionId, LeaderboardEntry, ParticipantInfo, PlayerAnswers, Question,
    QuizParams, RoomCode, RoomSnapshot, ServerEvent,
};
use tracing::debug;

use crate::{RoomError, RoundTracker};

/// Display names longer than this are rejected at join.
const MAX_NAME_LEN: usize = 32;

/// Who should receive an emitted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// The host and every current participant.
    Room,
    /// The host only.
    Host,
    /// One specific connection.
    Conn(ConnectionId),
}

/// Events produced by a state-machine operation, in delivery order.
pub type Outbound = Vec<(Recipient, ServerEvent)>;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Lobby → Review → (Question ⇄ Results)* → Finished
/// ```
///
/// - **Lobby**: room exists, participants may join, no quiz yet.
/// - **Review**: quiz content present; the host inspects, edits, or
///   regenerates questions. Joins still allowed.
/// - **Question**: one question is live and accepting answers.
/// - **Results**: the round outcome is on screen; the next question
///   (or the end of the game) follows after a fixed delay.
/// - **Finished**: terminal. "Play again" is a brand-new room, not a
///   transition out of this state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Lobby,
    Review,
    Question,
    Results,
    Finished,
}

impl Phase {
    /// Whether a game is currently running.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Question | Self::Results)
    }

    /// Whether new participants may still join.
    pub fn accepts_joins(&self) -> bool {
        matches!(self, Self::Lobby | Self::Review)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Lobby => "lobby",
            Self::Review => "review",
            Self::Question => "question",
            Self::Results => "results",
            Self::Finished => "finished",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// GameRoom
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Participant {
    conn: ConnectionId,
    name: String,
}

/// One quiz session's complete state.
pub struct GameRoom {
    code: RoomCode,
    host: ConnectionId,
    /// Currently connected participants, in join order. Never contains
    /// the host.
    participants: Vec<Participant>,
    /// Everyone who ever joined, in join order — kept after disconnect
    /// so the final leaderboard and answer review stay complete.
    roster: Vec<(ConnectionId, String)>,
    quiz: Option<Vec<Question>>,
    quiz_params: Option<QuizParams>,
    phase: Phase,
    /// `None` until the first question goes live. Only
    /// [`GameRoom::advance`] moves this, and only forward.
    current_index: Option<usize>,
    timer_duration: u32,
    scores: HashMap<ConnectionId, u32>,
    round: RoundTracker,
    player_answers: HashMap<ConnectionId, Vec<Option<String>>>,
}

impl GameRoom {
    /// Creates a fresh room in the lobby phase.
    pub fn new(code: RoomCode, host: ConnectionId) -> Self {
        Self {
            code,
            host,
            participants: Vec::new(),
            roster: Vec::new(),
            quiz: None,
            quiz_params: None,
            phase: Phase::Lobby,
            current_index: None,
            timer_duration: 0,
            scores: HashMap::new(),
            round: RoundTracker::new(),
            player_answers: HashMap::new(),
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn host(&self) -> ConnectionId {
        self.host
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn timer_duration(&self) -> u32 {
        self.timer_duration
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// The roster as sent to clients.
    pub fn participants_info(&self) -> Vec<ParticipantInfo> {
        self.participants
            .iter()
            .map(|p| ParticipantInfo {
                id: p.conn,
                name: p.name.clone(),
            })
            .collect()
    }

    /// Room state handed to a participant on join.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_code: self.code.clone(),
            participants: self.participants_info(),
        }
    }

    fn require_host(&self, conn: ConnectionId) -> Result<(), RoomError> {
        if conn == self.host {
            Ok(())
        } else {
            Err(RoomError::NotHost)
        }
    }

    fn is_participant(&self, conn: ConnectionId) -> bool {
        self.participants.iter().any(|p| p.conn == conn)
    }

    // -----------------------------------------------------------------
    // Lobby / review operations
    // -----------------------------------------------------------------

    /// Adds a participant. Valid while the game has not started.
    pub fn join(
        &mut self,
        conn: ConnectionId,
        name: &str,
    ) -> Result<Outbound, RoomError> {
        let name = name.trim();
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(RoomError::InvalidName(name.to_string()));
        }
        if !self.phase.accepts_joins() {
            return Err(RoomError::InvalidPhase(self.phase));
        }
        if conn == self.host || self.is_participant(conn) {
            return Err(RoomError::AlreadyInRoom);
        }

        self.participants.push(Participant {
            conn,
            name: name.to_string(),
        });
        self.roster.push((conn, name.to_string()));

        Ok(vec![(
            Recipient::Room,
            ServerEvent::UpdateParticipants {
                participants: self.participants_info(),
            },
        )])
    }

    /// Stores generation parameters ahead of an async generation call,
    /// returning a copy for the caller to generate with.
    pub fn store_params(
        &mut self,
        conn: ConnectionId,
        params: QuizParams,
    ) -> Result<QuizParams, RoomError> {
        self.require_host(conn)?;
        if self.phase.is_active() || self.phase == Phase::Finished {
            return Err(RoomError::InvalidPhase(self.phase));
        }
        self.quiz_params = Some(params.clone());
        Ok(params)
    }

    /// The parameters stored by the last generation request.
    pub fn stored_params(
        &self,
        conn: ConnectionId,
    ) -> Result<QuizParams, RoomError> {
        self.require_host(conn)?;
        self.quiz_params.clone().ok_or(RoomError::NoStoredParams)
    }

    /// Installs quiz content and enters review. Content is validated
    /// at the boundary it crossed (upload or generation) — not here.
    pub fn set_quiz_content(
        &mut self,
        conn: ConnectionId,
        questions: Vec<Question>,
    ) -> Result<Outbound, RoomError> {
        self.require_host(conn)?;
        if self.phase.is_active() || self.phase == Phase::Finished {
            return Err(RoomError::InvalidPhase(self.phase));
        }

        self.quiz = Some(questions.clone());
        self.phase = Phase::Review;

        Ok(vec![(
            Recipient::Host,
            ServerEvent::QuizReviewData { questions },
        )])
    }

    /// Swaps a single question during review.
    pub fn replace_question(
        &mut self,
        conn: ConnectionId,
        index: usize,
        question: Question,
    ) -> Result<Outbound, RoomError> {
        self.require_host(conn)?;
        if self.phase != Phase::Review {
            return Err(RoomError::InvalidPhase(self.phase));
        }
        let quiz = self.quiz.as_mut().ok_or(RoomError::NoQuizContent)?;
        let len = quiz.len();
        let slot = quiz
            .get_mut(index)
            .ok_or(RoomError::InvalidIndex { index, len })?;
        *slot = question.clone();

        Ok(vec![(
            Recipient::Host,
            ServerEvent::SingleQuestionUpdated {
                question_index: index,
                new_question: question,
            },
        )])
    }

    /// Replaces the whole quiz with host-edited questions.
    pub fn overwrite_quiz(
        &mut self,
        conn: ConnectionId,
        questions: Vec<Question>,
    ) -> Result<Outbound, RoomError> {
        self.require_host(conn)?;
        if self.phase != Phase::Review {
            return Err(RoomError::InvalidPhase(self.phase));
        }
        self.quiz = Some(questions);

        Ok(vec![(
            Recipient::Host,
            ServerEvent::QuizUpdateAck { success: true },
        )])
    }

    // -----------------------------------------------------------------
    // Game loop
    // -----------------------------------------------------------------

    /// Leaves review and stages the first round. The caller must
    /// immediately follow up with [`GameRoom::advance`] — start only
    /// resets state.
    pub fn start_quiz(
        &mut self,
        conn: ConnectionId,
        timer_duration: u32,
    ) -> Result<(), RoomError> {
        self.require_host(conn)?;
        if self.phase.is_active() || self.phase == Phase::Finished {
            return Err(RoomError::InvalidPhase(self.phase));
        }
        match &self.quiz {
            None => return Err(RoomError::NoQuizContent),
            Some(quiz) if quiz.is_empty() => {
                return Err(RoomError::NoQuizContent)
            }
            Some(_) => {}
        }
        if timer_duration == 0 {
            return Err(RoomError::InvalidTimer(timer_duration));
        }

        self.timer_duration = timer_duration;
        self.current_index = None;
        self.scores.clear();
        self.round.reset();
        self.player_answers.clear();
        self.player_answers.insert(self.host, Vec::new());
        for p in &self.participants {
            self.player_answers.insert(p.conn, Vec::new());
        }
        // Staged as "between rounds": the first advance() runs the
        // Results → Question transition for question 0.
        self.phase = Phase::Results;
        Ok(())
    }

    /// Performs exactly one phase transition:
    /// Results → Question (or Finished), or Question → Results.
    ///
    /// Called from two places only — the countdown elapsing, and host
    /// actions (start, skip). In any other phase this is a logged
    /// no-op.
    pub fn advance(&mut self) -> Outbound {
        match self.phase {
            Phase::Results => self.open_next_question(),
            Phase::Question => self.close_question(),
            phase => {
                debug!(room = %self.code, %phase, "advance called outside an active phase");
                Vec::new()
            }
        }
    }

    fn open_next_question(&mut self) -> Outbound {
        self.round.reset();
        let next = self.current_index.map_or(0, |i| i + 1);

        let Some(quiz) = self.quiz.as_ref() else {
            debug!(room = %self.code, "no quiz during advance");
            return Vec::new();
        };
        let total = quiz.len();
        if next >= total {
            return self.finish();
        }

        let question = &quiz[next];
        let event = ServerEvent::NewQuestion {
            question: question.text.clone(),
            options: question.options.clone(),
            question_index: next,
            total_questions: total,
        };

        self.current_index = Some(next);
        self.phase = Phase::Question;
        vec![(Recipient::Room, event)]
    }

    fn close_question(&mut self) -> Outbound {
        self.phase = Phase::Results;

        let mut out = vec![(
            Recipient::Room,
            ServerEvent::UpdateLeaderboard {
                leaderboard: self.leaderboard(),
            },
        )];

        let correct = self.current_index.and_then(|index| {
            self.quiz
                .as_ref()
                .and_then(|quiz| quiz.get(index))
                .map(|q| (index, q.correct_answer.clone()))
        });
        if let Some((index, correct_answer)) = correct {
            out.push((
                Recipient::Host,
                ServerEvent::QuestionOver {
                    correct_answer: correct_answer.clone(),
                    your_answer: None,
                },
            ));
            for p in &self.participants {
                let your_answer = self
                    .player_answers
                    .get(&p.conn)
                    .and_then(|answers| answers.get(index))
                    .cloned()
                    .flatten();
                out.push((
                    Recipient::Conn(p.conn),
                    ServerEvent::QuestionOver {
                        correct_answer: correct_answer.clone(),
                        your_answer,
                    },
                ));
            }
        }

        out
    }

    /// Aborts the remaining questions: final standings now.
    pub fn end_quiz(
        &mut self,
        conn: ConnectionId,
    ) -> Result<Outbound, RoomError> {
        self.require_host(conn)?;
        if !self.phase.is_active() {
            return Err(RoomError::InvalidPhase(self.phase));
        }
        Ok(self.finish())
    }

    /// Ends the current question early, exactly as if the timer
    /// expired.
    pub fn skip_question(
        &mut self,
        conn: ConnectionId,
    ) -> Result<Outbound, RoomError> {
        self.require_host(conn)?;
        if self.phase != Phase::Question {
            return Err(RoomError::InvalidPhase(self.phase));
        }
        Ok(self.advance())
    }

    fn finish(&mut self) -> Outbound {
        self.phase = Phase::Finished;

        let player_answers = self
            .roster
            .iter()
            .map(|(conn, name)| PlayerAnswers {
                id: *conn,
                name: name.clone(),
                answers: self
                    .player_answers
                    .get(conn)
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect();

        vec![(
            Recipient::Room,
            ServerEvent::GameOver {
                leaderboard: self.leaderboard(),
                quiz_data: self.quiz.clone().unwrap_or_default(),
                player_answers,
            },
        )]
    }

    /// Standings over everyone who ever joined, best score first;
    /// the stable sort keeps join order on ties.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut rows: Vec<LeaderboardEntry> = self
            .roster
            .iter()
            .map(|(conn, name)| LeaderboardEntry {
                name: name.clone(),
                score: self.scores.get(conn).copied().unwrap_or(0),
            })
            .collect();
        rows.sort_by(|a, b| b.score.cmp(&a.score));
        rows
    }

    // -----------------------------------------------------------------
    // Answer collection
    // -----------------------------------------------------------------

    /// Records a participant's answer for the live question.
    /// First submission wins; every precondition failure is an error
    /// the caller reports back to the submitter.
    pub fn submit_answer(
        &mut self,
        conn: ConnectionId,
        question_index: usize,
        answer: String,
    ) -> Result<Outbound, RoomError> {
        if self.phase != Phase::Question {
            return Err(RoomError::InvalidPhase(self.phase));
        }
        if !self.is_participant(conn) {
            return Err(RoomError::NotParticipant(conn));
        }
        let quiz = self.quiz.as_ref().ok_or(RoomError::NoQuizContent)?;
        let len = quiz.len();
        if self.current_index != Some(question_index) {
            return Err(RoomError::InvalidIndex {
                index: question_index,
                len,
            });
        }
        let question = quiz.get(question_index).ok_or(
            RoomError::InvalidIndex {
                index: question_index,
                len,
            },
        )?;
        if self.round.has_answered(conn) {
            return Err(RoomError::AlreadyAnswered);
        }

        let is_correct = answer == question.correct_answer;
        self.round.record(conn, &answer);
        if is_correct {
            *self.scores.entry(conn).or_insert(0) += 1;
        }
        let answers = self.player_answers.entry(conn).or_default();
        if answers.len() <= question_index {
            answers.resize(question_index + 1, None);
        }
        answers[question_index] = Some(answer);

        Ok(vec![
            (
                Recipient::Host,
                ServerEvent::HostUpdate {
                    answered_this_round: self.round.answered(),
                    answer_distribution: self.round.distribution().clone(),
                },
            ),
            (
                Recipient::Room,
                ServerEvent::UpdateAnswerProgress {
                    answered_count: self.round.answered_count(),
                    total_participants: self.participants.len(),
                },
            ),
        ])
    }

    // -----------------------------------------------------------------
    // Disconnects
    // -----------------------------------------------------------------

    /// Removes a departed participant from the live roster. Their
    /// scores, recorded answers, and roster entry survive; mid-question
    /// they also leave the answered set so progress denominators stay
    /// correct.
    pub fn remove_participant(&mut self, conn: ConnectionId) -> Outbound {
        if !self.is_participant(conn) {
            return Vec::new();
        }
        self.participants.retain(|p| p.conn != conn);

        let mut out = vec![(
            Recipient::Room,
            ServerEvent::UpdateParticipants {
                participants: self.participants_info(),
            },
        )];

        if self.phase == Phase::Question {
            self.round.forget(conn);
            out.push((
                Recipient::Room,
                ServerEvent::UpdateAnswerProgress {
                    answered_count: self.round.answered_count(),
                    total_participants: self.participants.len(),
                },
            ));
            out.push((
                Recipient::Host,
                ServerEvent::HostUpdate {
                    answered_this_round: self.round.answered(),
                    answer_distribution: self.round.distribution().clone(),
                },
            ));
        }

        out
    }
}
