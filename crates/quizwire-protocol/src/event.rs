//! The real-time event contract.
//!
//! Every message is an internally tagged JSON object: the `type` field
//! carries the kebab-case event name, the remaining fields are the
//! payload in camelCase — the shapes the web clients consume.
//!
//! [`ClientEvent`] is everything a socket may send the server;
//! [`ServerEvent`] is everything the server may send back, whether
//! room-wide or targeted at a single connection. Who receives what is
//! the room layer's business — the protocol only defines the shapes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{ConnectionId, Question, RoomCode};

// ---------------------------------------------------------------------------
// Payload fragments
// ---------------------------------------------------------------------------

/// One entry of the participant roster as sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub id: ConnectionId,
    pub name: String,
}

/// One row of a live or final leaderboard.
///
/// Rows are ordered by descending score; ties keep join order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u32,
}

/// A player's recorded answers, indexed by question; `None` marks a
/// question they never answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAnswers {
    pub id: ConnectionId,
    pub name: String,
    pub answers: Vec<Option<String>>,
}

/// Room state handed to a participant on a successful join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_code: RoomCode,
    pub participants: Vec<ParticipantInfo>,
}

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Events a client may send.
///
/// Host-only events are authorized by the room against the sending
/// connection, not by the protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Open a new room; the sender becomes its host.
    CreateRoom,

    /// Join an existing room under a display name.
    #[serde(rename_all = "camelCase")]
    JoinRoom { room_code: RoomCode, name: String },

    /// Ask the generation collaborator for a fresh question set.
    #[serde(rename_all = "camelCase")]
    HostGenerateQuiz {
        room_code: RoomCode,
        topic: String,
        subtopics: Vec<String>,
        difficulty: String,
        num_questions: u32,
    },

    /// Supply a pre-built question set (e.g. extracted from a
    /// document) and start the game with it.
    #[serde(rename_all = "camelCase")]
    HostUploadedQuiz {
        room_code: RoomCode,
        quiz: Vec<Question>,
        timer_duration: u32,
    },

    /// Re-run generation with the parameters stored from the first
    /// request.
    #[serde(rename_all = "camelCase")]
    HostRegenerateQuiz { room_code: RoomCode },

    /// Regenerate a single question in place during review.
    #[serde(rename_all = "camelCase")]
    HostRegenerateSingleQuestion {
        room_code: RoomCode,
        question_index: usize,
    },

    /// Replace the whole quiz with host-edited questions.
    #[serde(rename_all = "camelCase")]
    HostUpdateQuiz {
        room_code: RoomCode,
        updated_quiz: Vec<Question>,
    },

    /// Leave review and begin the timed question loop.
    #[serde(rename_all = "camelCase")]
    StartQuiz {
        room_code: RoomCode,
        timer_duration: u32,
    },

    /// Answer the current question. First submission wins.
    #[serde(rename_all = "camelCase")]
    SubmitAnswer {
        room_code: RoomCode,
        question_index: usize,
        answer: String,
    },

    /// End the current question immediately, as if the timer expired.
    #[serde(rename_all = "camelCase")]
    HostSkipQuestion { room_code: RoomCode },

    /// Abort the remaining questions and publish the final standings.
    #[serde(rename_all = "camelCase")]
    HostEndQuiz { room_code: RoomCode },
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Events the server may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Ack for `create-room` (targeted: host).
    #[serde(rename_all = "camelCase")]
    RoomCreated { room_code: RoomCode },

    /// Ack for `join-room` (targeted: joiner). On failure `room_data`
    /// is absent and `message` explains why.
    #[serde(rename_all = "camelCase")]
    JoinAck {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        room_data: Option<RoomSnapshot>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// The roster changed (room-wide).
    UpdateParticipants { participants: Vec<ParticipantInfo> },

    /// A generated or regenerated question set, ready for review
    /// (targeted: host).
    QuizReviewData { questions: Vec<Question> },

    /// One question was regenerated in place (targeted: host).
    #[serde(rename_all = "camelCase")]
    SingleQuestionUpdated {
        question_index: usize,
        new_question: Question,
    },

    /// Ack for `host-update-quiz` (targeted: host).
    QuizUpdateAck { success: bool },

    /// A new question went live (room-wide). Never carries the correct
    /// answer.
    #[serde(rename_all = "camelCase")]
    NewQuestion {
        question: String,
        options: Vec<String>,
        question_index: usize,
        total_questions: usize,
    },

    /// One second of the countdown elapsed (room-wide).
    #[serde(rename_all = "camelCase")]
    TimerTick { remaining_time: u32 },

    /// Standings after a round (room-wide).
    UpdateLeaderboard { leaderboard: Vec<LeaderboardEntry> },

    /// The round closed; reveals the correct answer plus the
    /// recipient's own submission (targeted per recipient; the host
    /// gets `your_answer: None`).
    #[serde(rename_all = "camelCase")]
    QuestionOver {
        correct_answer: String,
        your_answer: Option<String>,
    },

    /// Live answer counter (room-wide).
    #[serde(rename_all = "camelCase")]
    UpdateAnswerProgress {
        answered_count: usize,
        total_participants: usize,
    },

    /// Live per-round detail for the host dashboard (targeted: host).
    #[serde(rename_all = "camelCase")]
    HostUpdate {
        answered_this_round: Vec<ConnectionId>,
        answer_distribution: HashMap<String, u32>,
    },

    /// The session ended — final standings, the full quiz including
    /// correct answers, and everyone's recorded answers for review
    /// (room-wide).
    #[serde(rename_all = "camelCase")]
    GameOver {
        leaderboard: Vec<LeaderboardEntry>,
        quiz_data: Vec<Question>,
        player_answers: Vec<PlayerAnswers>,
    },

    /// The host's connection is gone and the room is being torn down
    /// (room-wide).
    HostDisconnected,

    /// Something went wrong with the recipient's request (targeted).
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_event_tag_is_kebab_case() {
        let event = ClientEvent::JoinRoom {
            room_code: RoomCode::new("AB12CD"),
            name: "Alice".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "join-room");
        assert_eq!(json["roomCode"], "AB12CD");
        assert_eq!(json["name"], "Alice");
    }

    #[test]
    fn test_create_room_is_bare_tag() {
        let json = serde_json::to_value(ClientEvent::CreateRoom).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "create-room" }));
    }

    #[test]
    fn test_generate_quiz_payload_fields_are_camel_case() {
        let event = ClientEvent::HostGenerateQuiz {
            room_code: RoomCode::new("AB12CD"),
            topic: "Rome".into(),
            subtopics: vec!["emperors".into()],
            difficulty: "Hard".into(),
            num_questions: 10,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "host-generate-quiz");
        assert_eq!(json["numQuestions"], 10);
        assert_eq!(json["subtopics"][0], "emperors");
    }

    #[test]
    fn test_submit_answer_decodes_from_wire_shape() {
        let json = r#"{
            "type": "submit-answer",
            "roomCode": "AB12CD",
            "questionIndex": 2,
            "answer": "Paris"
        }"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            ClientEvent::SubmitAnswer {
                room_code: RoomCode::new("AB12CD"),
                question_index: 2,
                answer: "Paris".into(),
            }
        );
    }

    #[test]
    fn test_unknown_event_tag_fails_to_decode() {
        let json = r#"{ "type": "fly-to-moon" }"#;
        let result: Result<ClientEvent, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_question_never_carries_correct_answer() {
        let event = ServerEvent::NewQuestion {
            question: "2+2?".into(),
            options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
            question_index: 0,
            total_questions: 1,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "new-question");
        assert_eq!(json["totalQuestions"], 1);
        assert!(json.get("correctAnswer").is_none());
    }

    #[test]
    fn test_join_ack_failure_omits_room_data() {
        let event = ServerEvent::JoinAck {
            success: false,
            room_data: None,
            message: Some("Room not found.".into()),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Room not found.");
        assert!(json.get("roomData").is_none());
    }

    #[test]
    fn test_join_ack_success_carries_room_snapshot() {
        let event = ServerEvent::JoinAck {
            success: true,
            room_data: Some(RoomSnapshot {
                room_code: RoomCode::new("AB12CD"),
                participants: vec![ParticipantInfo {
                    id: ConnectionId(3),
                    name: "Alice".into(),
                }],
            }),
            message: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["roomData"]["roomCode"], "AB12CD");
        assert_eq!(json["roomData"]["participants"][0]["name"], "Alice");
    }

    #[test]
    fn test_question_over_host_shape() {
        let event = ServerEvent::QuestionOver {
            correct_answer: "4".into(),
            your_answer: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "question-over");
        assert_eq!(json["correctAnswer"], "4");
        assert!(json["yourAnswer"].is_null());
    }

    #[test]
    fn test_timer_tick_round_trip() {
        let event = ServerEvent::TimerTick { remaining_time: 7 };
        let bytes = serde_json::to_vec(&event).unwrap();
        let decoded: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(event, decoded);
    }

    #[test]
    fn test_host_update_shape() {
        let mut distribution = HashMap::new();
        distribution.insert("4".to_string(), 2);
        let event = ServerEvent::HostUpdate {
            answered_this_round: vec![ConnectionId(2), ConnectionId(5)],
            answer_distribution: distribution,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "host-update");
        assert_eq!(json["answeredThisRound"], serde_json::json!([2, 5]));
        assert_eq!(json["answerDistribution"]["4"], 2);
    }

    #[test]
    fn test_game_over_round_trip() {
        let event = ServerEvent::GameOver {
            leaderboard: vec![LeaderboardEntry {
                name: "Alice".into(),
                score: 1,
            }],
            quiz_data: vec![],
            player_answers: vec![PlayerAnswers {
                id: ConnectionId(2),
                name: "Alice".into(),
                answers: vec![Some("4".into()), None],
            }],
        };
        let bytes = serde_json::to_vec(&event).unwrap();
        let decoded: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(event, decoded);
    }

    #[test]
    fn test_host_disconnected_is_bare_tag() {
        let json = serde_json::to_value(ServerEvent::HostDisconnected).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "host-disconnected" }));
    }
}
