//! The connection event gateway: binds inbound client events to room
//! operations.
//!
//! The gateway is deliberately thin. It resolves room codes, enforces
//! the content-validation boundary (uploads and generated sets), and
//! spawns generation tasks so a slow model call never blocks a room's
//! event processing. Game rules live in the room state machine; their
//! rejections come back to the offender as targeted `error` events,
//! emitted by the room actor itself.

use std::sync::Arc;

use quizwire_protocol::{
    validate_quiz, ClientEvent, ConnectionId, QuizParams, RoomCode, ServerEvent,
};
use quizwire_room::{EventSender, RoomError, RoomHandle};

use crate::server::ServerState;

fn send(sender: &EventSender, event: ServerEvent) {
    // A closed channel means the client is gone; its disconnect is
    // already on the way through the reader loop.
    let _ = sender.send(event);
}

fn send_error(sender: &EventSender, message: impl Into<String>) {
    send(
        sender,
        ServerEvent::Error {
            message: message.into(),
        },
    );
}

/// Resolves a room code or reports the failure to the sender.
fn resolve_room(
    state: &Arc<ServerState>,
    sender: &EventSender,
    code: &RoomCode,
) -> Option<RoomHandle> {
    let handle = state.registry.get(code);
    if handle.is_none() {
        send_error(sender, RoomError::NotFound(code.clone()).to_string());
    }
    handle
}

/// Dispatches one decoded client event.
pub(crate) async fn handle_event(
    state: &Arc<ServerState>,
    conn: ConnectionId,
    sender: &EventSender,
    event: ClientEvent,
) {
    match event {
        ClientEvent::CreateRoom => {
            if state.registry.host_room(conn).is_some() {
                send_error(sender, "You are already hosting a room.");
                return;
            }
            let handle = state.registry.create_room(conn, sender.clone());
            send(
                sender,
                ServerEvent::RoomCreated {
                    room_code: handle.code().clone(),
                },
            );
        }

        ClientEvent::JoinRoom { room_code, name } => {
            let Some(handle) = state.registry.get(&room_code) else {
                send(
                    sender,
                    ServerEvent::JoinAck {
                        success: false,
                        room_data: None,
                        message: Some("Room not found.".to_string()),
                    },
                );
                return;
            };
            match handle.join(conn, name, sender.clone()).await {
                Ok(snapshot) => {
                    state.registry.bind_participant(conn, room_code);
                    send(
                        sender,
                        ServerEvent::JoinAck {
                            success: true,
                            room_data: Some(snapshot),
                            message: None,
                        },
                    );
                }
                Err(e) => {
                    send(
                        sender,
                        ServerEvent::JoinAck {
                            success: false,
                            room_data: None,
                            message: Some(e.to_string()),
                        },
                    );
                }
            }
        }

        ClientEvent::HostGenerateQuiz {
            room_code,
            topic,
            subtopics,
            difficulty,
            num_questions,
        } => {
            let params = QuizParams {
                topic,
                subtopics,
                difficulty,
                num_questions,
            };
            spawn_generation(state, conn, sender, &room_code, Some(params))
                .await;
        }

        ClientEvent::HostRegenerateQuiz { room_code } => {
            // Reuses the parameters stored by the first request.
            spawn_generation(state, conn, sender, &room_code, None).await;
        }

        ClientEvent::HostRegenerateSingleQuestion {
            room_code,
            question_index,
        } => {
            spawn_replacement(state, conn, sender, &room_code, question_index)
                .await;
        }

        ClientEvent::HostUploadedQuiz {
            room_code,
            quiz,
            timer_duration,
        } => {
            // The upload boundary is a mandatory validation point.
            if let Err(e) = validate_quiz(&quiz) {
                send_error(sender, format!("Invalid quiz upload: {e}"));
                return;
            }
            let Some(handle) = resolve_room(state, sender, &room_code) else {
                return;
            };
            if let Err(e) =
                handle.upload_quiz(conn, quiz, timer_duration).await
            {
                send_error(sender, e.to_string());
            }
        }

        ClientEvent::HostUpdateQuiz {
            room_code,
            updated_quiz,
        } => {
            if let Err(e) = validate_quiz(&updated_quiz) {
                send(sender, ServerEvent::QuizUpdateAck { success: false });
                send_error(sender, format!("Invalid quiz update: {e}"));
                return;
            }
            let Some(handle) = resolve_room(state, sender, &room_code) else {
                return;
            };
            if let Err(e) = handle.overwrite_quiz(conn, updated_quiz).await {
                send_error(sender, e.to_string());
            }
        }

        ClientEvent::StartQuiz {
            room_code,
            timer_duration,
        } => {
            let Some(handle) = resolve_room(state, sender, &room_code) else {
                return;
            };
            if let Err(e) = handle.start_quiz(conn, timer_duration).await {
                send_error(sender, e.to_string());
            }
        }

        ClientEvent::SubmitAnswer {
            room_code,
            question_index,
            answer,
        } => {
            let Some(handle) = resolve_room(state, sender, &room_code) else {
                return;
            };
            if let Err(e) =
                handle.submit_answer(conn, question_index, answer).await
            {
                send_error(sender, e.to_string());
            }
        }

        ClientEvent::HostSkipQuestion { room_code } => {
            let Some(handle) = resolve_room(state, sender, &room_code) else {
                return;
            };
            if let Err(e) = handle.skip_question(conn).await {
                send_error(sender, e.to_string());
            }
        }

        ClientEvent::HostEndQuiz { room_code } => {
            let Some(handle) = resolve_room(state, sender, &room_code) else {
                return;
            };
            if let Err(e) = handle.end_quiz(conn).await {
                send_error(sender, e.to_string());
            }
        }
    }
}

/// Authorizes a generation request with the room, then runs the model
/// call in its own task. Completion re-enters the room as a command,
/// so authorization and phase are re-checked when the result lands.
async fn spawn_generation(
    state: &Arc<ServerState>,
    conn: ConnectionId,
    sender: &EventSender,
    room_code: &RoomCode,
    params: Option<QuizParams>,
) {
    let Some(handle) = resolve_room(state, sender, room_code) else {
        return;
    };
    let params = match handle.prepare_generation(conn, params).await {
        Ok(params) => params,
        Err(e) => {
            send_error(sender, e.to_string());
            return;
        }
    };

    let generator = Arc::clone(&state.generator);
    tokio::spawn(async move {
        // Generated content passes the same structural gate as uploads
        // before it can reach the room.
        let result = match generator.generate(&params).await {
            Ok(questions) => validate_quiz(&questions)
                .map(|_| questions)
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        let _ = handle.generation_finished(result).await;
    });
}

/// Same shape as [`spawn_generation`], for one question in place.
async fn spawn_replacement(
    state: &Arc<ServerState>,
    conn: ConnectionId,
    sender: &EventSender,
    room_code: &RoomCode,
    index: usize,
) {
    let Some(handle) = resolve_room(state, sender, room_code) else {
        return;
    };
    // Single-question regeneration always reuses the stored params.
    let params = match handle.prepare_generation(conn, None).await {
        Ok(params) => params,
        Err(e) => {
            send_error(sender, e.to_string());
            return;
        }
    };

    let generator = Arc::clone(&state.generator);
    tokio::spawn(async move {
        let result = match generator.generate_replacement(&params, index).await
        {
            Ok(question) => {
                question.validate().map(|_| question).map_err(|e| e.to_string())
            }
            Err(e) => Err(e.to_string()),
        };
        let _ = handle.replacement_finished(index, result).await;
    });
}

/// Routes a transport-level disconnect into the room the connection
/// belonged to, if any.
pub(crate) async fn handle_disconnect(
    state: &Arc<ServerState>,
    conn: ConnectionId,
) {
    // A connection can host one room and participate in another;
    // both memberships end with the socket.
    if let Some(code) = state.registry.host_room(conn) {
        tracing::info!(%conn, room = %code, "host connection lost");
        if let Some(handle) = state.registry.get(&code) {
            let _ = handle.disconnect(conn).await;
        }
    }

    if let Some(code) = state.registry.unbind_participant(conn) {
        tracing::info!(%conn, room = %code, "participant connection lost");
        if let Some(handle) = state.registry.get(&code) {
            let _ = handle.disconnect(conn).await;
        }
    }
}
