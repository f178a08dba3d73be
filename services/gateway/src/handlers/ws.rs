use crate::models::ClientMessage;
use crate::state::AppState;
use axum::{
    extract::{
        State,
        ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use matchmaker::events::{CONNECTED, OutboundMessage, REGISTERED, RegisteredEvent};
use serde_json::json;
use types::ids::{ConnectionId, ParticipantId};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection = ConnectionId::new();
    let mut outbound = state.transport.open(connection);
    let (mut sink, mut stream) = socket.split();

    tracing::info!(connection_id = %connection, "onConnect");

    let mut writer = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let frame = match message.to_frame() {
                Ok(frame) => frame,
                Err(err) => {
                    tracing::error!(
                        connection_id = %connection,
                        error = %err,
                        "Failed to encode frame"
                    );
                    continue;
                }
            };
            if sink.send(Message::Text(Utf8Bytes::from(frame))).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    greet(&state, connection);

    let reader = async {
        while let Some(Ok(msg)) = stream.next().await {
            match msg {
                Message::Text(text) => handle_client_text(&state, connection, text.as_str()),
                Message::Close(_) => break,
                _ => {}
            }
        }
    };

    // Either side ending finishes the connection; the writer ends first when
    // the transport disconnects a lagging client.
    tokio::select! {
        _ = &mut writer => {}
        _ = reader => {}
    }

    disconnect(&state, connection);
    writer.abort();
}

/// Queue the `connected` greeting on a fresh connection
fn greet(state: &AppState, connection: ConnectionId) {
    if let Err(err) = state.transport.push(
        connection,
        OutboundMessage::new(CONNECTED, json!({ "connectionId": connection })),
    ) {
        tracing::warn!(connection_id = %connection, error = %err, "Failed to greet connection");
    }
}

/// Drop the connection's bindings and outbound queue.
///
/// Returns the participants that were still bound to it.
fn disconnect(state: &AppState, connection: ConnectionId) -> Vec<ParticipantId> {
    let released = state.registry.deregister(connection);
    state.transport.close(connection);

    tracing::info!(
        connection_id = %connection,
        released = released.len(),
        "onDisconnect"
    );
    released
}

fn handle_client_text(state: &AppState, connection: ConnectionId, text: &str) {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(err) => {
            tracing::debug!(connection_id = %connection, error = %err, "Ignoring client message");
            return;
        }
    };

    match message {
        ClientMessage::Register { participant_id } => {
            let Some(participant_id) = ParticipantId::try_new(participant_id) else {
                tracing::debug!(
                    connection_id = %connection,
                    "Ignoring register without participantId"
                );
                return;
            };

            state.registry.register(participant_id.clone(), connection);
            tracing::info!(
                connection_id = %connection,
                participant_id = %participant_id,
                "onRegister"
            );

            let ack = RegisteredEvent { participant_id };
            match serde_json::to_value(&ack) {
                Ok(payload) => {
                    if let Err(err) = state
                        .transport
                        .push(connection, OutboundMessage::new(REGISTERED, payload))
                    {
                        tracing::warn!(
                            connection_id = %connection,
                            error = %err,
                            "Failed to ack register"
                        );
                    }
                }
                Err(err) => {
                    tracing::error!(
                        connection_id = %connection,
                        error = %err,
                        "Failed to encode ack"
                    );
                }
            }
        }
    }
}
