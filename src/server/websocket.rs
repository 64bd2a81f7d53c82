use crate::conversation::{ ConversationController, ConversationState };
use crate::models::chat::InputOrigin;
use crate::models::websocket::{ ClientMessage, ServerMessage };
use crate::server::SessionContext;
use crate::speech::{ RelaySpeechBridge, SpeechBridge, SpeechCommand, SpeechSignals };

use std::collections::HashMap;
use std::error::Error;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use tokio::io::{ AsyncRead, AsyncWrite };
use tokio::net::TcpListener;
use tokio::sync::{ mpsc, watch };
use tokio::task::JoinHandle;

use tokio_tungstenite::{ accept_hdr_async, WebSocketStream };
use tokio_tungstenite::tungstenite::handshake::server::{ ErrorResponse, Request, Response };
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::Message;

use lazy_static::lazy_static;
use governor::{ RateLimiter, Quota, state::{ InMemoryState, NotKeyed }, clock::DefaultClock };

use hmac::{ Hmac, Mac };
use sha2::Sha256;
use chrono::Utc;
use url::form_urlencoded;

use log::{ debug, error, info, warn };
use futures::{ SinkExt, StreamExt };
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Accepted clock skew for signed handshakes, in seconds.
const HANDSHAKE_WINDOW_SECS: i64 = 300;

lazy_static! {
    static ref CONNECTION_LIMITER: RateLimiter<NotKeyed, InMemoryState, DefaultClock> =
        RateLimiter::direct(
            Quota::per_second(NonZeroU32::new(10).unwrap_or(NonZeroU32::MIN))
        );
}

pub async fn start_ws_server(
    addr: &str,
    context: SessionContext,
    api_key: Option<String>
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    info!("WS server listening on: {}", addr);
    if api_key.as_deref().is_some_and(|k| !k.is_empty()) {
        info!("Signed handshakes required");
    }

    loop {
        let (stream, peer) = listener.accept().await?;

        if CONNECTION_LIMITER.check().is_err() {
            warn!("Global connection rate limit exceeded for {}. Dropping connection.", peer);
            continue;
        }

        info!("Incoming connection from: {}", peer);
        let context = context.clone();
        let required_api_key = api_key.clone();

        tokio::spawn(async move {
            if let Err(e) = process_connection(peer, stream, context, required_api_key).await {
                error!("Failed to process connection for {}: {}", peer, e);
            }
        });
    }
}

/// Checks the `ts`/`sig` query parameters of a handshake: `sig` must be the
/// hex HMAC-SHA256 of `ts` under `secret`, and `ts` must be within the window.
pub fn verify_handshake(query: &str, secret: &str, now: i64) -> Result<(), &'static str> {
    let params: HashMap<String, String> =
        form_urlencoded::parse(query.as_bytes()).into_owned().collect();

    let ts = params.get("ts").or_else(|| params.get("X-Api-Ts"));
    let sig = params.get("sig").or_else(|| params.get("X-Api-Sign"));
    let (Some(ts), Some(sig)) = (ts, sig) else {
        return Err("missing ts/sig");
    };

    let ts_i: i64 = ts.parse().map_err(|_| "bad timestamp")?;
    if (now - ts_i).abs() > HANDSHAKE_WINDOW_SECS {
        return Err("timestamp out of range");
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| "bad server key")?;
    mac.update(ts.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());
    if expected == *sig {
        Ok(())
    } else {
        Err("bad signature")
    }
}

fn unauthorized(reason: &str) -> ErrorResponse {
    let mut res = ErrorResponse::new(Some(reason.to_string()));
    *res.status_mut() = StatusCode::UNAUTHORIZED;
    res
}

async fn process_connection<S>(
    peer: SocketAddr,
    stream: S,
    context: SessionContext,
    required_api_key: Option<String>
) -> Result<(), Box<dyn Error + Send + Sync>>
    where S: AsyncRead + AsyncWrite + Unpin + Send + 'static
{
    let auth_callback = |req: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let secret = match &required_api_key {
            Some(k) if !k.is_empty() => k,
            _ => {
                return Ok(response);
            }
        };
        let query = req.uri().query().unwrap_or("");
        match verify_handshake(query, secret, Utc::now().timestamp()) {
            Ok(()) => Ok(response),
            Err(reason) => {
                warn!("Rejected handshake from {}: {}", peer, reason);
                Err(unauthorized(reason))
            }
        }
    };

    match accept_hdr_async(stream, auth_callback).await {
        Ok(ws) => {
            handle_connection(peer, ws, context).await;
            Ok(())
        }
        Err(e) => {
            error!("Handshake failed for {}: {}", peer, e);
            Err(Box::new(e) as _)
        }
    }
}

fn encode(message: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(message) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            None
        }
    }
}

fn push(outbound: &mpsc::UnboundedSender<Message>, message: &ServerMessage) -> bool {
    match encode(message) {
        Some(frame) => outbound.send(frame).is_ok(),
        None => true,
    }
}

fn state_message(conversation: &ConversationState, speech: &SpeechSignals) -> ServerMessage {
    ServerMessage::State {
        conversation: conversation.clone(),
        speech: speech.clone(),
        timestamp: Utc::now().timestamp(),
    }
}

/// Publishes a full state snapshot whenever the conversation or the speech
/// signals change.
fn spawn_state_publisher(
    mut conversation: watch::Receiver<ConversationState>,
    mut speech: watch::Receiver<SpeechSignals>,
    outbound: mpsc::UnboundedSender<Message>
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let message = state_message(
                &conversation.borrow_and_update(),
                &speech.borrow_and_update()
            );
            if !push(&outbound, &message) {
                break;
            }
            tokio::select! {
                changed = conversation.changed() => if changed.is_err() { break; },
                changed = speech.changed() => if changed.is_err() { break; },
            }
        }
    })
}

fn spawn_speech_forwarder(
    mut commands: mpsc::UnboundedReceiver<SpeechCommand>,
    outbound: mpsc::UnboundedSender<Message>
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(command) = commands.recv().await {
            if !push(&outbound, &ServerMessage::from(command)) {
                break;
            }
        }
    })
}

fn dispatch(controller: &ConversationController, bridge: &RelaySpeechBridge, message: ClientMessage) {
    match message {
        ClientMessage::Chat { content } => controller.spawn_submit(content, InputOrigin::Typed),
        ClientMessage::VoiceTranscript { text } => bridge.report_transcript(&text),
        ClientMessage::VoiceError { message } => bridge.report_error(&message),
        ClientMessage::SpeechState { is_speaking, engine_ready } => {
            if let Some(speaking) = is_speaking {
                bridge.report_speaking(speaking);
            }
            if let Some(ready) = engine_ready {
                bridge.set_engine_ready(ready);
            }
        }
        ClientMessage::StartVoice => {
            let c = controller.clone();
            controller.spawn(async move { c.start_voice_input().await });
        }
        ClientMessage::StopVoice => {
            let c = controller.clone();
            controller.spawn(async move { c.stop_voice_input().await });
        }
        ClientMessage::SetLanguage { language } => controller.set_language(&language),
        ClientMessage::ListModels => {
            let c = controller.clone();
            controller.spawn(async move { c.refresh_models().await });
        }
        ClientMessage::DownloadModel { model_id } => controller.spawn_download(model_id),
        ClientMessage::LoadModel { model_id } => controller.spawn_load(model_id),
        ClientMessage::ClearConversation => {
            let c = controller.clone();
            controller.spawn(async move { c.clear_conversation().await });
        }
        ClientMessage::StopSpeaking => {
            let c = controller.clone();
            controller.spawn(async move { c.stop_speaking().await });
        }
        ClientMessage::ClearSpeechError => controller.clear_speech_error(),
        ClientMessage::DailyTip => {
            let c = controller.clone();
            controller.spawn(async move { c.show_daily_tip().await });
        }
        ClientMessage::EmergencyContacts => {
            let c = controller.clone();
            controller.spawn(async move { c.show_emergency_contacts().await });
        }
    }
}

pub async fn handle_connection<S>(peer: SocketAddr, websocket: WebSocketStream<S>, context: SessionContext)
    where S: AsyncRead + AsyncWrite + Unpin + Send + 'static
{
    let session_id = Uuid::new_v4();
    info!("New WebSocket connection: {} (session {})", peer, session_id);

    let (mut tx, mut rx) = websocket.split();
    let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
    let (speech_tx, speech_rx) = mpsc::unbounded_channel::<SpeechCommand>();

    let bridge = Arc::new(RelaySpeechBridge::new(speech_tx, true, false));
    let controller = ConversationController::new(
        Arc::clone(&context.knowledge),
        context.model_session(),
        Arc::clone(&bridge) as Arc<dyn SpeechBridge>,
        Arc::clone(&context.prompts),
        &context.default_language
    );
    controller.spawn_speech_observer();

    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if let Err(e) = tx.send(frame).await {
                debug!("Stopped writing to {}: {}", peer, e);
                break;
            }
        }
        let _ = tx.close().await;
    });
    let publisher = spawn_state_publisher(
        controller.subscribe(),
        controller.speech_signals(),
        outbound.clone()
    );
    let forwarder = spawn_speech_forwarder(speech_rx, outbound.clone());

    let startup = controller.clone();
    let default_model = context.default_model.clone();
    controller.spawn(async move {
        startup.refresh_models().await;
        if let Some(model_id) = default_model {
            startup.load_model(&model_id).await;
        }
    });

    while let Some(msg) = rx.next().await {
        match msg {
            Ok(message) => {
                if message.len() > MAX_MESSAGE_SIZE {
                    warn!(
                        "Message from {} exceeds size limit ({} > {})",
                        peer,
                        message.len(),
                        MAX_MESSAGE_SIZE
                    );
                    push(&outbound, &(ServerMessage::Error {
                        message: "Message too large".to_string(),
                    }));
                    break;
                }

                match message {
                    Message::Text(text) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_message) => {
                                debug!("Received from {}: {:?}", peer, client_message);
                                dispatch(&controller, &bridge, client_message);
                            }
                            Err(e) => {
                                error!("Failed to parse message from {}: {}", peer, e);
                                let reply = ServerMessage::Error {
                                    message: format!("Failed to parse message: {}", e),
                                };
                                if !push(&outbound, &reply) {
                                    break;
                                }
                            }
                        }
                    }
                    Message::Close(_) => {
                        info!("Received close frame from {}", peer);
                        break;
                    }
                    Message::Ping(ping_data) => {
                        if outbound.send(Message::Pong(ping_data)).is_err() {
                            error!("Failed to send pong to {}", peer);
                            break;
                        }
                    }
                    Message::Pong(_) => {}
                    Message::Binary(_) => {
                        warn!("Ignoring binary message from {}", peer);
                    }
                    Message::Frame(_) => {}
                }
            }
            Err(e) => {
                match e {
                    | tokio_tungstenite::tungstenite::Error::ConnectionClosed
                    | tokio_tungstenite::tungstenite::Error::Protocol(_)
                    | tokio_tungstenite::tungstenite::Error::Utf8 => {
                        info!("WebSocket connection closed or protocol error for {}: {}", peer, e);
                    }
                    tokio_tungstenite::tungstenite::Error::Io(ref io_err) if
                        io_err.kind() == std::io::ErrorKind::ConnectionReset
                    => {
                        info!("WebSocket connection reset by peer {}", peer);
                    }
                    _ => {
                        error!("Error receiving message from {}: {}", peer, e);
                    }
                }
                break;
            }
        }
    }

    controller.shutdown();
    publisher.abort();
    forwarder.abort();
    drop(outbound);
    let _ = writer.await;
    info!("WebSocket connection closed for {} (session {})", peer, session_id);
}
