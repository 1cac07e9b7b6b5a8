use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::identity::Identity;
use crate::extractors::current_user::CurrentUser;
use crate::services::match_flow::MatchFlowService;
use crate::services::presence::ServerPush;
use crate::state::app_state::AppState;
use crate::ws::protocol::{ClientMsg, ServerMsg, WsErrorCode, PROTOCOL_VERSION};
use crate::AppError;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

/// Upgrade an authenticated request to a websocket session. The JWT has
/// already been validated by the JwtExtract middleware on this scope; an
/// invalid credential never reaches this point.
pub async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    current_user: CurrentUser,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let conn_id = Uuid::new_v4();
    let session = WsSession::new(conn_id, current_user.identity(), app_state);
    ws::start(session, &req, stream)
}

pub struct WsSession {
    conn_id: Uuid,
    identity: Identity,
    app_state: web::Data<AppState>,

    last_heartbeat: Instant,
    heartbeat_handle: Option<actix::SpawnHandle>,

    hello_done: bool,
}

impl WsSession {
    fn new(conn_id: Uuid, identity: Identity, app_state: web::Data<AppState>) -> Self {
        Self {
            conn_id,
            identity,
            app_state,
            last_heartbeat: Instant::now(),
            heartbeat_handle: None,
            hello_done: false,
        }
    }

    fn send_json(ctx: &mut ws::WebsocketContext<Self>, msg: &ServerMsg) {
        match serde_json::to_string(msg) {
            Ok(payload) => ctx.text(payload),
            Err(err) => warn!(error = %err, "[WS SESSION] failed to serialize outbound message"),
        }
    }

    fn send_error_and_close(
        &self,
        ctx: &mut ws::WebsocketContext<Self>,
        code: WsErrorCode,
        message: impl Into<String>,
    ) {
        let msg = ServerMsg::Error {
            code,
            message: message.into(),
        };
        Self::send_json(ctx, &msg);
        ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
        ctx.stop();
    }

    fn start_heartbeat(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let handle = ctx.run_interval(HEARTBEAT_INTERVAL, |actor, ctx| {
            if Instant::now().duration_since(actor.last_heartbeat) > CLIENT_TIMEOUT {
                warn!(
                    conn_id = %actor.conn_id,
                    sub = %actor.identity.sub,
                    "[WS SESSION] heartbeat timed out"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
                return;
            }
            ctx.ping(b"keepalive");
        });
        self.heartbeat_handle = Some(handle);
    }

    /// Run one client command. `ctx.wait` keeps this connection's
    /// commands strictly ordered: the next frame is not processed until
    /// the current command has entered (and left) the session's
    /// serialization queue.
    fn dispatch(&mut self, cmd: ClientMsg, ctx: &mut ws::WebsocketContext<Self>) {
        let state = self.app_state.clone();
        let identity = self.identity.clone();
        ctx.wait(
            async move { run_command(state, identity, cmd).await }
                .into_actor(self)
                .map(|res, _actor, ctx| match res {
                    Ok(Some(reply)) => Self::send_json(ctx, &reply),
                    Ok(None) => {}
                    Err(err) => Self::send_json(ctx, &ServerMsg::error_of(&err)),
                }),
        );
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(
            conn_id = %self.conn_id,
            sub = %self.identity.sub,
            "[WS SESSION] started"
        );

        let recipient = ctx.address().recipient::<ServerPush>();
        let came_online =
            self.app_state
                .presence
                .register(self.identity.clone(), self.conn_id, recipient);

        // Reconnection sync: replay the active session, if any, to this
        // connection only.
        let state = self.app_state.clone();
        let sub = self.identity.sub.clone();
        ctx.spawn(
            async move { MatchFlowService.connected(&state, &sub, came_online).await }
                .into_actor(self)
                .map(|snapshot, _actor, ctx| {
                    if let Some(snapshot) = snapshot {
                        Self::send_json(ctx, &ServerMsg::SessionResume { session: snapshot });
                    }
                }),
        );

        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let Some((sub, went_offline)) = self.app_state.presence.unregister(self.conn_id) {
            if went_offline {
                let state = self.app_state.clone();
                actix::spawn(async move {
                    MatchFlowService.disconnected(&state, &sub).await;
                });
            }
        }
        info!(
            conn_id = %self.conn_id,
            sub = %self.identity.sub,
            "[WS SESSION] stopped"
        );
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();

                let parsed: Result<ClientMsg, _> = serde_json::from_str(&text);
                let Ok(cmd) = parsed else {
                    self.send_error_and_close(ctx, WsErrorCode::BadRequest, "Malformed JSON");
                    return;
                };

                match cmd {
                    ClientMsg::Hello { protocol } => {
                        if protocol != PROTOCOL_VERSION {
                            self.send_error_and_close(
                                ctx,
                                WsErrorCode::BadProtocol,
                                "Unsupported protocol version",
                            );
                            return;
                        }
                        self.hello_done = true;
                        Self::send_json(
                            ctx,
                            &ServerMsg::HelloAck {
                                protocol: PROTOCOL_VERSION,
                                sub: self.identity.sub.clone(),
                            },
                        );
                    }
                    other => {
                        if !self.hello_done {
                            self.send_error_and_close(
                                ctx,
                                WsErrorCode::BadRequest,
                                "Must send hello first",
                            );
                            return;
                        }
                        self.dispatch(other, ctx);
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                self.last_heartbeat = Instant::now();
                self.send_error_and_close(ctx, WsErrorCode::BadRequest, "Binary not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Nop) => {
                self.last_heartbeat = Instant::now();
            }
            Err(err) => {
                warn!(
                    conn_id = %self.conn_id,
                    sub = %self.identity.sub,
                    error = %err,
                    "[WS SESSION] protocol error"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                ctx.stop();
            }
        }
    }
}

impl Handler<ServerPush> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: ServerPush, ctx: &mut Self::Context) -> Self::Result {
        Self::send_json(ctx, &msg.0);
    }
}

async fn run_command(
    state: web::Data<AppState>,
    identity: Identity,
    cmd: ClientMsg,
) -> Result<Option<ServerMsg>, AppError> {
    let flow = MatchFlowService;
    match cmd {
        // Handled inline by the stream handler.
        ClientMsg::Hello { .. } => Ok(None),

        ClientMsg::RequestSubmit { mode, target } => {
            let outcome = state.pairing.submit(identity, mode, target);
            Ok(Some(ServerMsg::RequestSent {
                request_id: outcome.request_id,
                status: outcome.status,
            }))
        }
        ClientMsg::RequestCancel { request_id } => {
            state.pairing.cancel(request_id, &identity.sub)?;
            Ok(Some(ServerMsg::Ack {
                message: "request_cancelled",
            }))
        }
        ClientMsg::RequestAccept {
            request_id,
            time_control,
        } => {
            let time_control = time_control.unwrap_or(state.match_config.default_time_control);
            let (_request, entry) = state.pairing.accept(request_id, &identity, time_control)?;
            // Both sides, the acceptor included, learn about the session
            // through the same session_started broadcast.
            flow.launch(&state, &entry).await;
            Ok(None)
        }
        ClientMsg::RequestDecline { request_id } => {
            state.pairing.decline(request_id, &identity)?;
            Ok(Some(ServerMsg::Ack {
                message: "request_declined",
            }))
        }

        ClientMsg::MoveSubmit {
            session_id,
            from,
            to,
            promotion,
            new_position_token,
        } => {
            flow.submit_move(
                &state,
                session_id,
                &identity.sub,
                &from,
                &to,
                promotion.as_deref(),
                new_position_token,
            )
            .await?;
            Ok(None)
        }
        ClientMsg::Resign { session_id } => {
            flow.resign(&state, session_id, &identity.sub).await?;
            Ok(None)
        }
        ClientMsg::OfferDraw { session_id } => {
            flow.offer_draw(&state, session_id, &identity.sub).await?;
            Ok(Some(ServerMsg::Ack {
                message: "draw_offered",
            }))
        }
        ClientMsg::AcceptDraw { session_id } => {
            flow.accept_draw(&state, session_id, &identity.sub).await?;
            Ok(None)
        }
        ClientMsg::ReportTerminal { session_id, kind } => {
            flow.report_terminal(&state, session_id, &identity.sub, kind)
                .await?;
            Ok(None)
        }
    }
}
