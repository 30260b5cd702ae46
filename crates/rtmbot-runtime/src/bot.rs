//! The connection manager.
//!
//! A [`Bot`] owns the handler registry and the two collaborators it needs to
//! talk to the chat service: an [`ApiCaller`] for the `rtm.start` handshake
//! and a [`Connector`] for the event stream. [`Bot::start`] runs the whole
//! lifecycle:
//!
//! ```text
//! rtm.start ──▶ Connecting ──▶ Connected ──(team_migration_started)──▶ Reconnecting
//!                   ▲                │                                     │
//!                   └────────────────┼───────── reconnect_url ─────────────┘
//!                                    ▼
//!                 Closed ◀── Shutdown / ShutdownNow / transport error
//! ```
//!
//! Frames are processed one at a time on the calling task: decode, dispatch,
//! apply the replies, then read the next frame.

use std::future::{self, Future};
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;
use tokio::signal;
use tracing::{debug, error, info, trace, warn};

use rtmbot_core::foundation::event::{RECONNECT_URL, TEAM_MIGRATION_STARTED};
use rtmbot_core::{
    ApiCaller, BotContext, BoxedApiCaller, BoxedConnector, Connection, Connector, Dispatcher,
    Event, Frame, Handler, Identity, Params, PatternError, Session, TransportError, Verdict,
    apply,
};
use rtmbot_transport::{HttpApiCaller, WsConnector};

use crate::config::BotConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::plugin::Plugin;
use crate::state::{ConnectionState, Phase};

/// Why a connection's read loop stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopExit {
    /// A handler asked to shut down.
    Terminated(Verdict),
    /// The server announced a migration.
    Migrate,
}

/// A bot: handler registrations plus the means to connect.
pub struct Bot {
    api: BoxedApiCaller,
    connector: BoxedConnector,
    dispatcher: Dispatcher,
}

impl Bot {
    /// Creates a bot from explicit collaborators.
    pub fn new(api: BoxedApiCaller, connector: BoxedConnector) -> Self {
        Self {
            api,
            connector,
            dispatcher: Dispatcher::new(),
        }
    }

    /// Creates a bot that talks HTTP for API calls and WebSocket for events.
    pub fn from_config(config: &BotConfig) -> RuntimeResult<Self> {
        let api =
            HttpApiCaller::with_options(&config.token, &config.api_base_url, config.api_timeout())?;
        Ok(Self::new(Arc::new(api), Arc::new(WsConnector::new())))
    }

    /// The handler registry.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers `handler` for every event of type `event_type`.
    pub fn on_event<H>(&mut self, event_type: impl Into<String>, handler: H) -> &mut Self
    where
        H: Handler + 'static,
    {
        self.dispatcher.register(event_type, handler);
        self
    }

    /// Registers `handler` for events of type `event_type` and subtype `subtype`.
    pub fn on_event_with_subtype<H>(
        &mut self,
        event_type: impl Into<String>,
        subtype: impl Into<String>,
        handler: H,
    ) -> &mut Self
    where
        H: Handler + 'static,
    {
        self.dispatcher
            .register_with_subtype(event_type, subtype, handler);
        self
    }

    /// Registers `handler` for chat messages whose text matches `pattern`.
    pub fn listen<H>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, PatternError>
    where
        H: Handler + 'static,
    {
        self.dispatcher.listen(pattern, handler)?;
        Ok(self)
    }

    /// Same as [`listen`](Self::listen) with a precompiled regex.
    pub fn listen_regex<H>(&mut self, regex: Regex, handler: H) -> &mut Self
    where
        H: Handler + 'static,
    {
        self.dispatcher.listen_regex(regex, handler);
        self
    }

    /// Registers `handler` for chat messages addressed to the bot whose
    /// remaining text matches `pattern`.
    pub fn respond<H>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, PatternError>
    where
        H: Handler + 'static,
    {
        self.dispatcher.respond(pattern, handler)?;
        Ok(self)
    }

    /// Same as [`respond`](Self::respond) with a precompiled regex.
    pub fn respond_regex<H>(&mut self, regex: Regex, handler: H) -> &mut Self
    where
        H: Handler + 'static,
    {
        self.dispatcher.respond_regex(regex, handler);
        self
    }

    /// Loads `plugin`.
    ///
    /// A plugin whose [`can_load`](Plugin::can_load) returns `false` is
    /// skipped; a failing [`load`](Plugin::load) is returned as
    /// [`RuntimeError::Plugin`].
    pub fn use_plugin<P: Plugin>(&mut self, plugin: P) -> RuntimeResult<&mut Self> {
        let name = plugin.name().to_string();
        if !plugin.can_load() {
            warn!(plugin = %name, "Plugin cannot be loaded, skipping");
            return Ok(self);
        }

        if let Err(e) = plugin.load(self) {
            error!(plugin = %name, error = %e, "Failed to load plugin");
            return Err(RuntimeError::plugin(name, format!("{e:#}")));
        }

        info!(plugin = %name, "Plugin loaded");
        Ok(self)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Connects and processes events until a handler asks to shut down.
    ///
    /// Returns `Ok(())` after a `Shutdown` / `ShutdownNow` verdict. Every
    /// other way out is an error: a bad handshake, a failed dial, a read
    /// error, the peer closing the stream, or a migration announced before
    /// any `reconnect_url`.
    pub async fn start(&self) -> RuntimeResult<()> {
        let (url, identity) = self.handshake().await?;
        info!(name = %identity.name(), id = %identity.id(), "Authenticated");

        let session = Arc::new(Session::new(identity, Arc::clone(&self.api)));
        let mut state = ConnectionState::new(url);

        loop {
            state.transition(Phase::Connecting);
            let mut connection = match self.connector.connect(state.target()).await {
                Ok(connection) => connection,
                Err(e) => {
                    state.transition(Phase::Closed);
                    return Err(e.into());
                }
            };
            state.transition(Phase::Connected);
            info!(url = %state.target(), "Connected to RTM stream");

            let exit = self
                .run_connection(&session, connection.as_mut(), &mut state)
                .await;
            connection.close().await;

            match exit {
                Ok(LoopExit::Terminated(verdict)) => {
                    state.transition(Phase::Closed);
                    info!(?verdict, "Bot shut down by handler");
                    return Ok(());
                }
                Ok(LoopExit::Migrate) => {
                    state.transition(Phase::Reconnecting);
                    if !state.retarget() {
                        state.transition(Phase::Closed);
                        error!("Team migration started but no reconnect URL was received");
                        return Err(RuntimeError::NoReconnectUrl);
                    }
                    info!(url = %state.target(), "Team migration started, reconnecting");
                }
                Err(e) => {
                    state.transition(Phase::Closed);
                    warn!(error = %e, "Connection lost");
                    return Err(e);
                }
            }
        }
    }

    /// Runs [`start`](Self::start) until it finishes or Ctrl+C / SIGTERM is
    /// received.
    pub async fn run(&self) -> RuntimeResult<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Runs [`start`](Self::start) until it finishes or `shutdown` resolves.
    ///
    /// A `shutdown` that is already complete wins over the bot.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            () = shutdown => {
                info!("Shutdown requested, stopping bot");
                Ok(())
            }
            result = self.start() => result,
        }
    }

    /// Calls `rtm.start` and extracts the stream URL and the bot identity.
    async fn handshake(&self) -> RuntimeResult<(String, Identity)> {
        debug!("Calling rtm.start");
        let payload = self.api.call("rtm.start", Params::new()).await?;

        parse_handshake(&payload).ok_or_else(|| {
            let reason = payload
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("malformed response");
            error!(reason = %reason, "rtm.start failed");
            RuntimeError::handshake()
        })
    }

    /// Reads and processes frames until the connection should be left.
    async fn run_connection(
        &self,
        session: &Arc<Session>,
        connection: &mut dyn Connection,
        state: &mut ConnectionState,
    ) -> RuntimeResult<LoopExit> {
        loop {
            let text = match connection.next_frame().await {
                Some(Ok(Frame::Text(text))) => text,
                Some(Ok(Frame::Close(reason))) => {
                    return Err(TransportError::ConnectionClosed {
                        reason: reason.unwrap_or_else(|| "closed by peer".to_string()),
                    }
                    .into());
                }
                Some(Ok(frame)) => {
                    trace!(?frame, "Ignoring non-text frame");
                    continue;
                }
                Some(Err(e)) => return Err(e.into()),
                None => {
                    return Err(TransportError::ConnectionClosed {
                        reason: "stream ended".to_string(),
                    }
                    .into());
                }
            };

            let event: Event = match text.parse() {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, len = text.len(), "Skipping undecodable frame");
                    continue;
                }
            };

            if event.is(TEAM_MIGRATION_STARTED) {
                return Ok(LoopExit::Migrate);
            }
            if event.is(RECONNECT_URL)
                && let Some(url) = event.url()
            {
                state.remember_reconnect_url(url);
            }

            let ctx = Arc::new(BotContext::new(Arc::clone(session), event));
            let replies = self.dispatcher.dispatch(ctx).await;
            let verdict = apply(replies, &mut *connection).await;
            if verdict.should_terminate() {
                return Ok(LoopExit::Terminated(verdict));
            }
        }
    }
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
///
/// A signal that cannot be listened for never resolves, so the bot keeps
/// running instead of stopping at once.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Cannot listen for Ctrl+C");
                future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Cannot listen for SIGTERM");
                future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

/// Extracts `(url, identity)` from an `rtm.start` response.
fn parse_handshake(payload: &Value) -> Option<(String, Identity)> {
    if payload.get("ok").and_then(Value::as_bool) != Some(true) {
        return None;
    }
    let url = payload.get("url")?.as_str()?;
    let me = payload.get("self")?;
    let id = me.get("id")?.as_str()?;
    let name = me.get("name")?.as_str()?;
    Some((url.to_string(), Identity::new(name, id)))
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
