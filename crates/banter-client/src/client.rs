//! Session facade: call lifecycle, notifications, and simulated sends.

use crate::config::CallConfig;
use crate::error::CallError;
use crate::lifecycle::TrackLifecycle;
use crate::media::AudioGraph;
use crate::publisher::{PacedPublisher, PacingConfig};
use crate::room::{RoomConnector, RoomEvent, RoomHandle};
use banter_types::clip::AudioClip;
use banter_types::control::{AGENT_PARTICIPANT, ServerEvent};
use banter_types::event::CallEvent;
use std::future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

/// How long to wait after the agent participant leaves before ending the
/// call, so trailing audio is not cut off.
const AGENT_DISCONNECT_GRACE: Duration = Duration::from_millis(500);

/// Capacity of the notification channel. Raw audio frames dominate the
/// volume when enabled; a subscriber that falls this far behind loses the
/// oldest notifications.
const EVENT_CHANNEL_DEPTH: usize = 256;

enum CallState {
    Disconnected,
    Connecting,
    Connected(ActiveCall),
}

struct ActiveCall {
    room: Arc<dyn RoomHandle>,
    lifecycle: Arc<TrackLifecycle>,
    /// Present only when the call was started with a simulated microphone.
    graph: Option<Arc<AudioGraph>>,
    sample_rate: u32,
    pacing: PacingConfig,
}

struct CallInner {
    connector: Arc<dyn RoomConnector>,
    state: Mutex<CallState>,
    events: broadcast::Sender<CallEvent>,
}

/// Entry point for voice calls with a remote agent.
///
/// One client runs at most one call at a time. Operations that change the
/// session (`start_call`, `stop_call`) serialize on an internal lock;
/// overlapping `send_audio_clip` calls on the same session are not
/// supported — callers issue one send at a time, and each send retires
/// whatever track the previous one left behind.
pub struct CallClient {
    inner: Arc<CallInner>,
}

impl CallClient {
    pub fn new(connector: Arc<dyn RoomConnector>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_DEPTH);
        Self {
            inner: Arc::new(CallInner {
                connector,
                state: Mutex::new(CallState::Disconnected),
                events,
            }),
        }
    }

    /// Subscribes to session notifications. Subscribe before starting the
    /// call to observe `call_started`.
    pub fn subscribe(&self) -> broadcast::Receiver<CallEvent> {
        self.inner.events.subscribe()
    }

    /// Connects to the agent infrastructure and brings the session up.
    ///
    /// With `simulate_microphone` set, no live capture is enabled and the
    /// synthetic audio graph is created instead, making
    /// [`send_audio_clip`](Self::send_audio_clip) available. Connection
    /// failures emit an `error` notification and leave the client
    /// disconnected.
    pub async fn start_call(&self, config: CallConfig) -> Result<(), CallError> {
        config.validate()?;
        let mut state = self.inner.state.lock().await;
        if !matches!(*state, CallState::Disconnected) {
            return Err(CallError::AlreadyStarted);
        }
        *state = CallState::Connecting;

        let (room, room_events) = match self.inner.connector.connect(&config).await {
            Ok(session) => session,
            Err(error) => {
                *state = CallState::Disconnected;
                self.inner.emit(CallEvent::Error {
                    message: error.to_string(),
                });
                return Err(error.into());
            }
        };

        // Live capture only when not simulating; the graph replaces it.
        if !config.simulate_microphone {
            if let Err(error) = room.set_microphone_enabled(true).await {
                *state = CallState::Disconnected;
                room.close().await;
                self.inner.emit(CallEvent::Error {
                    message: error.to_string(),
                });
                return Err(error.into());
            }
        }

        let graph = config
            .simulate_microphone
            .then(|| Arc::new(AudioGraph::new(config.sample_rate)));
        let lifecycle = Arc::new(TrackLifecycle::new(room.clone()));

        tokio::spawn(run_event_pump(
            self.inner.clone(),
            room_events,
            config.emit_raw_audio,
        ));

        *state = CallState::Connected(ActiveCall {
            room,
            lifecycle,
            graph,
            sample_rate: config.sample_rate,
            pacing: PacingConfig::default(),
        });
        drop(state);

        info!(simulated = config.simulate_microphone, "call started");
        self.inner.emit(CallEvent::CallStarted);
        Ok(())
    }

    /// Ends the call and releases every session resource. Safe to call at
    /// any time; a second call is a no-op.
    pub async fn stop_call(&self) {
        self.inner.shutdown().await;
    }

    /// Disables live microphone capture.
    pub async fn mute(&self) -> Result<(), CallError> {
        self.set_microphone(false).await
    }

    /// Re-enables live microphone capture.
    pub async fn unmute(&self) -> Result<(), CallError> {
        self.set_microphone(true).await
    }

    /// Resumes remote audio playback on platforms that defer output until
    /// the application allows it.
    pub async fn start_audio_playback(&self) -> Result<(), CallError> {
        self.connected_room().await?.start_audio().await?;
        Ok(())
    }

    /// Sends a buffered clip as if it were spoken into the microphone:
    /// published once, settled, then fed in real-time chunks.
    ///
    /// Requires a call started with `simulate_microphone`, and a clip at the
    /// session sample rate. Resolves once the clip has fully played out;
    /// one send at a time.
    pub async fn send_audio_clip(&self, clip: &AudioClip) -> Result<(), CallError> {
        let publisher = self.simulated_publisher(clip).await?;
        publisher.send_chunked(clip).await
    }

    /// Sends a buffered clip in one piece instead of paced chunks. See
    /// [`PacedPublisher::send_buffered`] for the trade-off.
    pub async fn send_audio_clip_buffered(&self, clip: &AudioClip) -> Result<(), CallError> {
        let publisher = self.simulated_publisher(clip).await?;
        publisher.send_buffered(clip).await
    }

    async fn set_microphone(&self, enabled: bool) -> Result<(), CallError> {
        self.connected_room()
            .await?
            .set_microphone_enabled(enabled)
            .await?;
        Ok(())
    }

    async fn connected_room(&self) -> Result<Arc<dyn RoomHandle>, CallError> {
        match &*self.inner.state.lock().await {
            CallState::Connected(call) => Ok(call.room.clone()),
            _ => Err(CallError::NotConnected),
        }
    }

    /// Checks every send precondition and assembles a publisher without
    /// holding the state lock for the duration of the send.
    async fn simulated_publisher(&self, clip: &AudioClip) -> Result<PacedPublisher, CallError> {
        let state = self.inner.state.lock().await;
        let CallState::Connected(call) = &*state else {
            return Err(CallError::NotConnected);
        };
        let Some(graph) = &call.graph else {
            return Err(CallError::SimulationDisabled);
        };
        if clip.sample_rate() != call.sample_rate {
            return Err(CallError::SampleRateMismatch {
                clip: clip.sample_rate(),
                session: call.sample_rate,
            });
        }
        Ok(PacedPublisher::new(
            call.room.clone(),
            graph.clone(),
            call.lifecycle.clone(),
            call.pacing.clone(),
        ))
    }
}

impl CallInner {
    fn emit(&self, event: CallEvent) {
        // An Err only means nobody is subscribed right now.
        let _ = self.events.send(event);
    }

    /// Tears the session down: the simulated track, the audio graph, and the
    /// transport, in that order. Idempotent; `call_ended` fires exactly once.
    async fn shutdown(&self) {
        let previous = {
            let mut state = self.state.lock().await;
            std::mem::replace(&mut *state, CallState::Disconnected)
        };
        let CallState::Connected(call) = previous else {
            return;
        };
        call.lifecycle.teardown().await;
        if let Some(graph) = &call.graph {
            graph.close();
        }
        call.room.close().await;
        info!("call ended");
        self.emit(CallEvent::CallEnded);
    }
}

/// Consumes room notifications and drives the outward-facing session
/// lifecycle until the transport goes away.
async fn run_event_pump(
    inner: Arc<CallInner>,
    mut events: mpsc::UnboundedReceiver<RoomEvent>,
    emit_raw_audio: bool,
) {
    let mut agent_ready = false;
    let mut end_at: Option<Instant> = None;
    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(event) => {
                        if !on_room_event(&inner, event, emit_raw_audio, &mut agent_ready, &mut end_at) {
                            break;
                        }
                    }
                    // The room closed its channel; the session is gone.
                    None => break,
                }
            }
            _ = async {
                match end_at {
                    Some(deadline) => time::sleep_until(deadline).await,
                    None => future::pending().await,
                }
            } => {
                debug!("agent-disconnect grace elapsed");
                break;
            }
        }
    }
    inner.shutdown().await;
    debug!("event pump finished");
}

/// Handles one room event; returns `false` when the session should end now.
fn on_room_event(
    inner: &CallInner,
    event: RoomEvent,
    emit_raw_audio: bool,
    agent_ready: &mut bool,
    end_at: &mut Option<Instant>,
) -> bool {
    match event {
        RoomEvent::TrackSubscribed { participant } => {
            if participant == AGENT_PARTICIPANT && !*agent_ready {
                *agent_ready = true;
                inner.emit(CallEvent::CallReady);
            }
            true
        }
        RoomEvent::Audio { frame, .. } => {
            if emit_raw_audio {
                inner.emit(CallEvent::Audio { frame });
            }
            true
        }
        RoomEvent::Data {
            participant,
            payload,
        } => {
            if participant == AGENT_PARTICIPANT {
                on_control_payload(inner, &payload);
            }
            true
        }
        RoomEvent::ParticipantDisconnected { identity } => {
            if identity == AGENT_PARTICIPANT && end_at.is_none() {
                // Let trailing audio finish before tearing the call down.
                debug!("agent participant left; ending call after grace period");
                *end_at = Some(Instant::now() + AGENT_DISCONNECT_GRACE);
            }
            true
        }
        RoomEvent::Disconnected { reason } => {
            info!(%reason, "transport disconnected");
            false
        }
    }
}

fn on_control_payload(inner: &CallInner, payload: &[u8]) {
    match serde_json::from_slice::<ServerEvent>(payload) {
        Ok(ServerEvent::Update { data }) => inner.emit(CallEvent::Update { data }),
        Ok(ServerEvent::Metadata { data }) => inner.emit(CallEvent::Metadata { data }),
        Ok(ServerEvent::AgentStartTalking) => inner.emit(CallEvent::AgentStartTalking),
        Ok(ServerEvent::AgentStopTalking) => inner.emit(CallEvent::AgentStopTalking),
        Ok(ServerEvent::NodeTransition { data }) => inner.emit(CallEvent::NodeTransition { data }),
        Ok(ServerEvent::Other) => {}
        Err(error) => {
            warn!(%error, "ignoring malformed control message");
        }
    }
}
