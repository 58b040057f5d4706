use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dto::events::ServerEvent;

/// Per-game broadcast channels, partitioned by audience.
///
/// `events` carries presentation-state transitions and is consumed by host,
/// players, and TV alike; `tv` carries only answer-progress counters for the
/// shared display. Payload scoping happens at construction time; a channel
/// never sees data its audience is not permitted to know.
pub struct GameChannels {
    events: FanoutHub,
    tv: FanoutHub,
}

impl GameChannels {
    fn new(events_capacity: usize, tv_capacity: usize) -> Self {
        Self {
            events: FanoutHub::new(events_capacity),
            tv: FanoutHub::new(tv_capacity),
        }
    }

    /// The general game-events channel.
    pub fn events(&self) -> &FanoutHub {
        &self.events
    }

    /// The TV-only answer-progress channel.
    pub fn tv(&self) -> &FanoutHub {
        &self.tv
    }
}

/// Registry of per-game channel pairs, created lazily on first use.
pub struct FanoutState {
    channels: DashMap<Uuid, Arc<GameChannels>>,
    events_capacity: usize,
    tv_capacity: usize,
}

impl FanoutState {
    /// Build the registry with per-stream channel capacities.
    pub fn new(events_capacity: usize, tv_capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            events_capacity,
            tv_capacity,
        }
    }

    /// Channels for a game, creating them on first access.
    pub fn channels(&self, game_id: Uuid) -> Arc<GameChannels> {
        self.channels
            .entry(game_id)
            .or_insert_with(|| {
                Arc::new(GameChannels::new(self.events_capacity, self.tv_capacity))
            })
            .clone()
    }

    /// Drop a finished game's channels; existing subscribers see the streams
    /// close.
    pub fn remove(&self, game_id: Uuid) {
        self.channels.remove(&game_id);
    }
}

/// Simple broadcast hub wrapper used by the SSE services.
pub struct FanoutHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl FanoutHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    /// Publishing is fire-and-forget; disconnected subscribers recover via
    /// the catch-up read, not via retries here.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}
