//! Async polling loop
//!
//! Drains the single-consumer hardware queue on a fixed interval and feeds
//! the engine. Profile lookup, config reloads and profile republishes all
//! happen here, between ticks, so the engine never sees a half-applied
//! change.

use crate::action::Action;
use crate::config::{AppConfig, ConfigWatcher};
use crate::device::{AttachOutcome, DetachOutcome, DeviceHandle, DeviceModel};
use crate::dispatch::Host;
use crate::engine::Engine;
use crate::input::gamepad::DeviceEvent;
use crate::input::RawFrame;
use crate::profile::defaults::default_profile;
use crate::profile::{CompiledProfile, Context, InputRef, ProfileStore};
use anyhow::{Context as _, Result};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

pub struct Runtime<H: Host> {
    engine: Engine<H>,
    store: ProfileStore,
    /// Latest frame per handle
    frames: BTreeMap<DeviceHandle, RawFrame>,
    poll_interval: Duration,
    started: Instant,
}

impl<H: Host> Runtime<H> {
    pub fn new(engine: Engine<H>, store: ProfileStore, poll_interval_ms: u64) -> Self {
        Self {
            engine,
            store,
            frames: BTreeMap::new(),
            poll_interval: Duration::from_millis(poll_interval_ms.max(1)),
            started: Instant::now(),
        }
    }

    pub fn engine(&self) -> &Engine<H> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine<H> {
        &mut self.engine
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Apply one hardware event; returns the number of resolved actions
    pub async fn handle_event(&mut self, event: DeviceEvent, now_ms: u64) -> usize {
        match event {
            DeviceEvent::Connected(raw) => {
                if let AttachOutcome::Activated(session) = self.engine.connect(raw) {
                    self.activate_for(session.model).await;
                }
                0
            }
            DeviceEvent::Disconnected(handle) => {
                self.frames.remove(&handle);
                if let DetachOutcome::Active {
                    promoted: Some(next), ..
                } = self.engine.disconnect(handle)
                {
                    self.activate_for(next.model).await;
                }
                0
            }
            DeviceEvent::Frame { handle, frame } => {
                let actions = self.engine.tick(handle, &frame, now_ms).actions;
                self.frames.insert(handle, frame);
                actions
            }
        }
    }

    /// Tick the active controller with its latest frame
    ///
    /// Keeps hold timers and cursor motion running while the hardware sends
    /// nothing new.
    pub fn tick(&mut self, now_ms: u64) -> usize {
        let Some(handle) = self.engine.active().map(|s| s.handle) else {
            return 0;
        };
        match self.frames.get(&handle) {
            Some(frame) => self.engine.tick(handle, frame, now_ms).actions,
            None => 0,
        }
    }

    /// Apply a reloaded config; returns whether the poll interval changed
    pub fn apply_config(&mut self, config: &AppConfig) -> bool {
        self.engine.apply_settings(config.engine_settings());
        let interval = Duration::from_millis(config.engine.poll_interval_ms.max(1));
        if interval == self.poll_interval {
            return false;
        }
        info!("Poll interval now {} ms", config.engine.poll_interval_ms);
        self.poll_interval = interval;
        true
    }

    /// Change one binding of the active profile and republish it
    pub async fn update_binding(&mut self, context: Context, input: InputRef, action: Option<Action>) -> Result<()> {
        let Some(model) = self.engine.active().map(|s| s.model.clone()) else {
            anyhow::bail!("No active controller");
        };
        let name = self.engine.tables().load().profile_name.clone();
        self.store
            .update_binding(&name, context, input, action)
            .await
            .with_context(|| format!("Failed to update profile '{}'", name))?;
        let compiled = self.store.compile(&name, model)?;
        self.engine.tables().publish(compiled);
        Ok(())
    }

    /// Assign a stored profile to the active controller's model and switch to it
    pub async fn switch_profile(&mut self, name: &str) -> Result<()> {
        let Some(model) = self.engine.active().map(|s| s.model.clone()) else {
            anyhow::bail!("No active controller");
        };
        let compiled = self.store.compile(name, model.clone())?;
        self.store.assign(&model.name, name).await?;
        self.engine.activate(compiled);
        Ok(())
    }

    /// Make a standby controller the active one and load its profile
    pub async fn switch_controller(&mut self, handle: DeviceHandle) -> Result<()> {
        let Some(session) = self.engine.switch_controller(handle) else {
            anyhow::bail!("Controller {} is not on standby", handle);
        };
        self.activate_for(session.model).await;
        Ok(())
    }

    async fn activate_for(&mut self, model: Arc<DeviceModel>) {
        let compiled = match self.store.find_profile(&model).await {
            Ok(profile) => CompiledProfile::compile(&profile, model),
            Err(e) => {
                warn!("⚠️ Profile lookup for {} failed: {}; using built-in defaults", model.name, e);
                CompiledProfile::compile(&default_profile(&model), model)
            }
        };
        self.engine.activate(compiled);
    }

    /// Run until `shutdown` resolves
    pub async fn run<F>(
        &mut self,
        mut events: mpsc::UnboundedReceiver<DeviceEvent>,
        mut watcher: Option<ConfigWatcher>,
        shutdown: F,
    ) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut interval = new_interval(self.poll_interval);
        let mut queue_open = true;
        info!("🚀 Polling every {} ms", self.poll_interval.as_millis());

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                _ = interval.tick() => {
                    if let Some(config) = watcher.as_mut().and_then(ConfigWatcher::try_next) {
                        if self.apply_config(&config) {
                            interval = new_interval(self.poll_interval);
                        }
                    }

                    let now = self.now_ms();
                    let active = self.engine.active().map(|s| s.handle);
                    let mut fresh = false;
                    while queue_open {
                        match events.try_recv() {
                            Ok(event) => {
                                if let DeviceEvent::Frame { handle, .. } = &event {
                                    fresh |= Some(*handle) == active;
                                }
                                self.handle_event(event, now).await;
                            }
                            Err(TryRecvError::Empty) => break,
                            Err(TryRecvError::Disconnected) => {
                                debug!("Device queue closed");
                                queue_open = false;
                            }
                        }
                    }
                    if !fresh {
                        self.tick(now);
                    }
                }
            }
        }
        Ok(())
    }
}

fn new_interval(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}
