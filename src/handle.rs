//! Concurrent facade over the mixer engine.
//!
//! [`MixerHandle`] owns the engine behind a mutex and runs the ticker
//! thread that advances fades in real time. Callers on other threads have
//! two ways in:
//! - direct methods (`fade_to`, `set_volume`, ...) that lock the engine
//! - [`MixerHandle::queue`], which hands a [`MixerCommand`] to the ticker
//!   thread to apply right before its next update
//!
//! Handles without a running ticker can still be stepped manually through
//! [`MixerHandle::update`], which is how deterministic tests and the CLI
//! fade simulation drive the engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::config::MixerConfig;
use crate::dsp::FadeCurve;
use crate::error::{log_mixer_error, MixerError};
use crate::mixer::{BusDecl, BusKind, BusSnapshot, MixerEngine};
use crate::telemetry::{EventHub, EventSnapshot, MixerEvent, MixerEventKind};

/// Broadcast buffer for event subscribers.
const EVENT_BUFFER: usize = 128;

/// A request queued for the ticker thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MixerCommand {
    FadeTo {
        kind: BusKind,
        bus: String,
        level: f32,
        duration: f32,
        curve: FadeCurve,
    },
    SetVolume {
        kind: BusKind,
        bus: String,
        volume: f32,
    },
}

/// Thread-safe handle owning the engine, its event hub and the ticker.
pub struct MixerHandle {
    engine: Arc<Mutex<MixerEngine>>,
    hub: Arc<EventHub>,
    config: MixerConfig,
    command_tx: mpsc::Sender<MixerCommand>,
    command_rx: Arc<Mutex<mpsc::Receiver<MixerCommand>>>,
    running: Arc<AtomicBool>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl MixerHandle {
    /// Builds a handle (and its engine) from configuration. The ticker is
    /// not started yet.
    pub fn new(config: MixerConfig) -> Self {
        let hub = Arc::new(EventHub::new(
            EVENT_BUFFER,
            config.engine.event_history.max(1),
        ));
        let engine = Arc::new(Mutex::new(MixerEngine::new(&config, Arc::clone(&hub))));
        let (command_tx, command_rx) = mpsc::channel(config.engine.command_queue_capacity.max(1));

        Self {
            engine,
            hub,
            config,
            command_tx,
            command_rx: Arc::new(Mutex::new(command_rx)),
            running: Arc::new(AtomicBool::new(false)),
            ticker: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &MixerConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Subscribe to live mixer events.
    pub fn subscribe(&self) -> broadcast::Receiver<MixerEvent> {
        self.hub.subscribe()
    }

    /// Recent event history plus counters.
    pub fn events(&self) -> EventSnapshot {
        self.hub.snapshot()
    }

    /// Starts the ticker thread.
    ///
    /// # Errors
    /// [`MixerError::AlreadyRunning`] when the ticker is already up.
    pub fn start(&self) -> Result<(), MixerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            let err = MixerError::AlreadyRunning;
            log_mixer_error(&err, "start");
            return Err(err);
        }

        let engine = Arc::clone(&self.engine);
        let command_rx = Arc::clone(&self.command_rx);
        let running = Arc::clone(&self.running);
        let tick_hz = self.config.engine.tick_hz.max(1.0);
        let period = Duration::from_secs_f32(1.0 / tick_hz);

        let worker = std::thread::spawn(move || {
            let mut last = Instant::now();
            while running.load(Ordering::SeqCst) {
                std::thread::sleep(period);
                let now = Instant::now();
                let delta = now.saturating_duration_since(last).as_secs_f32();
                last = now;

                let mut engine = match engine.lock() {
                    Ok(guard) => guard,
                    Err(_) => {
                        warn!("[MixerHandle] Engine lock poisoned, ticker exiting");
                        return;
                    }
                };
                if let Ok(mut rx) = command_rx.lock() {
                    while let Ok(command) = rx.try_recv() {
                        apply_command(&mut engine, command);
                    }
                }
                engine.update(delta);
            }
        });

        match self.lock_ticker() {
            Ok(mut guard) => *guard = Some(worker),
            Err(err) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(err);
            }
        }

        self.emit(MixerEventKind::EngineStarted { tick_hz });
        info!("[MixerHandle] Ticker started at {} Hz", tick_hz);
        Ok(())
    }

    /// Stops the ticker thread and waits for it to finish.
    ///
    /// # Errors
    /// [`MixerError::NotRunning`] when there is nothing to stop.
    pub fn stop(&self) -> Result<(), MixerError> {
        if !self.running.swap(false, Ordering::SeqCst) {
            let err = MixerError::NotRunning;
            log_mixer_error(&err, "stop");
            return Err(err);
        }

        if let Some(worker) = self.lock_ticker()?.take() {
            if worker.join().is_err() {
                warn!("[MixerHandle] Ticker thread panicked during shutdown");
            }
        }

        self.emit(MixerEventKind::EngineStopped);
        info!("[MixerHandle] Ticker stopped");
        Ok(())
    }

    /// Queues a command for the ticker thread. Never blocks.
    ///
    /// # Errors
    /// [`MixerError::CommandQueueFull`] when the ticker is not draining
    /// fast enough.
    pub fn queue(&self, command: MixerCommand) -> Result<(), MixerError> {
        self.command_tx.try_send(command).map_err(|err| {
            let err = match err {
                TrySendError::Full(_) => MixerError::CommandQueueFull,
                TrySendError::Closed(_) => MixerError::CommandQueueClosed,
            };
            log_mixer_error(&err, "queue");
            err
        })
    }

    /// Queues a fade for the ticker thread.
    pub fn queue_fade(
        &self,
        kind: BusKind,
        bus: &str,
        level: f32,
        duration: f32,
        curve: FadeCurve,
    ) -> Result<(), MixerError> {
        self.queue(MixerCommand::FadeTo {
            kind,
            bus: bus.to_string(),
            level,
            duration,
            curve,
        })
    }

    /// Queues an immediate volume write for the ticker thread.
    pub fn queue_set_volume(
        &self,
        kind: BusKind,
        bus: &str,
        volume: f32,
    ) -> Result<(), MixerError> {
        self.queue(MixerCommand::SetVolume {
            kind,
            bus: bus.to_string(),
            volume,
        })
    }

    /// Fades a bus to `level`, deciding the direction from the current
    /// volume.
    pub fn fade_to(
        &self,
        kind: BusKind,
        bus: &str,
        level: f32,
        duration: f32,
        curve: FadeCurve,
    ) -> Result<(), MixerError> {
        self.lock_engine()?.fade_to(kind, bus, level, duration, curve)
    }

    /// Full adjust form with an explicit fade-out flag.
    pub fn adjust_volume(
        &self,
        kind: BusKind,
        bus: &str,
        level: f32,
        duration: f32,
        curve: FadeCurve,
        is_fade_out: bool,
    ) -> Result<(), MixerError> {
        self.lock_engine()?
            .adjust_volume(kind, bus, level, duration, curve, is_fade_out)
    }

    /// Sets a bus volume immediately.
    pub fn set_volume(&self, kind: BusKind, bus: &str, volume: f32) -> Result<(), MixerError> {
        self.lock_engine()?.set_volume(kind, bus, volume)
    }

    /// Current volume of a bus.
    pub fn volume(&self, kind: BusKind, bus: &str) -> Result<f32, MixerError> {
        self.lock_engine()?.volume(kind, bus)
    }

    /// Volume a bus is heading toward.
    pub fn target_volume(&self, kind: BusKind, bus: &str) -> Result<f32, MixerError> {
        self.lock_engine()?.target_volume(kind, bus)
    }

    /// Registers a bus at runtime.
    pub fn register(&self, kind: BusKind, decl: BusDecl) -> Result<(), MixerError> {
        self.lock_engine()?.register(kind, decl);
        Ok(())
    }

    /// Removes a bus at runtime.
    pub fn unregister(&self, kind: BusKind, bus: &str) -> Result<(), MixerError> {
        self.lock_engine()?.unregister(kind, bus)
    }

    /// Advances the engine manually. Useful when no ticker is running.
    pub fn update(&self, delta: f32) -> Result<(), MixerError> {
        self.lock_engine()?.update(delta);
        Ok(())
    }

    /// Reports every bus, sorted by name then kind.
    pub fn snapshot(&self) -> Result<Vec<BusSnapshot>, MixerError> {
        Ok(self.lock_engine()?.snapshot())
    }

    fn emit(&self, kind: MixerEventKind) {
        if let Ok(engine) = self.engine.lock() {
            engine.emit(kind, None);
        }
    }

    fn lock_engine(&self) -> Result<MutexGuard<'_, MixerEngine>, MixerError> {
        self.engine.lock().map_err(|_| {
            let err = MixerError::LockPoisoned {
                component: "mixer_engine".to_string(),
            };
            log_mixer_error(&err, "lock_engine");
            err
        })
    }

    fn lock_ticker(&self) -> Result<MutexGuard<'_, Option<JoinHandle<()>>>, MixerError> {
        self.ticker.lock().map_err(|_| {
            let err = MixerError::LockPoisoned {
                component: "ticker".to_string(),
            };
            log_mixer_error(&err, "lock_ticker");
            err
        })
    }
}

impl Default for MixerHandle {
    fn default() -> Self {
        Self::new(MixerConfig::default())
    }
}

fn apply_command(engine: &mut MixerEngine, command: MixerCommand) {
    let result = match command {
        MixerCommand::FadeTo {
            kind,
            bus,
            level,
            duration,
            curve,
        } => engine.fade_to(kind, &bus, level, duration, curve),
        MixerCommand::SetVolume { kind, bus, volume } => engine.set_volume(kind, &bus, volume),
    };

    if let Err(err) = result {
        log_mixer_error(&err, "apply_command");
        engine.warn(format!("Dropped queued command: {}", err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle_with_music() -> MixerHandle {
        let mut config = MixerConfig::default();
        config.classes = vec![BusDecl::named("Music")];
        MixerHandle::new(config)
    }

    #[test]
    fn test_queue_reports_backpressure() {
        let mut config = MixerConfig::default();
        config.classes = vec![BusDecl::named("Music")];
        config.engine.command_queue_capacity = 1;
        let handle = MixerHandle::new(config);

        let command = MixerCommand::SetVolume {
            kind: BusKind::SoundClass,
            bus: "Music".to_string(),
            volume: 0.5,
        };

        handle.queue(command.clone()).unwrap();
        let err = handle.queue(command).unwrap_err();
        assert_eq!(err, MixerError::CommandQueueFull);
    }

    #[test]
    fn test_stop_without_start_is_an_error() {
        let handle = handle_with_music();
        assert_eq!(handle.stop().unwrap_err(), MixerError::NotRunning);
        assert!(!handle.is_running());
    }

    #[test]
    fn test_manual_update_applies_fades_without_a_ticker() {
        let handle = handle_with_music();
        handle
            .fade_to(BusKind::SoundClass, "Music", 0.5, 1.0, FadeCurve::Linear)
            .unwrap();

        for _ in 0..10 {
            handle.update(0.1).unwrap();
        }

        let volume = handle.volume(BusKind::SoundClass, "Music").unwrap();
        assert!((volume - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_bad_queued_commands_surface_as_warnings() {
        let handle = handle_with_music();
        let mut rx = handle.subscribe();

        // Applied the same way the ticker would.
        let mut engine = handle.engine.lock().unwrap();
        apply_command(
            &mut engine,
            MixerCommand::FadeTo {
                kind: BusKind::SoundClass,
                bus: "Nope".to_string(),
                level: 0.0,
                duration: 1.0,
                curve: FadeCurve::Linear,
            },
        );
        drop(engine);

        let event = rx.try_recv().expect("warning should be published");
        assert!(matches!(event.kind, MixerEventKind::Warning));
        assert!(event.detail.unwrap().contains("Nope"));
    }
}
