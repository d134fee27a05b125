// Batch image loading through the host engine

use super::{AssetError, ImageDescriptor};
use crate::engine::host::{HostEngine, LoadSignal};
use image::RgbaImage;
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot::error::TryRecvError;
use tokio_util::sync::CancellationToken;

/// Result of a joined batch load
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Keys whose pixels were captured
    pub loaded: Vec<String>,
    /// Keys that loaded but cannot be derived from
    pub faults: Vec<(String, AssetError)>,
}

struct PendingLoad {
    key: String,
    signal: LoadSignal,
    captured: Option<Result<Arc<RgbaImage>, AssetError>>,
}

enum Wait {
    Joined,
    TimedOut,
    Cancelled,
}

/// Fans a batch of descriptors out to the host engine and joins on completion
///
/// Pixels of every completed load are captured into an internal store keyed
/// by load key, where the derivation pass picks them up.
#[derive(Debug, Default)]
pub struct AssetLoader {
    raw: HashMap<String, Arc<RgbaImage>>,
}

impl AssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every image of every descriptor
    ///
    /// All requests are issued before any is awaited. The batch fails with
    /// [`AssetError::StalledLoad`] if `timeout` elapses first, or
    /// [`AssetError::Cancelled`] if `cancel` fires.
    pub async fn load_all<E: HostEngine>(
        &mut self,
        engine: &mut E,
        descriptors: &[ImageDescriptor],
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<LoadOutcome, AssetError> {
        let mut pending: Vec<PendingLoad> = descriptors
            .iter()
            .flat_map(|descriptor| descriptor.load_requests())
            .map(|(key, url)| PendingLoad {
                signal: engine.load_image(&key, url),
                key,
                captured: None,
            })
            .collect();

        info!(
            "Loading {} images ({} requests)",
            descriptors.len(),
            pending.len()
        );

        let wait = {
            let engine = &*engine;
            let join = Self::join(&mut pending, engine);
            match timeout {
                Some(limit) => tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Wait::Cancelled,
                    joined = tokio::time::timeout(limit, join) => match joined {
                        Ok(()) => Wait::Joined,
                        Err(_) => Wait::TimedOut,
                    },
                },
                None => tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Wait::Cancelled,
                    _ = join => Wait::Joined,
                },
            }
        };

        match wait {
            Wait::Joined => {}
            Wait::Cancelled => {
                warn!("Batch load cancelled");
                return Err(AssetError::Cancelled);
            }
            Wait::TimedOut => {
                let stalled: Vec<String> = pending
                    .iter_mut()
                    .filter_map(|load| {
                        let unsignalled = load.captured.is_none()
                            && matches!(load.signal.try_recv(), Err(TryRecvError::Empty));
                        unsignalled.then(|| load.key.clone())
                    })
                    .collect();
                let timeout_ms = timeout.map_or(0, |limit| limit.as_millis() as u64);
                warn!(
                    "Batch load stalled after {}ms waiting on {:?}",
                    timeout_ms, stalled
                );
                return Err(AssetError::StalledLoad {
                    pending: stalled,
                    timeout_ms,
                });
            }
        }

        let mut outcome = LoadOutcome::default();
        for load in pending {
            let captured = load
                .captured
                .unwrap_or_else(|| Err(AssetError::LoadFailed(load.key.clone())));
            match captured {
                Ok(pixels) => {
                    self.raw.insert(load.key.clone(), pixels);
                    outcome.loaded.push(load.key);
                }
                Err(fault) => {
                    warn!("Skipping {}: {}", load.key, fault);
                    outcome.faults.push((load.key, fault));
                }
            }
        }

        Ok(outcome)
    }

    /// Await each signal in turn, capturing pixels as each one settles
    async fn join<E: HostEngine>(pending: &mut [PendingLoad], engine: &E) {
        for load in pending.iter_mut() {
            let captured = match (&mut load.signal).await {
                Ok(()) => Self::capture(engine, &load.key),
                Err(_) => Err(AssetError::LoadFailed(load.key.clone())),
            };
            load.captured = Some(captured);
        }
    }

    fn capture<E: HostEngine>(engine: &E, key: &str) -> Result<Arc<RgbaImage>, AssetError> {
        let source = engine
            .loaded_image(key)
            .ok_or_else(|| AssetError::LoadFailed(key.to_string()))?;
        source
            .as_bitmap()
            .cloned()
            .ok_or_else(|| AssetError::UnsupportedSource {
                key: key.to_string(),
                kind: source.kind().to_string(),
            })
    }

    /// Captured pixels for a load key
    pub fn raw(&self, key: &str) -> Option<&Arc<RgbaImage>> {
        self.raw.get(key)
    }

    pub fn raw_count(&self) -> usize {
        self.raw.len()
    }

    pub fn remove(&mut self, key: &str) {
        self.raw.remove(key);
    }

    /// Drop every captured image
    pub fn clear(&mut self) {
        self.raw.clear();
    }
}
