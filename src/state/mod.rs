use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{config::AppConfig, dao::car_store::CarStore, error::ServiceError};

pub type SharedState = Arc<AppState>;

/// Central application state holding the configuration and the storage handle.
pub struct AppState {
    config: AppConfig,
    car_store: RwLock<Option<Arc<dyn CarStore>>>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            car_store: RwLock::new(None),
            degraded: degraded_tx,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current car store, if one is installed.
    pub async fn car_store(&self) -> Option<Arc<dyn CarStore>> {
        let guard = self.car_store.read().await;
        guard.as_ref().cloned()
    }

    /// Car store usable for a request, or [`ServiceError::Degraded`] while storage is down.
    pub async fn require_car_store(&self) -> Result<Arc<dyn CarStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.car_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new car store implementation and leave degraded mode.
    pub async fn install_car_store(&self, store: Arc<dyn CarStore>) {
        {
            let mut guard = self.car_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current car store and enter degraded mode.
    pub async fn clear_car_store(&self) {
        {
            let mut guard = self.car_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }
}
