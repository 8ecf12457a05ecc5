use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::checkin::{SessionStore, Station, StationHandle};
use crate::config::Config;
use crate::services::{HttpValidIdsClient, LocalStorage};
use crate::utils::error::CheckInError;

pub struct AppState {
    pub config: Config,
    store: Arc<SessionStore<HttpValidIdsClient>>,
    stations: Mutex<HashMap<String, StationHandle>>,
}

impl AppState {
    pub fn new(config: Config, storage: LocalStorage, client: HttpValidIdsClient) -> Arc<Self> {
        Arc::new(Self {
            config,
            store: Arc::new(SessionStore::new(storage, client)),
            stations: Mutex::new(HashMap::new()),
        })
    }

    pub async fn from_config(config: Config) -> Result<Arc<Self>, CheckInError> {
        let storage = LocalStorage::connect(&config.database_url).await?;
        let client = HttpValidIdsClient::new(config.api_base_url.clone(), config.request_timeout)?;
        Ok(Self::new(config, storage, client))
    }

    /// Opens the check-in view for `event_id`, replacing any view already open for it.
    pub async fn open_station(
        &self,
        event_id: &str,
        token: Option<&str>,
    ) -> Result<StationHandle, CheckInError> {
        let mut stations = self.stations.lock().await;
        if let Some(previous) = stations.remove(event_id) {
            info!(event_id, "Re-opening check-in view");
            previous.close().await;
        }

        let handle = Station::open(
            Arc::clone(&self.store),
            event_id,
            token,
            self.config.display_window,
        )
        .await?;
        stations.insert(event_id.to_string(), handle.clone());
        Ok(handle)
    }

    pub async fn station(&self, event_id: &str) -> Option<StationHandle> {
        self.stations.lock().await.get(event_id).cloned()
    }

    pub async fn close_station(&self, event_id: &str) -> bool {
        let handle = self.stations.lock().await.remove(event_id);
        match handle {
            Some(handle) => {
                handle.close().await;
                true
            }
            None => false,
        }
    }

    pub async fn close_all(&self) {
        let handles: Vec<StationHandle> = self.stations.lock().await.drain().map(|(_, h)| h).collect();
        for handle in handles {
            handle.close().await;
        }
    }
}
