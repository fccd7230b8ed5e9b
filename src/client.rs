use std::sync::Arc;

use crate::api::{AiApi, AuthApi, ScheduleApi};
use crate::assistant::Assistant;
use crate::config::BackendConfig;
use crate::error::ClientError;
use crate::gateway::Gateway;
use crate::store::ScheduleStore;

/// Everything a front-end needs, wired to one shared [`Gateway`].
#[derive(Clone)]
pub struct ScheduleClient {
    gateway: Gateway,
    store: Arc<ScheduleStore>,
}

impl ScheduleClient {
    pub fn new(cfg: &BackendConfig) -> Result<Self, ClientError> {
        let gateway = Gateway::new(cfg)?;
        let store = Arc::new(ScheduleStore::new(ScheduleApi::new(gateway.clone())));
        Ok(Self { gateway, store })
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.gateway.clone())
    }

    pub fn schedules(&self) -> ScheduleApi {
        ScheduleApi::new(self.gateway.clone())
    }

    pub fn ai(&self) -> AiApi {
        AiApi::new(self.gateway.clone())
    }

    pub fn store(&self) -> Arc<ScheduleStore> {
        self.store.clone()
    }

    pub fn assistant(&self) -> Assistant {
        Assistant::new(self.ai(), self.store.clone())
    }
}
