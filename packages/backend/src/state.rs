use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::services::practice::PracticeService;

#[derive(Clone)]
pub struct AppState {
    practice: Arc<PracticeService>,
    started_at: Instant,
    started_at_system: SystemTime,
}

impl AppState {
    pub fn new(practice: PracticeService) -> Self {
        Self {
            practice: Arc::new(practice),
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
        }
    }

    pub fn practice(&self) -> Arc<PracticeService> {
        Arc::clone(&self.practice)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }
}
