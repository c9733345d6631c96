pub mod alarm_repo;
pub mod observation_log;

pub use alarm_repo::AlarmRepo;
pub use observation_log::{JsonlObservationLog, MemoryObservationLog, ObservationLog};
