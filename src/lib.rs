// Core of the weekly tracker: data model, time arithmetic, selectors,
// scoring and the reducer, plus the storage and HTTP layers around them.
pub mod config;
pub mod error;
pub mod insights; // Dashboard summary and recommendations
pub mod logging;
pub mod models; // Data structures (TimeBlock, Activity, Settings, ScheduleState)
pub mod reducer; // State mutations
pub mod routes_schedule; // HTTP handlers that change the schedule
pub mod routes_stats; // HTTP handlers for derived figures
pub mod routes_tasks; // HTTP handlers for the daily to-do list
pub mod scoring; // Adherence / completion / productivity
pub mod selectors; // Read-only aggregate queries
pub mod store; // Storage backends and the persisted store
pub mod tasks; // Daily to-do list grouped by date
pub mod time; // "HH:MM" parsing, weekly ranges, active-window clipping

pub use error::{AppError, AppResult};
pub use models::ScheduleState;
pub use reducer::{Action, reduce};
pub use store::{
    Document, FileStorage, MemoryStorage, Persistence, ScheduleStore, StorageBackend, Store, TaskStore,
};
