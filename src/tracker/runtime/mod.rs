pub mod orchestrator;


pub use orchestrator::{AddressTracker, SyncReport, TrackerPhase};
