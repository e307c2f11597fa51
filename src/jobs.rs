pub mod archiver;
pub mod estimate;
pub mod maintenance;
pub mod orchestrator;
pub mod status;
