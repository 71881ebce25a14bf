pub mod archive;
pub mod consts;
pub mod orchestrator;
pub mod refresher;
pub mod storage;
pub mod types;
