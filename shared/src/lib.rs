use serde::{Deserialize, Serialize};

mod timeperiod;
mod winner;

#[cfg(feature = "client")]
pub mod api;

pub use timeperiod::*;
pub use winner::*;
