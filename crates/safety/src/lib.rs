//! Driver warning state machines
//!
//! Three independent systems, each a pure function of its own persistent
//! counters and the current frame's inputs:
//! - **FCWS**: forward collision warning, driven by the closest in-path
//!   detection's distance against two thresholds
//! - **LDWS**: lane departure warning, driven by the signed lane offset
//! - **LKAS**: lane keeping assist, a continuous steering-angle advisory
//!
//! The only coupling between them is that all three read the same lane
//! offset, computed once per frame. All systems fail open: missing data
//! always resolves to the safe state, never to a phantom warning.

pub mod fcws;
pub mod ldws;
pub mod lkas;

pub use fcws::{Fcws, FcwsState, RiskyDetection};
pub use ldws::{Ldws, LdwsState};
pub use lkas::{Lkas, LkasStatus};
