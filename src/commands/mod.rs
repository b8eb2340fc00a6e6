/// Each command returns a result struct instead of printing; main.rs renders
/// it as human text or JSON.
mod check;
mod launch;

pub use check::*;
pub use launch::*;
