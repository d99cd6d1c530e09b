// Command types - Controller → clock thread

use crate::transport::state::StopReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCommand {
    /// End the run as soon as the loop observes it
    Stop(StopReason),
}
