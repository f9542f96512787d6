//! Speech queue status models.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The item currently being narrated.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct SpeechItemInfo {
    pub id: String,
    /// Source label, usually the agent name.
    pub label: String,
    pub text: String,
}

/// Snapshot of the speech queue.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
pub struct SpeechStatus {
    pub enabled: bool,
    pub playing: bool,
    pub paused: bool,
    /// Items waiting behind the current one.
    pub queue_length: usize,
    pub current: Option<SpeechItemInfo>,
}
