//! Audible notification at the end of a pipeline run.

use std::io::Write;
use std::time::Duration;

use crate::command::ExternalCommand;

const PLAYER: &str = "afplay";
const PLAYER_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Success,
    Error,
}

impl Cue {
    fn system_sound(&self) -> &'static str {
        match self {
            Self::Success => "/System/Library/Sounds/Glass.aiff",
            Self::Error => "/System/Library/Sounds/Basso.aiff",
        }
    }
}

/// Ring the terminal bell, then try the platform sound player.
///
/// Failures are ignored; a missing player is the common case off macOS.
pub async fn play(cue: Cue) {
    let mut stderr = std::io::stderr();
    let _ = stderr.write_all(b"\x07");
    let _ = stderr.flush();

    let player = ExternalCommand::new(PLAYER, [cue.system_sound()]);
    if let Err(e) = player.run(Some(PLAYER_TIMEOUT)).await {
        tracing::debug!("No sound played: {}", e);
    }
}
