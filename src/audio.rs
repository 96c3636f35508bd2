//! Audio categories and playback sinks
//!
//! The simulation only names *what* should be heard; a host implements
//! [`AudioSink`] to actually play it.

use serde::{Deserialize, Serialize};

/// Sound effect categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Player took contact damage
    PlayerDamage,
    /// Enemy took a non-lethal hit
    EnemyDamage,
    /// Enemy started dying
    EnemyDeath,
    /// Player health reached zero
    PlayerDeath,
    /// Bomb item detonated
    BombExplosion,
    /// Bar deployed from aiming
    BarStretch,
    /// Bar reversed its spin
    RotationChange,
    /// Once per second while time is stopped
    ClockTick,
}

/// Background music tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MusicTrack {
    /// Silence
    #[default]
    None,
    Gameplay,
}

/// Fire-and-forget audio output
pub trait AudioSink {
    fn play_sfx(&mut self, effect: SoundEffect);
    /// Switch background music, crossfading over `fade_secs`
    fn play_music(&mut self, track: MusicTrack, fade_secs: f32);
}

/// Sink that writes every cue to the log (headless runs)
#[derive(Debug, Default)]
pub struct LogAudio {
    pub current_track: MusicTrack,
    pub sfx_played: u32,
    muted: bool,
}

impl LogAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}

impl AudioSink for LogAudio {
    fn play_sfx(&mut self, effect: SoundEffect) {
        self.sfx_played += 1;
        if !self.muted {
            log::debug!("sfx: {:?}", effect);
        }
    }

    fn play_music(&mut self, track: MusicTrack, fade_secs: f32) {
        if self.current_track == track {
            return;
        }
        if !self.muted {
            log::info!(
                "music: {:?} -> {:?} ({:.1}s crossfade)",
                self.current_track,
                track,
                fade_secs
            );
        }
        self.current_track = track;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_audio_counts_and_tracks() {
        let mut audio = LogAudio::new();
        audio.set_muted(true);
        audio.play_sfx(SoundEffect::EnemyDeath);
        audio.play_sfx(SoundEffect::ClockTick);
        audio.play_music(MusicTrack::Gameplay, 1.0);
        assert_eq!(audio.sfx_played, 2);
        assert_eq!(audio.current_track, MusicTrack::Gameplay);
    }
}
