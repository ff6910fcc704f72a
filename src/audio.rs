//! Sound and music cues
//!
//! The simulation only names cues; an [`AudioSink`] decides what to do with
//! them. [`AudioManager`] is the default sink: it applies volume and mute
//! settings and logs each cue, which is all a headless run needs.

use serde::{Deserialize, Serialize};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Player fires a blast
    ZombieAttack,
    /// Player eats a citizen (three variants)
    ZombieEat1,
    ZombieEat2,
    ZombieEat3,
    /// A potion is brewed (four variants)
    ZombieBurp1,
    ZombieBurp2,
    ZombieBurp3,
    ZombieBurp4,
    /// Player gets hurt
    ZombieGroan,
    /// Player dies
    ZombieDeath,
    /// Mage killed
    MageDeath,
    /// Player steps on a trap tile
    Trap,
    /// Potion picked up
    Potion,
}

impl SoundEffect {
    pub const EAT: [SoundEffect; 3] = [Self::ZombieEat1, Self::ZombieEat2, Self::ZombieEat3];
    pub const BURP: [SoundEffect; 4] = [
        Self::ZombieBurp1,
        Self::ZombieBurp2,
        Self::ZombieBurp3,
        Self::ZombieBurp4,
    ];
}

/// Music tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MusicTrack {
    Menu,
    Level,
    GameOver,
}

/// Fire-and-forget audio output
pub trait AudioSink {
    /// Play a one-shot effect at `volume_percent` (0-100)
    fn play(&mut self, effect: SoundEffect, volume_percent: f32);
    fn play_music(&mut self, track: MusicTrack);
    fn stop_music(&mut self);
    /// Music volume in percent (0-100)
    fn set_music_volume(&mut self, volume_percent: f32);
}

/// A queued audio request, replayed onto a sink at the end of a phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioCue {
    Effect(SoundEffect, f32),
    Music(MusicTrack),
    StopMusic,
    MusicVolume(f32),
}

impl AudioCue {
    pub fn apply(self, sink: &mut dyn AudioSink) {
        match self {
            AudioCue::Effect(effect, volume) => sink.play(effect, volume),
            AudioCue::Music(track) => sink.play_music(track),
            AudioCue::StopMusic => sink.stop_music(),
            AudioCue::MusicVolume(volume) => sink.set_music_volume(volume),
        }
    }
}

/// Audio manager for the game
#[derive(Debug, Clone)]
pub struct AudioManager {
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    muted: bool,
    current_track: Option<MusicTrack>,
    last_effect: Option<SoundEffect>,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: false,
            current_track: None,
            last_effect: None,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn music_volume(&self) -> f32 {
        self.music_volume
    }

    pub fn current_track(&self) -> Option<MusicTrack> {
        self.current_track
    }

    /// Most recent effect that was audible
    pub fn last_effect(&self) -> Option<SoundEffect> {
        self.last_effect
    }

    /// Get effective volume for an effect requested at `volume_percent`
    fn effective_volume(&self, volume_percent: f32) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume * (volume_percent / 100.0).clamp(0.0, 1.0)
        }
    }
}

impl AudioSink for AudioManager {
    fn play(&mut self, effect: SoundEffect, volume_percent: f32) {
        let vol = self.effective_volume(volume_percent);
        if vol <= 0.0 {
            return;
        }
        log::trace!("sfx {:?} at {:.2}", effect, vol);
        self.last_effect = Some(effect);
    }

    fn play_music(&mut self, track: MusicTrack) {
        log::debug!("music {:?} (volume {:.2})", track, self.music_volume);
        self.current_track = Some(track);
    }

    fn stop_music(&mut self) {
        self.current_track = None;
    }

    fn set_music_volume(&mut self, volume_percent: f32) {
        self.music_volume = (volume_percent / 100.0).clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_music_track_bookkeeping() {
        let mut audio = AudioManager::new();
        audio.play_music(MusicTrack::Level);
        assert_eq!(audio.current_track(), Some(MusicTrack::Level));
        audio.stop_music();
        assert_eq!(audio.current_track(), None);
    }

    #[test]
    fn test_cues_replay_onto_sink() {
        let mut audio = AudioManager::new();
        AudioCue::Music(MusicTrack::GameOver).apply(&mut audio);
        AudioCue::MusicVolume(20.0).apply(&mut audio);
        assert_eq!(audio.current_track(), Some(MusicTrack::GameOver));
        assert!((audio.music_volume() - 0.2).abs() < 1e-6);
        AudioCue::StopMusic.apply(&mut audio);
        assert_eq!(audio.current_track(), None);
    }

    #[test]
    fn test_mute_silences_effects() {
        let mut audio = AudioManager::new();
        assert!(audio.effective_volume(50.0) > 0.0);
        audio.set_muted(true);
        assert_eq!(audio.effective_volume(50.0), 0.0);
    }
}
