//! Audio cues.
//!
//! The engine never plays sound itself. It emits [`AudioCue`]s which the
//! session forwards to an injected [`AudioSink`].

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    Collect,
    PowerUp,
    Damage,
    Jump,
    LevelComplete,
    Achievement,
    MenuSelect,
    ButtonClick,
}

impl SoundEffect {
    pub fn asset_name(&self) -> &'static str {
        match self {
            SoundEffect::Collect => "collect",
            SoundEffect::PowerUp => "powerup",
            SoundEffect::Damage => "damage",
            SoundEffect::Jump => "jump",
            SoundEffect::LevelComplete => "level_complete",
            SoundEffect::Achievement => "achievement",
            SoundEffect::MenuSelect => "menu_select",
            SoundEffect::ButtonClick => "button_click",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MusicTrack {
    MainMenu,
    CyberTheme,
    ForestTheme,
    DesertTheme,
    ArcticTheme,
    VolcanoTheme,
    SpaceTheme,
    BossBattle,
    Victory,
}

impl MusicTrack {
    pub fn asset_name(&self) -> &'static str {
        match self {
            MusicTrack::MainMenu => "main_menu",
            MusicTrack::CyberTheme => "cyber_theme",
            MusicTrack::ForestTheme => "forest_theme",
            MusicTrack::DesertTheme => "desert_theme",
            MusicTrack::ArcticTheme => "arctic_theme",
            MusicTrack::VolcanoTheme => "volcano_theme",
            MusicTrack::SpaceTheme => "space_theme",
            MusicTrack::BossBattle => "boss_battle",
            MusicTrack::Victory => "victory",
        }
    }
}

/// A single audio request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioCue {
    Sfx(SoundEffect),
    Music(MusicTrack),
    StopMusic,
}

impl fmt::Display for AudioCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioCue::Sfx(s) => write!(f, "sfx:{}", s.asset_name()),
            AudioCue::Music(m) => write!(f, "music:{}", m.asset_name()),
            AudioCue::StopMusic => write!(f, "music:stop"),
        }
    }
}

/// Volume settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    pub enabled: bool,
    pub music_volume: f32,
    pub sfx_volume: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            music_volume: 0.5,
            sfx_volume: 0.7,
        }
    }
}

impl AudioConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_music_volume(mut self, volume: f32) -> Self {
        self.music_volume = volume.clamp(0.0, 1.0);
        self
    }

    pub fn with_sfx_volume(mut self, volume: f32) -> Self {
        self.sfx_volume = volume.clamp(0.0, 1.0);
        self
    }
}

/// Receives audio cues from the session.
pub trait AudioSink: Send {
    fn play(&mut self, cue: AudioCue);

    /// Track currently playing, if any.
    fn current_music(&self) -> Option<MusicTrack>;
}

/// Default sink: logs cues through `tracing` and remembers the music track.
#[derive(Debug, Default)]
pub struct TracingAudio {
    config: AudioConfig,
    current: Option<MusicTrack>,
}

impl TracingAudio {
    pub fn new(config: AudioConfig) -> Self {
        Self {
            config,
            current: None,
        }
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }
}

impl AudioSink for TracingAudio {
    fn play(&mut self, cue: AudioCue) {
        match cue {
            AudioCue::Music(track) => {
                // Restarting the same track is a no-op
                if self.current == Some(track) {
                    return;
                }
                self.current = Some(track);
                if self.config.enabled {
                    tracing::debug!(track = track.asset_name(), volume = self.config.music_volume, "music");
                }
            }
            AudioCue::StopMusic => {
                self.current = None;
                tracing::debug!("music stopped");
            }
            AudioCue::Sfx(effect) => {
                if self.config.enabled {
                    tracing::debug!(sfx = effect.asset_name(), volume = self.config.sfx_volume, "sfx");
                }
            }
        }
    }

    fn current_music(&self) -> Option<MusicTrack> {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_audio_remembers_track() {
        let mut audio = TracingAudio::new(AudioConfig::default());
        assert_eq!(audio.current_music(), None);

        audio.play(AudioCue::Music(MusicTrack::MainMenu));
        audio.play(AudioCue::Sfx(SoundEffect::Collect));
        assert_eq!(audio.current_music(), Some(MusicTrack::MainMenu));

        audio.play(AudioCue::StopMusic);
        assert_eq!(audio.current_music(), None);
    }

    #[test]
    fn test_disabled_audio_still_tracks_music() {
        let mut audio = TracingAudio::new(AudioConfig::new().with_enabled(false));
        audio.play(AudioCue::Music(MusicTrack::BossBattle));
        assert_eq!(audio.current_music(), Some(MusicTrack::BossBattle));
    }

    #[test]
    fn test_volume_is_clamped() {
        let config = AudioConfig::new().with_music_volume(3.0).with_sfx_volume(-1.0);
        assert_eq!(config.music_volume, 1.0);
        assert_eq!(config.sfx_volume, 0.0);
    }

    #[test]
    fn test_cue_display() {
        assert_eq!(AudioCue::Sfx(SoundEffect::LevelComplete).to_string(), "sfx:level_complete");
        assert_eq!(AudioCue::Music(MusicTrack::CyberTheme).to_string(), "music:cyber_theme");
    }
}
