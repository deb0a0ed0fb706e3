//! Audio side effects and the once-per-reveal guard.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SoundCue {
    LotteryMusic,
    EndChime,
    WinFanfare,
}

impl SoundCue {
    pub fn volume(self) -> f64 {
        match self {
            SoundCue::LotteryMusic => 0.7,
            SoundCue::EndChime => 1.0,
            SoundCue::WinFanfare => 0.8,
        }
    }

    /// Nominal clip length used by backends that simulate playback.
    pub fn duration_ms(self) -> u64 {
        match self {
            SoundCue::LotteryMusic => 95_000,
            SoundCue::EndChime => 1_500,
            SoundCue::WinFanfare => 3_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundId(pub u64);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResourceError {
    #[error("audio playback of {0:?} blocked by platform policy")]
    AudioBlocked(SoundCue),
    #[error("audio {0:?} unavailable: {1}")]
    AudioUnavailable(SoundCue, String),
    #[error("avatar {0} unavailable")]
    AvatarUnavailable(String),
}

pub trait AudioBackend {
    fn play(
        &mut self,
        cue: SoundCue,
        looped: bool,
        volume: f64,
        now: u64,
    ) -> Result<SoundId, ResourceError>;
    fn stop(&mut self, id: SoundId);
    /// Sounds that ended on their own since the last poll.
    fn poll_finished(&mut self, now: u64) -> Vec<SoundId>;
}

/// Backend for headless sessions: every sound "plays" and ends immediately.
#[derive(Debug, Default)]
pub struct SilentAudio {
    next: u64,
    ended: Vec<SoundId>,
}

impl AudioBackend for SilentAudio {
    fn play(&mut self, _: SoundCue, looped: bool, _: f64, _: u64) -> Result<SoundId, ResourceError> {
        self.next += 1;
        let id = SoundId(self.next);
        if !looped {
            self.ended.push(id);
        }
        Ok(id)
    }

    fn stop(&mut self, _: SoundId) {}

    fn poll_finished(&mut self, _: u64) -> Vec<SoundId> {
        std::mem::take(&mut self.ended)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AudioCall {
    Play {
        id: SoundId,
        cue: SoundCue,
        looped: bool,
        volume: f64,
        at: u64,
    },
    Stop(SoundId),
}

/// Backend that logs every call and simulates clip lengths on the virtual clock.
#[derive(Debug, Default)]
pub struct RecordingAudio {
    pub calls: Vec<AudioCall>,
    /// Simulates an autoplay policy that rejects every `play`.
    pub blocked: bool,
    /// Cues whose clip failed to load.
    pub missing: BTreeSet<SoundCue>,
    next: u64,
    playing: BTreeMap<SoundId, Option<u64>>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plays_of(&self, cue: SoundCue) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, AudioCall::Play { cue: played, .. } if *played == cue))
            .count()
    }

    pub fn playing(&self) -> usize {
        self.playing.len()
    }
}

impl AudioBackend for RecordingAudio {
    fn play(
        &mut self,
        cue: SoundCue,
        looped: bool,
        volume: f64,
        now: u64,
    ) -> Result<SoundId, ResourceError> {
        if self.blocked {
            return Err(ResourceError::AudioBlocked(cue));
        }
        if self.missing.contains(&cue) {
            return Err(ResourceError::AudioUnavailable(
                cue,
                "clip failed to load".to_string(),
            ));
        }
        self.next += 1;
        let id = SoundId(self.next);
        self.calls.push(AudioCall::Play {
            id,
            cue,
            looped,
            volume,
            at: now,
        });
        let ends = (!looped).then(|| now.saturating_add(cue.duration_ms()));
        self.playing.insert(id, ends);
        Ok(id)
    }

    fn stop(&mut self, id: SoundId) {
        self.calls.push(AudioCall::Stop(id));
        self.playing.remove(&id);
    }

    fn poll_finished(&mut self, now: u64) -> Vec<SoundId> {
        let ended: Vec<SoundId> = self
            .playing
            .iter()
            .filter(|(_, ends)| ends.is_some_and(|at| at <= now))
            .map(|(id, _)| *id)
            .collect();
        for id in &ended {
            self.playing.remove(id);
        }
        ended
    }
}

/// Singular background music plus a capped set of one-shot effects.
#[derive(Debug)]
pub struct SoundBoard<A: AudioBackend> {
    backend: A,
    enabled: bool,
    cap: usize,
    music: Option<SoundId>,
    one_shots: Vec<SoundId>,
}

impl<A: AudioBackend> SoundBoard<A> {
    pub fn new(backend: A, cap: usize, enabled: bool) -> Self {
        Self {
            backend,
            enabled,
            cap,
            music: None,
            one_shots: Vec::new(),
        }
    }

    pub fn backend(&self) -> &A {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut A {
        &mut self.backend
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn music_playing(&self) -> bool {
        self.music.is_some()
    }

    pub fn one_shots(&self) -> usize {
        self.one_shots.len()
    }

    /// Starts looping music, replacing any previous track.
    pub fn play_music(&mut self, cue: SoundCue, now: u64) -> Option<SoundId> {
        if !self.enabled {
            return None;
        }
        self.stop_music();
        match self.backend.play(cue, true, cue.volume(), now) {
            Ok(id) => {
                self.music = Some(id);
                Some(id)
            }
            Err(err) => {
                log::warn!("{err}");
                None
            }
        }
    }

    pub fn stop_music(&mut self) {
        if let Some(id) = self.music.take() {
            self.backend.stop(id);
        }
    }

    /// Plays a one-shot unless the cap is reached; excess requests are dropped.
    pub fn play_once(&mut self, cue: SoundCue, now: u64) -> Option<SoundId> {
        if !self.enabled {
            return None;
        }
        self.reap(now);
        if self.one_shots.len() >= self.cap {
            log::warn!(
                "dropping {cue:?}: {} one-shot sounds already playing",
                self.one_shots.len()
            );
            return None;
        }
        match self.backend.play(cue, false, cue.volume(), now) {
            Ok(id) => {
                self.one_shots.push(id);
                Some(id)
            }
            Err(err) => {
                log::warn!("{err}");
                None
            }
        }
    }

    /// Drops one-shots that ended on their own.
    pub fn reap(&mut self, now: u64) {
        for id in self.backend.poll_finished(now) {
            self.one_shots.retain(|live| *live != id);
            if self.music == Some(id) {
                self.music = None;
            }
        }
    }

    pub fn stop_all(&mut self) {
        self.stop_music();
        for id in std::mem::take(&mut self.one_shots) {
            self.backend.stop(id);
        }
    }
}

/// Fire-once flags for the effects of a single reveal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevealGuard {
    pub win_sound: bool,
    pub confetti: bool,
}

impl RevealGuard {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True exactly once per reset.
    pub fn take_win_sound(&mut self) -> bool {
        !std::mem::replace(&mut self.win_sound, true)
    }

    pub fn take_confetti(&mut self) -> bool {
        !std::mem::replace(&mut self.confetti, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn music_is_singular() {
        let mut board = SoundBoard::new(RecordingAudio::new(), 10, true);
        let first = board.play_music(SoundCue::LotteryMusic, 0).expect("plays");
        board.play_music(SoundCue::LotteryMusic, 10);
        assert!(board.backend().calls.contains(&AudioCall::Stop(first)));
        assert_eq!(board.backend().playing(), 1);
    }

    #[test]
    fn one_shots_respect_cap_and_expire() {
        let mut board = SoundBoard::new(RecordingAudio::new(), 10, true);
        for _ in 0..12 {
            board.play_once(SoundCue::WinFanfare, 0);
        }
        assert_eq!(board.one_shots(), 10);
        assert_eq!(board.backend().plays_of(SoundCue::WinFanfare), 10);
        board.reap(SoundCue::WinFanfare.duration_ms());
        assert_eq!(board.one_shots(), 0);
        assert!(board.play_once(SoundCue::WinFanfare, 5_000).is_some());
    }

    #[test]
    fn blocked_audio_degrades_silently() {
        let mut audio = RecordingAudio::new();
        audio.blocked = true;
        let mut board = SoundBoard::new(audio, 10, true);
        assert!(board.play_music(SoundCue::LotteryMusic, 0).is_none());
        assert!(board.play_once(SoundCue::EndChime, 0).is_none());
        assert!(!board.music_playing());
        assert_eq!(board.one_shots(), 0);
    }

    #[test]
    fn missing_clip_skips_only_that_cue() {
        let mut audio = RecordingAudio::new();
        audio.missing.insert(SoundCue::WinFanfare);
        assert_eq!(
            audio.play(SoundCue::WinFanfare, false, 0.8, 0),
            Err(ResourceError::AudioUnavailable(
                SoundCue::WinFanfare,
                "clip failed to load".into()
            ))
        );
        let mut board = SoundBoard::new(audio, 10, true);
        assert!(board.play_once(SoundCue::WinFanfare, 0).is_none());
        assert!(board.play_once(SoundCue::EndChime, 0).is_some());
        assert_eq!(board.one_shots(), 1);
    }

    #[test]
    fn disabled_board_plays_nothing() {
        let mut board = SoundBoard::new(RecordingAudio::new(), 10, false);
        board.play_music(SoundCue::LotteryMusic, 0);
        board.play_once(SoundCue::EndChime, 0);
        assert!(board.backend().calls.is_empty());
    }

    #[test]
    fn stop_all_silences_everything() {
        let mut board = SoundBoard::new(RecordingAudio::new(), 10, true);
        board.play_music(SoundCue::LotteryMusic, 0);
        board.play_once(SoundCue::EndChime, 0);
        board.stop_all();
        assert_eq!(board.backend().playing(), 0);
        assert!(!board.music_playing());
    }

    #[test]
    fn guard_fires_once_per_reset() {
        let mut guard = RevealGuard::default();
        assert!(guard.take_win_sound());
        assert!(!guard.take_win_sound());
        assert!(guard.take_confetti());
        guard.reset();
        assert!(guard.take_win_sound());
    }
}
