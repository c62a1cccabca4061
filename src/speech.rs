//! Blocking speech cues.
//!
//! [`SpeechCuePlayer`] owns no engine between calls: every [`Speaker::speak`] acquires a
//! fresh engine from its [`EngineFactory`], configures it, renders the text, and releases
//! it again. Release happens on drop, so an engine is stopped even when rendering fails.

use serde::{Deserialize, Serialize};
use std::io;
use std::ops::{Deref, DerefMut};
use std::process::Command;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("voice '{0}' is not available")]
    VoiceUnavailable(String),
    #[error("failed to start speech program '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("speech program '{program}' exited with {status}")]
    Playback { program: String, status: String },
    #[error("speech engine failed: {0}")]
    Engine(String),
}

/// Deterministic engine parameters applied before every cue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    /// Speaking rate in words per minute.
    pub rate: u32,
    /// Volume between 0 and 1.
    pub volume: f32,
    /// Requested voice. Best effort: the engine default is used when it is missing.
    pub voice: String,
    /// Executable used by [`EspeakFactory`].
    pub program: String,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            rate: 125,
            volume: 1.0,
            voice: "English (America)".to_string(),
            program: "espeak-ng".to_string(),
        }
    }
}

/// A text-to-speech engine instance.
pub trait SynthesisEngine {
    fn set_rate(&mut self, words_per_minute: u32);
    fn set_volume(&mut self, volume: f32);
    /// Selects a voice, failing with [`SpeechError::VoiceUnavailable`] if the host lacks it.
    fn set_voice(&mut self, voice: &str) -> Result<(), SpeechError>;
    /// Queues text for rendering.
    fn say(&mut self, text: &str);
    /// Renders everything queued and blocks until playback completes.
    fn run_and_wait(&mut self) -> Result<(), SpeechError>;
    /// Releases the engine's resources.
    fn stop(&mut self);
}

/// Creates engine instances on demand.
pub trait EngineFactory {
    type Engine: SynthesisEngine;

    fn init(&self) -> Result<Self::Engine, SpeechError>;
}

/// Anything that can speak a phrase and block until it is done.
pub trait Speaker {
    fn speak(&mut self, text: &str) -> Result<(), SpeechError>;
}

impl<S: Speaker + ?Sized> Speaker for &mut S {
    fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        (**self).speak(text)
    }
}

/// Scoped engine: stops the wrapped engine when dropped.
pub struct EngineSession<E: SynthesisEngine> {
    engine: E,
}

impl<E: SynthesisEngine> EngineSession<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }
}

impl<E: SynthesisEngine> Deref for EngineSession<E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.engine
    }
}

impl<E: SynthesisEngine> DerefMut for EngineSession<E> {
    fn deref_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}

impl<E: SynthesisEngine> Drop for EngineSession<E> {
    fn drop(&mut self) {
        self.engine.stop();
    }
}

/// Renders speech cues with a fresh engine per cue.
pub struct SpeechCuePlayer<F> {
    factory: F,
    settings: VoiceSettings,
}

impl<F: EngineFactory> SpeechCuePlayer<F> {
    pub fn new(factory: F, settings: VoiceSettings) -> Self {
        Self { factory, settings }
    }

    pub fn settings(&self) -> &VoiceSettings {
        &self.settings
    }
}

impl<F: EngineFactory> Speaker for SpeechCuePlayer<F> {
    fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        let mut engine = EngineSession::new(self.factory.init()?);

        engine.set_rate(self.settings.rate);
        engine.set_volume(self.settings.volume.clamp(0.0, 1.0));
        if let Err(err) = engine.set_voice(&self.settings.voice) {
            warn!(voice = %self.settings.voice, error = %err, "falling back to default voice");
        }

        info!(text, "speaking");
        engine.say(text);
        engine.run_and_wait()
    }
}

// --- espeak-ng ---

/// Spawns [`EspeakEngine`]s backed by an `espeak`-compatible executable.
#[derive(Clone, Debug)]
pub struct EspeakFactory {
    program: String,
}

impl EspeakFactory {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl EngineFactory for EspeakFactory {
    type Engine = EspeakEngine;

    fn init(&self) -> Result<EspeakEngine, SpeechError> {
        Ok(EspeakEngine {
            program: self.program.clone(),
            rate: 175,
            amplitude: 100,
            voice: None,
            queue: Vec::new(),
        })
    }
}

/// One `espeak-ng` invocation per queued phrase; `run_and_wait` blocks on each child.
#[derive(Debug)]
pub struct EspeakEngine {
    program: String,
    rate: u32,
    amplitude: u32,
    voice: Option<String>,
    queue: Vec<String>,
}

impl EspeakEngine {
    fn list_voices(&self) -> Result<String, SpeechError> {
        let output = Command::new(&self.program)
            .arg("--voices")
            .output()
            .map_err(|source| SpeechError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl SynthesisEngine for EspeakEngine {
    fn set_rate(&mut self, words_per_minute: u32) {
        self.rate = words_per_minute;
    }

    fn set_volume(&mut self, volume: f32) {
        // espeak amplitude: 0..=200, 100 is nominal.
        self.amplitude = (volume.clamp(0.0, 1.0) * 100.0).round() as u32;
    }

    fn set_voice(&mut self, voice: &str) -> Result<(), SpeechError> {
        let listing = self.list_voices()?;
        match find_voice(&listing, voice) {
            Some(code) => {
                debug!(voice, code = %code, "voice selected");
                self.voice = Some(code);
                Ok(())
            }
            None => Err(SpeechError::VoiceUnavailable(voice.to_string())),
        }
    }

    fn say(&mut self, text: &str) {
        self.queue.push(text.to_string());
    }

    fn run_and_wait(&mut self) -> Result<(), SpeechError> {
        for text in self.queue.drain(..) {
            let mut cmd = Command::new(&self.program);
            cmd.arg("-s")
                .arg(self.rate.to_string())
                .arg("-a")
                .arg(self.amplitude.to_string());
            if let Some(voice) = &self.voice {
                cmd.arg("-v").arg(voice);
            }
            let status = cmd.arg(&text).status().map_err(|source| SpeechError::Spawn {
                program: self.program.clone(),
                source,
            })?;
            if !status.success() {
                return Err(SpeechError::Playback {
                    program: self.program.clone(),
                    status: status.to_string(),
                });
            }
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.queue.clear();
    }
}

fn normalize_voice(name: &str) -> String {
    name.trim().replace('_', " ").to_lowercase()
}

/// Looks `requested` up in `espeak --voices` output and returns the language code to pass
/// with `-v`. Language code, voice name, and voice file are all accepted as matches.
pub fn find_voice(listing: &str, requested: &str) -> Option<String> {
    let wanted = normalize_voice(requested);
    if wanted.is_empty() {
        return None;
    }
    listing.lines().skip(1).find_map(|line| {
        let fields: Vec<&str> = line.split_whitespace().collect();
        // Pty Language Age/Gender VoiceName File ...
        let (language, name, file) = match fields.as_slice() {
            [_, language, _, name, file, ..] => (*language, *name, *file),
            _ => return None,
        };
        [language, name, file]
            .iter()
            .any(|candidate| normalize_voice(candidate) == wanted)
            .then(|| language.to_string())
    })
}

// --- Silent engine ---

/// Factory for [`LogEngine`], used when no audio output is wanted.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogFactory;

impl EngineFactory for LogFactory {
    type Engine = LogEngine;

    fn init(&self) -> Result<LogEngine, SpeechError> {
        Ok(LogEngine::default())
    }
}

/// Engine that renders nothing and reports queued text to the log.
#[derive(Debug, Default)]
pub struct LogEngine {
    queue: Vec<String>,
}

impl SynthesisEngine for LogEngine {
    fn set_rate(&mut self, _words_per_minute: u32) {}

    fn set_volume(&mut self, _volume: f32) {}

    fn set_voice(&mut self, _voice: &str) -> Result<(), SpeechError> {
        Ok(())
    }

    fn say(&mut self, text: &str) {
        self.queue.push(text.to_string());
    }

    fn run_and_wait(&mut self) -> Result<(), SpeechError> {
        for text in self.queue.drain(..) {
            info!(text = %text, "(muted) speech rendered");
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.queue.clear();
    }
}
