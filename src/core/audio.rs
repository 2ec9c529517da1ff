//! Alert sound playback.
//!
//! Playback is fire-and-forget: `RodioPlayer` hands file paths to a
//! dedicated audio thread that owns the output stream and plays them in
//! order. Everything that decides *whether* a sound plays lives in
//! [`Notifier`].

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use thiserror::Error;

use super::alerts::throttle::NotificationThrottle;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("sound file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unable to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: rodio::decoder::DecoderError,
    },
    #[error("audio thread is not running")]
    Disconnected,
}

/// Anything that can play a resolved sound file.
pub trait SoundPlayer: Send + Sync {
    fn play(&self, path: &Path) -> Result<(), AudioError>;
}

/// Plays sounds through the default output device.
pub struct RodioPlayer {
    tx: Sender<PathBuf>,
}

impl RodioPlayer {
    /// Start the audio thread.
    pub fn spawn() -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("proximity-audio".to_string())
            .spawn(move || audio_loop(rx))?;
        Ok(Self { tx })
    }
}

impl SoundPlayer for RodioPlayer {
    fn play(&self, path: &Path) -> Result<(), AudioError> {
        if !path.is_file() {
            return Err(AudioError::Io {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such sound file"),
            });
        }
        self.tx
            .send(path.to_path_buf())
            .map_err(|_| AudioError::Disconnected)
    }
}

fn audio_loop(rx: Receiver<PathBuf>) {
    let mut stream = match rodio::OutputStreamBuilder::open_default_stream() {
        Ok(stream) => stream,
        Err(e) => {
            log::error!("No audio output available, alert sounds disabled: {}", e);
            return;
        }
    };
    stream.log_on_drop(false);

    for path in rx {
        if let Err(e) = play_file(&stream, &path) {
            log::warn!("Failed to play alert sound: {}", e);
        }
    }
}

fn play_file(stream: &rodio::OutputStream, path: &Path) -> Result<(), AudioError> {
    let file = File::open(path).map_err(|source| AudioError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let source = rodio::Decoder::new(BufReader::new(file)).map_err(|source| AudioError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let sink = rodio::Sink::connect_new(stream.mixer());
    sink.append(source);
    sink.detach();
    Ok(())
}

/// Decides whether an alert sound actually reaches the player.
#[derive(Clone)]
pub struct Notifier {
    enabled: bool,
    sound_dir: PathBuf,
    throttle: Arc<NotificationThrottle>,
    player: Arc<dyn SoundPlayer>,
}

impl Notifier {
    pub fn new(sound_dir: PathBuf, throttle: Arc<NotificationThrottle>, player: Arc<dyn SoundPlayer>) -> Self {
        Self {
            enabled: true,
            sound_dir,
            throttle,
            player,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_sound_dir(&mut self, sound_dir: PathBuf) {
        self.sound_dir = sound_dir;
    }

    pub fn sound_path(&self, sound: &str) -> PathBuf {
        self.sound_dir.join(sound)
    }

    /// Request playback of `sound`. Returns whether it was handed to the player.
    pub fn notify(&self, sound: &str) -> Result<bool, AudioError> {
        if !self.enabled || !self.throttle.try_play(sound) {
            return Ok(false);
        }
        self.player.play(&self.sound_path(sound))?;
        Ok(true)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Player that remembers what it was asked to play.
    #[derive(Default)]
    pub struct RecordingPlayer {
        pub played: Mutex<Vec<PathBuf>>,
    }

    impl RecordingPlayer {
        pub fn count(&self) -> usize {
            self.played.lock().unwrap().len()
        }
    }

    impl SoundPlayer for RecordingPlayer {
        fn play(&self, path: &Path) -> Result<(), AudioError> {
            self.played.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    /// Notifier with its own zero-cooldown throttle so tests see every request.
    pub fn notifier() -> (Notifier, Arc<RecordingPlayer>) {
        let player = Arc::new(RecordingPlayer::default());
        let throttle = Arc::new(NotificationThrottle::new(std::time::Duration::ZERO));
        let notifier = Notifier::new(PathBuf::from("sounds"), throttle, player.clone());
        (notifier, player)
    }
}
