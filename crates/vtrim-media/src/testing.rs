//! In-memory runtime for tests.
//!
//! The fake keeps its working namespace in a map, records every call, and
//! "trims" by writing a marker derived from the argument vector to the
//! output name.

use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{MediaError, MediaResult};
use crate::runtime::{RuntimeConfig, RuntimeProvider, TranscoderRuntime};

/// Failure injection for [`FakeProvider`].
#[derive(Debug, Clone, Default)]
pub struct FakeBehavior {
    /// Fail this many script loads before succeeding.
    pub script_failures: u32,
    /// Fail this many instance loads before succeeding.
    pub load_failures: u32,
    /// Make the command for this clip (by run order) fail.
    pub fail_run_for_clip: Option<usize>,
    /// Produce an empty output for this clip.
    pub empty_output_for_clip: Option<usize>,
    /// Refuse writes into the working namespace.
    pub fail_write: bool,
    pub fail_unlink: bool,
    pub probed_duration: Option<f64>,
}

/// Everything the fake observed.
#[derive(Debug, Clone, Default)]
pub struct FakeRecord {
    pub script_calls: u32,
    pub instances: u32,
    pub load_calls: u32,
    pub commands: Vec<Vec<String>>,
    pub files: BTreeMap<String, Bytes>,
    pub unlinked: Vec<String>,
}

#[derive(Debug, Default)]
struct Shared {
    behavior: FakeBehavior,
    record: FakeRecord,
}

/// Provider whose instances share one observable state.
#[derive(Debug, Clone, Default)]
pub struct FakeProvider {
    shared: Arc<Mutex<Shared>>,
}

impl FakeProvider {
    pub fn new(behavior: FakeBehavior) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                behavior,
                record: FakeRecord::default(),
            })),
        }
    }

    /// Snapshot of the calls so far.
    pub fn record(&self) -> FakeRecord {
        lock(&self.shared).record.clone()
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl RuntimeProvider for FakeProvider {
    async fn load_script(&self) -> MediaResult<()> {
        let mut shared = lock(&self.shared);
        shared.record.script_calls += 1;
        if shared.behavior.script_failures > 0 {
            shared.behavior.script_failures -= 1;
            return Err(MediaError::FfmpegNotFound("fake".to_string()));
        }
        Ok(())
    }

    fn create_instance(&self, _config: &RuntimeConfig) -> MediaResult<Box<dyn TranscoderRuntime>> {
        lock(&self.shared).record.instances += 1;
        Ok(Box::new(FakeRuntime {
            shared: Arc::clone(&self.shared),
            loaded: false,
        }))
    }
}

/// Runtime instance backed by [`FakeProvider`]'s shared state.
#[derive(Debug)]
pub struct FakeRuntime {
    shared: Arc<Mutex<Shared>>,
    loaded: bool,
}

fn not_found(name: &str) -> MediaError {
    MediaError::Io(io::Error::new(io::ErrorKind::NotFound, name.to_string()))
}

#[async_trait]
impl TranscoderRuntime for FakeRuntime {
    fn is_loaded(&self) -> bool {
        self.loaded
    }

    async fn load(&mut self) -> MediaResult<()> {
        let mut shared = lock(&self.shared);
        shared.record.load_calls += 1;
        if shared.behavior.load_failures > 0 {
            shared.behavior.load_failures -= 1;
            return Err(MediaError::ffmpeg_failed("fake load failure", None, Some(1)));
        }
        self.loaded = true;
        Ok(())
    }

    async fn write_file(&self, name: &str, data: &[u8]) -> MediaResult<()> {
        let mut shared = lock(&self.shared);
        if shared.behavior.fail_write {
            return Err(MediaError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                name.to_string(),
            )));
        }
        shared
            .record
            .files
            .insert(name.to_string(), Bytes::copy_from_slice(data));
        Ok(())
    }

    async fn read_file(&self, name: &str) -> MediaResult<Bytes> {
        lock(&self.shared)
            .record
            .files
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(name))
    }

    async fn unlink(&self, name: &str) -> MediaResult<()> {
        let mut shared = lock(&self.shared);
        if shared.behavior.fail_unlink {
            return Err(MediaError::internal("fake unlink failure"));
        }
        shared.record.unlinked.push(name.to_string());
        shared.record.files.remove(name).map(|_| ()).ok_or_else(|| not_found(name))
    }

    async fn run(&self, args: &[String]) -> MediaResult<()> {
        if !self.loaded {
            return Err(MediaError::RuntimeNotLoaded);
        }
        let mut shared = lock(&self.shared);
        let clip = shared.record.commands.len();
        shared.record.commands.push(args.to_vec());

        if shared.behavior.fail_run_for_clip == Some(clip) {
            return Err(MediaError::ffmpeg_failed(
                "fake command failure",
                Some("Invalid data found when processing input".to_string()),
                Some(1),
            ));
        }

        let input = args
            .iter()
            .position(|a| a == "-i")
            .and_then(|i| args.get(i + 1))
            .ok_or_else(|| MediaError::internal("no input in command"))?;
        if !shared.record.files.contains_key(input) {
            return Err(not_found(input));
        }
        let output = args
            .last()
            .cloned()
            .ok_or_else(|| MediaError::internal("no output in command"))?;

        let data = if shared.behavior.empty_output_for_clip == Some(clip) {
            Bytes::new()
        } else {
            Bytes::from(format!("trimmed {}", args.join(" ")))
        };
        shared.record.files.insert(output, data);
        Ok(())
    }

    async fn probe_duration(&self, _name: &str) -> MediaResult<Option<f64>> {
        Ok(lock(&self.shared).behavior.probed_duration)
    }
}
