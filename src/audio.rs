//! Positional sound playback.
//!
//! Modes talk to [`AudioOutput`]; the host picks [`RodioAudio`] when an output
//! device is available and [`NullAudio`] otherwise.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::Cursor;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::Context;
use glam::Vec3;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Source, SpatialSink};

/// Half the distance between the listener's ears, in world units.
const EAR_OFFSET: f32 = 0.1;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SampleId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SoundHandle(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Looping {
    Once,
    Forever,
}

pub trait AudioOutput {
    fn load_sample(&self, bytes: Vec<u8>) -> anyhow::Result<SampleId>;

    /// Moves the listener. `right` points out of the listener's right ear.
    fn set_listener(&self, position: Vec3, right: Vec3);

    fn play(&self, sample: SampleId, position: Vec3, looping: Looping)
        -> anyhow::Result<SoundHandle>;

    fn set_position(&self, sound: SoundHandle, position: Vec3);

    fn stop(&self, sound: SoundHandle);
}

pub fn create_audio() -> Rc<dyn AudioOutput> {
    match RodioAudio::new() {
        Ok(audio) => Rc::new(audio),
        Err(e) => {
            log::warn!("No audio output available, continuing silently: {:#}", e);
            Rc::new(NullAudio::default())
        }
    }
}

pub struct RodioAudio {
    // Dropping the stream silences every sink created from its handle.
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    samples: RefCell<Vec<Arc<[u8]>>>,
    sounds: RefCell<HashMap<SoundHandle, SpatialSink>>,
    listener: Cell<(Vec3, Vec3)>,
    next_sound: Cell<u32>,
}

impl RodioAudio {
    pub fn new() -> anyhow::Result<Self> {
        let (stream, stream_handle) =
            OutputStream::try_default().context("Failed to open default audio output")?;

        Ok(Self {
            _stream: stream,
            stream_handle,
            samples: RefCell::new(Vec::new()),
            sounds: RefCell::new(HashMap::new()),
            listener: Cell::new((Vec3::ZERO, Vec3::X)),
            next_sound: Cell::new(0),
        })
    }

    fn ears(&self) -> ([f32; 3], [f32; 3]) {
        let (position, right) = self.listener.get();
        (
            (position - right * EAR_OFFSET).to_array(),
            (position + right * EAR_OFFSET).to_array(),
        )
    }
}

impl AudioOutput for RodioAudio {
    fn load_sample(&self, bytes: Vec<u8>) -> anyhow::Result<SampleId> {
        // Broken files should fail here rather than on first play
        let data: Arc<[u8]> = Arc::from(bytes.into_boxed_slice());
        Decoder::new(Cursor::new(data.clone())).context("Failed to decode audio sample")?;

        let mut samples = self.samples.borrow_mut();
        samples.push(data);
        Ok(SampleId(samples.len() as u32 - 1))
    }

    fn set_listener(&self, position: Vec3, right: Vec3) {
        self.listener.set((position, right));
        let (left_ear, right_ear) = self.ears();

        let mut sounds = self.sounds.borrow_mut();
        sounds.retain(|_, sink| !sink.empty());
        for sink in sounds.values() {
            sink.set_left_ear_position(left_ear);
            sink.set_right_ear_position(right_ear);
        }
    }

    fn play(
        &self,
        sample: SampleId,
        position: Vec3,
        looping: Looping,
    ) -> anyhow::Result<SoundHandle> {
        let data = self
            .samples
            .borrow()
            .get(sample.0 as usize)
            .cloned()
            .with_context(|| format!("Unknown sample {:?}", sample))?;

        let (left_ear, right_ear) = self.ears();
        let sink = SpatialSink::try_new(
            &self.stream_handle,
            position.to_array(),
            left_ear,
            right_ear,
        )
        .context("Failed to create audio sink")?;

        let source = Decoder::new(Cursor::new(data)).context("Failed to decode audio sample")?;
        match looping {
            Looping::Once => sink.append(source),
            Looping::Forever => sink.append(source.repeat_infinite()),
        }

        let handle = SoundHandle(self.next_sound.get());
        self.next_sound.set(handle.0.wrapping_add(1));
        self.sounds.borrow_mut().insert(handle, sink);

        Ok(handle)
    }

    fn set_position(&self, sound: SoundHandle, position: Vec3) {
        if let Some(sink) = self.sounds.borrow().get(&sound) {
            sink.set_emitter_position(position.to_array());
        }
    }

    fn stop(&self, sound: SoundHandle) {
        if let Some(sink) = self.sounds.borrow_mut().remove(&sound) {
            sink.stop();
        }
    }
}

/// Accepts everything and plays nothing.
#[derive(Default)]
pub struct NullAudio {
    next: Cell<u32>,
}

impl NullAudio {
    fn next_id(&self) -> u32 {
        let id = self.next.get();
        self.next.set(id.wrapping_add(1));
        id
    }
}

impl AudioOutput for NullAudio {
    fn load_sample(&self, _bytes: Vec<u8>) -> anyhow::Result<SampleId> {
        Ok(SampleId(self.next_id()))
    }

    fn set_listener(&self, _position: Vec3, _right: Vec3) {}

    fn play(
        &self,
        _sample: SampleId,
        _position: Vec3,
        _looping: Looping,
    ) -> anyhow::Result<SoundHandle> {
        Ok(SoundHandle(self.next_id()))
    }

    fn set_position(&self, _sound: SoundHandle, _position: Vec3) {}

    fn stop(&self, _sound: SoundHandle) {}
}
