use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, Stream, StreamConfig};

use crate::audio::{OutputBackend, SinkHandle};
use crate::error::DeviceError;
use crate::models::{AudioFormat, PcmSlice};

/// Output through the host's audio device via cpal
#[derive(Debug, Clone, Default)]
pub struct CpalBackend {
    preferred_device: Option<String>,
}

impl CpalBackend {
    pub fn new(preferred_device: Option<String>) -> Self {
        Self { preferred_device }
    }
}

impl OutputBackend for CpalBackend {
    fn name(&self) -> &str {
        "cpal"
    }

    fn is_available(&self) -> bool {
        select_device(&cpal::default_host(), self.preferred_device.as_deref()).is_ok()
    }

    fn open(&self, format: &AudioFormat) -> Result<Box<dyn SinkHandle>, DeviceError> {
        let sink = CpalSink::open(self.preferred_device.clone(), *format)?;
        Ok(Box::new(sink))
    }
}

enum StreamCommand {
    Pause,
    Resume,
    Close,
}

/// State shared between the sink handle and the realtime callback
struct StreamShared {
    pcm: Mutex<Option<PcmSlice>>,
    cursor: AtomicUsize,
    total: AtomicUsize,
    paused: AtomicBool,
    format: AudioFormat,
}

/// An open cpal stream. The stream itself lives on a dedicated thread
/// since it cannot move between threads on every platform.
pub struct CpalSink {
    shared: Arc<StreamShared>,
    commands: Sender<StreamCommand>,
    thread: Option<JoinHandle<()>>,
}

impl CpalSink {
    fn open(preferred_device: Option<String>, format: AudioFormat) -> Result<Self, DeviceError> {
        let shared = Arc::new(StreamShared {
            pcm: Mutex::new(None),
            cursor: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            paused: AtomicBool::new(false),
            format,
        });

        let (command_tx, command_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        let thread_shared = Arc::clone(&shared);

        let thread = thread::Builder::new()
            .name("pcm-output".to_string())
            .spawn(move || {
                run_output_thread(preferred_device, thread_shared, command_rx, ready_tx)
            })
            .map_err(|e| DeviceError::OpenFailed(format!("failed to spawn output thread: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                shared,
                commands: command_tx,
                thread: Some(thread),
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(DeviceError::OpenFailed("output thread exited during setup".to_string()))
            }
        }
    }
}

impl SinkHandle for CpalSink {
    fn write(&mut self, pcm: PcmSlice) -> Result<(), DeviceError> {
        if self.thread.is_none() {
            return Err(DeviceError::WriteFailed("device is closed".to_string()));
        }

        let mut current = self.shared.pcm.lock().unwrap_or_else(PoisonError::into_inner);
        self.shared.cursor.store(0, Ordering::Release);
        self.shared.total.store(pcm.len(), Ordering::Release);
        *current = Some(pcm);
        Ok(())
    }

    fn pause(&mut self) {
        self.shared.paused.store(true, Ordering::Release);
        let _ = self.commands.send(StreamCommand::Pause);
    }

    fn resume(&mut self) {
        self.shared.paused.store(false, Ordering::Release);
        let _ = self.commands.send(StreamCommand::Resume);
    }

    fn reset(&mut self) -> Result<(), DeviceError> {
        if self.thread.is_none() {
            return Err(DeviceError::ResetFailed("device is closed".to_string()));
        }

        let mut current = self.shared.pcm.lock().unwrap_or_else(PoisonError::into_inner);
        *current = None;
        self.shared.cursor.store(0, Ordering::Release);
        self.shared.total.store(0, Ordering::Release);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.commands.send(StreamCommand::Close);
            if thread.join().is_err() {
                log::error!("Audio output thread panicked");
            }
        }
    }

    fn consumed_bytes(&self) -> usize {
        let total = self.shared.total.load(Ordering::Acquire);
        self.shared.cursor.load(Ordering::Acquire).min(total)
    }

    fn is_drained(&self) -> bool {
        let total = self.shared.total.load(Ordering::Acquire);
        self.shared.cursor.load(Ordering::Acquire) >= total
    }
}

impl Drop for CpalSink {
    fn drop(&mut self) {
        self.close();
    }
}

fn select_device(host: &cpal::Host, preferred: Option<&str>) -> Result<cpal::Device, DeviceError> {
    match preferred {
        Some(name) => host
            .output_devices()
            .map_err(|e| DeviceError::OpenFailed(format!("cannot enumerate devices: {}", e)))?
            .find(|device| device.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| DeviceError::DeviceNotFound {
                device: name.to_string(),
            }),
        None => host.default_output_device().ok_or(DeviceError::NoDevice),
    }
}

fn run_output_thread(
    preferred_device: Option<String>,
    shared: Arc<StreamShared>,
    commands: Receiver<StreamCommand>,
    ready: Sender<Result<(), DeviceError>>,
) {
    // Set high priority for audio thread (platform-specific)
    #[cfg(target_os = "macos")]
    unsafe {
        let thread = libc::pthread_self();
        let mut policy: libc::c_int = 0;
        let mut param: libc::sched_param = std::mem::zeroed();

        if libc::pthread_getschedparam(thread, &mut policy, &mut param) == 0 {
            param.sched_priority = 63;
            let _ = libc::pthread_setschedparam(thread, libc::SCHED_FIFO, &param);
        }
    }

    let stream = match open_stream(preferred_device.as_deref(), &shared) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready.send(Err(DeviceError::OpenFailed(format!("failed to start stream: {}", e))));
        return;
    }

    if ready.send(Ok(())).is_err() {
        return;
    }

    // A dropped sender ends the loop the same way Close does
    while let Ok(command) = commands.recv() {
        match command {
            StreamCommand::Pause => {
                if let Err(e) = stream.pause() {
                    log::warn!("Failed to pause output stream: {}", e);
                }
            }
            StreamCommand::Resume => {
                if let Err(e) = stream.play() {
                    log::warn!("Failed to resume output stream: {}", e);
                }
            }
            StreamCommand::Close => break,
        }
    }

    let _ = stream.pause();
}

fn open_stream(preferred_device: Option<&str>, shared: &Arc<StreamShared>) -> Result<Stream, DeviceError> {
    let host = cpal::default_host();
    let device = select_device(&host, preferred_device)?;

    let default_config = device
        .default_output_config()
        .map_err(|e| DeviceError::OpenFailed(format!("failed to get default config: {}", e)))?;

    let config = StreamConfig {
        channels: shared.format.channels,
        sample_rate: SampleRate(shared.format.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    log::debug!(
        "Opening output stream: {} ({:?} device samples)",
        shared.format.format_description(),
        default_config.sample_format()
    );

    match default_config.sample_format() {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, shared),
        SampleFormat::I16 => build_stream::<i16>(&device, &config, shared),
        SampleFormat::U16 => build_stream::<u16>(&device, &config, shared),
        SampleFormat::I32 => build_stream::<i32>(&device, &config, shared),
        sample_format => Err(DeviceError::OpenFailed(format!(
            "unsupported device sample format: {:?}",
            sample_format
        ))),
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    shared: &Arc<StreamShared>,
) -> Result<Stream, DeviceError>
where
    T: cpal::Sample + cpal::SizedSample + Send + 'static,
    T: cpal::FromSample<f32>,
{
    let shared = Arc::clone(shared);
    let bit_depth = shared.format.bit_depth;
    let bytes_per_sample = shared.format.bytes_per_sample() as usize;

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let silence = <T as cpal::Sample>::from_sample::<f32>(0.0);

                if shared.paused.load(Ordering::Acquire) {
                    data.fill(silence);
                    return;
                }

                // Never block the realtime thread; a busy lock means a write or reset is in flight
                let current = match shared.pcm.try_lock() {
                    Ok(current) => current,
                    Err(_) => {
                        data.fill(silence);
                        return;
                    }
                };

                let bytes = match current.as_ref() {
                    Some(slice) => slice.as_bytes(),
                    None => {
                        data.fill(silence);
                        return;
                    }
                };

                let mut cursor = shared.cursor.load(Ordering::Acquire);
                for out in data.iter_mut() {
                    if cursor + bytes_per_sample <= bytes.len() {
                        let sample = decode_sample(&bytes[cursor..cursor + bytes_per_sample], bit_depth);
                        *out = <T as cpal::Sample>::from_sample::<f32>(sample);
                        cursor += bytes_per_sample;
                    } else {
                        *out = silence;
                    }
                }

                if cursor + bytes_per_sample > bytes.len() {
                    cursor = bytes.len();
                }
                shared.cursor.store(cursor, Ordering::Release);
            },
            move |err| {
                log::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| DeviceError::OpenFailed(format!("failed to build output stream: {}", e)))
}

/// Convert one little-endian PCM sample to f32 in [-1.0, 1.0)
fn decode_sample(bytes: &[u8], bit_depth: u16) -> f32 {
    match bit_depth {
        8 => (bytes[0] as f32 - 128.0) / 128.0,
        16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f32 / 32768.0,
        24 => {
            let raw = (bytes[0] as i32) | ((bytes[1] as i32) << 8) | ((bytes[2] as i32) << 16);
            // Sign-extend from 24 bits
            ((raw << 8) >> 8) as f32 / 8_388_608.0
        }
        32 => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32 / 2_147_483_648.0,
        _ => 0.0,
    }
}
