//! Speaker output through rodio.

use std::time::Duration;

use rodio::{buffer::SamplesBuffer, source::Zero, OutputStream, Sink, Source};
use tracing::debug;

use crate::{AudioDevice, AudioError, Frame};

/// Frames collected before a buffer is queued on the sink.
const FLUSH_FRAMES: usize = 512;
/// Queued buffers beyond which new audio is dropped instead of adding latency.
const MAX_QUEUED_BUFFERS: usize = 16;
/// Silence queued on open so frame jitter does not starve the sink.
const LEAD_IN: Duration = Duration::from_millis(60);
const CHANNELS: u16 = 2;

struct Output {
    // Dropping the stream closes the device, so it lives as long as the sink.
    _stream: OutputStream,
    sink: Sink,
    sample_rate: u32,
}

/// Device that plays rendered frames on the default output through rodio.
#[derive(Default)]
pub struct RodioDevice {
    output: Option<Output>,
    pending: Vec<f32>,
    dropped_buffers: u64,
}

impl RodioDevice {
    /// Creates a device; the output stream opens on [`AudioDevice::open`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers discarded because the sink was too far ahead.
    #[must_use]
    pub const fn dropped_buffers(&self) -> u64 {
        self.dropped_buffers
    }

    fn flush(&mut self) {
        let Some(output) = self.output.as_ref() else {
            return;
        };
        let samples = std::mem::take(&mut self.pending);
        if output.sink.len() >= MAX_QUEUED_BUFFERS {
            self.dropped_buffers += 1;
            debug!(queued = output.sink.len(), "audio backlog, dropping buffer");
            return;
        }
        output
            .sink
            .append(SamplesBuffer::new(CHANNELS, output.sample_rate, samples));
    }
}

impl AudioDevice for RodioDevice {
    fn open(&mut self, sample_rate: u32) -> Result<(), AudioError> {
        let unavailable = |reason: String| AudioError::Unavailable { reason };
        let (stream, handle) =
            OutputStream::try_default().map_err(|error| unavailable(error.to_string()))?;
        let sink = Sink::try_new(&handle).map_err(|error| unavailable(error.to_string()))?;
        sink.append(Zero::<f32>::new(CHANNELS, sample_rate).take_duration(LEAD_IN));
        self.output = Some(Output {
            _stream: stream,
            sink,
            sample_rate,
        });
        Ok(())
    }

    fn submit(&mut self, frames: &[Frame]) -> Result<(), AudioError> {
        if self.output.is_none() {
            return Err(AudioError::Rejected {
                frames: frames.len(),
                reason: "device was never opened".to_owned(),
            });
        }
        interleave_into(frames, &mut self.pending);
        if self.pending.len() >= FLUSH_FRAMES * usize::from(CHANNELS) {
            self.flush();
        }
        Ok(())
    }
}

impl std::fmt::Debug for RodioDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioDevice")
            .field("open", &self.output.is_some())
            .field("pending", &(self.pending.len() / usize::from(CHANNELS)))
            .field("dropped_buffers", &self.dropped_buffers)
            .finish()
    }
}

/// Appends `frames` as interleaved left/right samples clamped to full scale.
fn interleave_into(frames: &[Frame], samples: &mut Vec<f32>) {
    samples.reserve(frames.len() * usize::from(CHANNELS));
    for frame in frames {
        samples.push(frame.left.clamp(-1.0, 1.0));
        samples.push(frame.right.clamp(-1.0, 1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::{interleave_into, RodioDevice};
    use crate::{AudioDevice, AudioError, Frame};

    #[test]
    fn frames_interleave_left_first_and_clip() {
        let mut samples = vec![0.25];
        interleave_into(&[Frame::new(0.5, -0.5), Frame::new(1.5, -2.0)], &mut samples);
        assert_eq!(samples, vec![0.25, 0.5, -0.5, 1.0, -1.0]);
    }

    #[test]
    fn submitting_before_open_is_rejected() {
        let mut device = RodioDevice::new();
        let error = device
            .submit(&[Frame::ZERO; 4])
            .expect_err("no stream is open");
        assert!(matches!(error, AudioError::Rejected { frames: 4, .. }));
        assert_eq!(device.dropped_buffers(), 0);
    }
}
