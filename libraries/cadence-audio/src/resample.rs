//! Whole-buffer sample rate conversion
//!
//! Tracks are decoded fully into memory, so conversion runs once over the
//! complete signal instead of streaming. The sinc resampler's output delay is
//! trimmed so the result lines up with the input.

use crate::error::{AudioError, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

const CHUNK_FRAMES: usize = 1024;

/// Upper bound on flush rounds while draining the resampler's delay line
const MAX_FLUSHES: usize = 8;

fn sinc_params() -> SincInterpolationParameters {
    SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Cubic,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris,
    }
}

/// Convert interleaved samples from `input_rate` to `output_rate`.
///
/// Equal rates and empty input pass through unchanged.
pub fn resample(
    interleaved: &[f32],
    channels: usize,
    input_rate: u32,
    output_rate: u32,
) -> Result<Vec<f32>> {
    if input_rate == 0 || input_rate > 1_000_000 {
        return Err(AudioError::InvalidSampleRate(input_rate));
    }
    if output_rate == 0 || output_rate > 1_000_000 {
        return Err(AudioError::InvalidSampleRate(output_rate));
    }
    if channels == 0 || interleaved.len() % channels != 0 {
        return Err(AudioError::Resampling(format!(
            "{} samples do not divide into {} channels",
            interleaved.len(),
            channels
        )));
    }
    if input_rate == output_rate || interleaved.is_empty() {
        return Ok(interleaved.to_vec());
    }

    let ratio = f64::from(output_rate) / f64::from(input_rate);
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, sinc_params(), CHUNK_FRAMES, channels)
        .map_err(|e| AudioError::Resampling(format!("SincFixedIn creation failed: {}", e)))?;

    let planar = deinterleave(interleaved, channels);
    let frames = planar[0].len();
    let expected = (frames as f64 * ratio).ceil() as usize;
    let delay = resampler.output_delay();

    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(expected + delay); channels];
    let mut pos = 0;

    while frames - pos >= resampler.input_frames_next() {
        let needed = resampler.input_frames_next();
        let chunk: Vec<&[f32]> = planar.iter().map(|c| &c[pos..pos + needed]).collect();
        let processed = resampler
            .process(&chunk, None)
            .map_err(|e| AudioError::Resampling(e.to_string()))?;
        append(&mut output, processed);
        pos += needed;
    }

    if pos < frames {
        let tail: Vec<&[f32]> = planar.iter().map(|c| &c[pos..]).collect();
        let processed = resampler
            .process_partial(Some(&tail), None)
            .map_err(|e| AudioError::Resampling(e.to_string()))?;
        append(&mut output, processed);
    }

    let mut flushes = 0;
    while output[0].len() < expected + delay && flushes < MAX_FLUSHES {
        let processed = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(|e| AudioError::Resampling(e.to_string()))?;
        if processed[0].is_empty() {
            break;
        }
        append(&mut output, processed);
        flushes += 1;
    }

    for channel in &mut output {
        let start = delay.min(channel.len());
        channel.drain(..start);
        channel.truncate(expected);
    }

    Ok(interleave(&output))
}

fn append(output: &mut [Vec<f32>], processed: Vec<Vec<f32>>) {
    for (out, chunk) in output.iter_mut().zip(processed) {
        out.extend_from_slice(&chunk);
    }
}

/// [L, R, L, R, ...] to [[L, L, ...], [R, R, ...]]
fn deinterleave(interleaved: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = interleaved.len() / channels;
    let mut planar = vec![Vec::with_capacity(frames); channels];
    for frame in interleaved.chunks_exact(channels) {
        for (ch, sample) in frame.iter().enumerate() {
            planar[ch].push(*sample);
        }
    }
    planar
}

fn interleave(planar: &[Vec<f32>]) -> Vec<f32> {
    let frames = planar.iter().map(Vec::len).min().unwrap_or(0);
    let mut interleaved = Vec::with_capacity(frames * planar.len());
    for i in 0..frames {
        for channel in planar {
            interleaved.push(channel[i]);
        }
    }
    interleaved
}
