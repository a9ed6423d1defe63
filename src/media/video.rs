use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::foundation::core::Canvas;
use crate::foundation::error::{FramemarkError, FramemarkResult};

/// Probed properties of a video file.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoInfo {
    /// Source file.
    pub path: PathBuf,
    /// Native width in pixels.
    pub width: u32,
    /// Native height in pixels.
    pub height: u32,
    /// Frame rate numerator.
    pub fps_num: u32,
    /// Frame rate denominator.
    pub fps_den: u32,
    /// Container duration in seconds (0 when unknown).
    pub duration_sec: f64,
}

impl VideoInfo {
    /// Frames per second, 0 when unknown.
    pub fn fps(&self) -> f64 {
        if self.fps_den == 0 {
            0.0
        } else {
            f64::from(self.fps_num) / f64::from(self.fps_den)
        }
    }

    /// Native dimensions.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }
}

/// Playback times from `start` to `end` inclusive, one per frame at `fps`.
pub fn frame_times(start: f64, end: f64, fps: f64) -> Vec<f64> {
    if !(fps > 0.0) || !start.is_finite() || !end.is_finite() || end < start {
        return Vec::new();
    }
    let count = ((end - start) * fps).floor() as u64 + 1;
    (0..count).map(|i| start + i as f64 / fps).collect()
}

/// Wrap raw RGBA8 bytes as an image, checking the length.
pub fn frame_from_rgba8(width: u32, height: u32, bytes: Vec<u8>) -> FramemarkResult<RgbaImage> {
    let expected = width as usize * height as usize * 4;
    if expected == 0 || bytes.len() != expected {
        return Err(FramemarkError::media(format!(
            "decoded frame has {} bytes, expected {expected}",
            bytes.len()
        )));
    }
    RgbaImage::from_raw(width, height, bytes)
        .ok_or_else(|| FramemarkError::media("decoded frame buffer rejected"))
}

pub(crate) fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let (a, b) = s.split_once('/')?;
    let a = a.trim().parse::<u32>().ok()?;
    let b = b.trim().parse::<u32>().ok()?;
    if b == 0 {
        return None;
    }
    Some((a, b))
}

/// Probe a video with `ffprobe`.
#[cfg(feature = "media-ffmpeg")]
#[tracing::instrument(fields(path = %path.display()))]
pub fn probe_video(path: &Path) -> FramemarkResult<VideoInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| FramemarkError::media(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(FramemarkError::media(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| FramemarkError::media(format!("ffprobe json parse failed: {e}")))?;
    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| FramemarkError::media("no video stream found"))?;
    let (Some(width), Some(height)) = (video.width, video.height) else {
        return Err(FramemarkError::media("ffprobe reported no video dimensions"));
    };
    let (fps_num, fps_den) = parse_ff_ratio(video.r_frame_rate.as_deref().unwrap_or("0/1"))
        .ok_or_else(|| FramemarkError::media("invalid video r_frame_rate"))?;
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(VideoInfo {
        path: path.to_path_buf(),
        width,
        height,
        fps_num,
        fps_den,
        duration_sec,
    })
}

/// Probe a video with `ffprobe` (unavailable without the `media-ffmpeg` feature).
#[cfg(not(feature = "media-ffmpeg"))]
pub fn probe_video(_path: &Path) -> FramemarkResult<VideoInfo> {
    Err(FramemarkError::media(
        "video probing requires the 'media-ffmpeg' feature",
    ))
}

/// Decode `count` consecutive frames starting at `start_sec` with `ffmpeg`.
#[cfg(feature = "media-ffmpeg")]
pub fn decode_frames(
    info: &VideoInfo,
    start_sec: f64,
    count: u32,
) -> FramemarkResult<Vec<RgbaImage>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-ss", &format!("{start_sec:.9}")])
        .arg("-i")
        .arg(&info.path)
        .args([
            "-frames:v",
            &count.to_string(),
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ])
        .output()
        .map_err(|e| FramemarkError::media(format!("failed to run ffmpeg: {e}")))?;
    if !out.status.success() {
        return Err(FramemarkError::media(format!(
            "ffmpeg decode failed for '{}': {}",
            info.path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let frame_len = info.width as usize * info.height as usize * 4;
    if frame_len == 0 || !out.stdout.len().is_multiple_of(frame_len) {
        return Err(FramemarkError::media(format!(
            "decoded batch has {} bytes, expected a multiple of {frame_len}",
            out.stdout.len()
        )));
    }
    out.stdout
        .chunks_exact(frame_len)
        .take(count as usize)
        .map(|chunk| frame_from_rgba8(info.width, info.height, chunk.to_vec()))
        .collect()
}

/// Decode frames with `ffmpeg` (unavailable without the `media-ffmpeg` feature).
#[cfg(not(feature = "media-ffmpeg"))]
pub fn decode_frames(
    _info: &VideoInfo,
    _start_sec: f64,
    _count: u32,
) -> FramemarkResult<Vec<RgbaImage>> {
    Err(FramemarkError::media(
        "video decoding requires the 'media-ffmpeg' feature",
    ))
}

/// Decode the frame shown at `t` seconds.
pub fn decode_frame(info: &VideoInfo, t: f64) -> FramemarkResult<RgbaImage> {
    decode_frames(info, t, 1)?.pop().ok_or_else(|| {
        FramemarkError::media(format!(
            "ffmpeg returned no frame at {t:.3}s for '{}'",
            info.path.display()
        ))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/media/video.rs"]
mod tests;
