use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use pixdex::device::{DeviceFrame, DeviceFrameReader};

pub struct MonitorOptions {
    /// Snapshot magnification, 1 keeps the device resolution.
    pub scale: u32,
    pub snapshot_dir: Option<PathBuf>,
    pub max_frames: Option<u64>,
}

/// Timings of one received frame.
struct FrameTiming {
    read: Duration,
    decode: Duration,
    show: Duration,
    /// Wall clock time since the previous frame finished.
    wall: Duration,
}

impl FrameTiming {
    fn fps(&self) -> f64 {
        if self.wall.is_zero() {
            0.0
        } else {
            1.0 / self.wall.as_secs_f64()
        }
    }

    /// Payload throughput, header excluded.
    fn mib_per_sec(&self, payload_len: u32) -> f64 {
        let secs = self.read.as_secs_f64().max(1e-9);
        (f64::from(payload_len) / (1024.0 * 1024.0)) / secs
    }
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn save_snapshot(frame: &DeviceFrame, dir: &Path, scale: u32) -> Result<()> {
    let Some(img) = frame.to_rgb_image() else {
        return Ok(());
    };
    let img = if scale > 1 {
        imageops::resize(
            &img,
            img.width() * scale,
            img.height() * scale,
            FilterType::Nearest,
        )
    } else {
        img
    };
    let path = dir.join(format!("frame_{:06}.png", frame.header.frame_id));
    img.save(&path)
        .with_context(|| format!("Failed to write '{}'", path.display()))?;
    Ok(())
}

pub fn run(port: &Path, opts: &MonitorOptions) -> Result<()> {
    let file = File::open(port).with_context(|| format!("Failed to open '{}'", port.display()))?;
    let mut reader = DeviceFrameReader::new(BufReader::new(file));

    if let Some(dir) = &opts.snapshot_dir {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create '{}'", dir.display()))?;
    }

    log::info!("Reading device frames from '{}'", port.display());

    let mut received = 0u64;
    let mut last_frame = Instant::now();
    while opts.max_frames.map_or(true, |max| received < max) {
        let read_start = Instant::now();
        let Some(frame) = reader.next_frame()? else {
            break;
        };
        let read = read_start.elapsed();

        let decode_start = Instant::now();
        let decoded = frame.to_rgb_image();
        let decode = decode_start.elapsed();

        let show_start = Instant::now();
        if let Some(dir) = &opts.snapshot_dir {
            save_snapshot(&frame, dir, opts.scale)?;
        }
        let show = show_start.elapsed();

        let now = Instant::now();
        let timing = FrameTiming {
            read,
            decode,
            show,
            wall: now - last_frame,
        };
        last_frame = now;
        received += 1;

        if decoded.is_none() {
            log::warn!("frame {} could not be decoded", frame.header.frame_id);
        }

        let header = &frame.header;
        log::info!(
            "fid={:6} read={:6.2}ms decode={:6.2}ms show={:6.2}ms | draw(dev)={:6.2}ms | total={:6.2}ms | fps={:5.1} | thr={:4.2} MiB/s",
            header.frame_id,
            ms(timing.read),
            ms(timing.decode),
            ms(timing.show),
            ms(header.draw_time()),
            ms(timing.read + timing.decode + timing.show),
            timing.fps(),
            timing.mib_per_sec(header.payload_len),
        );
    }

    log::info!(
        "{} frames received, {} bytes skipped while resyncing",
        received,
        reader.skipped_bytes()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_file_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let capture = dir.path().join("capture.raw");
        let mut bytes = vec![0xaa, 0xbb];
        bytes.extend(DeviceFrame::from_pixels(2, 1, 3, &[0xf800, 0x001f]).to_bytes());
        bytes.extend(DeviceFrame::from_pixels(2, 1, 4, &[0x07e0, 0xffff]).to_bytes());
        fs::write(&capture, bytes).unwrap();

        let shots = dir.path().join("shots");
        run(
            &capture,
            &MonitorOptions {
                scale: 2,
                snapshot_dir: Some(shots.clone()),
                max_frames: Some(1),
            },
        )
        .unwrap();

        let first = image::open(shots.join("frame_000003.png")).unwrap().to_rgb8();
        assert_eq!(first.dimensions(), (4, 2));
        assert_eq!(first.get_pixel(3, 1).0, [0, 0, 248]);
        // frame limit reached before the second frame
        assert!(!shots.join("frame_000004.png").exists());
    }

    #[test]
    fn test_empty_frame_does_not_stop_monitor() {
        let dir = tempfile::tempdir().unwrap();
        let capture = dir.path().join("capture.raw");
        let mut bytes = DeviceFrame::from_pixels(0, 0, 1, &[]).to_bytes();
        bytes.extend(DeviceFrame::from_pixels(2, 1, 2, &[0xf800, 0x001f]).to_bytes());
        fs::write(&capture, bytes).unwrap();

        let shots = dir.path().join("shots");
        run(
            &capture,
            &MonitorOptions {
                scale: 1,
                snapshot_dir: Some(shots.clone()),
                max_frames: None,
            },
        )
        .unwrap();

        assert!(!shots.join("frame_000001.png").exists());
        assert!(shots.join("frame_000002.png").is_file());
    }

    #[test]
    fn test_fps_of_zero_interval() {
        let timing = FrameTiming {
            read: Duration::from_millis(2),
            decode: Duration::ZERO,
            show: Duration::ZERO,
            wall: Duration::ZERO,
        };
        assert_eq!(timing.fps(), 0.0);
        assert!(timing.mib_per_sec(1024 * 1024) > 400.0);
    }
}
