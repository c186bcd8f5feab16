//! Frames streamed back from the display device.
//!
//! Every frame starts with a 22 byte little-endian header:
//!
//! ```text
//! [u32 magic][u16 width][u16 height][u8 bpp][u8 flags][u32 payload_len][u32 draw_us][u32 frame_id]
//! ```
//!
//! followed by `payload_len` bytes of big-endian RGB565 pixels, row-major.
//! A reader that loses sync drops one byte at a time until it finds a usable
//! header again.

use std::io::{self, Read};
use std::time::Duration;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use image::{Rgb, RgbImage};

use crate::rgb565::rgb565_to_rgb888;

/// Marks the start of a frame header.
pub const FRAME_MAGIC: u32 = 0xDEAD_BEEF;

/// Size of an encoded [`DeviceFrameHeader`].
pub const HEADER_SIZE: usize = 22;

/// Largest payload a reader accepts, a 2048×2048 RGB565 frame.
pub const MAX_PAYLOAD_LEN: usize = 2048 * 2048 * 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceFrameHeader {
    pub width: u16,
    pub height: u16,
    pub bpp: u8,
    pub flags: u8,
    pub payload_len: u32,
    /// Time the device spent drawing this frame, in microseconds.
    pub draw_us: u32,
    pub frame_id: u32,
}

impl DeviceFrameHeader {
    /// Parses a header, `None` if the magic doesn't match.
    pub fn parse(bytes: &[u8; HEADER_SIZE]) -> Option<Self> {
        if LittleEndian::read_u32(&bytes[0..4]) != FRAME_MAGIC {
            return None;
        }
        Some(Self {
            width: LittleEndian::read_u16(&bytes[4..6]),
            height: LittleEndian::read_u16(&bytes[6..8]),
            bpp: bytes[8],
            flags: bytes[9],
            payload_len: LittleEndian::read_u32(&bytes[10..14]),
            draw_us: LittleEndian::read_u32(&bytes[14..18]),
            frame_id: LittleEndian::read_u32(&bytes[18..22]),
        })
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        LittleEndian::write_u32(&mut bytes[0..4], FRAME_MAGIC);
        LittleEndian::write_u16(&mut bytes[4..6], self.width);
        LittleEndian::write_u16(&mut bytes[6..8], self.height);
        bytes[8] = self.bpp;
        bytes[9] = self.flags;
        LittleEndian::write_u32(&mut bytes[10..14], self.payload_len);
        LittleEndian::write_u32(&mut bytes[14..18], self.draw_us);
        LittleEndian::write_u32(&mut bytes[18..22], self.frame_id);
        bytes
    }

    /// Payload size implied by the frame dimensions, two bytes per pixel.
    pub fn expected_payload_len(&self) -> usize {
        self.width as usize * self.height as usize * 2
    }

    /// Why this header can't describe an RGB565 frame, `None` if it can.
    ///
    /// `bpp` is accepted both as bytes (2) and as bits (16) per pixel.
    pub fn defect(&self) -> Option<&'static str> {
        if self.width == 0 || self.height == 0 {
            Some("has no pixels")
        } else if !matches!(self.bpp, 2 | 16) {
            Some("is not RGB565")
        } else if self.payload_len as usize != self.expected_payload_len() {
            Some("has a payload length that doesn't match its size")
        } else if self.expected_payload_len() > MAX_PAYLOAD_LEN {
            Some("is too large")
        } else {
            None
        }
    }

    pub fn draw_time(&self) -> Duration {
        Duration::from_micros(u64::from(self.draw_us))
    }
}

/// A complete frame as received from the device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceFrame {
    pub header: DeviceFrameHeader,
    pub payload: Vec<u8>,
}

impl DeviceFrame {
    /// Builds a frame from RGB565 pixels, filling in the size fields.
    pub fn from_pixels(width: u16, height: u16, frame_id: u32, pixels: &[u16]) -> Self {
        let mut payload = vec![0u8; pixels.len() * 2];
        BigEndian::write_u16_into(pixels, &mut payload);
        Self {
            header: DeviceFrameHeader {
                width,
                height,
                bpp: 2,
                flags: 0,
                payload_len: payload.len() as u32,
                draw_us: 0,
                frame_id,
            },
            payload,
        }
    }

    /// Header followed by payload, as sent on the wire.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.payload.len());
        out.extend_from_slice(&self.header.to_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    /// RGB565 samples of the payload.
    pub fn pixels(&self) -> impl Iterator<Item = u16> + '_ {
        self.payload.chunks_exact(2).map(BigEndian::read_u16)
    }

    /// Decodes the payload to RGB888, `None` if it doesn't match the frame size.
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        if self.payload.len() != self.header.expected_payload_len() {
            return None;
        }
        let raw: Vec<u8> = self.pixels().flat_map(rgb565_to_rgb888).collect();
        RgbImage::from_raw(
            u32::from(self.header.width),
            u32::from(self.header.height),
            raw,
        )
    }

    /// Decoded pixel at (`x`, `y`).
    pub fn pixel(&self, x: u16, y: u16) -> Option<Rgb<u8>> {
        if x >= self.header.width || y >= self.header.height {
            return None;
        }
        let offset = (y as usize * self.header.width as usize + x as usize) * 2;
        let sample = self.payload.get(offset..offset + 2)?;
        Some(Rgb(rgb565_to_rgb888(BigEndian::read_u16(sample))))
    }
}

/// Pulls frames out of a byte stream, resynchronizing on corrupt data.
///
/// Headers with a wrong magic, or with a right magic but a [`defect`], are
/// skipped one byte at a time.
///
/// [`defect`]: DeviceFrameHeader::defect End of stream, even in
/// the middle of a frame, ends the iteration.
pub struct DeviceFrameReader<R> {
    inner: R,
    skipped: u64,
}

impl<R: Read> DeviceFrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, skipped: 0 }
    }

    /// Bytes thrown away while searching for a header so far.
    pub fn skipped_bytes(&self) -> u64 {
        self.skipped
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Fills `buf` completely, `false` on end of stream.
    fn fill(&mut self, buf: &mut [u8]) -> io::Result<bool> {
        match self.inner.read_exact(buf) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Reads the next valid frame, `Ok(None)` at end of stream.
    pub fn next_frame(&mut self) -> io::Result<Option<DeviceFrame>> {
        let mut window = [0u8; HEADER_SIZE];
        if !self.fill(&mut window)? {
            return Ok(None);
        }

        loop {
            match DeviceFrameHeader::parse(&window) {
                Some(header) if header.defect().is_none() => {
                    let mut payload = vec![0u8; header.payload_len as usize];
                    if !self.fill(&mut payload)? {
                        log::debug!("stream ended inside frame {}", header.frame_id);
                        return Ok(None);
                    }
                    return Ok(Some(DeviceFrame { header, payload }));
                }
                Some(header) => {
                    log::warn!(
                        "header of frame {} ({}x{}, bpp {}, {} payload bytes) {}, resyncing",
                        header.frame_id,
                        header.width,
                        header.height,
                        header.bpp,
                        header.payload_len,
                        header.defect().unwrap_or_default()
                    );
                }
                None => {}
            }

            window.copy_within(1.., 0);
            self.skipped += 1;
            if !self.fill(&mut window[HEADER_SIZE - 1..])? {
                return Ok(None);
            }
        }
    }
}

impl<R: Read> Iterator for DeviceFrameReader<R> {
    type Item = io::Result<DeviceFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}
