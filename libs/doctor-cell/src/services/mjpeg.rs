use tracing::warn;

const SOI: [u8; 2] = [0xFF, 0xD8];
const EOI: [u8; 2] = [0xFF, 0xD9];

const MARKER_EOI: u8 = 0xD9;
const MARKER_SOS: u8 = 0xDA;
const MARKER_TEM: u8 = 0x01;

/// Upper bound on bytes held while waiting for a frame to complete.
pub const MAX_BUFFERED_BYTES: usize = 8 * 1024 * 1024;

/// Splits an MJPEG byte stream into individual JPEG frames.
///
/// Multipart boundaries and part headers are skipped implicitly: anything
/// outside an SOI..EOI span is discarded. The end of a frame is found by
/// walking its marker segments, so an EXIF thumbnail (a complete JPEG nested
/// in APP1) does not end the outer frame early.
#[derive(Debug)]
pub struct MjpegFrameReader {
    buffer: Vec<u8>,
    max_buffered: usize,
}

impl Default for MjpegFrameReader {
    fn default() -> Self {
        Self::new()
    }
}

impl MjpegFrameReader {
    pub fn new() -> Self {
        Self::with_limit(MAX_BUFFERED_BYTES)
    }

    pub fn with_limit(max_buffered: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_buffered,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);

        if self.buffer.len() > self.max_buffered {
            warn!(
                "Discarding {} buffered feed bytes without a complete frame",
                self.buffer.len()
            );
            self.buffer.clear();
        }
    }

    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        let start = match find_marker(&self.buffer, &SOI, 0) {
            Some(start) => start,
            None => {
                // A trailing 0xFF may be the first half of the next SOI.
                let keep = usize::from(self.buffer.last() == Some(&0xFF));
                let drop = self.buffer.len() - keep;
                self.buffer.drain(..drop);
                return None;
            }
        };

        let end = match find_frame_end(&self.buffer, start) {
            Some(end) => end,
            None => {
                self.buffer.drain(..start);
                return None;
            }
        };

        let frame = self.buffer[start..end].to_vec();
        self.buffer.drain(..end);
        Some(frame)
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

/// Index one past the EOI of the frame starting at `start`, or `None` while
/// the frame is still incomplete.
fn find_frame_end(buffer: &[u8], start: usize) -> Option<usize> {
    let mut pos = start + SOI.len();

    loop {
        let marker = match (buffer.get(pos), buffer.get(pos + 1)) {
            (Some(&0xFF), Some(&marker)) => marker,
            (Some(&0xFF), None) | (None, _) => return None,
            // Headers we cannot walk fall back to the first EOI.
            _ => return find_marker(buffer, &EOI, pos).map(|end| end + EOI.len()),
        };

        match marker {
            0xFF => pos += 1,
            MARKER_EOI => return Some(pos + EOI.len()),
            MARKER_TEM | 0xD0..=0xD7 => pos += 2,
            _ => {
                let length = usize::from(u16::from_be_bytes([
                    *buffer.get(pos + 2)?,
                    *buffer.get(pos + 3)?,
                ]));
                if length < 2 {
                    return find_marker(buffer, &EOI, pos + 2).map(|end| end + EOI.len());
                }

                pos += 2 + length;
                if marker == MARKER_SOS {
                    pos = skip_scan_data(buffer, pos)?;
                }
            }
        }
    }
}

/// Position of the first marker after entropy-coded scan data. Stuffed
/// `FF 00`, restart markers and fill bytes belong to the scan.
fn skip_scan_data(buffer: &[u8], from: usize) -> Option<usize> {
    let mut pos = from;

    loop {
        let ff = pos + buffer.get(pos..)?.iter().position(|&b| b == 0xFF)?;
        match *buffer.get(ff + 1)? {
            0x00 | 0xD0..=0xD7 | 0xFF => pos = ff + 1,
            _ => return Some(ff),
        }
    }
}

fn find_marker(haystack: &[u8], marker: &[u8; 2], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(marker.len())
        .position(|window| window == marker)
        .map(|pos| pos + from)
}
