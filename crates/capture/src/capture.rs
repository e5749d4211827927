//! Capture loop
//!
//! Drives repeated bulk reads, streams payloads to a sink, and collects
//! statistics about what the device delivered.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

use tracing::{debug, info, warn};
use usb_reader::{BulkTransport, ReadError, Timeout, TransferRequest, read};

use crate::config::CaptureSettings;

/// First candidate size that evenly divides a non-empty chunk
pub fn detect_frame_size(len: usize, candidates: &[usize]) -> Option<usize> {
    if len == 0 {
        return None;
    }
    candidates
        .iter()
        .copied()
        .find(|&size| size != 0 && len % size == 0)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub reads: u64,
    pub bytes: u64,
    /// Reads that returned the full requested length
    pub full_reads: u64,
    pub short_reads: u64,
    /// Reads that returned nothing, usually a timeout
    pub empty_reads: u64,
    pub min_chunk: Option<usize>,
    pub max_chunk: usize,
    /// Chunk count per detected frame size
    pub frames: BTreeMap<usize, u64>,
    /// Non-empty chunks matching no frame size
    pub unframed: u64,
}

impl CaptureStats {
    pub fn record(&mut self, len: usize, requested: usize, frame_sizes: &[usize]) {
        self.reads += 1;
        self.bytes += len as u64;

        if len == 0 {
            self.empty_reads += 1;
        } else if len < requested {
            self.short_reads += 1;
        } else {
            self.full_reads += 1;
        }

        self.min_chunk = Some(self.min_chunk.map_or(len, |min| min.min(len)));
        self.max_chunk = self.max_chunk.max(len);

        if len > 0 {
            match detect_frame_size(len, frame_sizes) {
                Some(size) => *self.frames.entry(size).or_default() += 1,
                None => self.unframed += 1,
            }
        }
    }

    /// Frame size seen most often
    pub fn dominant_frame_size(&self) -> Option<usize> {
        self.frames
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(size, _)| *size)
    }
}

impl fmt::Display for CaptureStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reads:        {}", self.reads)?;
        writeln!(f, "Bytes:        {}", self.bytes)?;
        writeln!(
            f,
            "Full/short/empty: {}/{}/{}",
            self.full_reads, self.short_reads, self.empty_reads
        )?;
        writeln!(
            f,
            "Chunk size:   min {} max {}",
            self.min_chunk.unwrap_or(0),
            self.max_chunk
        )?;
        for (size, count) in &self.frames {
            writeln!(f, "  {} byte frames: {} chunks", size, count)?;
        }
        if self.unframed > 0 {
            writeln!(f, "  unframed:     {} chunks", self.unframed)?;
        }
        match self.dominant_frame_size() {
            Some(size) => write!(f, "Mode detected: {} bytes/frame", size),
            None => write!(f, "Mode detected: none"),
        }
    }
}

/// Outcome of a capture run
#[derive(Debug)]
pub struct CaptureReport {
    pub stats: CaptureStats,
    /// The read error that ended the run early, if any
    pub error: Option<ReadError>,
}

/// Issue `settings.reads` bulk reads and write every payload to `sink`.
///
/// A read error stops the run; it is returned in the report alongside the
/// statistics gathered so far. Only sink failures are returned as `Err`.
pub fn run_capture<T, W>(
    transport: &T,
    settings: &CaptureSettings,
    sink: &mut W,
) -> common::Result<CaptureReport>
where
    T: BulkTransport + ?Sized,
    W: Write,
{
    let request = TransferRequest::new(
        settings.endpoint,
        settings.length,
        Timeout::from_millis(settings.timeout_ms),
    );
    let mut stats = CaptureStats::default();

    info!(
        "Capturing {} reads of {} bytes from endpoint {}",
        settings.reads, request.length, request.endpoint
    );

    for index in 0..settings.reads {
        match read(transport, request) {
            Ok(payload) => {
                debug!("Read {}: {} bytes", index, payload.len());
                sink.write_all(&payload)?;
                stats.record(payload.len(), request.length, &settings.frame_sizes);
            }
            Err(error) => {
                warn!("Capture stopped after {} reads: {}", index, error);
                return Ok(CaptureReport {
                    stats,
                    error: Some(error),
                });
            }
        }
    }

    sink.flush()?;

    Ok(CaptureReport { stats, error: None })
}
