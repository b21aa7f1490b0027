// ReplaySource - file-backed byte source
//
// Replays a raw capture of the amplifier's serial stream through the
// ByteSource contract, which is how sessions run without hardware attached
// (and how the integration tests drive the controller). The source reports
// closed once the capture is exhausted.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::AcquisitionError;
use crate::session::ByteSource;

#[derive(Debug)]
pub struct ReplaySource {
    file: Option<File>,
    path: String,
}

impl ReplaySource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AcquisitionError> {
        let path_display = path.as_ref().display().to_string();
        let file = File::open(&path).map_err(|err| AcquisitionError::Unavailable {
            source: path_display.clone(),
            details: err.to_string(),
        })?;
        tracing::info!("Replaying capture {path_display}");
        Ok(Self {
            file: Some(file),
            path: path_display,
        })
    }
}

impl ByteSource for ReplaySource {
    fn read(&mut self, n: usize) -> std::io::Result<Vec<u8>> {
        let Some(file) = self.file.as_mut() else {
            return Ok(Vec::new());
        };

        let mut buf = vec![0u8; n];
        let mut filled = 0usize;
        while filled < n {
            match file.read(&mut buf[filled..])? {
                0 => break,
                read => filled += read,
            }
        }
        buf.truncate(filled);

        if filled < n {
            tracing::info!("Capture {} exhausted", self.path);
            self.file = None;
        }
        Ok(buf)
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn close(&mut self) {
        self.file = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_capture(name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("spikersong-capture-{name}"));
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_reads_in_chunks_until_exhausted() {
        let path = temp_capture("chunks.bin", &[1, 2, 3, 4, 5]);
        let mut source = ReplaySource::open(&path).unwrap();

        assert_eq!(source.read(2).unwrap(), vec![1, 2]);
        assert!(source.is_open());
        assert_eq!(source.read(4).unwrap(), vec![3, 4, 5]);
        assert!(!source.is_open(), "short read marks the capture exhausted");
        assert!(source.read(4).unwrap().is_empty());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_capture_is_unavailable() {
        let err = ReplaySource::open("/nonexistent/capture.bin").unwrap_err();
        assert!(matches!(err, AcquisitionError::Unavailable { .. }));
    }

    #[test]
    fn test_close_stops_reads() {
        let path = temp_capture("close.bin", &[9; 16]);
        let mut source = ReplaySource::open(&path).unwrap();
        source.close();
        assert!(!source.is_open());
        assert!(source.read(8).unwrap().is_empty());
        std::fs::remove_file(&path).ok();
    }
}
