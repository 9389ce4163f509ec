//! # Framer Module
//!
//! Rebuilds newline-terminated command lines from serial reads that may split
//! a line anywhere.

/// Accumulates raw bytes and yields complete lines.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completes, in arrival order.
    ///
    /// Lines are decoded as UTF-8 with invalid sequences dropped, trimmed,
    /// and skipped when blank. Bytes after the last newline stay buffered for
    /// the next call.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = decode_permissive(&raw[..pos]);
            let line = line.trim();
            if !line.is_empty() {
                lines.push(line.to_string());
            }
        }
        lines
    }

    /// Number of buffered bytes not yet terminated by a newline.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// Decode UTF-8, silently dropping malformed sequences.
fn decode_permissive(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.push(b"PLAY_PAUSE\n"), vec!["PLAY_PAUSE"]);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn test_partial_line_is_kept() {
        let mut framer = LineFramer::new();
        assert!(framer.push(b"VOL_").is_empty());
        assert_eq!(framer.pending(), 4);
        assert_eq!(framer.push(b"UP\nNE"), vec!["VOL_UP"]);
        assert_eq!(framer.push(b"XT\n"), vec!["NEXT"]);
    }

    #[test]
    fn test_multiple_lines_in_one_chunk() {
        let mut framer = LineFramer::new();
        assert_eq!(
            framer.push(b"NEXT\nPREV\nVOL_MUTE\n"),
            vec!["NEXT", "PREV", "VOL_MUTE"]
        );
    }

    #[test]
    fn test_blank_lines_are_dropped() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.push(b"\n  \r\n\t\nNEXT\r\n"), vec!["NEXT"]);
    }

    #[test]
    fn test_invalid_utf8_is_dropped() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.push(b"VOL_\xff\xfeUP\n"), vec!["VOL_UP"]);
        assert!(framer.push(b"\xc3\n").is_empty());
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        let mut framer = LineFramer::new();
        let text = "NEXT é\n".as_bytes();
        let split = text.len() - 2;
        assert!(framer.push(&text[..split]).is_empty());
        assert_eq!(framer.push(&text[split..]), vec!["NEXT é"]);
    }

    #[test]
    fn test_chunking_invariance() {
        let stream: &[u8] =
            b"play_pause\n\nVOL_SET:75\r\n  next \n\xffPREV\nVOL_UP\nx\ntrailing";
        let expected = LineFramer::new().push(stream);
        assert_eq!(
            expected,
            vec!["play_pause", "VOL_SET:75", "next", "PREV", "VOL_UP", "x"]
        );

        for first in 0..=stream.len() {
            for second in first..=stream.len() {
                let mut framer = LineFramer::new();
                let mut lines = framer.push(&stream[..first]);
                lines.extend(framer.push(&stream[first..second]));
                lines.extend(framer.push(&stream[second..]));
                assert_eq!(lines, expected, "split at {first}/{second}");
                assert_eq!(framer.pending(), b"trailing".len());
            }
        }
    }

    #[test]
    fn test_byte_at_a_time() {
        let stream = b"VOL_DOWN\nVOL_MUTE\n";
        let mut framer = LineFramer::new();
        let lines: Vec<String> = stream.iter().flat_map(|b| framer.push(&[*b])).collect();
        assert_eq!(lines, vec!["VOL_DOWN", "VOL_MUTE"]);
    }
}
