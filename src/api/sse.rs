// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Minimal server-sent-events decoder over any buffered reader.

use std::io::{self, BufRead};

/// One dispatched event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// `event:` name; `None` means the default `message` type.
    pub event: Option<String>,
    pub data: String,
}

/// Iterator over the events of an SSE body.
///
/// Comment lines and unknown fields are skipped. An event without `data` is not
/// dispatched, and a trailing event not closed by a blank line is dropped.
/// A read error leaves the partial line and event in place, so iteration can
/// resume after a timeout.
pub struct SseReader<R> {
    reader: R,
    line: Vec<u8>,
    event: Option<String>,
    data: Option<String>,
}

impl<R: BufRead> SseReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            event: None,
            data: None,
        }
    }

    /// Apply one complete line; returns an event when a blank line closes one.
    fn take_line(&mut self) -> Option<SseEvent> {
        let raw = std::mem::take(&mut self.line);
        let text = String::from_utf8_lossy(&raw);
        let line = text.trim_end_matches(['\n', '\r']);

        if line.is_empty() {
            let event = self.event.take();
            return self.data.take().map(|data| SseEvent { event, data });
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => {
                let buf = self.data.get_or_insert_with(String::new);
                if !buf.is_empty() {
                    buf.push('\n');
                }
                buf.push_str(value);
            }
            "event" => self.event = Some(value.to_string()),
            _ => {}
        }
        None
    }
}

impl<R: BufRead> Iterator for SseReader<R> {
    type Item = io::Result<SseEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.reader.read_until(b'\n', &mut self.line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(err) => return Some(Err(err)),
            }
            if let Some(event) = self.take_line() {
                return Some(Ok(event));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(body: &str) -> Vec<SseEvent> {
        SseReader::new(body.as_bytes())
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn decodes_data_events() {
        let body = ": keepalive\n\
                    data: {\"progress\":1,\"total\":2,\"status\":\"processing\"}\n\n\
                    event: done\r\n\
                    data:{\"progress\":2,\r\n\
                    data: \"total\":2}\r\n\r\n";
        let got = events(body);
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].event, None);
        assert_eq!(
            got[0].data,
            r#"{"progress":1,"total":2,"status":"processing"}"#
        );
        assert_eq!(got[1].event.as_deref(), Some("done"));
        assert_eq!(got[1].data, "{\"progress\":2,\n\"total\":2}");
    }

    #[test]
    fn unterminated_and_empty_events_are_dropped() {
        assert!(events("event: ping\n\n").is_empty());
        assert!(events("data: partial").is_empty());
        assert!(events("").is_empty());
    }

    /// Yields scripted chunks, failing with a timeout where the script says so.
    struct Stalling {
        chunks: Vec<Option<&'static [u8]>>,
    }

    impl io::Read for Stalling {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.chunks.is_empty() {
                return Ok(0);
            }
            match self.chunks.remove(0) {
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(chunk);
                    Ok(chunk.len())
                }
                None => Err(io::Error::new(io::ErrorKind::TimedOut, "quiet")),
            }
        }
    }

    #[test]
    fn resumes_after_a_read_timeout() {
        let source = Stalling {
            chunks: vec![
                Some(b"event: tick\ndata: {\"progr"),
                None,
                Some(b"ess\":1}\n"),
                None,
                Some(b"\n"),
            ],
        };
        let mut reader = SseReader::new(io::BufReader::new(source));
        assert_eq!(
            reader.next().map(|r| r.map_err(|e| e.kind())),
            Some(Err(io::ErrorKind::TimedOut))
        );
        assert!(matches!(reader.next(), Some(Err(_))));
        let event = reader.next().unwrap().unwrap();
        assert_eq!(event.event.as_deref(), Some("tick"));
        assert_eq!(event.data, r#"{"progress":1}"#);
        assert!(reader.next().is_none());
    }
}
