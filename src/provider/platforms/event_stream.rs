//! SSE (`text/event-stream`) 解码器

use bytes::BytesMut;
use serde_json::Value;
use std::io;
use tokio_util::codec::Decoder;

/// 一个完整的 SSE 事件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

impl SseEvent {
    /// OpenAI 风格的流结束标记
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.data.trim() == "[DONE]"
    }

    /// 将 data 解析为 JSON，非 JSON 时返回 `None`
    #[must_use]
    pub fn json(&self) -> Option<Value> {
        let payload = self.data.trim();
        if payload.is_empty() || self.is_done() {
            return None;
        }
        serde_json::from_str(payload).ok()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SseDecoder {
    current: SseEvent,
    has_any: bool,
}

impl SseDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn flush(&mut self) -> Option<SseEvent> {
        if !self.has_any {
            return None;
        }
        self.has_any = false;
        Some(std::mem::take(&mut self.current))
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.flush();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };

        match field {
            "data" => {
                if !self.current.data.is_empty() {
                    self.current.data.push('\n');
                }
                self.current.data.push_str(value);
                self.has_any = true;
            }
            "event" => {
                self.current.event = Some(value.to_string());
                self.has_any = true;
            }
            _ => {}
        }
        None
    }

    fn take_one_line(src: &mut BytesMut) -> io::Result<Option<String>> {
        let Some(pos) = src.iter().position(|b| *b == b'\n') else {
            return Ok(None);
        };
        let mut line_bytes = src.split_to(pos + 1);
        line_bytes.truncate(line_bytes.len() - 1);
        if line_bytes.ends_with(b"\r") {
            line_bytes.truncate(line_bytes.len() - 1);
        }
        String::from_utf8(line_bytes.to_vec())
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl Decoder for SseDecoder {
    type Item = SseEvent;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<Self::Item>> {
        while let Some(line) = Self::take_one_line(src)? {
            if let Some(ev) = self.process_line(&line) {
                return Ok(Some(ev));
            }
        }
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> io::Result<Option<Self::Item>> {
        if let Some(ev) = self.decode(src)? {
            return Ok(Some(ev));
        }
        if !src.is_empty() {
            let last = String::from_utf8(src.split_to(src.len()).to_vec())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            let last = last.trim_end_matches(['\r', '\n']);
            if let Some(ev) = self.process_line(last) {
                return Ok(Some(ev));
            }
        }
        Ok(self.flush())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(input: &str) -> Vec<SseEvent> {
        let mut decoder = SseDecoder::new();
        let mut buf = BytesMut::from(input);
        let mut events = Vec::new();
        while let Some(ev) = decoder.decode(&mut buf).unwrap() {
            events.push(ev);
        }
        while let Some(ev) = decoder.decode_eof(&mut buf).unwrap() {
            events.push(ev);
        }
        events
    }

    #[test]
    fn splits_events_on_blank_lines() {
        let events = decode_all("data: {\"a\":1}\n\n: keep-alive\n\ndata: [DONE]\n\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].json().unwrap()["a"], 1);
        assert!(events[1].is_done());
    }

    #[test]
    fn keeps_event_names_and_crlf() {
        let events = decode_all("event: content_block_delta\r\ndata: {\"x\":true}\r\n\r\n");
        assert_eq!(events[0].event.as_deref(), Some("content_block_delta"));
        assert_eq!(events[0].json().unwrap()["x"], true);
    }

    #[test]
    fn flushes_trailing_event_without_blank_line() {
        let events = decode_all("data: {\"tail\":1}");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].json().unwrap()["tail"], 1);
    }

    #[test]
    fn multi_line_data_is_joined() {
        let events = decode_all("data: first\ndata: second\n\n");
        assert_eq!(events[0].data, "first\nsecond");
        assert!(events[0].json().is_none());
    }
}
