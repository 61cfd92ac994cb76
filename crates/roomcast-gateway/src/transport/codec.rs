//! Inbound frame classification.
//!
//! Text frames carry broadcast payloads; binary frames are not part of the
//! protocol and are surfaced only so the caller can count and drop them.
//! Ping/Pong are answered by the WebSocket layer itself.

use axum::extract::ws::Message;
use bytes::Bytes;

#[derive(Debug, PartialEq, Eq)]
pub enum Inbound {
    Text(Bytes),
    Binary { bytes_len: usize },
    Ping,
    Pong,
    Close { code: Option<u16> },
}

pub fn decode(msg: Message) -> Inbound {
    match msg {
        Message::Text(s) => Inbound::Text(Bytes::from(s)),
        Message::Binary(b) => Inbound::Binary { bytes_len: b.len() },
        Message::Ping(_) => Inbound::Ping,
        Message::Pong(_) => Inbound::Pong,
        Message::Close(frame) => Inbound::Close {
            code: frame.map(|f| f.code),
        },
    }
}

#[cfg(test)]
mod tests {
    use axum::extract::ws::CloseFrame;

    use super::*;

    #[test]
    fn text_payload_is_kept_verbatim() {
        let got = decode(Message::Text("hello, 世界".into()));
        assert_eq!(got, Inbound::Text(Bytes::from("hello, 世界")));
    }

    #[test]
    fn binary_is_classified_not_forwarded() {
        assert_eq!(
            decode(Message::Binary(vec![1, 2, 3])),
            Inbound::Binary { bytes_len: 3 }
        );
    }

    #[test]
    fn close_carries_peer_code() {
        let frame = CloseFrame {
            code: 1000,
            reason: "bye".into(),
        };
        assert_eq!(
            decode(Message::Close(Some(frame))),
            Inbound::Close { code: Some(1000) }
        );
        assert_eq!(decode(Message::Close(None)), Inbound::Close { code: None });
    }
}
