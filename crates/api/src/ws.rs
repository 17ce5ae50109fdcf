//! Adapter zwischen axum-WebSocket und transportunabhaengigen Frames

use axum::extract::ws::{Message, WebSocket};
use cinesync_signaling::Frame;
use futures_util::{Sink, SinkExt, Stream, StreamExt, future};

/// Macht aus einem axum-WebSocket einen `Frame`-Stream und -Sink
pub fn frames(
    socket: WebSocket,
) -> impl Stream<Item = Result<Frame, axum::Error>> + Sink<Frame, Error = axum::Error> + Send + 'static
{
    socket
        .with(|frame: Frame| future::ready(Ok::<_, axum::Error>(in_nachricht(frame))))
        .map(|ergebnis| ergebnis.map(aus_nachricht))
}

fn in_nachricht(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text),
        Frame::Binary(daten) => Message::Binary(daten),
        Frame::Ping(daten) => Message::Ping(daten),
        Frame::Pong(daten) => Message::Pong(daten),
        Frame::Close => Message::Close(None),
    }
}

fn aus_nachricht(nachricht: Message) -> Frame {
    match nachricht {
        Message::Text(text) => Frame::Text(text),
        Message::Binary(daten) => Frame::Binary(daten),
        Message::Ping(daten) => Frame::Ping(daten),
        Message::Pong(daten) => Frame::Pong(daten),
        Message::Close(_) => Frame::Close,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_ohne_grund() {
        assert!(matches!(in_nachricht(Frame::Close), Message::Close(None)));
        assert_eq!(aus_nachricht(Message::Close(None)), Frame::Close);
    }

    #[test]
    fn text_und_binaer_bleiben_erhalten() {
        assert_eq!(
            aus_nachricht(in_nachricht(Frame::Text("{}".into()))),
            Frame::Text("{}".into())
        );
        assert_eq!(
            aus_nachricht(Message::Binary(vec![1, 2])),
            Frame::Binary(vec![1, 2])
        );
    }
}
