//! Unit tests for the IPC line codec.

use bytes::BytesMut;
use meeting_bridge::ipc::codec::{CommandCodec, MAX_LINE_BYTES};
use meeting_bridge::AppError;
use tokio_util::codec::{Decoder, Encoder};

#[test]
fn decodes_complete_lines() {
    let mut codec = CommandCodec::new();
    let mut buf = BytesMut::from("{\"method\":\"logout\"}\n{\"method\":");

    let first = codec.decode(&mut buf).expect("decode");
    assert_eq!(first.as_deref(), Some("{\"method\":\"logout\"}"));

    // Partial line stays buffered.
    assert_eq!(codec.decode(&mut buf).expect("decode"), None);

    buf.extend_from_slice(b"\"leave_meeting\"}\n");
    let second = codec.decode(&mut buf).expect("decode");
    assert_eq!(second.as_deref(), Some("{\"method\":\"leave_meeting\"}"));
}

#[test]
fn overlong_line_is_ipc_error() {
    let mut codec = CommandCodec::new();
    let mut buf = BytesMut::from(vec![b'a'; MAX_LINE_BYTES + 1].as_slice());

    let err = codec.decode(&mut buf).unwrap_err();
    assert!(matches!(err, AppError::Ipc(ref msg) if msg.starts_with("line too long")));
}

#[test]
fn final_unterminated_line_is_returned_at_eof() {
    let mut codec = CommandCodec::new();
    let mut buf = BytesMut::from("{\"method\":\"cancel\"}");
    let line = codec.decode_eof(&mut buf).expect("decode");
    assert_eq!(line.as_deref(), Some("{\"method\":\"cancel\"}"));
}

#[test]
fn encode_appends_newline() {
    let mut codec = CommandCodec::default();
    let mut buf = BytesMut::new();
    codec
        .encode("{\"ok\":true}".to_owned(), &mut buf)
        .expect("encode");
    assert_eq!(&buf[..], b"{\"ok\":true}\n");
}
