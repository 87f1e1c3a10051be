//! Fuzz target: `Deframer::feed`
//!
//! Drives arbitrary byte sequences into the streaming COBS deframer and
//! asserts that it never panics, never yields an oversized message, and
//! that every message it yields re-frames to bytes it decodes identically.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use apparatus::protocol::codec::{self, Deframer, MAX_ENCODED};
use apparatus::protocol::message::MAX_MESSAGE;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut deframer = Deframer::new();

    deframer.feed(data, |result| {
        let Ok(message) = result else { return };
        assert!(message.len() <= MAX_MESSAGE, "message exceeds MAX_MESSAGE");

        let mut framed = [0u8; MAX_ENCODED + 1];
        let n = codec::encode_frame(&message, &mut framed).expect("decoded message must re-encode");
        let mut again = Deframer::new();
        let mut seen = 0;
        again.feed(&framed[..n], |r| {
            assert_eq!(r.ok().as_deref(), Some(&message[..]));
            seen += 1;
        });
        assert_eq!(seen, 1);
    });

    // After a reset the deframer must accept bytes cleanly again.
    deframer.reset();
    deframer.feed(data, |_| {});
});
