//! Fuzz target for client and server message decoding
//!
//! Feeds arbitrary text to both decoders to find:
//! - Parser panics on malformed JSON or unknown events
//! - Size checks that can be bypassed
//! - Messages that decode but fail to re-encode
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use fadu_proto::{ClientMessage, MAX_MESSAGE_SIZE, ServerMessage};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|text: &str| {
    if let Ok(message) = ClientMessage::decode(text) {
        assert!(text.len() <= MAX_MESSAGE_SIZE);
        let encoded = message.encode().unwrap();
        assert_eq!(ClientMessage::decode(&encoded).unwrap(), message);
    }

    let _ = ServerMessage::decode(text);
});
