//! Fuzz target: `router::route` and command decoding
//!
//! Treats the input as one received message at each node and on each
//! link.  Routing must never panic, only intact messages addressed to the
//! node may be delivered, and decoding a delivered payload must never
//! panic either.
//!
//! cargo fuzz run fuzz_message_route

#![no_main]

use apparatus::app::commands::{ClientCommand, ServerCommand};
use apparatus::link::Route;
use apparatus::protocol::Address;
use apparatus::router::{self, Decision};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for this in [Address::Server, Address::Client] {
        for origin in [Route::Serial, Route::Radio] {
            match router::route(this, origin, data) {
                Decision::Deliver(m) => {
                    assert!(m.length_ok() && m.checksum_ok());
                    assert_eq!(m.header.dst, this.as_u8());
                    if this == Address::Server {
                        let _ = ServerCommand::decode(m.header.msg_type, m.payload);
                    } else {
                        let _ = ClientCommand::decode(m.header.msg_type, m.payload);
                    }
                }
                Decision::Forward(link) => assert_ne!(link, origin),
                Decision::Reject { .. } | Decision::Drop(_) => {}
            }
        }
    }
});
