//! Fuzz target: `validate_frame` + `parse_body`
//!
//! Arbitrary frames must either be rejected with a typed error or decode
//! to a packet whose key is 26 uppercase hex characters and whose two
//! integer views agree with the key.
//!
//! cargo fuzz run fuzz_packet_parser

#![no_main]

use hydrapurr::rfid::packet::TAG_HEX_LEN;
use hydrapurr::rfid::{parse_body, validate_frame};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for invert_required in [false, true] {
        let Ok(body) = validate_frame(data, invert_required) else {
            continue;
        };
        let Ok(packet) = parse_body(body, 0) else {
            continue;
        };

        assert_eq!(packet.hex_key.len(), TAG_HEX_LEN);
        assert!(packet.hex_key.bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b)));
        assert_eq!(format!("{:026X}", packet.id_be), packet.hex_key.as_str());
        assert_eq!(packet.raw_hex.len(), 2 * TAG_HEX_LEN);
    }

    // Bodies that skip frame validation are held to the same rules.
    if let Ok(packet) = parse_body(data, 0) {
        assert!(packet.id_be < 1u128 << 104);
        assert!(packet.id_le < 1u128 << 104);
    }
});
