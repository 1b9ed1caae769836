//! Fuzz target: `FrameReader::ingest` / `try_extract_frame`
//!
//! The first byte picks `max_frame_len`; the rest is split into uneven
//! chunks and streamed in. The reader must never panic, never hold more
//! than twice the frame bound, and never yield a frame longer than the
//! bound or without its markers.
//!
//! cargo fuzz run fuzz_frame_reader

#![no_main]

use hydrapurr::rfid::{ETX, FrameReader, STX};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&len_byte, rest)) = data.split_first() else {
        return;
    };
    let max_len = 4 + usize::from(len_byte) % 125;
    let mut reader = FrameReader::new(max_len);

    // Chunk sizes cycle through 1..=13 so fragmentation varies with input.
    let mut offset = 0;
    let mut step = 1;
    while offset < rest.len() {
        let end = (offset + step).min(rest.len());
        reader.ingest(&rest[offset..end]);
        assert!(reader.buffered() <= 2 * max_len);

        loop {
            match reader.try_extract_frame() {
                Ok(Some(frame)) => {
                    assert!(frame.len() <= max_len, "frame exceeds bound");
                    assert_eq!(frame.first(), Some(&STX));
                    assert_eq!(frame.last(), Some(&ETX));
                }
                Ok(None) => break,
                Err(_) => {}
            }
        }

        offset = end;
        step = step % 13 + 1;
    }

    reader.clear();
    assert_eq!(reader.buffered(), 0);
});
