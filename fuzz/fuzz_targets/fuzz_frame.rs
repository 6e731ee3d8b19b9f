#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use sfs_protocol::protocol::{self, SfsCodec};
use tokio_util::codec::Decoder;

fuzz_target!(|data: &[u8]| {
    let _ = protocol::decode(data);

    // Streaming decoder: split frames, then decode each one
    let mut codec = SfsCodec::default();
    let mut src = BytesMut::from(data);
    while let Ok(Some(frame)) = codec.decode(&mut src) {
        let _ = codec.decode_message(&frame);
    }
});
