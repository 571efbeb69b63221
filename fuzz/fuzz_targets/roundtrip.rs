#![no_main]
use libfuzzer_sys::fuzz_target;
use lzss::{decode, encode, Strategy};

fuzz_target!(|data: &[u8]| {
    let (&pick, data) = match data.split_first() {
        Some(split) => split,
        None => return,
    };
    let strategy = Strategy::ALL[usize::from(pick) % Strategy::ALL.len()];

    let mut encoder = encode::Encoder::new(strategy);
    let mut buffer = Vec::with_capacity(2*data.len() + 40);
    let result = encoder.into_stream(&mut buffer).encode_all(data);
    assert!(result.status.is_ok(), "{:?}", result.status);

    let mut decoder = decode::Decoder::strict();
    let mut compare = vec![];
    let result = decoder.into_stream(&mut compare).decode_all(buffer.as_slice());
    assert!(result.status.is_ok(), "{:?}", result.status);
    assert_eq!(data, &*compare, "{}", strategy);
});
