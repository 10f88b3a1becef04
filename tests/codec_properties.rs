use etekcity_scale::constants::{MAGIC_BYTE, MAX_PAYLOAD_LEN};
use etekcity_scale::{decode, encode, ScaleError};
use proptest::prelude::*;

fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD_LEN)
}

proptest! {
    /// Property: any type and payload that fits survives encode then decode
    #[test]
    fn prop_roundtrip_preserves_data(msg_type in any::<u8>(), payload in payload_strategy()) {
        let frame = encode(msg_type, &payload).unwrap();
        prop_assert_eq!(frame.len(), payload.len() + 4);

        let (decoded_type, decoded_payload) = decode(&frame).unwrap();
        prop_assert_eq!(decoded_type, msg_type);
        prop_assert_eq!(decoded_payload, payload.as_slice());
    }

    /// Property: a single flipped bit is caught by the length or checksum check
    #[test]
    fn prop_single_bit_flip_detected(
        msg_type in any::<u8>(),
        payload in prop::collection::vec(any::<u8>(), 0..64),
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let mut frame = encode(msg_type, &payload).unwrap();
        let offset = position.index(frame.len());
        frame[offset] ^= 1 << bit;

        let result = decode(&frame);
        prop_assert!(
            matches!(result, Err(ScaleError::LengthMismatch { .. }) | Err(ScaleError::ChecksumMismatch { .. })),
            "flip at {} bit {} gave {:?}", offset, bit, result
        );
    }

    /// Property: a frame with a valid checksum but the wrong magic is rejected
    #[test]
    fn prop_magic_enforced(
        msg_type in any::<u8>(),
        payload in prop::collection::vec(any::<u8>(), 0..64),
        magic in any::<u8>().prop_filter("must differ from the magic byte", |m| *m != MAGIC_BYTE),
    ) {
        let mut frame = encode(msg_type, &payload).unwrap();
        let last = frame.len() - 1;
        frame[2] = magic;
        frame[last] = frame[..last].iter().fold(0u8, |acc, &b| acc.wrapping_add(b));

        prop_assert!(matches!(decode(&frame), Err(ScaleError::MagicMismatch(m)) if m == magic));
    }

    /// Property: payloads longer than the length byte allows are refused, never truncated
    #[test]
    fn prop_oversized_payload_refused(extra in 1usize..64) {
        let payload = vec![0u8; MAX_PAYLOAD_LEN + extra];
        prop_assert!(matches!(encode(0x10, &payload), Err(ScaleError::Encoding(_))));
    }
}
