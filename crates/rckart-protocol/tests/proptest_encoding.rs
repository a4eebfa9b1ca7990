//! Property-based tests for actuator payload encoding.

use proptest::prelude::*;
use rckart_protocol::{
    MotorEncoding, PAYLOAD_LEN, STEERING_MAX, decode_steering, encode_steering,
};

fn any_encoding() -> impl Strategy<Value = MotorEncoding> {
    prop_oneof![
        Just(MotorEncoding::SignedOffset),
        Just(MotorEncoding::Unsigned)
    ]
}

#[test]
fn steering_round_trip_over_full_domain() -> Result<(), Box<dyn std::error::Error>> {
    for angle in 0..=STEERING_MAX {
        let payload = encode_steering(angle)?;
        assert_eq!(decode_steering(&payload)?, angle);
    }
    Ok(())
}

#[test]
fn motor_round_trip_over_full_domain() -> Result<(), Box<dyn std::error::Error>> {
    for encoding in [MotorEncoding::SignedOffset, MotorEncoding::Unsigned] {
        let range = encoding.range();
        for speed in range.min..=range.max {
            let payload = encoding.encode(speed)?;
            assert_eq!(encoding.decode(&payload)?, speed, "{encoding:?} speed {speed}");
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Encoding succeeds exactly on the declared domain.
    #[test]
    fn prop_motor_encode_accepts_only_domain(encoding in any_encoding(), speed in any::<i16>()) {
        let result = encoding.encode(speed);
        prop_assert_eq!(result.is_ok(), encoding.range().contains(speed));
    }

    /// Encoding is strictly monotonic, so the vehicle sees the same ordering
    /// of speeds as the controller.
    #[test]
    fn prop_motor_encoding_monotonic(
        encoding in any_encoding(),
        a in -100i16..=100,
        b in -100i16..=100,
    ) {
        let range = encoding.range();
        prop_assume!(range.contains(a) && range.contains(b) && a < b);
        let ea = encoding.encode(a).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let eb = encoding.encode(b).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(ea[0] < eb[0], "{a} -> {ea:?}, {b} -> {eb:?}");
    }

    /// Every decodable byte re-encodes to itself.
    #[test]
    fn prop_decode_then_encode_identity(encoding in any_encoding(), byte in any::<u8>()) {
        if let Ok(speed) = encoding.decode(&[byte]) {
            let payload = encoding.encode(speed).map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(payload, [byte]);
        }
    }

    /// Payloads of any length other than one byte are rejected.
    #[test]
    fn prop_wrong_length_rejected(data in proptest::collection::vec(any::<u8>(), 0..8usize)) {
        prop_assume!(data.len() != PAYLOAD_LEN);
        prop_assert!(decode_steering(&data).is_err());
        prop_assert!(MotorEncoding::SignedOffset.decode(&data).is_err());
    }
}
