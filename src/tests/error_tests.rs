//! Unit tests for error reporting

use crate::error::*;

#[test]
fn test_protocol_desync_message() {
    let err = ReservoirError::ProtocolDesync {
        expected: 64,
        actual: 72,
    };
    assert_eq!(
        err.to_string(),
        "Reservoir desynchronized: controller holds 64 bits, frame declares 72 bits"
    );
}

#[test]
fn test_errors_convert_into_top_level() {
    let err: Error = ConfigError::UnsupportedSampleRate(96000).into();
    assert!(matches!(err, Error::Config(ConfigError::UnsupportedSampleRate(96000))));
    assert_eq!(err.to_string(), "Configuration error: Unsupported sample rate: 96000 Hz");

    let err: Error = ReservoirError::ProtocolDesync {
        expected: 0,
        actual: 8,
    }
    .into();
    assert!(matches!(err, Error::Reservoir(_)));

    let err: Error = SideInfoError::SlotOutOfRange {
        granule: 1,
        channel: 1,
        granules: 1,
        channels: 1,
    }
    .into();
    assert!(err.to_string().contains("(1, 1)"));
}
