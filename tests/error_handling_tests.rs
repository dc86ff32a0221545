use serprobe::{ProbeConfig, ProbeError, ProbePacket, ProbeResult, ProbeSession};
use std::error::Error;

/// Error handling tests
#[cfg(test)]
mod error_handling_tests {
    use super::*;

    #[test]
    fn test_error_types() {
        let errors = vec![
            ProbeError::Config { message: "Config error".to_string() },
            ProbeError::InvalidData("bad hex".to_string()),
            ProbeError::InvalidInput("bad base64".to_string()),
            ProbeError::Output("stdout closed".to_string()),
        ];

        for error in errors {
            let display = error.to_string();
            assert!(!display.is_empty(), "Error display should not be empty");
        }

        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProbeError>();
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "unplugged");
        let probe_error: ProbeError = io_error.into();
        assert!(matches!(probe_error, ProbeError::Io(_)));
    }

    #[test]
    fn test_port_open_error_keeps_source() {
        let error = ProbeError::PortOpen {
            path: "/dev/ttyUSB9".to_string(),
            source: serialport::Error::new(serialport::ErrorKind::NoDevice, "no such device"),
        };

        assert!(error.to_string().contains("/dev/ttyUSB9"));
        let source = error.source().expect("PortOpen should expose its source");
        assert!(source.to_string().contains("no such device"));
    }

    #[test]
    fn test_result_type() {
        fn parse(text: &str) -> ProbeResult<ProbePacket> {
            ProbePacket::from_hex("probe", text)
        }

        assert!(parse("7e 7f").is_ok());
        let err = parse("7e 7g").unwrap_err();
        assert!(err.to_string().contains("Invalid data format"));
    }

    #[test]
    fn test_session_rejects_invalid_config() {
        let mut config = ProbeConfig::default();
        config.packets.clear();

        match ProbeSession::new(config) {
            Err(ProbeError::Config { message }) => assert!(message.contains("no enabled packets")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("config without packets must be rejected"),
        }
    }
}
