//! Receiver binary log ids.

pub const BESTPOS: u16 = 42;
pub const GPGGA: u16 = 218;
pub const GPGSA: u16 = 221;
pub const GPRMC: u16 = 225;
pub const BESTXYZ: u16 = 241;

/// Human-readable name of a receiver log id.
pub fn log_name(message_id: u16) -> &'static str {
    match message_id {
        BESTPOS => "BESTPOS",
        GPGGA => "GPGGA",
        GPGSA => "GPGSA",
        GPRMC => "GPRMC",
        BESTXYZ => "BESTXYZ",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_ids() {
        assert_eq!(log_name(42), "BESTPOS");
        assert_eq!(log_name(241), "BESTXYZ");
        assert_eq!(log_name(GPRMC), "GPRMC");
    }

    #[test]
    fn unknown_id() {
        assert_eq!(log_name(0), "UNKNOWN");
        assert_eq!(log_name(u16::MAX), "UNKNOWN");
    }
}
