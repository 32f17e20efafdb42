//! ArtDMX packet encoding (§4.8). Bit-exact and normative: any
//! implementation must interoperate with standard Art-Net receivers.

pub const ART_NET_PORT: u16 = 6454;
pub const MAX_CHANNELS_PER_UNIVERSE: usize = 512;

const ART_NET_ID: &[u8; 8] = b"Art-Net\0";
const OP_CODE_DMX: u16 = 0x0050;
const PROTOCOL_VERSION: u16 = 0x000e;

/// Encodes one ArtDMX packet for a single universe.
///
/// ```text
/// bytes 0..7  : "Art-Net\0"
/// bytes 8..9  : 0x0050 (ArtDMX opcode, little-endian)
/// bytes 10..11: 0x000e (protocol version, big-endian)
/// byte 12     : sequence (may be 0)
/// byte 13     : physical (0)
/// bytes 14..15: universe (little-endian)
/// bytes 16..17: data length (big-endian)
/// bytes 18..N : DMX data (1..512 bytes)
/// ```
pub fn encode_art_dmx(universe: u16, sequence: u8, data: &[u8]) -> Vec<u8> {
    debug_assert!(!data.is_empty() && data.len() <= MAX_CHANNELS_PER_UNIVERSE);
    let mut packet = Vec::with_capacity(18 + data.len());
    packet.extend_from_slice(ART_NET_ID);
    packet.extend_from_slice(&OP_CODE_DMX.to_le_bytes());
    packet.extend_from_slice(&PROTOCOL_VERSION.to_be_bytes());
    packet.push(sequence);
    packet.push(0); // physical
    packet.extend_from_slice(&universe.to_le_bytes());
    packet.extend_from_slice(&(data.len() as u16).to_be_bytes());
    packet.extend_from_slice(data);
    packet
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_matches_the_normative_layout() {
        let packet = encode_art_dmx(3, 7, &[1, 2, 3]);
        assert_eq!(&packet[0..8], b"Art-Net\0");
        assert_eq!(&packet[8..10], &[0x50, 0x00]);
        assert_eq!(&packet[10..12], &[0x00, 0x0e]);
        assert_eq!(packet[12], 7);
        assert_eq!(packet[13], 0);
        assert_eq!(&packet[14..16], &3u16.to_le_bytes());
        assert_eq!(&packet[16..18], &3u16.to_be_bytes());
        assert_eq!(&packet[18..21], &[1, 2, 3]);
    }

    #[test]
    fn total_length_is_header_plus_data() {
        let packet = encode_art_dmx(0, 0, &[0u8; 512]);
        assert_eq!(packet.len(), 18 + 512);
    }
}
