// CRC-32 (ISO-HDLC), the checksum every PNG chunk carries over `type || data`
const POLYNOMIAL: u32 = 0xEDB8_8320;

// Built at compile time, read-only afterwards so it can be shared by any
// number of concurrent rewrites.
static CRC_TABLE: [u32; 256] = generate_table();

const fn generate_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 == 1 {
                crc = (crc >> 1) ^ POLYNOMIAL;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

// Make the checksum api be similiar to blake3's
#[derive(Debug, Clone)]
pub struct Checksum(u32);

impl Checksum {
    pub fn new() -> Checksum {
        Checksum(0xFFFF_FFFF)
    }

    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            let idx = ((self.0 ^ u32::from(byte)) & 0xFF) as usize;
            self.0 = (self.0 >> 8) ^ CRC_TABLE[idx];
        }
    }

    pub fn finalize(self) -> u32 {
        self.0 ^ 0xFFFF_FFFF
    }
}

impl Default for Checksum {
    fn default() -> Self {
        Checksum::new()
    }
}

pub fn crc32(data: &[u8]) -> u32 {
    let mut hash = Checksum::new();
    hash.update(data);
    hash.finalize()
}

#[cfg(test)]
mod test_crc32 {
    use super::*;

    #[test]
    fn empty() {
        assert_eq!(crc32(&[]), 0x0000_0000);
    }

    #[test]
    fn check_value() {
        // Published check value for CRC-32/ISO-HDLC
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn iend_chunk() {
        // Every PNG ends with `IEND` + `AE 42 60 82`
        assert_eq!(crc32(b"IEND"), 0xAE42_6082);
    }

    #[test]
    fn split_update() {
        let mut hash = Checksum::new();
        hash.update(b"tEXt");
        hash.update(b"Creation Time\0");
        hash.update(b"2024:01:02");

        assert_eq!(hash.finalize(), crc32(b"tEXtCreation Time\x002024:01:02"));
    }

    #[test]
    fn shared_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| crc32(b"123456789")))
            .collect();

        for h in handles {
            assert_eq!(h.join().unwrap(), 0xCBF4_3926);
        }
    }
}
