//! Calibration coefficient storage and the Bosch integer compensation
//! formulas for the BME280.

/// Registers 0x88..=0xA1
pub const BLOCK1_LEN: usize = 26;
/// Registers 0xE1..=0xE7
pub const BLOCK2_LEN: usize = 7;

/// Factory trim coefficients read from the device NVM at init
#[derive(Debug, Default, Clone)]
pub struct Calibration {
    dig_t1: u16,
    dig_t2: i16,
    dig_t3: i16,

    dig_p1: u16,
    dig_p2: i16,
    dig_p3: i16,
    dig_p4: i16,
    dig_p5: i16,
    dig_p6: i16,
    dig_p7: i16,
    dig_p8: i16,
    dig_p9: i16,

    dig_h1: u8,
    dig_h2: i16,
    dig_h3: u8,
    dig_h4: i16,
    dig_h5: i16,
    dig_h6: i8,
}

impl Calibration {
    /// Unpacks both calibration blocks. All multi-byte coefficients are
    /// little-endian; H4/H5 share a nibble-packed byte.
    pub fn parse(block1: &[u8; BLOCK1_LEN], block2: &[u8; BLOCK2_LEN]) -> Self {
        let le16 = |b: &[u8], i: usize| u16::from_le_bytes([b[i], b[i + 1]]);

        Self {
            dig_t1: le16(block1, 0),
            dig_t2: le16(block1, 2) as i16,
            dig_t3: le16(block1, 4) as i16,

            dig_p1: le16(block1, 6),
            dig_p2: le16(block1, 8) as i16,
            dig_p3: le16(block1, 10) as i16,
            dig_p4: le16(block1, 12) as i16,
            dig_p5: le16(block1, 14) as i16,
            dig_p6: le16(block1, 16) as i16,
            dig_p7: le16(block1, 18) as i16,
            dig_p8: le16(block1, 20) as i16,
            dig_p9: le16(block1, 22) as i16,

            dig_h1: block1[25],
            dig_h2: le16(block2, 0) as i16,
            dig_h3: block2[2],
            dig_h4: ((block2[3] as i16) << 4) | (block2[4] & 0x0F) as i16,
            dig_h5: ((block2[5] as i16) << 4) | (block2[4] >> 4) as i16,
            dig_h6: block2[6] as i8,
        }
    }

    /// Returns the temperature in degrees Celsius along with `t_fine`, the
    /// fine-resolution temperature the other two compensations depend on.
    pub fn compensate_temperature(&self, adc_t: i32) -> (f32, i32) {
        let var1 = (((adc_t >> 3) - ((self.dig_t1 as i32) << 1)) * self.dig_t2 as i32) >> 11;
        let var2 = (((((adc_t >> 4) - self.dig_t1 as i32) * ((adc_t >> 4) - self.dig_t1 as i32))
            >> 12)
            * self.dig_t3 as i32)
            >> 14;
        let t_fine = var1 + var2;
        let t = (t_fine * 5 + 128) >> 8;
        (t as f32 / 100.0, t_fine)
    }

    /// Returns the pressure in hPa (64-bit integer formula, Q24.8 Pa
    /// internally). Returns 0 when the coefficients would divide by zero.
    pub fn compensate_pressure(&self, adc_p: i32, t_fine: i32) -> f32 {
        let mut var1 = t_fine as i64 - 128000;
        let mut var2 = var1 * var1 * self.dig_p6 as i64;
        var2 += (var1 * self.dig_p5 as i64) << 17;
        var2 += (self.dig_p4 as i64) << 35;
        var1 = ((var1 * var1 * self.dig_p3 as i64) >> 8) + ((var1 * self.dig_p2 as i64) << 12);
        var1 = (((1i64 << 47) + var1) * self.dig_p1 as i64) >> 33;

        if var1 == 0 {
            return 0.0;
        }

        let mut p = 1_048_576 - adc_p as i64;
        p = (((p << 31) - var2) * 3125) / var1;
        var1 = ((self.dig_p9 as i64) * (p >> 13) * (p >> 13)) >> 25;
        var2 = ((self.dig_p8 as i64) * p) >> 19;
        p = ((p + var1 + var2) >> 8) + ((self.dig_p7 as i64) << 4);

        p as f32 / 25600.0
    }

    /// Returns the relative humidity in percent, clamped to 0..=100.
    pub fn compensate_humidity(&self, adc_h: i32, t_fine: i32) -> f32 {
        let vx = t_fine - 76800;
        let var1 = (((adc_h << 14) - ((self.dig_h4 as i32) << 20) - (self.dig_h5 as i32) * vx)
            + 16384)
            >> 15;
        let var2 = ((((((vx * self.dig_h6 as i32) >> 10)
            * (((vx * self.dig_h3 as i32) >> 11) + 32768))
            >> 10)
            + 2_097_152)
            * self.dig_h2 as i32
            + 8192)
            >> 14;
        let mut vx = var1 * var2;
        vx -= ((((vx >> 15) * (vx >> 15)) >> 7) * self.dig_h1 as i32) >> 4;
        let vx = vx.clamp(0, 419_430_400);
        (vx >> 12) as f32 / 1024.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Coefficients from the Bosch datasheet trimming example.
    fn datasheet_calibration() -> Calibration {
        Calibration {
            dig_t1: 27504,
            dig_t2: 26435,
            dig_t3: -1000,
            dig_p1: 36477,
            dig_p2: -10685,
            dig_p3: 3024,
            dig_p4: 2855,
            dig_p5: 140,
            dig_p6: -7,
            dig_p7: 15500,
            dig_p8: -14600,
            dig_p9: 6000,
            dig_h1: 75,
            dig_h2: 353,
            dig_h3: 0,
            dig_h4: 339,
            dig_h5: 0,
            dig_h6: 30,
        }
    }

    #[test]
    fn temperature_matches_datasheet_example() {
        let calib = datasheet_calibration();
        let (t, t_fine) = calib.compensate_temperature(519888);
        assert_eq!(t_fine, 128422);
        assert!((t - 25.08).abs() < 0.005, "temperature was {t}");
    }

    #[test]
    fn pressure_matches_datasheet_example() {
        let calib = datasheet_calibration();
        let (_, t_fine) = calib.compensate_temperature(519888);
        let p = calib.compensate_pressure(415148, t_fine);
        assert!((p - 1006.5325).abs() < 0.01, "pressure was {p}");
    }

    #[test]
    fn humidity_matches_reference_formula() {
        let calib = datasheet_calibration();
        let (_, t_fine) = calib.compensate_temperature(519888);
        let h = calib.compensate_humidity(32768, t_fine);
        assert!((h - 60.4805).abs() < 0.01, "humidity was {h}");
    }

    #[test]
    fn humidity_clamps_to_valid_range() {
        let calib = datasheet_calibration();
        let (_, t_fine) = calib.compensate_temperature(519888);
        assert!(calib.compensate_humidity(0, t_fine) >= 0.0);
        assert!(calib.compensate_humidity(65535, t_fine) <= 102.0);
    }

    #[test]
    fn pressure_is_zero_with_zeroed_coefficients() {
        let calib = Calibration::default();
        assert_eq!(calib.compensate_pressure(415148, 128422), 0.0);
    }

    #[test]
    fn parse_unpacks_nibble_packed_humidity_coefficients() {
        let mut block1 = [0u8; BLOCK1_LEN];
        block1[0..2].copy_from_slice(&27504u16.to_le_bytes());
        block1[2..4].copy_from_slice(&26435i16.to_le_bytes());
        block1[4..6].copy_from_slice(&(-1000i16).to_le_bytes());
        block1[6..8].copy_from_slice(&36477u16.to_le_bytes());
        block1[25] = 75;

        // H4 = 0x153 (339), H5 = 0x021 (33) packed around the shared byte
        let block2 = [0x61, 0x01, 0x00, 0x15, 0x13, 0x02, 0x1E];
        let calib = Calibration::parse(&block1, &block2);

        assert_eq!(calib.dig_t1, 27504);
        assert_eq!(calib.dig_t2, 26435);
        assert_eq!(calib.dig_t3, -1000);
        assert_eq!(calib.dig_p1, 36477);
        assert_eq!(calib.dig_h1, 75);
        assert_eq!(calib.dig_h2, 353);
        assert_eq!(calib.dig_h3, 0);
        assert_eq!(calib.dig_h4, 339);
        assert_eq!(calib.dig_h5, 33);
        assert_eq!(calib.dig_h6, 30);
    }
}
