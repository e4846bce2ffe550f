// THEORY:
// The `Pixel` module is the lowest-level data object of the toolkit. It is a
// "dumb" container for one 3-channel RGB sample and the handful of scalar
// reductions every higher layer is built on: the perceptual luminance value
// (the Y of the Y'CbCr transform) and the plain channel average.
//
// Key architectural principles:
// 1.  **Single Source of the Luminance Formula**: the weights 0.299/0.587/0.114
//     appear exactly once, here. Sample extraction, edge detection, and
//     histogram equalization all derive their grayscale view through this
//     module, so the three pipelines can never drift apart.
// 2.  **Data Container**: a `Pixel` performs calculations on its own channels
//     and nothing else. Comparing, clustering, and remapping pixels is the
//     job of the higher modules.

pub mod pixel {
    type Byte = u8;
    type Bytes = Vec<Byte>;
    pub type Channel = Byte;
    pub type Luminance = f64;
    /// A grayscale intensity level in [0, 255].
    pub type GrayLevel = u8;

    const CHANNELS: usize = 3;

    /// A "dumb" data container for one RGB pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        pub red: Channel,
        pub green: Channel,
        pub blue: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel { red, green, blue }
        }

        /// The real-valued luminance, Y = 0.299R + 0.587G + 0.114B.
        pub fn luminance(&self) -> Luminance {
            0.299 * self.red as f64 + 0.587 * self.green as f64 + 0.114 * self.blue as f64
        }

        /// The luminance rounded and clamped into a gray level.
        pub fn luminance_level(&self) -> GrayLevel {
            self.luminance().round().clamp(0.0, 255.0) as GrayLevel
        }

        /// The plain channel average, (R + G + B) / 3 with truncating division.
        pub fn average_level(&self) -> GrayLevel {
            ((self.red as u16 + self.green as u16 + self.blue as u16) / 3) as GrayLevel
        }

        pub fn channels(&self) -> [Channel; CHANNELS] {
            [self.red, self.green, self.blue]
        }
    }

    impl From<&[Byte]> for Pixel {
        fn from(bytes: &[Byte]) -> Self {
            if bytes.len() != CHANNELS {
                panic!("Cannot convert {} bytes into pixel.", bytes.len());
            }
            Pixel::new(bytes[0], bytes[1], bytes[2])
        }
    }

    impl From<Pixel> for Bytes {
        fn from(pixel: Pixel) -> Self {
            vec![pixel.red, pixel.green, pixel.blue]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pixel::*;

    #[test]
    fn luminance_of_white_is_full_scale() {
        let white = Pixel::new(255, 255, 255);
        assert_eq!(white.luminance_level(), 255);
    }

    #[test]
    fn luminance_weights_red_channel() {
        // 0.299 * 255 = 76.245 -> 76
        let red = Pixel::new(255, 0, 0);
        assert_eq!(red.luminance_level(), 76);
    }

    #[test]
    fn average_truncates() {
        // (10 + 20 + 41) / 3 = 23.66... -> 23
        let pixel = Pixel::new(10, 20, 41);
        assert_eq!(pixel.average_level(), 23);
    }

    #[test]
    fn round_trips_through_bytes() {
        let pixel = Pixel::from(&[1u8, 2, 3][..]);
        let bytes: Vec<u8> = pixel.into();
        assert_eq!(bytes, vec![1, 2, 3]);
    }
}
