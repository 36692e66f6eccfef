// THEORY:
// The `Pixel` module is the most fundamental unit of the analysis engine. It is a
// "dumb" data container for a single RGB sample plus the one single-pixel
// heuristic every analyzer relies on: brightness, the plain mean of the three
// channels. Anything that needs more than one pixel (mirror comparison, regional
// averages, segment scanning) belongs to the higher-level analyzers.
//
// Alpha is never stored. Camera frames often arrive as RGBA; the fourth byte is
// accepted on conversion and discarded, since composition heuristics only look at
// visible intensity.

pub mod pixel {
    pub type Byte = u8;
    pub type Channel = Byte;
    pub type Brightness = f64;

    /// Bytes per pixel in the packed RGB layout used by `Frame`.
    pub const RGB_CHANNELS: usize = 3;
    /// Bytes per pixel in the packed RGBA layout delivered by most camera APIs.
    pub const RGBA_CHANNELS: usize = 4;

    /// A "dumb" data container representing a single RGB pixel.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
    }

    impl Pixel {
        pub const fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel { red, green, blue }
        }

        /// A gray pixel with all three channels set to `value`.
        pub const fn gray(value: Channel) -> Self {
            Pixel::new(value, value, value)
        }

        /// Mean of the three channels on the 0..255 scale.
        #[inline]
        pub fn brightness(&self) -> Brightness {
            (self.red as Brightness + self.green as Brightness + self.blue as Brightness) / 3.0
        }
    }

    impl TryFrom<&[Byte]> for Pixel {
        type Error = usize;

        /// Accepts RGB or RGBA bytes. On failure returns the offending length.
        fn try_from(bytes: &[Byte]) -> Result<Self, Self::Error> {
            match bytes.len() {
                RGB_CHANNELS | RGBA_CHANNELS => Ok(Pixel::new(bytes[0], bytes[1], bytes[2])),
                len => Err(len),
            }
        }
    }

    impl From<Pixel> for [Byte; RGB_CHANNELS] {
        fn from(pixel: Pixel) -> Self {
            [pixel.red, pixel.green, pixel.blue]
        }
    }
}
