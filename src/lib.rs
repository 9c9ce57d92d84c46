pub mod catalog;
pub mod classifier;
pub mod config;
pub mod ingest;
pub mod server;

/// Logging and test utilities
pub mod util {
    use crate::config::DEFAULT_LOG_FILTER;
    use tracing_subscriber::EnvFilter;

    /// Install the global tracing subscriber. `RUST_LOG` wins over the
    /// built-in filter.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    #[cfg(test)]
    pub mod test {
        use crate::ingest::{self, DecodedImage};
        use base64::{engine::general_purpose, Engine as _};
        use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
        use std::io::Cursor;

        /// A small PNG with enough noise that it doesn't compress to nothing
        pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
            let img = RgbImage::from_fn(width, height, |x, y| {
                let v = (x * 31 + y * 17) as u8;
                Rgb([v, v.wrapping_mul(7), v ^ 0x5a])
            });

            let mut bytes: Vec<u8> = Vec::new();
            DynamicImage::ImageRgb8(img)
                .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
                .unwrap();
            bytes
        }

        pub fn png_base64(width: u32, height: u32) -> String {
            general_purpose::STANDARD.encode(png_bytes(width, height))
        }

        pub fn decoded_image() -> DecodedImage {
            ingest::decode_image(&png_bytes(2, 2)).unwrap()
        }
    }
}
