mod tesseract;

pub use tesseract::TesseractCli;

use anyhow::Result;
use image::RgbaImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OcrBox {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

/// One recognized word in band pixel space, before scaling back.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrWord {
    pub text: String,
    pub confidence: f64,
    pub choice_count: u32,
    pub bbox: OcrBox,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrLine {
    pub words: Vec<OcrWord>,
}

pub trait OcrEngine {
    fn recognize(&mut self, band: &RgbaImage) -> Result<Vec<OcrLine>>;

    fn reset(&mut self) {}
}

/// Holds the engine for exactly one band. The engine is reset when the
/// session drops, on the error path as well as after a successful call.
pub struct BandSession<'a, E: OcrEngine + ?Sized> {
    engine: &'a mut E,
}

impl<'a, E: OcrEngine + ?Sized> BandSession<'a, E> {
    pub fn begin(engine: &'a mut E) -> Self {
        Self { engine }
    }

    pub fn recognize(&mut self, band: &RgbaImage) -> Result<Vec<OcrLine>> {
        self.engine.recognize(band)
    }
}

impl<E: OcrEngine + ?Sized> Drop for BandSession<'_, E> {
    fn drop(&mut self) {
        self.engine.reset();
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{Result, bail};
    use image::RgbaImage;

    use super::{BandSession, OcrEngine, OcrLine};

    #[derive(Default)]
    struct CountingEngine {
        fail: bool,
        calls: usize,
        resets: usize,
    }

    impl OcrEngine for CountingEngine {
        fn recognize(&mut self, _band: &RgbaImage) -> Result<Vec<OcrLine>> {
            self.calls += 1;
            if self.fail {
                bail!("engine crashed");
            }
            Ok(Vec::new())
        }

        fn reset(&mut self) {
            self.resets += 1;
        }
    }

    #[test]
    fn band_session_resets_engine_after_success() {
        let mut engine = CountingEngine::default();
        let band = RgbaImage::new(4, 4);
        {
            let mut session = BandSession::begin(&mut engine);
            session.recognize(&band).expect("recognize should succeed");
        }
        assert_eq!(engine.calls, 1);
        assert_eq!(engine.resets, 1);
    }

    #[test]
    fn band_session_resets_engine_after_failure() {
        let mut engine = CountingEngine {
            fail: true,
            ..CountingEngine::default()
        };
        let band = RgbaImage::new(4, 4);
        let result = {
            let mut session = BandSession::begin(&mut engine);
            session.recognize(&band)
        };
        assert!(result.is_err());
        assert_eq!(engine.resets, 1);
    }
}
