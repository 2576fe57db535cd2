//! Text recognition backends.
use anyhow::Result;
use image::GrayImage;

/// Characters a legend numeral can contain.
pub const WHITELIST: &str = "0123456789°FC";

/// Recognize the text in a single grayscale image.
///
/// Implementations are stateful and used from one thread;
/// only the raw text is consumed, no confidence.
pub trait TextRecognizer {
    fn recognize(&mut self, image: &GrayImage) -> Result<String>;
}

/// Holds an engine handle that consuming API calls may lose.
/// A lost handle is rebuilt on next use, so one failed call
/// only costs that call.
pub struct EngineSlot<T> {
    handle: Option<T>,
    build: Box<dyn FnMut() -> Result<T>>,
}

impl<T> EngineSlot<T> {
    pub fn new(mut build: Box<dyn FnMut() -> Result<T>>) -> Result<Self> {
        let handle = build()?;
        Ok(EngineSlot {
            handle: Some(handle),
            build,
        })
    }

    /// The current handle, rebuilding it if the last user did
    /// not [`put_back`](EngineSlot::put_back) one.
    pub fn take(&mut self) -> Result<T> {
        match self.handle.take() {
            Some(handle) => Ok(handle),
            None => {
                tracing::warn!("recognition engine lost by a failed call, reinitializing");
                (self.build)()
            }
        }
    }

    pub fn put_back(&mut self, handle: T) {
        self.handle = Some(handle);
    }
}

#[cfg(feature = "ocr")]
pub use self::tess::TesseractEngine;

#[cfg(feature = "ocr")]
mod tess {
    use anyhow::{anyhow, Context, Result};
    use image::GrayImage;
    use tesseract::Tesseract;

    use super::{EngineSlot, TextRecognizer, WHITELIST};

    /// Tesseract restricted to [`WHITELIST`].
    ///
    /// The API handle is consumed by each builder step and
    /// dropped when a step fails; it is then recreated from
    /// the same data path and language.
    pub struct TesseractEngine {
        api: EngineSlot<Tesseract>,
    }

    fn init(datapath: Option<&str>, language: &str) -> Result<Tesseract> {
        Tesseract::new(datapath, Some(language))
            .map_err(|e| anyhow!("{}", e))
            .context("could not initialize tesseract")?
            .set_variable("tessedit_char_whitelist", WHITELIST)
            .map_err(|e| anyhow!("{}", e))
            .context("could not set tesseract whitelist")
    }

    impl TesseractEngine {
        pub fn new(datapath: Option<&str>, language: Option<&str>) -> Result<Self> {
            let datapath = datapath.map(String::from);
            let language = language.unwrap_or("eng").to_owned();
            let api = EngineSlot::new(Box::new(move || init(datapath.as_deref(), &language)))?;
            Ok(TesseractEngine { api })
        }
    }

    impl TextRecognizer for TesseractEngine {
        fn recognize(&mut self, image: &GrayImage) -> Result<String> {
            let (width, height) = image.dimensions();
            let mut api = self
                .api
                .take()?
                .set_frame(
                    image.as_raw(),
                    width as i32,
                    height as i32,
                    1,
                    width as i32,
                )
                .map_err(|e| anyhow!("{}", e))?
                .recognize()
                .map_err(|e| anyhow!("{}", e))?;
            let text = api.get_text().map_err(|e| anyhow!("{}", e));
            self.api.put_back(api);
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use anyhow::anyhow;

    use super::*;

    fn counted(fail_from: usize) -> (EngineSlot<usize>, Rc<Cell<usize>>) {
        let builds = Rc::new(Cell::new(0));
        let counter = builds.clone();
        let slot = EngineSlot::new(Box::new(move || {
            counter.set(counter.get() + 1);
            if counter.get() > fail_from {
                Err(anyhow!("init failed"))
            } else {
                Ok(counter.get())
            }
        }))
        .unwrap();
        (slot, builds)
    }

    #[test]
    fn returned_handle_is_reused() {
        let (mut slot, builds) = counted(usize::MAX);
        for _ in 0..3 {
            let handle = slot.take().unwrap();
            assert_eq!(handle, 1);
            slot.put_back(handle);
        }
        assert_eq!(builds.get(), 1);
    }

    #[test]
    fn lost_handle_is_rebuilt() {
        let (mut slot, builds) = counted(usize::MAX);
        // A failed call drops the handle instead of returning it.
        drop(slot.take().unwrap());
        assert_eq!(slot.take().unwrap(), 2);
        assert_eq!(builds.get(), 2);
    }

    #[test]
    fn failed_rebuild_is_retried_on_next_use() {
        let (mut slot, builds) = counted(1);
        drop(slot.take().unwrap());
        assert!(slot.take().is_err());
        assert!(slot.take().is_err());
        assert_eq!(builds.get(), 3);
    }
}
