//! crates/pharm_mentor_core/src/image_lab.rs
//!
//! The image-analysis feature area: the selected image, the loading flag,
//! the last analysis text and the last error.

use crate::domain::ImageUpload;
use crate::ports::{PortResult, Rejection};

const GENERIC_ANALYSIS_ERROR: &str = "Failed to analyze image lab scan.";

#[derive(Debug, Default)]
pub struct ImageLab {
    image: Option<ImageUpload>,
    loading: bool,
    result: Option<String>,
    error: Option<String>,
}

impl ImageLab {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> Option<&ImageUpload> {
        self.image.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Selects a new image, clearing the prior result and error immediately.
    pub fn select(&mut self, image: ImageUpload) -> Result<(), Rejection> {
        if self.loading {
            return Err(Rejection::Busy);
        }
        self.image = Some(image);
        self.result = None;
        self.error = None;
        Ok(())
    }

    /// Starts an analysis and returns the image to send.
    pub fn begin(&mut self) -> Result<ImageUpload, Rejection> {
        if self.loading {
            return Err(Rejection::Busy);
        }
        let image = self.image.clone().ok_or(Rejection::NoImage)?;
        self.loading = true;
        self.error = None;
        Ok(image)
    }

    /// Records the outcome of the analysis started by `begin`.
    pub fn finish(&mut self, outcome: PortResult<String>) {
        self.loading = false;
        match outcome {
            Ok(text) => self.result = Some(text),
            Err(e) => {
                let message = e.to_string();
                self.error = Some(if message.trim().is_empty() {
                    GENERIC_ANALYSIS_ERROR.to_string()
                } else {
                    message
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PortError;

    fn png(byte: u8) -> ImageUpload {
        ImageUpload::new("image/png", vec![byte]).unwrap()
    }

    #[test]
    fn selection_clears_previous_result_and_error() {
        let mut lab = ImageLab::new();
        lab.select(png(1)).unwrap();
        lab.begin().unwrap();
        lab.finish(Ok("A burette".to_string()));
        assert_eq!(lab.result(), Some("A burette"));

        lab.select(png(2)).unwrap();
        assert_eq!(lab.result(), None);
        assert!(!lab.is_loading());

        lab.begin().unwrap();
        lab.finish(Err(PortError::Service("quota".to_string())));
        assert!(lab.error().is_some());

        lab.select(png(3)).unwrap();
        assert_eq!(lab.error(), None);
        assert_eq!(lab.image().map(|i| i.data.clone()), Some(vec![3]));
    }

    #[test]
    fn analysis_needs_an_image_and_is_exclusive() {
        let mut lab = ImageLab::new();
        assert_eq!(lab.begin(), Err(Rejection::NoImage));

        lab.select(png(1)).unwrap();
        lab.begin().unwrap();
        assert_eq!(lab.begin(), Err(Rejection::Busy));
        assert_eq!(lab.select(png(2)), Err(Rejection::Busy));
    }
}
