use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use ddsfile::Dds;
use image::ImageFormat;
use tracing::{debug, warn};

use crate::error::IngestError;

pub(crate) const TEXTURE_EXTENSION: &str = "dds";
pub(crate) const WEB_IMAGE_EXTENSION: &str = "webp";

pub(crate) trait TextureConverter {
    // `None` means "no image available"; failures are logged, never raised.
    fn convert(&self, input: &Path) -> Option<String>;
}

pub(crate) struct WebpConverter {
    output_dir: PathBuf,
}

impl WebpConverter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_path_for(&self, input: &Path) -> Option<PathBuf> {
        let stem = input.file_stem()?;
        Some(
            self.output_dir
                .join(Path::new(stem).with_extension(WEB_IMAGE_EXTENSION)),
        )
    }

    pub fn try_convert(&self, input: &Path) -> Result<PathBuf, IngestError> {
        let failure = |detail: String| IngestError::ImageConversion {
            path: input.to_path_buf(),
            detail,
        };

        let file = File::open(input).map_err(|source| IngestError::Io {
            path: input.to_path_buf(),
            source,
        })?;
        let dds = Dds::read(BufReader::new(file))
            .map_err(|err| failure(format!("unreadable dds: {err}")))?;
        let rgba = image_dds::image_from_dds(&dds, 0)
            .map_err(|err| failure(format!("unsupported dds surface: {err}")))?;

        fs::create_dir_all(&self.output_dir).map_err(|source| IngestError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let output = self
            .output_path_for(input)
            .ok_or_else(|| failure("texture path has no file name".to_string()))?;
        rgba.save_with_format(&output, ImageFormat::WebP)
            .map_err(|err| failure(format!("failed to write {}: {err}", output.display())))?;

        debug!(
            input = %input.display(),
            output = %output.display(),
            width = rgba.width(),
            height = rgba.height(),
            "converted store texture"
        );
        Ok(output)
    }
}

impl TextureConverter for WebpConverter {
    fn convert(&self, input: &Path) -> Option<String> {
        match self.try_convert(input) {
            Ok(output) => Some(output.display().to_string()),
            Err(err) => {
                warn!(error = %err, "texture conversion failed; storing record without image");
                None
            }
        }
    }
}
