use crate::models::FaceRegion;
use crate::utils::KycError;
use image::{DynamicImage, ImageFormat};
use imageproc::contrast::equalize_histogram;
use log::info;
use std::path::Path;
use tempfile::NamedTempFile;

/// Face box growth per dimension before cropping, so the crop keeps hair and chin.
pub const FACE_CROP_SCALE: f64 = 1.5;

/// Face crop of an ID image, stored in a temporary file owned by one request.
/// The file is removed when the crop is dropped.
#[derive(Debug)]
pub struct FaceCrop {
    pub region: FaceRegion,
    file: NamedTempFile,
}

impl FaceCrop {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

pub struct ImageProcessor;

impl ImageProcessor {
    pub fn open(image_path: &Path) -> Result<DynamicImage, KycError> {
        image::open(image_path).map_err(|e| {
            KycError::ImageProcessing(format!("Failed to open {}: {}", image_path.display(), e))
        })
    }

    /// Grayscale and histogram-equalised copy of the image for OCR.
    pub fn preprocess_for_ocr(image_path: &Path) -> Result<NamedTempFile, KycError> {
        let img = Self::open(image_path)?;
        let enhanced = equalize_histogram(&img.to_luma8());
        Self::save_to_temp_file(&DynamicImage::ImageLuma8(enhanced), ImageFormat::Png)
    }

    pub fn save_to_temp_file(img: &DynamicImage, format: ImageFormat) -> Result<NamedTempFile, KycError> {
        let suffix = match format {
            ImageFormat::Jpeg => ".jpg",
            _ => ".png",
        };
        let temp_file = tempfile::Builder::new()
            .prefix("ekyc-")
            .suffix(suffix)
            .tempfile()?;

        // JPEG carries no alpha channel
        let encodable = match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
            _ => img.clone(),
        };
        encodable
            .save_with_format(temp_file.path(), format)
            .map_err(|e| KycError::ImageProcessing(format!("Failed to write image: {}", e)))?;

        Ok(temp_file)
    }

    /// Largest region by area; the earliest one wins a tie.
    pub fn largest_face(regions: &[FaceRegion]) -> Option<FaceRegion> {
        regions.iter().fold(None, |best: Option<FaceRegion>, region| match best {
            Some(current) if current.area() >= region.area() => Some(current),
            _ if region.area() == 0 => best,
            _ => Some(*region),
        })
    }

    /// Grow `region` by `scale` around its centre, clipped to the image.
    pub fn expand_region(region: &FaceRegion, scale: f64, image_width: u32, image_height: u32) -> Option<FaceRegion> {
        let new_width = (f64::from(region.width) * scale) as u32;
        let new_height = (f64::from(region.height) * scale) as u32;
        let x = region.x.saturating_sub(new_width.saturating_sub(region.width) / 2);
        let y = region.y.saturating_sub(new_height.saturating_sub(region.height) / 2);

        if x >= image_width || y >= image_height {
            return None;
        }
        let width = new_width.min(image_width - x);
        let height = new_height.min(image_height - y);
        if width == 0 || height == 0 {
            return None;
        }

        Some(FaceRegion {
            x,
            y,
            width,
            height,
        })
    }

    /// Crop the largest detected face out of `img` into a request-scoped file.
    /// `None` when there is no usable region.
    pub fn crop_largest_face(img: &DynamicImage, regions: &[FaceRegion], scale: f64) -> Result<Option<FaceCrop>, KycError> {
        let Some(largest) = Self::largest_face(regions) else {
            return Ok(None);
        };
        let Some(region) = Self::expand_region(&largest, scale, img.width(), img.height()) else {
            return Ok(None);
        };

        let face = img.crop_imm(region.x, region.y, region.width, region.height);
        let file = Self::save_to_temp_file(&face, ImageFormat::Jpeg)?;
        info!("Extracted face saved at: {}", file.path().display());

        Ok(Some(FaceCrop { region, file }))
    }
}
