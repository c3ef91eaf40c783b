/// Topics behind the "?" buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Smoothing,
    XSize,
    YSize,
    CountsSi,
    CountsTotal,
    RasterFactor,
    Coefficients,
}

impl HelpTopic {
    pub fn title(self) -> &'static str {
        match self {
            HelpTopic::Smoothing => "Smoothing",
            HelpTopic::XSize => "X size",
            HelpTopic::YSize => "Y size",
            HelpTopic::CountsSi => "Counts/pixel factor (Si image)",
            HelpTopic::CountsTotal => "Counts/pixel factor (total image)",
            HelpTopic::RasterFactor => "Pixel/raster factor",
            HelpTopic::Coefficients => "Calibration coefficients",
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            HelpTopic::Smoothing => {
                "The Si image is smoothed with a 2D convolution. The kernel is a \
                 normalized square matrix whose size is set by the slider (3 to 100).\n\n\
                 The kernel is placed over a pixel, the pixels below it are averaged \
                 and the central pixel takes the average. The kernel then moves on \
                 until every pixel has been processed. Pixels outside the image count \
                 as zero, so the borders get darker."
            }
            HelpTopic::XSize => {
                "Length of the image along X in mm. Used to convert the image width \
                 from pixels to mm."
            }
            HelpTopic::YSize => {
                "Length of the image along Y in mm. Used to convert the image height \
                 from pixels to mm."
            }
            HelpTopic::CountsSi => {
                "Converts the pixel intensity of the Si image to counts: divide the \
                 maximum intensity in counts (e.g. 33 counts) by the maximum of the \
                 8-bit image (255)."
            }
            HelpTopic::CountsTotal => {
                "Converts the pixel intensity of the total-ion image to counts: divide \
                 the maximum intensity in counts (e.g. 8000 counts) by the maximum of \
                 the 8-bit image (255)."
            }
            HelpTopic::RasterFactor => {
                "Number of pixels of the raster used for the calibration \
                 (e.g. 128x128). The calibration was measured on the whole raster, so \
                 its intensities are this many times higher than a single pixel's. \
                 Use 1 if the calibration was done with pixel intensities."
            }
            HelpTopic::Coefficients => {
                "a and b are the coefficients of the calibration (Si signal as a \
                 function of thickness):\n\n    counts = a * exp(b * thickness)\n\n\
                 The normalized pair applies when normalization is on. Check \
                 'Use new coefficients' to enter your own instead of the library \
                 values."
            }
        }
    }
}
