//! Image formats that can be embedded in a data URI.

use std::fmt;

/// MIME image subtype used when wrapping base64 text as a data URI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PayloadFormat {
    /// Animated PNG.
    Apng,
    /// AV1 image file.
    Avif,
    /// Windows bitmap.
    Bmp,
    /// Graphics Interchange Format.
    Gif,
    /// Windows icon.
    Ico,
    /// JPEG.
    Jpeg,
    /// Portable Network Graphics.
    #[default]
    Png,
    /// Scalable Vector Graphics.
    Svg,
    /// WebP.
    WebP,
}

impl PayloadFormat {
    /// Lowercase MIME subtype, e.g. `png`.
    #[must_use]
    pub const fn subtype(self) -> &'static str {
        match self {
            Self::Apng => "apng",
            Self::Avif => "avif",
            Self::Bmp => "bmp",
            Self::Gif => "gif",
            Self::Ico => "ico",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Svg => "svg",
            Self::WebP => "webp",
        }
    }

    /// Returns the `data:image/<fmt>;base64,` prefix.
    #[must_use]
    pub fn data_uri_prefix(self) -> String {
        format!("data:image/{};base64,", self.subtype())
    }

    /// Wraps base64 text as a data URI renderable by an `<img>` element.
    #[must_use]
    pub fn data_uri(self, base64_text: &str) -> String {
        let mut uri = self.data_uri_prefix();
        uri.push_str(base64_text);
        uri
    }
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.subtype())
    }
}
