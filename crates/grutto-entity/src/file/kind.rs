//! Display category of a file, derived from its MIME type.

use serde::{Deserialize, Serialize};

/// The category label used for filtering and for the search index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Portable Document Format.
    Pdf,
    /// Word processing documents.
    Word,
    /// Spreadsheets.
    Excel,
    /// Slide decks.
    Powerpoint,
    /// Any image type.
    Image,
    /// Everything else.
    Document,
}

impl FileKind {
    /// All categories, in filter-menu order.
    pub const ALL: [FileKind; 6] = [
        Self::Pdf,
        Self::Word,
        Self::Excel,
        Self::Powerpoint,
        Self::Image,
        Self::Document,
    ];

    /// Classify a MIME type. Total: every input maps to exactly one category.
    ///
    /// Rules are substring checks applied in order, so
    /// `application/vnd.openxmlformats-officedocument.wordprocessingml.document`
    /// is `Word`, not `Document`.
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.to_ascii_lowercase();
        if mime.contains("pdf") {
            Self::Pdf
        } else if mime.contains("word") {
            Self::Word
        } else if mime.contains("excel") || mime.contains("spreadsheet") {
            Self::Excel
        } else if mime.contains("powerpoint") || mime.contains("presentation") {
            Self::Powerpoint
        } else if mime.contains("image") {
            Self::Image
        } else {
            Self::Document
        }
    }

    /// Return the label as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Word => "word",
            Self::Excel => "excel",
            Self::Powerpoint => "powerpoint",
            Self::Image => "image",
            Self::Document => "document",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "word" => Ok(Self::Word),
            "excel" => Ok(Self::Excel),
            "powerpoint" => Ok(Self::Powerpoint),
            "image" => Ok(Self::Image),
            "document" | "other" => Ok(Self::Document),
            _ => Err(format!("Unknown file type: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_office_mime_types() {
        assert_eq!(FileKind::from_mime("application/pdf"), FileKind::Pdf);
        assert_eq!(FileKind::from_mime("application/msword"), FileKind::Word);
        assert_eq!(
            FileKind::from_mime(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            ),
            FileKind::Word
        );
        assert_eq!(FileKind::from_mime("application/vnd.ms-excel"), FileKind::Excel);
        assert_eq!(
            FileKind::from_mime("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
            FileKind::Excel
        );
        assert_eq!(
            FileKind::from_mime("application/vnd.ms-powerpoint"),
            FileKind::Powerpoint
        );
        assert_eq!(
            FileKind::from_mime(
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            ),
            FileKind::Powerpoint
        );
    }

    #[test]
    fn test_fallbacks() {
        assert_eq!(FileKind::from_mime("image/png"), FileKind::Image);
        assert_eq!(FileKind::from_mime("text/plain"), FileKind::Document);
        assert_eq!(FileKind::from_mime(""), FileKind::Document);
        assert_eq!(FileKind::from_mime("APPLICATION/PDF"), FileKind::Pdf);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("PDF".parse::<FileKind>().unwrap(), FileKind::Pdf);
        assert_eq!("other".parse::<FileKind>().unwrap(), FileKind::Document);
        assert!("video".parse::<FileKind>().is_err());
    }
}
