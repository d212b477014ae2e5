use std::io::Read;
use std::path::Path;

/// File extension together with its MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionWithMime {
    /// File extension (without leading dot), e.g., `csv.gz`
    pub extension: String,
    /// MIME type, e.g., `text/csv`
    pub mime: String,
}

impl ExtensionWithMime {
    /// Create a new [`ExtensionWithMime`]
    pub fn new(extension: &str, mime: &str) -> Self {
        Self {
            extension: extension.to_string(),
            mime: mime.to_string(),
        }
    }
}

/// Trait for importing types from a file path or reader
pub trait Importable: Sized {
    /// The error type returned by import operations
    type Error: std::error::Error + Send + Sync + 'static + From<std::io::Error>;
    /// Options controlling the import
    type ImportOptions: Default;

    /// Import from a reader, specifying the format and options.
    fn import_from_reader_with_options<R: Read>(
        reader: R,
        format: &str,
        options: Self::ImportOptions,
    ) -> Result<Self, Self::Error>;

    /// Formats (file extensions) supported for import
    fn known_import_formats() -> Vec<ExtensionWithMime>;

    /// Import from a reader, specifying the format.
    fn import_from_reader<R: Read>(reader: R, format: &str) -> Result<Self, Self::Error> {
        Self::import_from_reader_with_options(reader, format, Self::ImportOptions::default())
    }

    /// Import from a file path with options.
    /// The format is inferred from the file extension.
    fn import_from_path_with_options<P: AsRef<Path>>(
        path: P,
        options: Self::ImportOptions,
    ) -> Result<Self, Self::Error> {
        let path = path.as_ref();
        let format = Self::infer_format(path).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Could not infer format from path",
            )
        })?;

        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Self::import_from_reader_with_options(reader, &format, options)
    }

    /// Import from a file path.
    /// The format is inferred from the file extension.
    fn import_from_path<P: AsRef<Path>>(path: P) -> Result<Self, Self::Error> {
        Self::import_from_path_with_options(path, Self::ImportOptions::default())
    }

    /// Import from a byte slice, specifying the format.
    fn import_from_bytes(bytes: &[u8], format: &str) -> Result<Self, Self::Error> {
        Self::import_from_reader(std::io::Cursor::new(bytes), format)
    }

    /// Infer format from path.
    ///
    /// The longest of the [`Importable::known_import_formats`] the file name ends with is chosen
    /// (e.g., `csv.gz` over `gz`), otherwise the plain extension.
    fn infer_format(path: &Path) -> Option<String> {
        let path_str = path.to_string_lossy().to_lowercase();
        Self::known_import_formats()
            .into_iter()
            .map(|f| f.extension)
            .filter(|ext| path_str.ends_with(&format!(".{ext}")))
            .max_by_key(|ext| ext.len())
            .or_else(|| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .map(|s| s.to_lowercase())
            })
    }
}
