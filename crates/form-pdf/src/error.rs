use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormPdfError {
    /// The document declares no interactive fields and no widget
    /// annotations to fall back on. Fatal for that upload; not retried.
    #[error("document has no fillable fields")]
    UnprocessableDocument,

    #[error("failed to parse PDF: {0}")]
    Parse(String),

    #[error("failed to write PDF: {0}")]
    Write(String),
}
