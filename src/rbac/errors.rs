use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PolicyError {
    #[error("malformed policy document: {reason}")]
    #[diagnostic(
        code(syzygy::rbac::malformed_document),
        help("The policy document must be line-oriented text (comma-separated rows, `#` comments, `policy.default=` settings)")
    )]
    MalformedDocument { reason: String },
}
