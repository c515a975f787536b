use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(&self, other: &Span) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    UnknownOperator,
    TypeMismatch,
    DimensionMismatch,
    CellTypeMismatch,
    NoDataMismatch,
    Masking,
    DataSource,
}

impl ErrorKind {
    /// Raster-raster arithmetic between grids of different units.
    pub fn is_compatibility(&self) -> bool {
        matches!(self, ErrorKind::CellTypeMismatch | ErrorKind::NoDataMismatch)
    }

    fn title(&self) -> &'static str {
        match self {
            ErrorKind::Syntax => "Syntax Error",
            ErrorKind::UnknownOperator => "Unknown Operator",
            ErrorKind::TypeMismatch => "Type Mismatch",
            ErrorKind::DimensionMismatch => "Dimension Mismatch",
            ErrorKind::CellTypeMismatch | ErrorKind::NoDataMismatch => "Incompatible Rasters",
            ErrorKind::Masking => "Masking Error",
            ErrorKind::DataSource => "Data Source Error",
        }
    }

    fn color(&self) -> Color {
        match self {
            ErrorKind::Syntax => Color::Yellow,
            ErrorKind::DataSource => Color::Red,
            _ => Color::Magenta,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct BandmathError {
    pub kind: ErrorKind,
    pub span: Span,
    pub message: String,
    pub help: Option<String>,
}

pub type BandmathResult<T> = Result<T, BandmathError>;

impl BandmathError {
    pub fn new(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn syntax(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, span, message)
    }

    pub fn syntax_with_help(span: Span, message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::syntax(span, message).with_help(help)
    }

    pub fn report(&self, source: &str, filename: Option<&str>) {
        let filename = filename.unwrap_or("<repl>");
        let color = self.kind.color();

        let mut report_builder = Report::build(ReportKind::Error, filename, self.span.start)
            .with_message(format!("{}: {}", self.kind.title().fg(color), self.message))
            .with_label(
                Label::new((filename, self.span.start..self.span.end))
                    .with_message(&self.message)
                    .with_color(color),
            );

        if let Some(ref help_text) = self.help {
            report_builder = report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
        }

        if let Err(e) = report_builder
            .finish()
            .eprint((filename, Source::from(source)))
        {
            eprintln!("{}", self);
            tracing::warn!(error = %e, "failed to render diagnostic");
        }
    }
}
