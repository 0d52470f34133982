//! Reporting over the collected corpus
//!
//! Frequency counting, the per-run summary report and the word cloud image.

mod error;
mod frequency;
mod summary;
mod wordcloud;

pub use error::{RenderError, ReportError};
pub use frequency::{FrequencyTable, summarize};
pub use summary::{
    SummaryReport, SummaryRow, file_stem, image_path, read_summary, summary_path, write_summary,
};
pub use wordcloud::{
    DEFAULT_FONT_CANDIDATES, Occupancy, Renderer, WordCloudRenderer, word_weights,
};
