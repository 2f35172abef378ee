pub mod aggregate;
pub mod extract;
pub mod reader;
pub mod record;
pub mod report;
pub mod source;

pub use aggregate::{Aggregates, Aggregator, AggregatorConfig, DateWindow, run, run_reader};
pub use extract::{FieldFinder, extract};
pub use reader::{ChunkLines, Line, read_lines};
pub use record::{DecodeError, DecodeMode, Field, RecordDecoder, TripRecord, decode};
pub use report::{Query, ReportConfig, ReportFormat, write_report};
