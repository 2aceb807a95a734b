pub mod coerce;
pub mod errors;
pub mod formats;
pub mod frame;
pub mod model;
mod registry;

pub use errors::{FormatAttempt, SheetError};
pub use formats::{ColumnAliases, StatusVocabulary};
pub use frame::{
    date_to_epoch_days, empty_sales_frame, epoch_days_to_date, sales_frame, stack_frames,
    SALES_COLUMNS,
};
pub use model::{Cell, NormalizedRow, NormalizedSheet, RawWorksheet, Status};
pub use registry::{normalize_with_formats, normalize_worksheet, SheetFormat};
