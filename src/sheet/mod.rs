pub mod dates;
pub mod io;

pub use dates::{normalize_date, parse_date_text};
pub use io::{read_sheet, write_sheet, Row, SheetData};
