pub mod delimited;
pub mod remote;
pub mod spreadsheet;

pub use delimited::DelimitedReader;
pub use remote::{HttpFetcher, RemoteFetcher};
pub use spreadsheet::SpreadsheetReader;
