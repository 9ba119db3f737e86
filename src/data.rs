//! Index tables and their resolution
//!
//! # Components
//!
//! - **period**: `YYYY` / `YYYY-MM` table keys
//! - **locale**: decoding of locale-formatted numbers
//! - **table**: loading World Bank and Bundesbank tables
//! - **succession**: region code migrations used for fallback lookups
//! - **resolver**: (region, date) -> index value
//! - **update**: Bundesbank downloads (feature `async`)
//!
//! # Example
//!
//! ```rust
//! use rusty_cucopy::data::{IndexResolver, TableSource};
//! use chrono::NaiveDate;
//!
//! let csv = "Country Code,2019,2020\nDEU,112.9,113.5\n";
//! let table = TableSource::world(0).load_from_str(csv).unwrap();
//! let resolver = IndexResolver::new(table);
//!
//! let date = NaiveDate::from_ymd_opt(2020, 5, 1).unwrap();
//! assert_eq!(resolver.resolve("DEU", date).unwrap(), 113.5);
//! ```

pub mod locale;
pub mod period;
pub mod resolver;
pub mod succession;
pub mod table;
#[cfg(feature = "async")]
pub mod update;

pub use locale::decode_number;
pub use period::{Granularity, Period};
pub use resolver::{IndexResolver, IndexSource};
pub use succession::{Succession, SuccessionTable};
pub use table::{IndexTable, RegionRow, TableFormat, TableSource};
#[cfg(feature = "async")]
pub use update::BundesbankClient;
