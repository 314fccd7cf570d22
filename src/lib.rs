#![forbid(unsafe_code)]

//! Build and submit ERA5 reanalysis requests to the Copernicus Climate Data
//! Store (CDS).
//!
//! Three products are supported: model levels (`ml`), pressure levels (`pl`)
//! and single levels (`sfc`). A [`Query`] holds the validated date range,
//! bounding box, grid resolution and time step; a [`Product`] turns it into
//! the CDS dataset name, the request keywords and the output file name.
//!
//! ```no_run
//! use era5_cds::{Client, Era5, Product, Query};
//!
//! let query = Query::builder()
//!     .date(["20200101", "20200102"])
//!     .lon(-20.0, 15.0)
//!     .lat(35.0, 45.0)
//!     .res(0.25)
//!     .step(6)
//!     .build()?;
//!
//! let era5 = Era5::new(Product::Sfc, query);
//! let client = Client::from_env()?;
//! let result = era5.retrieve(&client)?;
//! println!("{} bytes in {}", result.size_bytes, result.target.display());
//! # Ok::<(), era5_cds::Error>(())
//! ```
//!
//! Notes:
//! - Dates before 1979 use the preliminary back-extension datasets; dates
//!   before 1950 are rejected.
//! - Credentials come from `CDSAPI_URL`/`CDSAPI_KEY` or `~/.cdsapirc`, and the
//!   dataset licence must be accepted on the CDS website first.

mod client;
mod config;
mod datasets;
mod date;
mod era5;
mod error;
mod product;
mod query;
mod request;

pub use crate::client::{
    Client, ClientOptions, Credentials, Download, JobState, JobStatus, Retrieve,
};
pub use crate::config::{Block, DateValue, Settings, DEFAULT_BLOCK};
pub use crate::datasets::{DEFAULT_URL, PL_LEVELS, PL_VARIABLES, SFC_VARIABLES};
pub use crate::date::{parse_date, DateRange};
pub use crate::era5::{Era5, Retrieval};
pub use crate::error::{Error, Result};
pub use crate::product::Product;
pub use crate::query::{wrap_longitude, Query, QueryBuilder, RESOLUTIONS};
pub use crate::request::{Request, RequestValue};
