//! Request settings read from a TOML file.
//!
//! Each top-level table is a named block:
//!
//! ```toml
//! [era5]
//! lon = [-20.0, 15.0]
//! lat = [35.0, 45.0]
//! res = 0.25
//! step = 6
//! date = ["20200101", "20200102"]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::query::{Query, QueryBuilder};

pub const DEFAULT_BLOCK: &str = "era5";

/// Dates may be written as strings or bare integers (`20200101`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DateValue {
    Int(i64),
    Str(String),
}

impl DateValue {
    fn into_string(self) -> String {
        match self {
            DateValue::Int(n) => n.to_string(),
            DateValue::Str(s) => s,
        }
    }
}

/// One block of settings. Every field is optional so that blocks can be
/// layered (command line over file).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Block {
    pub lon: Option<[f64; 2]>,
    pub lat: Option<[f64; 2]>,
    pub res: Option<f64>,
    pub step: Option<u32>,
    pub date: Option<Vec<DateValue>>,
    pub verbose: Option<bool>,
    pub output: Option<PathBuf>,
}

impl Block {
    /// Fields set in `self` win; the rest come from `fallback`.
    pub fn or(self, fallback: Block) -> Block {
        Block {
            lon: self.lon.or(fallback.lon),
            lat: self.lat.or(fallback.lat),
            res: self.res.or(fallback.res),
            step: self.step.or(fallback.step),
            date: self.date.or(fallback.date),
            verbose: self.verbose.or(fallback.verbose),
            output: self.output.or(fallback.output),
        }
    }

    pub fn query_builder(&self) -> QueryBuilder {
        let mut b = Query::builder().verbose(self.verbose.unwrap_or(false));
        if let Some(dates) = &self.date {
            b = b.date(dates.iter().cloned().map(DateValue::into_string));
        }
        if let Some([lonmin, lonmax]) = self.lon {
            b = b.lon(lonmin, lonmax);
        }
        if let Some([latmin, latmax]) = self.lat {
            b = b.lat(latmin, latmax);
        }
        if let Some(res) = self.res {
            b = b.res(res);
        }
        if let Some(step) = self.step {
            b = b.step(step);
        }
        b
    }

    pub fn to_query(&self) -> Result<Query> {
        self.query_builder().build()
    }
}

/// All blocks of a settings file, by name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    pub blocks: BTreeMap<String, Block>,
}

impl Settings {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_str(&text)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn block(&self, name: &str) -> Result<&Block> {
        self.blocks.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.blocks.keys().map(String::as_str).collect();
            Error::InvalidRequest(format!(
                "block [{name}] not found in configuration (available: {})",
                known.join(", ")
            ))
        })
    }
}
