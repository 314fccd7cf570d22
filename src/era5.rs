use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::client::{Download, Retrieve};
use crate::error::Result;
use crate::product::Product;
use crate::query::Query;
use crate::request::Request;

/// Everything the archive needs for one call: dataset, keywords, target file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Retrieval {
    pub database: String,
    pub request: Request,
    pub target: PathBuf,
}

/// An ERA5 download: a product plus a validated query.
#[derive(Debug, Clone)]
pub struct Era5 {
    product: Product,
    query: Query,
    output: Option<PathBuf>,
}

impl Era5 {
    pub fn new(product: Product, query: Query) -> Self {
        Self {
            product,
            query,
            output: None,
        }
    }

    /// Write to `path` instead of the default `era5.<product>.<dates>.nc`.
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn target(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.product.file_name(&self.query)))
    }

    /// Resolve dataset, request and target. Fails for dates before 1950.
    pub fn retrieval(&self) -> Result<Retrieval> {
        Ok(Retrieval {
            database: self.product.database(&self.query)?.to_string(),
            request: self.product.params(&self.query),
            target: self.target(),
        })
    }

    /// Hand the request to `client` unmodified.
    pub fn retrieve<C: Retrieve + ?Sized>(&self, client: &C) -> Result<Download> {
        let r = self.retrieval()?;
        if self.query.verbose {
            info!(
                database = %r.database,
                target = %r.target.display(),
                area = %self.query.area(),
                grid = %self.query.grid(),
                "requesting file"
            );
        }
        client.retrieve(&r.database, &r.request, &r.target)
    }
}
