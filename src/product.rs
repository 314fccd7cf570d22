use std::fmt;

use crate::datasets::{
    dataset_name, ML_LEVELS, ML_PARAMS, PL_LEVELS, PL_VARIABLES, SFC_VARIABLES,
};
use crate::date::{hours, iso};
use crate::error::{Error, Result};
use crate::query::Query;
use crate::request::Request;

/// ERA5 product, distinguished by vertical coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Product {
    /// Model levels (full 137-level archive).
    Ml,
    /// Pressure levels.
    Pl,
    /// Single levels (surface).
    Sfc,
}

impl Product {
    pub fn as_str(&self) -> &'static str {
        match self {
            Product::Ml => "ml",
            Product::Pl => "pl",
            Product::Sfc => "sfc",
        }
    }

    /// CDS dataset for the query's start date.
    ///
    /// Fails for years before 1950; warns and picks the preliminary back
    /// extension for 1950-1978.
    pub fn database(&self, query: &Query) -> Result<&'static str> {
        let back = query.date.needs_back_extension()?;
        dataset_name(self.as_str(), back).ok_or_else(|| {
            Error::InvalidRequest(format!("no dataset for product {self}"))
        })
    }

    /// Request keywords for this product.
    pub fn params(&self, query: &Query) -> Request {
        let mut params = Request::new()
            .kw("format", "netcdf")
            .kw("grid", query.grid())
            .kw("area", query.area());

        let date1 = iso(&query.date.start);
        let date2 = iso(&query.date.end);
        let hours = hours(query.step);

        match self {
            Product::Ml => {
                let time: Vec<String> = hours.iter().map(|h| format!("{h:02}")).collect();
                params.set("class", "ea");
                params.set("expver", "1");
                params.set("stream", "oper");
                params.set("type", "an");
                params.set("time", time.join("/"));
                params.set("date", format!("{date1}/to/{date2}"));
                params.set("levtype", "ml");
                params.set("param", ML_PARAMS);
                params.set("levelist", ML_LEVELS);
            }
            Product::Pl | Product::Sfc => {
                let time: Vec<String> = hours.iter().map(|h| format!("{h:02}:00")).collect();
                params.set("product_type", "reanalysis");
                params.set("time", time);
                params.set("date", format!("{date1}/{date2}"));
                if *self == Product::Pl {
                    params.set("variable", PL_VARIABLES);
                    params.set("pressure_level", PL_LEVELS);
                } else {
                    params.set("variable", SFC_VARIABLES);
                }
            }
        }

        params
    }

    /// Default output file, e.g. `era5.pl.20200101-20200102.nc`.
    pub fn file_name(&self, query: &Query) -> String {
        format!("era5.{}.{}.nc", self.as_str(), query.date.compact())
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Product {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ml" => Ok(Product::Ml),
            "pl" => Ok(Product::Pl),
            "sfc" => Ok(Product::Sfc),
            other => Err(Error::InvalidRequest(format!(
                "unknown ERA5 product: {other} (expected ml, pl or sfc)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestValue;

    fn query(dates: [&str; 2], step: u32) -> Query {
        Query::builder()
            .date(dates)
            .lon(-20.0, 15.0)
            .lat(35.0, 45.0)
            .res(0.25)
            .step(step)
            .build()
            .unwrap()
    }

    #[test]
    fn common_keys_are_present() {
        let q = query(["20200101", "20200102"], 6);
        for p in [Product::Ml, Product::Pl, Product::Sfc] {
            let r = p.params(&q);
            assert_eq!(r.get_str("format"), Some("netcdf"));
            assert_eq!(r.get_str("grid"), Some("0.25/0.25"));
            assert_eq!(r.get_str("area"), Some("45.0/-20.0/35.0/15.0"));
        }
    }

    #[test]
    fn model_level_request() {
        let q = query(["20200102", "20200101"], 6);
        let r = Product::Ml.params(&q);
        assert_eq!(r.get_str("time"), Some("00/06/12/18"));
        assert_eq!(r.get_str("date"), Some("2020-01-01/to/2020-01-02"));
        assert_eq!(r.get_str("levtype"), Some("ml"));
        assert_eq!(r.get_str("class"), Some("ea"));
        assert_eq!(r.get_str("param"), Some("129/130/131/132/133/135/152"));
        assert_eq!(r.get_str("levelist"), Some("1/to/137"));
        assert!(!r.contains_key("variable"));
        assert_eq!(Product::Ml.file_name(&q), "era5.ml.20200101-20200102.nc");
    }

    #[test]
    fn pressure_level_request() {
        let q = query(["20200101", "20200102"], 12);
        let r = Product::Pl.params(&q);
        assert_eq!(
            r.get("time"),
            Some(&RequestValue::from(["00:00", "12:00"]))
        );
        assert_eq!(r.get_str("date"), Some("2020-01-01/2020-01-02"));
        assert_eq!(r.get_str("product_type"), Some("reanalysis"));
        assert_eq!(r.get("variable").unwrap().as_strings().len(), 6);
        let levels = r.get("pressure_level").unwrap().as_strings();
        assert_eq!(levels.len(), 37);
        assert_eq!(levels.first().map(String::as_str), Some("1"));
        assert_eq!(levels.last().map(String::as_str), Some("1000"));
        assert_eq!(Product::Pl.file_name(&q), "era5.pl.20200101-20200102.nc");
    }

    #[test]
    fn single_level_request() {
        let q = query(["20200101", "20200102"], 3);
        let r = Product::Sfc.params(&q);
        let variables = r.get("variable").unwrap().as_strings();
        assert_eq!(variables.len(), 13);
        assert!(variables.contains(&"2m_temperature".to_string()));
        assert!(!r.contains_key("pressure_level"));
        assert_eq!(r.get("time").unwrap().as_strings().len(), 8);
    }

    #[test]
    fn database_follows_date_thresholds() {
        let recent = query(["20200101", "20200102"], 6);
        assert_eq!(Product::Sfc.database(&recent).unwrap(), "reanalysis-era5-single-levels");
        assert_eq!(Product::Ml.database(&recent).unwrap(), "reanalysis-era5-complete");

        let back = query(["19600101", "19600102"], 6);
        assert_eq!(
            Product::Pl.database(&back).unwrap(),
            "reanalysis-era5-pressure-levels-preliminary-back-extension"
        );
        assert_eq!(
            Product::Ml.database(&back).unwrap(),
            "reanalysis-era5-complete-preliminary-back-extension"
        );

        let early = query(["19400101", "19600102"], 6);
        assert!(matches!(
            Product::Sfc.database(&early),
            Err(Error::NoDataAvailable(1940))
        ));
    }

    #[test]
    fn parses_product_names() {
        assert_eq!("SFC".parse::<Product>().unwrap(), Product::Sfc);
        assert_eq!("ml".parse::<Product>().unwrap(), Product::Ml);
        assert!("xyz".parse::<Product>().is_err());
    }
}
