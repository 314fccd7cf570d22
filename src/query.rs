use tracing::warn;

use crate::date::DateRange;
use crate::error::{Error, Result};

/// Grid resolutions (degrees) served for ERA5 requests.
pub const RESOLUTIONS: [f64; 3] = [0.25, 0.5, 1.0];

pub const DEFAULT_RESOLUTION: f64 = 0.25;
pub const DEFAULT_STEP: u32 = 1;

/// Wrap a longitude into [-180, 180). Western longitudes come out negative.
pub fn wrap_longitude(lon: f64) -> f64 {
    (lon - 180.0).rem_euclid(360.0) - 180.0
}

/// Decimal-degree text: integral values keep one decimal ("40.0"),
/// others use the shortest exact form ("-3.5", "0.25").
pub fn format_degree(v: f64) -> String {
    // avoid "-0.0" in area strings
    let v = if v == 0.0 { 0.0 } else { v };
    if v.fract() == 0.0 && v.is_finite() {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

/// Validated geographic/temporal selection shared by all ERA5 products.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub date: DateRange,
    /// `[lonmin, lonmax]`, already wrapped.
    pub lon: [f64; 2],
    /// `[latmin, latmax]`, ordered.
    pub lat: [f64; 2],
    pub res: f64,
    pub step: u32,
    pub verbose: bool,
}

impl Query {
    pub fn builder() -> QueryBuilder {
        QueryBuilder::default()
    }

    /// `"{res}/{res}"`
    pub fn grid(&self) -> String {
        let r = format_degree(self.res);
        format!("{r}/{r}")
    }

    /// North/West/South/East.
    pub fn area(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            format_degree(self.lat[1]),
            format_degree(self.lon[0]),
            format_degree(self.lat[0]),
            format_degree(self.lon[1]),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    dates: Vec<String>,
    lon: Option<[f64; 2]>,
    lat: Option<[f64; 2]>,
    res: Option<f64>,
    step: Option<u32>,
    verbose: bool,
}

impl QueryBuilder {
    /// Date values as `YYYYMMDD` or `YYYY-MM-DD`; one or two are expected.
    pub fn date<S: AsRef<str>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.dates = values.into_iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    pub fn lon(mut self, lonmin: f64, lonmax: f64) -> Self {
        self.lon = Some([lonmin, lonmax]);
        self
    }

    pub fn lat(mut self, latmin: f64, latmax: f64) -> Self {
        self.lat = Some([latmin, latmax]);
        self
    }

    pub fn res(mut self, res: f64) -> Self {
        self.res = Some(res);
        self
    }

    pub fn step(mut self, step: u32) -> Self {
        self.step = Some(step);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn build(self) -> Result<Query> {
        let date = DateRange::parse(&self.dates)?;

        let [lon0, lon1] = self
            .lon
            .ok_or_else(|| Error::InvalidRequest("missing mandatory argument: lon".into()))?;
        if !lon0.is_finite() || !lon1.is_finite() {
            return Err(Error::InvalidRequest(format!(
                "longitudes must be finite, got {lon0}/{lon1}"
            )));
        }
        let lon = [wrap_longitude(lon0), wrap_longitude(lon1)];

        let [mut lat0, mut lat1] = self
            .lat
            .ok_or_else(|| Error::InvalidRequest("missing mandatory argument: lat".into()))?;
        for lat in [lat0, lat1] {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(Error::InvalidRequest(format!(
                    "latitude must be within [-90, 90], got {lat}"
                )));
            }
        }
        if lat0 > lat1 {
            warn!(latmin = lat0, latmax = lat1, "latmin > latmax, swapping latitudes");
            std::mem::swap(&mut lat0, &mut lat1);
        }

        let res = self.res.unwrap_or(DEFAULT_RESOLUTION);
        if !RESOLUTIONS.iter().any(|r| (r - res).abs() < 1e-9) {
            return Err(Error::InvalidRequest(format!(
                "resolution must be one of 0.25, 0.5, 1.0, got {res}"
            )));
        }

        let step = self.step.unwrap_or(DEFAULT_STEP);
        if step == 0 || 24 % step != 0 {
            return Err(Error::InvalidRequest(format!(
                "time step must divide 24 hours, got {step}"
            )));
        }

        Ok(Query {
            date,
            lon,
            lat: [lat0, lat1],
            res,
            step,
            verbose: self.verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> QueryBuilder {
        Query::builder()
            .date(["20200101", "20200102"])
            .lon(-10.0, 10.0)
            .lat(30.0, 40.0)
    }

    #[test]
    fn wraps_longitudes_into_half_open_range() {
        assert_eq!(wrap_longitude(0.0), 0.0);
        assert_eq!(wrap_longitude(180.0), -180.0);
        assert_eq!(wrap_longitude(-180.0), -180.0);
        assert_eq!(wrap_longitude(350.0), -10.0);
        assert_eq!(wrap_longitude(190.5), -169.5);
        assert_eq!(wrap_longitude(-190.0), 170.0);
        assert_eq!(wrap_longitude(720.0), 0.0);
    }

    #[test]
    fn formats_degrees() {
        assert_eq!(format_degree(40.0), "40.0");
        assert_eq!(format_degree(-3.5), "-3.5");
        assert_eq!(format_degree(0.25), "0.25");
        assert_eq!(format_degree(-0.0), "0.0");
    }

    #[test]
    fn builds_area_and_grid() {
        let q = base().lon(350.0, 20.0).res(0.5).build().unwrap();
        assert_eq!(q.lon, [-10.0, 20.0]);
        assert_eq!(q.area(), "40.0/-10.0/30.0/20.0");
        assert_eq!(q.grid(), "0.5/0.5");
    }

    #[test]
    fn defaults_apply() {
        let q = base().build().unwrap();
        assert_eq!(q.res, DEFAULT_RESOLUTION);
        assert_eq!(q.step, DEFAULT_STEP);
        assert!(!q.verbose);
    }

    #[test]
    fn reversed_latitudes_are_swapped() {
        let q = base().lat(40.0, 30.0).build().unwrap();
        assert_eq!(q.lat, [30.0, 40.0]);
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        assert!(base().lat(-91.0, 0.0).build().is_err());
    }

    #[test]
    fn latitude_bounds_are_inclusive() {
        let q = base().lat(-90.0, 90.0).build().unwrap();
        assert_eq!(q.lat, [-90.0, 90.0]);
        assert!(base().lat(0.0, 90.0001).build().is_err());
        assert!(base().lat(-90.0001, 0.0).build().is_err());
        assert!(base().lat(f64::NAN, 10.0).build().is_err());
    }

    #[test]
    fn rejects_non_finite_longitudes() {
        assert!(base().lon(f64::NAN, 10.0).build().is_err());
        assert!(base().lon(0.0, f64::INFINITY).build().is_err());
        assert!(base().lon(f64::NEG_INFINITY, 0.0).build().is_err());
    }

    #[test]
    fn rejects_unsupported_resolution_and_step() {
        assert!(base().res(0.1).build().is_err());
        assert!(base().step(5).build().is_err());
        assert!(base().step(0).build().is_err());
        assert!(base().step(3).build().is_ok());
    }

    #[test]
    fn requires_date_and_box() {
        assert!(Query::builder().lon(0.0, 1.0).lat(0.0, 1.0).build().is_err());
        assert!(
            Query::builder()
                .date(["20200101"])
                .lat(0.0, 1.0)
                .build()
                .is_err()
        );
        assert!(
            Query::builder()
                .date(["20200101"])
                .lon(0.0, 1.0)
                .build()
                .is_err()
        );
    }

    #[test]
    fn normalizes_date_order() {
        let q = base().date(["20200110", "20200101"]).build().unwrap();
        assert_eq!(q.date.compact(), "20200101-20200110");
    }
}
