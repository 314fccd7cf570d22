/// Default CDS API endpoint.
pub const DEFAULT_URL: &str = "https://cds.climate.copernicus.eu/api";

/// CDS dataset names, main archive and preliminary back extension.
pub fn dataset_name(product: &str, back_extension: bool) -> Option<&'static str> {
    match (product, back_extension) {
        ("ml", false) => Some("reanalysis-era5-complete"),
        ("ml", true) => Some("reanalysis-era5-complete-preliminary-back-extension"),
        ("pl", false) => Some("reanalysis-era5-pressure-levels"),
        ("pl", true) => Some("reanalysis-era5-pressure-levels-preliminary-back-extension"),
        ("sfc", false) => Some("reanalysis-era5-single-levels"),
        ("sfc", true) => Some("reanalysis-era5-single-levels-preliminary-back-extension"),
        _ => None,
    }
}

/// GRIB parameter ids requested on model levels:
/// z, t, q, u, v, w, lnsp.
pub const ML_PARAMS: &str = "129/130/131/132/133/135/152";
pub const ML_LEVELS: &str = "1/to/137";

pub const PL_VARIABLES: [&str; 6] = [
    "geopotential",
    "specific_humidity",
    "temperature",
    "u_component_of_wind",
    "v_component_of_wind",
    "vertical_velocity",
];

/// Pressure levels in hPa.
#[rustfmt::skip]
pub const PL_LEVELS: [&str; 37] = [
    "1", "2", "3", "5", "7",
    "10", "20", "30", "50", "70",
    "100", "125", "150", "175",
    "200", "225", "250",
    "300", "350",
    "400", "450",
    "500", "550",
    "600", "650",
    "700", "750", "775",
    "800", "825", "850", "875",
    "900", "925", "950", "975",
    "1000",
];

pub const SFC_VARIABLES: [&str; 13] = [
    "10m_u_component_of_wind",
    "10m_v_component_of_wind",
    "2m_dewpoint_temperature",
    "2m_temperature",
    "boundary_layer_height",
    "friction_velocity",
    "land_sea_mask",
    "mean_sea_level_pressure",
    "geopotential",
    "soil_type",
    "surface_pressure",
    "total_precipitation",
    "volumetric_soil_water_layer_1",
];
