/// Default source file locations
pub const DEFAULT_REGISTRY_PATH: &str = "data/rsqaq_station_1975-2024.csv";
pub const DEFAULT_MEASUREMENT_PATH: &str = "data/rsqa-indice-qualite-air-station.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_CONFIG_FILE: &str = "rsqa.toml";

/// Environment variable prefix for configuration overrides (RSQA_OUTPUT_DIR, ...)
pub const ENV_PREFIX: &str = "RSQA";

/// Fallback reference entities
pub const DEFAULT_MUNICIPALITY: &str = "Montréal";
pub const DEFAULT_ENVIRONMENT_TYPE: &str = "Urbain";

/// Date format shared by both sources
pub const SOURCE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Hours of day
pub const MAX_HOUR: u8 = 23;

/// Output table names
pub const TABLE_ENVIRONMENT_TYPES: &str = "environment_types";
pub const TABLE_MUNICIPALITIES: &str = "municipalities";
pub const TABLE_STATIONS: &str = "stations";
pub const TABLE_POLLUTANTS: &str = "pollutants";
pub const TABLE_MEASUREMENTS: &str = "measurements";

/// Load order: reference tables before the tables that point at them
pub const TABLE_LOAD_ORDER: [&str; 5] = [
    TABLE_ENVIRONMENT_TYPES,
    TABLE_MUNICIPALITIES,
    TABLE_STATIONS,
    TABLE_POLLUTANTS,
    TABLE_MEASUREMENTS,
];

/// Processing defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";

pub const SUPPORTED_COMPRESSIONS: [&str; 5] = [
    COMPRESSION_SNAPPY,
    COMPRESSION_GZIP,
    COMPRESSION_LZ4,
    COMPRESSION_ZSTD,
    COMPRESSION_NONE,
];
