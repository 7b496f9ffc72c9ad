mod config;

pub use self::config::{
    ChainSettings, CheckpointSettings, FetcherSettings, OracleSettings, ReportSettings, Settings,
    TokenSettings,
};
