pub mod config;
pub mod error;
pub mod series;

pub use config::{load_dotenv, Config, RankConfig};
pub use error::CoreError;
pub use series::Series;
