use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("version tracking error: {0}")]
    Version(String),

    #[error("migration {version} failed: {message}")]
    Migration { version: u32, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn error_display_includes_context() {
        let e = Error::Config("bad yaml".into());
        assert_eq!(e.to_string(), "configuration error: bad yaml");

        let e = Error::Catalog("duplicate version 3".into());
        assert_eq!(e.to_string(), "catalog error: duplicate version 3");

        let e = Error::Migration {
            version: 7,
            message: "no such column".into(),
        };
        assert_eq!(e.to_string(), "migration 7 failed: no such column");

        let e = Error::Other("misc".into());
        assert_eq!(e.to_string(), "misc");
    }
}
