use std::env;
use std::error::Error;
use std::str::FromStr;

use npystream::{MemoryOrder, Placeholder, StreamConfig};

pub fn key_or_default_parse<
    E: Into<Box<dyn Error>>,
    T: FromStr<Err=E>
>(key: &str, default: T) -> Result<T, Box<dyn Error>> {
    match env::var(key) {
        Ok(val) => val.parse::<T>().map_err(|err| err.into()),
        Err(_) => Ok(default),
    }
}

pub fn key_or_default(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(val) => val,
        Err(_) => default.into(),
    }
}

pub fn key_or_none(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(val) => Some(val),
        Err(_) => None,
    }
}

/// buffer_bytes: usize. record buffer size, NPY_BUFFER_BYTES
/// placeholder: `zeroed` or `max`, NPY_PLACEHOLDER
/// fortran_order: bool. NPY_FORTRAN_ORDER
/// log_file: optional log file, NPY_LOG_FILE
/// verbosity: number of -v flags
#[derive(Clone, Debug, Default)]
pub struct Settings {
    pub buffer_bytes: usize,
    pub placeholder: String,
    pub fortran_order: bool,
    pub log_file: Option<String>,
    pub verbosity: u8,
}

impl Settings {
    /// Takes CLI values first, then the environment, then the defaults.
    pub fn from_matches(matches: &clap::ArgMatches) -> Result<Settings, Box<dyn Error>> {
        let buffer_bytes = match matches.value_of("buffer_bytes") {
            Some(v) => v.parse::<usize>()?,
            None => key_or_default_parse("NPY_BUFFER_BYTES", npystream::config::DEFAULT_BUFFER_BYTES)?,
        };
        let placeholder = matches
            .value_of("placeholder")
            .map(String::from)
            .unwrap_or_else(|| key_or_default("NPY_PLACEHOLDER", "zeroed"));
        let fortran_order = {
            let cli_setting = matches.is_present("fortran_order");
            match key_or_none("NPY_FORTRAN_ORDER") {
                Some(s) => match s.as_ref() {
                    "true" | "1" => true,
                    "false" | "0" => false,
                    _ => cli_setting,
                },
                None => cli_setting,
            }
        };
        let log_file = matches
            .value_of("log_file")
            .map(String::from)
            .or_else(|| key_or_none("NPY_LOG_FILE"));

        Ok(Settings {
            buffer_bytes,
            placeholder,
            fortran_order,
            log_file,
            verbosity: matches.occurrences_of("v") as u8,
        })
    }

    pub fn stream_config(&self) -> Result<StreamConfig, String> {
        let placeholder = match self.placeholder.as_ref() {
            "zeroed" => Placeholder::Zeroed,
            "max" => Placeholder::MaxCount,
            other => return Err(format!("unknown placeholder mode: {}", other)),
        };
        Ok(StreamConfig {
            memory_order: if self.fortran_order { MemoryOrder::Fortran } else { MemoryOrder::C },
            buffer_bytes: self.buffer_bytes,
            placeholder,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_map_placeholder_modes() {
        let mut settings = Settings {
            buffer_bytes: 64,
            placeholder: "max".to_owned(),
            ..Settings::default()
        };
        let config = settings.stream_config().unwrap();
        assert_eq!(config.placeholder, Placeholder::MaxCount);
        assert_eq!(config.buffer_bytes, 64);
        assert_eq!(config.memory_order, MemoryOrder::C);

        settings.placeholder = "garbage".to_owned();
        assert!(settings.stream_config().is_err());
    }

    #[test]
    fn test_key_or_default() {
        assert_eq!(key_or_default("NPY_SURELY_UNSET_KEY", "fallback"), "fallback");
        assert_eq!(key_or_none("NPY_SURELY_UNSET_KEY"), None);
        assert_eq!(key_or_default_parse("NPY_SURELY_UNSET_KEY", 7usize).unwrap(), 7);
    }
}
