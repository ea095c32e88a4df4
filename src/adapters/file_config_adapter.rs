//! INI file configuration adapter.
//!
//! A strategy file has up to four kinds of section:
//!
//! ```ini
//! [indicators]
//! enabled = sma, ema, macd      ; which indicator sections to read
//!
//! [sma]                         ; one section per enabled indicator
//! timeperiod = 5, 20, 50        ; comma list, one grid axis per key
//!
//! [macd]
//! fastperiod = 12
//! slowperiod = 26
//! signalperiod = 9
//!
//! [signals]
//! fast_ma = sma                 ; moving averages whose crossover signals
//! slow_ma = ema
//! rsi_buy = 30
//!
//! [backtest]
//! stop_loss = 0.02
//! take_profit = 0.04
//! allow_shorting = yes          ; true/yes/1 or false/no/0
//! ```
//!
//! Section and key names are case-insensitive. This adapter only hands out
//! raw strings; parsing and defaults live in `StrategyConfig::from_config`.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    ini: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut ini = Ini::new();
        ini.load(path).map_err(std::io::Error::other)?;
        Ok(Self { ini })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut ini = Ini::new();
        ini.read(content.to_string())?;
        Ok(Self { ini })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.ini.get(section, key)
    }

    fn keys(&self, section: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .ini
            .get_map_ref()
            .get(&section.to_lowercase())
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}
