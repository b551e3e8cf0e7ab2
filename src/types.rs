use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the fixed financial indices the service knows about.
///
/// The string form is the column name in the store and the stem of the
/// exported CSV file. Several of them contain shell-significant characters
/// (`&`, `$`), so anything that ends up on a command line must be quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum IndexKey {
    #[serde(rename = "S&P_500_INDEX")]
    Sp500,
    #[serde(rename = "FTSE_MIB_INDEX")]
    FtseMib,
    #[serde(rename = "GOLD_SPOT_$_OZ")]
    GoldSpot,
    #[serde(rename = "MSCI_EM")]
    MsciEm,
    #[serde(rename = "MSCI_EURO")]
    MsciEuro,
    #[serde(rename = "All_Bonds_TR")]
    AllBonds,
    #[serde(rename = "U.S._Treasury")]
    UsTreasury,
}

impl IndexKey {
    pub const COUNT: usize = 7;

    /// All keys, in catalogue order. Selectors index into this list.
    pub const ALL: [IndexKey; IndexKey::COUNT] = [
        IndexKey::Sp500,
        IndexKey::FtseMib,
        IndexKey::GoldSpot,
        IndexKey::MsciEm,
        IndexKey::MsciEuro,
        IndexKey::AllBonds,
        IndexKey::UsTreasury,
    ];

    pub fn all() -> &'static [IndexKey] {
        &Self::ALL
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IndexKey::Sp500 => "S&P_500_INDEX",
            IndexKey::FtseMib => "FTSE_MIB_INDEX",
            IndexKey::GoldSpot => "GOLD_SPOT_$_OZ",
            IndexKey::MsciEm => "MSCI_EM",
            IndexKey::MsciEuro => "MSCI_EURO",
            IndexKey::AllBonds => "All_Bonds_TR",
            IndexKey::UsTreasury => "U.S._Treasury",
        }
    }

    /// Position of this key in [`IndexKey::ALL`].
    pub fn position(self) -> usize {
        Self::ALL
            .iter()
            .position(|k| *k == self)
            .unwrap_or_default()
    }

    /// Exact lookup; `None` when the selector is outside `0..7`.
    pub fn from_selector(selector: i64) -> Option<IndexKey> {
        usize::try_from(selector)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Lookup that clamps out-of-range selectors to the nearest valid bound.
    pub fn from_selector_clamped(selector: i64) -> IndexKey {
        let last = (Self::ALL.len() - 1) as i64;
        Self::ALL[selector.clamp(0, last) as usize]
    }

    /// File name used for the exported series, e.g. `MSCI_EM.csv`.
    pub fn csv_file_name(self) -> String {
        format!("{}.csv", self.as_str())
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s.trim())
            .ok_or_else(|| format!("unknown index key: {s}"))
    }
}

/// What the forecast route does with a selector outside the catalogue.
///
/// - `Clamp`: snap to the first / last index (default, historical behaviour).
/// - `Reject`: answer with "not found".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SelectorPolicy {
    #[default]
    Clamp,
    Reject,
}

impl SelectorPolicy {
    pub fn resolve(self, selector: i64) -> Option<IndexKey> {
        match self {
            SelectorPolicy::Clamp => Some(IndexKey::from_selector_clamped(selector)),
            SelectorPolicy::Reject => IndexKey::from_selector(selector),
        }
    }
}

impl FromStr for SelectorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clamp" => Ok(SelectorPolicy::Clamp),
            "reject" => Ok(SelectorPolicy::Reject),
            other => Err(format!(
                "invalid out_of_range_selector: {other} (expected \"clamp\" or \"reject\")"
            )),
        }
    }
}

/// How the runtime environment is activated before the interpreter runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LaunchMode {
    /// Source the activation script in a shell, then run the interpreter in
    /// that same shell: `. <activate> <env> && <python> <args>`.
    #[default]
    Activate,
    /// Let conda set up the environment and exec the interpreter directly:
    /// `<conda> run -n <env> --no-capture-output <python> <args>`.
    CondaRun,
}

impl FromStr for LaunchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "activate" => Ok(LaunchMode::Activate),
            "conda-run" | "conda_run" => Ok(LaunchMode::CondaRun),
            other => Err(format!(
                "invalid launch mode: {other} (expected \"activate\" or \"conda-run\")"
            )),
        }
    }
}
