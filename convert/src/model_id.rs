use std::fmt;
use std::str::FromStr;

use crate::error::ConvertError;

/// The models this tool can convert to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelId {
    Tsukuyomi,
    Amitaro,
}

impl ModelId {
    pub fn all() -> [ModelId; 2] {
        [ModelId::Tsukuyomi, ModelId::Amitaro]
    }

    /// Canonical identifier.
    pub fn name(self) -> &'static str {
        match self {
            ModelId::Tsukuyomi => "tsukuyomi",
            ModelId::Amitaro => "amitaro",
        }
    }

    /// Every identifier accepted for this model.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            ModelId::Tsukuyomi => &["tsukuyomi", "つくよみちゃん"],
            ModelId::Amitaro => &["amitaro", "あみたろ"],
        }
    }

    /// Checkpoint file name inside the model directory.
    pub fn checkpoint_file(self) -> &'static str {
        match self {
            ModelId::Tsukuyomi => "01 つくよみちゃん公式RVCモデル 通常1.pth",
            ModelId::Amitaro => "AMITARO-natural.pth",
        }
    }

    /// Resolves an identifier without touching the filesystem.
    pub fn resolve(identifier: &str) -> Result<Self, ConvertError> {
        let wanted = identifier.trim();
        Self::all()
            .into_iter()
            .find(|id| {
                id.aliases()
                    .iter()
                    .any(|alias| alias.eq_ignore_ascii_case(wanted))
            })
            .ok_or_else(|| ConvertError::UnknownModel(identifier.to_string()))
    }
}

impl FromStr for ModelId {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
