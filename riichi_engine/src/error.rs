use std::fmt;

/// What ran out when an operation hit `ResourceExhausted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// 山牌（自摸可能な牌）
    LiveWall,
    /// 王牌
    DeadWall,
    /// ドラ表示牌・槓ドラ表示牌の候補
    DoraIndicator,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::LiveWall => write!(f, "live wall"),
            Resource::DeadWall => write!(f, "dead wall"),
            Resource::DoraIndicator => write!(f, "dora indicator"),
        }
    }
}

#[derive(Debug)]
pub enum EngineError {
    /// 現在の状態では実行できない操作（手牌にない牌の打牌、自分の捨て牌を鳴く等）
    State { message: String },
    /// 牌山・王牌・ドラ表示牌の枯渇
    ResourceExhausted { resource: Resource, message: String },
    /// 内部の帳尻が合わない（136枚の保存則違反など）。プログラムの欠陥
    InvariantViolation { message: String },
    /// ルール設定の読み込み失敗
    Config { message: String },
}

impl EngineError {
    pub(crate) fn state(message: impl Into<String>) -> Self {
        EngineError::State {
            message: message.into(),
        }
    }

    pub(crate) fn exhausted(resource: Resource, message: impl Into<String>) -> Self {
        EngineError::ResourceExhausted {
            resource,
            message: message.into(),
        }
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        EngineError::InvariantViolation {
            message: message.into(),
        }
    }

    /// Fatal errors abort the match; the rest are reported and play continues.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::InvariantViolation { .. })
    }

    /// The live wall ran dry: a drawn game, not a fault.
    pub fn is_wall_exhausted(&self) -> bool {
        matches!(
            self,
            EngineError::ResourceExhausted {
                resource: Resource::LiveWall,
                ..
            }
        )
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::State { message } => {
                write!(f, "Invalid state: {}", message)
            }
            EngineError::ResourceExhausted { resource, message } => {
                write!(f, "Exhausted {}: {}", resource, message)
            }
            EngineError::InvariantViolation { message } => {
                write!(f, "Invariant violated: {}", message)
            }
            EngineError::Config { message } => {
                write!(f, "Config error: {}", message)
            }
        }
    }
}

impl std::error::Error for EngineError {}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Config {
            message: err.to_string(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
