//! 错误处理模块

use core::fmt;

/// 特性标志字
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureWord {
    /// s_feature_compat
    Compat,
    /// s_feature_incompat
    Incompat,
    /// s_feature_ro_compat
    RoCompat,
}

impl fmt::Display for FeatureWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeatureWord::Compat => "compat",
            FeatureWord::Incompat => "incompat",
            FeatureWord::RoCompat => "ro_compat",
        };
        f.write_str(name)
    }
}

/// 无法识别的特性位
///
/// 记录是哪一个标志字中的哪些位，方便调用者精确地打印日志。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnknownFeatures {
    pub word: FeatureWord,
    pub bits: u32,
}

impl fmt::Display for UnknownFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} 0x{:08x}", self.word, self.bits)
    }
}

/// 错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 缓冲区比解码器需要的字段范围短
    BufferTooSmall,
    /// 魔数不是 0xEF53（不是 ext4，而不是 ext4 损坏）
    BadMagic,
    /// 块/簇几何参数自相矛盾
    InconsistentGeometry,
    /// 存在本实现不理解的特性位
    UnsupportedFeature,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BufferTooSmall => "buffer too small",
            ErrorKind::BadMagic => "bad magic",
            ErrorKind::InconsistentGeometry => "inconsistent geometry",
            ErrorKind::UnsupportedFeature => "unsupported feature",
        }
    }
}

/// superblock 解码错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: &'static str,
    feature: Option<UnknownFeatures>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self {
            kind,
            message,
            feature: None,
        }
    }

    /// 构造携带具体特性位的 `UnsupportedFeature` 错误
    pub fn unsupported_feature(word: FeatureWord, bits: u32) -> Self {
        let message = match word {
            FeatureWord::Incompat => "unknown incompatible feature",
            FeatureWord::RoCompat => "unknown read-only compatible feature",
            FeatureWord::Compat => "unknown compatible feature",
        };
        Self {
            kind: ErrorKind::UnsupportedFeature,
            message,
            feature: Some(UnknownFeatures { word, bits }),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &'static str {
        self.message
    }

    /// 导致错误的特性位（仅 `UnsupportedFeature`）
    pub fn feature(&self) -> Option<UnknownFeatures> {
        self.feature
    }

    /// 是否终止挂载
    ///
    /// 只有 incompat 字中的未知位是致命的；ro_compat 只会把挂载降级为只读。
    pub fn is_fatal(&self) -> bool {
        match self.kind {
            ErrorKind::UnsupportedFeature => {
                matches!(self.feature, Some(UnknownFeatures { word: FeatureWord::Incompat, .. }))
            }
            _ => true,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ext4 superblock: {}: {}", self.kind.as_str(), self.message)?;
        if let Some(feature) = self.feature {
            write!(f, " ({})", feature)?;
        }
        Ok(())
    }
}

impl core::error::Error for Error {}

/// Result 类型
pub type Result<T> = core::result::Result<T, Error>;
