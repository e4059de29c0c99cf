//! 挂载准入
//!
//! 约定：
//! - compat 特性不理解也可以忽略；
//! - incompat 特性只要有一位不理解就拒绝挂载；
//! - ro_compat 特性有不理解的位时，只能只读挂载。

use crate::{
    error::{Error, FeatureWord, Result},
    features::{CompatFeatures, IncompatFeatures, IncompatFlags, RoCompatFeatures, RoCompatFlags},
    superblock::SuperBlock,
    types::Revision,
};

/// 挂载模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MountMode {
    #[default]
    ReadOnly,
    ReadWrite,
}

/// 本实现理解的特性集合
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedFeatures {
    pub incompat: IncompatFeatures,
    pub ro_compat: RoCompatFeatures,
}

impl Default for SupportedFeatures {
    /// 所有有名字的位
    fn default() -> Self {
        Self {
            incompat: IncompatFeatures::all(),
            ro_compat: RoCompatFeatures::all(),
        }
    }
}

impl SupportedFeatures {
    /// 从支持集合中去掉若干 incompat 特性
    pub fn without_incompat(self, flags: IncompatFlags) -> Self {
        Self {
            incompat: IncompatFeatures::from(self.incompat.flags().difference(flags)),
            ..self
        }
    }

    /// 从支持集合中去掉若干 ro_compat 特性
    pub fn without_ro_compat(self, flags: RoCompatFlags) -> Self {
        Self {
            ro_compat: RoCompatFeatures::from(self.ro_compat.flags().difference(flags)),
            ..self
        }
    }
}

/// 挂载选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MountOptions {
    /// 请求的挂载模式
    pub mode: MountMode,
    pub supported: SupportedFeatures,
}

impl MountOptions {
    pub fn read_only() -> Self {
        Self::default()
    }

    pub fn read_write() -> Self {
        Self {
            mode: MountMode::ReadWrite,
            ..Self::default()
        }
    }

    pub fn with_supported(self, supported: SupportedFeatures) -> Self {
        Self { supported, ..self }
    }
}

/// 被降级为只读的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Downgrade {
    /// ro_compat 中有不理解的位（非致命的 `UnsupportedFeature`）
    UnsupportedFeature(Error),
    /// 文件系统设置了 ro_compat READONLY
    ReadOnlyFeature,
    /// 版本号比 Dynamic 更新
    RevisionTooNew(u32),
}

/// 准入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountDecision {
    /// 拒绝挂载（incompat 中有不理解的位）
    Refuse(Error),
    /// 只能只读挂载
    ForceReadOnly(Downgrade),
    /// 按请求的模式挂载
    Permit(MountMode),
}

impl MountDecision {
    /// 生效的挂载模式；拒绝时为 None
    pub fn mode(&self) -> Option<MountMode> {
        match self {
            MountDecision::Refuse(_) => None,
            MountDecision::ForceReadOnly(_) => Some(MountMode::ReadOnly),
            MountDecision::Permit(mode) => Some(*mode),
        }
    }

    pub fn is_refused(&self) -> bool {
        matches!(self, MountDecision::Refuse(_))
    }

    pub fn into_result(self) -> Result<MountMode> {
        match self {
            MountDecision::Refuse(err) => Err(err),
            MountDecision::ForceReadOnly(_) => Ok(MountMode::ReadOnly),
            MountDecision::Permit(mode) => Ok(mode),
        }
    }
}

/// 根据特性字决定能否挂载以及以什么模式挂载
///
/// 只读请求只有三种结果：incompat 有未知位时拒绝，ro_compat 有未知位时强制只读，否则按请求挂载。
/// ro_compat READONLY 标志和过新的版本号只会把读写请求降为只读，对只读请求没有影响。
pub fn evaluate<S: SuperBlock + ?Sized>(sb: &S, opts: &MountOptions) -> MountDecision {
    let words = sb.feature_words();

    let unsupported_incompat = words.incompat & !opts.supported.incompat.to_bits();
    if unsupported_incompat != 0 {
        log::warn!("refusing mount: unsupported incompat features 0x{:x}", unsupported_incompat);
        return MountDecision::Refuse(Error::unsupported_feature(
            FeatureWord::Incompat,
            unsupported_incompat,
        ));
    }

    let unsupported_ro = words.ro_compat & !opts.supported.ro_compat.to_bits();
    if unsupported_ro != 0 {
        log::warn!("forcing read-only: unsupported ro_compat features 0x{:x}", unsupported_ro);
        return MountDecision::ForceReadOnly(Downgrade::UnsupportedFeature(
            Error::unsupported_feature(FeatureWord::RoCompat, unsupported_ro),
        ));
    }

    let unknown_compat = CompatFeatures::unknown_bits(words.compat);
    if unknown_compat != 0 {
        log::warn!("ignoring unknown compat features 0x{:x}", unknown_compat);
    }

    if sb.incompat_features().recovery {
        log::warn!("journal needs recovery; it will not be replayed");
    }

    if opts.mode == MountMode::ReadWrite {
        if sb.ro_compat_features().read_only {
            log::warn!("filesystem is marked read-only; forcing read-only mount");
            return MountDecision::ForceReadOnly(Downgrade::ReadOnlyFeature);
        }
        if let Revision::Unknown(rev) = sb.revision() {
            log::warn!("revision level {} too high; forcing read-only mount", rev);
            return MountDecision::ForceReadOnly(Downgrade::RevisionTooNew(rev));
        }
    }

    log::debug!("mount permitted: {:?}", opts.mode);
    MountDecision::Permit(opts.mode)
}
