//! 挂载入口
//!
//! 把解码和准入串起来：字节 -> superblock -> 挂载模式。
//! 不做任何 I/O，调用者负责提供从设备读出的字节。

use crate::{
    admission::{self, Downgrade, MountDecision, MountMode, MountOptions},
    consts::*,
    error::{Error, ErrorKind, Result},
    superblock::{self, DecodedSuperblock, SuperBlock},
};

/// 已通过准入的 superblock
///
/// 挂载期间不可变，可以以引用的方式被多个读者共享。
///
/// # 示例
///
/// ```rust,ignore
/// use ext4sb_core::{Ext4Mount, MountOptions, SuperBlock};
///
/// let image: &[u8] = read_image_head(); // 至少 2048 字节
/// let mount = Ext4Mount::mount(image, &MountOptions::read_only())?;
/// println!("block size: {}", mount.superblock().block_size());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ext4Mount {
    sb: DecodedSuperblock,
    mode: MountMode,
    downgrade: Option<Downgrade>,
}

impl Ext4Mount {
    /// 从设备镜像的开头挂载
    ///
    /// `image` 必须至少覆盖 superblock 所在的区域（偏移 1024 起）。
    pub fn mount(image: &[u8], opts: &MountOptions) -> Result<Self> {
        let region = image.get(EXT4_SUPERBLOCK_OFFSET as usize..).ok_or_else(|| {
            Error::new(ErrorKind::BufferTooSmall, "image ends before superblock offset")
        })?;
        Self::from_superblock(region, opts)
    }

    /// 从 superblock 本身的字节挂载
    ///
    /// # 错误
    ///
    /// - `ErrorKind::BufferTooSmall` - 缓冲区不足
    /// - `ErrorKind::BadMagic` - 不是 ext4
    /// - `ErrorKind::InconsistentGeometry` - 几何参数矛盾
    /// - `ErrorKind::UnsupportedFeature` - 有不理解的 incompat 特性
    pub fn from_superblock(buf: &[u8], opts: &MountOptions) -> Result<Self> {
        let sb = superblock::decode(buf)?;
        Self::admit(sb, opts)
    }

    /// 对已解码的 superblock 做准入
    pub fn admit(sb: DecodedSuperblock, opts: &MountOptions) -> Result<Self> {
        let (mode, downgrade) = match admission::evaluate(&sb, opts) {
            MountDecision::Refuse(err) => return Err(err),
            MountDecision::ForceReadOnly(reason) => (MountMode::ReadOnly, Some(reason)),
            MountDecision::Permit(mode) => (mode, None),
        };

        log::debug!(
            "ext4 mounted: blocks={}, block_size={}, groups={}, mode={:?}",
            sb.blocks_count(),
            sb.block_size(),
            sb.group_count(),
            mode
        );

        Ok(Self { sb, mode, downgrade })
    }

    /// 获取 superblock 引用
    pub fn superblock(&self) -> &DecodedSuperblock {
        &self.sb
    }

    /// 生效的挂载模式
    pub fn mode(&self) -> MountMode {
        self.mode
    }

    pub fn is_read_only(&self) -> bool {
        self.mode == MountMode::ReadOnly
    }

    /// 被降级为只读的原因（没有降级时为 None）
    pub fn downgrade(&self) -> Option<Downgrade> {
        self.downgrade
    }
}
