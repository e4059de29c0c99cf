//! Superblock 解码模块
//!
//! 磁盘上有两种 superblock 布局：原始的 revision 0 和带扩展字段的 dynamic 布局。
//! 两个解码器互相独立，输出都实现 [`SuperBlock`]，文件系统的其他部分只依赖这个 trait。
//!
//! 解码流程：检查长度 -> 检查魔数 -> 按 s_rev_level 选择解码器 -> 推导几何参数。
//! 解码结果构造后不可变，可以在多个读者之间共享。

mod dynamic;
pub mod geometry;
mod old;
mod read;
pub mod replica;

pub use dynamic::DynamicSuperblock;
pub use geometry::Geometry;
pub use old::OldSuperblock;

use crate::{
    consts::*,
    error::{Error, ErrorKind, Result},
    features::{CompatFeatures, FeatureWords, IncompatFeatures, RoCompatFeatures},
    types::{CreatorOs, ErrorPolicy, Revision, SbState, Timestamp, Uuid, VolumeLabel},
};
use read::FieldReader;

/// superblock 的抽象接口
///
/// 不论来自哪个磁盘版本，解码结果都通过这个 trait 访问。
/// 新的磁盘版本只需要新增一个实现，调用者不用改动。
pub trait SuperBlock {
    /// 总 inode 数
    fn inodes_count(&self) -> u32;

    /// 总块数（64bit 特性下合并高 32 位）
    fn blocks_count(&self) -> u64;

    /// 为超级用户保留的块数
    fn reserved_blocks_count(&self) -> u64;

    /// 空闲块数
    fn free_blocks_count(&self) -> u64;

    /// 空闲 inode 数
    fn free_inodes_count(&self) -> u32;

    /// 自上次 fsck 以来的挂载次数
    fn mount_count(&self) -> u16;

    /// 需要 fsck 之前允许的最大挂载次数
    fn max_mount_count(&self) -> u16;

    /// 第一个数据块（即 superblock 所在的块）
    ///
    /// 1K 块大小时为 1，其他情况通常为 0。
    fn first_data_block(&self) -> u32;

    /// 第一个非保留 inode
    fn first_inode(&self) -> u32;

    /// 块大小（字节）
    fn block_size(&self) -> u64;

    fn blocks_per_group(&self) -> u32;

    /// 簇大小；未启用 bigalloc 时等于块大小
    fn cluster_size(&self) -> u64;

    /// 每组簇数；未启用 bigalloc 时等于每组块数
    fn clusters_per_group(&self) -> u32;

    /// inode 结构大小
    fn inode_size(&self) -> u16;

    fn inodes_per_group(&self) -> u32;

    /// 块组描述符大小
    fn group_desc_size(&self) -> u16;

    fn compat_features(&self) -> CompatFeatures;

    fn incompat_features(&self) -> IncompatFeatures;

    fn ro_compat_features(&self) -> RoCompatFeatures;

    /// 磁盘上的原始特性字（含未知位）
    fn feature_words(&self) -> FeatureWords;

    /// 最后挂载时间
    fn mount_time(&self) -> Timestamp;

    /// 最后写入时间
    fn write_time(&self) -> Timestamp;

    /// mkfs 时间
    fn creation_time(&self) -> Timestamp;

    /// 最后检查时间
    fn last_check_time(&self) -> Timestamp;

    /// 两次强制检查之间的最大间隔（秒）
    fn check_interval(&self) -> u32;

    /// 魔数，必须为 0xEF53
    fn magic(&self) -> u16;

    fn state(&self) -> SbState;

    fn error_policy(&self) -> ErrorPolicy;

    fn creator_os(&self) -> CreatorOs;

    fn revision(&self) -> Revision;

    fn minor_revision(&self) -> u16;

    /// 默认保留 uid/gid
    fn default_reserved_ids(&self) -> (u16, u16);

    /// 这份 superblock 所在的块组号，副本时可能非 0
    fn group_number(&self) -> u16;

    fn uuid(&self) -> Uuid;

    fn label(&self) -> VolumeLabel;

    /// sparse_super2 的两个备份组（s_backup_bgs）
    fn backup_groups(&self) -> [u32; 2];

    /// 块组数量
    fn group_count(&self) -> u64 {
        geometry::group_count(self.blocks_count(), self.first_data_block(), self.blocks_per_group())
    }

    /// 几何参数快照
    fn geometry(&self) -> Geometry {
        Geometry {
            block_size: self.block_size(),
            cluster_size: self.cluster_size(),
            blocks_per_group: self.blocks_per_group(),
            clusters_per_group: self.clusters_per_group(),
            inodes_per_group: self.inodes_per_group(),
        }
    }
}

/// 检查魔数
///
/// 在解释其他任何字段之前完成。
fn check_magic(r: &FieldReader<'_>) -> Result<()> {
    let magic = r.u16(offset::MAGIC);
    if magic != EXT4_SUPERBLOCK_MAGIC {
        log::debug!("not an ext4 superblock: magic=0x{:04x}", magic);
        return Err(Error::new(ErrorKind::BadMagic, "invalid ext4 superblock magic number"));
    }
    Ok(())
}

/// 解码结果
///
/// 按版本号分派一次，之后所有访问都通过 [`SuperBlock`]。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedSuperblock {
    Original(OldSuperblock),
    Dynamic(DynamicSuperblock),
}

/// 解码 superblock
///
/// `buf` 从 superblock 起始处开始（即设备偏移 1024）。
pub fn decode(buf: &[u8]) -> Result<DecodedSuperblock> {
    let r = FieldReader::new(buf, EXT4_REV0_SPAN)?;
    check_magic(&r)?;

    let revision = Revision::from(r.u32(offset::REV_LEVEL));
    log::debug!("superblock revision: {:?}", revision);

    match revision {
        Revision::Original => OldSuperblock::decode(buf).map(DecodedSuperblock::Original),
        Revision::Dynamic | Revision::Unknown(_) => {
            DynamicSuperblock::decode(buf).map(DecodedSuperblock::Dynamic)
        }
    }
}

macro_rules! dispatch {
    ($($name:ident -> $ret:ty),* $(,)?) => {
        $(
            fn $name(&self) -> $ret {
                match self {
                    DecodedSuperblock::Original(sb) => sb.$name(),
                    DecodedSuperblock::Dynamic(sb) => sb.$name(),
                }
            }
        )*
    };
}

impl SuperBlock for DecodedSuperblock {
    dispatch! {
        inodes_count -> u32,
        blocks_count -> u64,
        reserved_blocks_count -> u64,
        free_blocks_count -> u64,
        free_inodes_count -> u32,
        mount_count -> u16,
        max_mount_count -> u16,
        first_data_block -> u32,
        first_inode -> u32,
        block_size -> u64,
        blocks_per_group -> u32,
        cluster_size -> u64,
        clusters_per_group -> u32,
        inode_size -> u16,
        inodes_per_group -> u32,
        group_desc_size -> u16,
        compat_features -> CompatFeatures,
        incompat_features -> IncompatFeatures,
        ro_compat_features -> RoCompatFeatures,
        feature_words -> FeatureWords,
        mount_time -> Timestamp,
        write_time -> Timestamp,
        creation_time -> Timestamp,
        last_check_time -> Timestamp,
        check_interval -> u32,
        magic -> u16,
        state -> SbState,
        error_policy -> ErrorPolicy,
        creator_os -> CreatorOs,
        revision -> Revision,
        minor_revision -> u16,
        default_reserved_ids -> (u16, u16),
        group_number -> u16,
        uuid -> Uuid,
        label -> VolumeLabel,
        backup_groups -> [u32; 2],
    }
}

/// 两种布局共有的 revision 0 字段
///
/// 对应 struct ext4_super_block 的前 0x54 字节。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BaseFields {
    pub inodes_count: u32,           // 0x00
    pub blocks_count_lo: u32,        // 0x04
    pub r_blocks_count_lo: u32,      // 0x08
    pub free_blocks_count_lo: u32,   // 0x0C
    pub free_inodes_count: u32,      // 0x10
    pub first_data_block: u32,       // 0x14
    pub log_block_size: u32,         // 0x18
    pub log_cluster_size: u32,       // 0x1C（revision 0 中为 log_frag_size）
    pub blocks_per_group: u32,       // 0x20
    pub clusters_per_group: u32,     // 0x24
    pub inodes_per_group: u32,       // 0x28
    pub mtime: u32,                  // 0x2C
    pub wtime: u32,                  // 0x30
    pub mnt_count: u16,              // 0x34
    pub max_mnt_count: u16,          // 0x36
    pub magic: u16,                  // 0x38
    pub state: u16,                  // 0x3A
    pub errors: u16,                 // 0x3C
    pub minor_rev_level: u16,        // 0x3E
    pub lastcheck: u32,              // 0x40
    pub checkinterval: u32,          // 0x44
    pub creator_os: u32,             // 0x48
    pub rev_level: u32,              // 0x4C
    pub def_resuid: u16,             // 0x50
    pub def_resgid: u16,             // 0x52
}

impl BaseFields {
    fn parse(r: &FieldReader<'_>) -> Self {
        Self {
            inodes_count: r.u32(offset::INODES_COUNT),
            blocks_count_lo: r.u32(offset::BLOCKS_COUNT_LO),
            r_blocks_count_lo: r.u32(offset::R_BLOCKS_COUNT_LO),
            free_blocks_count_lo: r.u32(offset::FREE_BLOCKS_COUNT_LO),
            free_inodes_count: r.u32(offset::FREE_INODES_COUNT),
            first_data_block: r.u32(offset::FIRST_DATA_BLOCK),
            log_block_size: r.u32(offset::LOG_BLOCK_SIZE),
            log_cluster_size: r.u32(offset::LOG_CLUSTER_SIZE),
            blocks_per_group: r.u32(offset::BLOCKS_PER_GROUP),
            clusters_per_group: r.u32(offset::CLUSTERS_PER_GROUP),
            inodes_per_group: r.u32(offset::INODES_PER_GROUP),
            mtime: r.u32(offset::MTIME),
            wtime: r.u32(offset::WTIME),
            mnt_count: r.u16(offset::MNT_COUNT),
            max_mnt_count: r.u16(offset::MAX_MNT_COUNT),
            magic: r.u16(offset::MAGIC),
            state: r.u16(offset::STATE),
            errors: r.u16(offset::ERRORS),
            minor_rev_level: r.u16(offset::MINOR_REV_LEVEL),
            lastcheck: r.u32(offset::LASTCHECK),
            checkinterval: r.u32(offset::CHECKINTERVAL),
            creator_os: r.u32(offset::CREATOR_OS),
            rev_level: r.u32(offset::REV_LEVEL),
            def_resuid: r.u16(offset::DEF_RESUID),
            def_resgid: r.u16(offset::DEF_RESGID),
        }
    }

    fn raw_geometry(&self) -> geometry::RawGeometry {
        geometry::RawGeometry {
            log_block_size: self.log_block_size,
            log_cluster_size: self.log_cluster_size,
            blocks_per_group: self.blocks_per_group,
            clusters_per_group: self.clusters_per_group,
            inodes_per_group: self.inodes_per_group,
            first_data_block: self.first_data_block,
        }
    }

    /// 第一个数据块必须落在卷内
    fn check_data_start(&self, blocks_count: u64) -> Result<()> {
        if self.first_data_block as u64 >= blocks_count {
            log::debug!(
                "first data block {} beyond block count {}",
                self.first_data_block,
                blocks_count
            );
            return Err(Error::new(
                ErrorKind::InconsistentGeometry,
                "first data block beyond end of volume",
            ));
        }
        Ok(())
    }
}

/// 两种布局共有的访问器
///
/// 要求实现类型带有 `base: BaseFields` 和 `geometry: Geometry` 字段。
macro_rules! base_accessors {
    () => {
        fn inodes_count(&self) -> u32 {
            self.base.inodes_count
        }

        fn free_inodes_count(&self) -> u32 {
            self.base.free_inodes_count
        }

        fn mount_count(&self) -> u16 {
            self.base.mnt_count
        }

        fn max_mount_count(&self) -> u16 {
            self.base.max_mnt_count
        }

        fn first_data_block(&self) -> u32 {
            self.base.first_data_block
        }

        fn block_size(&self) -> u64 {
            self.geometry.block_size
        }

        fn blocks_per_group(&self) -> u32 {
            self.geometry.blocks_per_group
        }

        fn cluster_size(&self) -> u64 {
            self.geometry.cluster_size
        }

        fn clusters_per_group(&self) -> u32 {
            self.geometry.clusters_per_group
        }

        fn inodes_per_group(&self) -> u32 {
            self.geometry.inodes_per_group
        }

        fn check_interval(&self) -> u32 {
            self.base.checkinterval
        }

        fn magic(&self) -> u16 {
            self.base.magic
        }

        fn state(&self) -> $crate::types::SbState {
            $crate::types::SbState::from_bits(self.base.state)
        }

        fn error_policy(&self) -> $crate::types::ErrorPolicy {
            $crate::types::ErrorPolicy::from(self.base.errors)
        }

        fn creator_os(&self) -> $crate::types::CreatorOs {
            $crate::types::CreatorOs::from(self.base.creator_os)
        }

        fn revision(&self) -> $crate::types::Revision {
            $crate::types::Revision::from(self.base.rev_level)
        }

        fn minor_revision(&self) -> u16 {
            self.base.minor_rev_level
        }

        fn default_reserved_ids(&self) -> (u16, u16) {
            (self.base.def_resuid, self.base.def_resgid)
        }

        fn geometry(&self) -> $crate::superblock::Geometry {
            self.geometry
        }
    };
}

pub(crate) use base_accessors;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn base_image(rev: u32) -> alloc::vec::Vec<u8> {
        let mut buf = vec![0u8; EXT4_SUPERBLOCK_SIZE];
        buf[offset::BLOCKS_COUNT_LO..offset::BLOCKS_COUNT_LO + 4]
            .copy_from_slice(&65536u32.to_le_bytes());
        buf[offset::LOG_BLOCK_SIZE..offset::LOG_BLOCK_SIZE + 4].copy_from_slice(&2u32.to_le_bytes());
        buf[offset::LOG_CLUSTER_SIZE..offset::LOG_CLUSTER_SIZE + 4]
            .copy_from_slice(&2u32.to_le_bytes());
        buf[offset::BLOCKS_PER_GROUP..offset::BLOCKS_PER_GROUP + 4]
            .copy_from_slice(&32768u32.to_le_bytes());
        buf[offset::CLUSTERS_PER_GROUP..offset::CLUSTERS_PER_GROUP + 4]
            .copy_from_slice(&32768u32.to_le_bytes());
        buf[offset::INODES_PER_GROUP..offset::INODES_PER_GROUP + 4]
            .copy_from_slice(&8192u32.to_le_bytes());
        buf[offset::MAGIC..offset::MAGIC + 2].copy_from_slice(&EXT4_SUPERBLOCK_MAGIC.to_le_bytes());
        buf[offset::REV_LEVEL..offset::REV_LEVEL + 4].copy_from_slice(&rev.to_le_bytes());
        if rev >= 1 {
            buf[offset::INODE_SIZE..offset::INODE_SIZE + 2].copy_from_slice(&256u16.to_le_bytes());
            buf[offset::FIRST_INO..offset::FIRST_INO + 4].copy_from_slice(&11u32.to_le_bytes());
        }
        buf
    }

    #[test]
    fn test_dispatch_by_revision() {
        let sb = decode(&base_image(0)).unwrap();
        assert!(matches!(sb, DecodedSuperblock::Original(_)));
        assert_eq!(sb.revision(), Revision::Original);

        let sb = decode(&base_image(1)).unwrap();
        assert!(matches!(sb, DecodedSuperblock::Dynamic(_)));
        assert_eq!(sb.inode_size(), 256);

        let sb = decode(&base_image(5)).unwrap();
        assert!(matches!(sb, DecodedSuperblock::Dynamic(_)));
        assert_eq!(sb.revision(), Revision::Unknown(5));
    }

    #[test]
    fn test_bad_magic_checked_first() {
        let mut buf = base_image(1);
        buf[offset::MAGIC] = 0;
        buf[offset::MAGIC + 1] = 0;
        // 其他字段也是坏的，但魔数先被检查
        buf[offset::LOG_BLOCK_SIZE] = 9;
        let err = decode(&buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadMagic);
    }

    #[test]
    fn test_too_small_for_any_layout() {
        let buf = base_image(0);
        let err = decode(&buf[..0x40]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferTooSmall);
    }

    #[test]
    fn test_dynamic_needs_full_region() {
        let buf = base_image(1);
        let err = decode(&buf[..EXT4_REV0_SPAN]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferTooSmall);
        // revision 0 只需要固定区域
        let buf = base_image(0);
        assert!(decode(&buf[..EXT4_REV0_SPAN]).is_ok());
    }

    #[test]
    fn test_group_count_and_geometry() {
        let sb = decode(&base_image(1)).unwrap();
        assert_eq!(sb.group_count(), 2);
        let g = sb.geometry();
        assert_eq!(g.block_size, 4096);
        assert_eq!(g.cluster_size, 4096);
        assert_eq!(g.clusters_per_group, 32768);
    }
}
