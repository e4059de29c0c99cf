//! Dynamic superblock
//!
//! 在 revision 0 字段之外还包含：第一个非保留 inode、inode 大小、块组号、
//! 三个特性字、UUID、卷标，以及 64bit 特性下的高 32 位计数和块组描述符大小。

use super::{
    base_accessors, check_magic, geometry, read::FieldReader, BaseFields, Geometry, SuperBlock,
};
use crate::{
    consts::*,
    error::Result,
    features::{CompatFeatures, FeatureWords, IncompatFeatures, RoCompatFeatures},
    types::{Timestamp, Uuid, VolumeLabel},
};

/// Dynamic（revision 1 及以上）superblock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicSuperblock {
    base: BaseFields,
    geometry: Geometry,
    first_ino: u32,
    inode_size: u16,
    block_group_nr: u16,
    words: FeatureWords,
    uuid: Uuid,
    label: VolumeLabel,
    blocks_count: u64,
    r_blocks_count: u64,
    free_blocks_count: u64,
    desc_size: u16,
    mtime: Timestamp,
    wtime: Timestamp,
    mkfs_time: Timestamp,
    backup_bgs: [u32; 2],
}

impl DynamicSuperblock {
    /// 从 superblock 起始处的字节解码
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let r = FieldReader::new(buf, EXT4_DYNAMIC_SPAN)?;
        check_magic(&r)?;

        let base = BaseFields::parse(&r);
        let words = FeatureWords {
            compat: r.u32(offset::FEATURE_COMPAT),
            incompat: r.u32(offset::FEATURE_INCOMPAT),
            ro_compat: r.u32(offset::FEATURE_RO_COMPAT),
        };
        let incompat = words.incompat_features();
        let ro_compat = words.ro_compat_features();
        log::debug!(
            "superblock features: compat=0x{:x}, incompat=0x{:x}, ro_compat=0x{:x}",
            words.compat,
            words.incompat,
            words.ro_compat
        );

        let geometry = Geometry::derive(&base.raw_geometry(), ro_compat.bigalloc)?;

        let is_64bit = incompat.is_64bit;
        let blocks_count = geometry::reconcile_count(
            is_64bit,
            base.blocks_count_lo,
            r.u32(offset::BLOCKS_COUNT_HI),
        );
        let r_blocks_count = geometry::reconcile_count(
            is_64bit,
            base.r_blocks_count_lo,
            r.u32(offset::R_BLOCKS_COUNT_HI),
        );
        let free_blocks_count = geometry::reconcile_count(
            is_64bit,
            base.free_blocks_count_lo,
            r.u32(offset::FREE_BLOCKS_COUNT_HI),
        );
        base.check_data_start(blocks_count)?;

        let inode_size = geometry::check_inode_size(r.u16(offset::INODE_SIZE), geometry.block_size)?;
        let desc_size = geometry::group_desc_size(is_64bit, r.u16(offset::DESC_SIZE))?;

        let first_ino = r.u32(offset::FIRST_INO);
        if first_ino < EXT4_GOOD_OLD_FIRST_INO {
            log::warn!("s_first_ino {} overlaps reserved inodes", first_ino);
        }

        Ok(Self {
            geometry,
            first_ino,
            inode_size,
            block_group_nr: r.u16(offset::BLOCK_GROUP_NR),
            words,
            uuid: Uuid(r.bytes16(offset::UUID)),
            label: VolumeLabel::from_raw(r.bytes16(offset::VOLUME_NAME)),
            blocks_count,
            r_blocks_count,
            free_blocks_count,
            desc_size,
            mtime: Timestamp::from_parts(base.mtime, r.u8(offset::MTIME_HI)),
            wtime: Timestamp::from_parts(base.wtime, r.u8(offset::WTIME_HI)),
            mkfs_time: Timestamp::from_parts(r.u32(offset::MKFS_TIME), r.u8(offset::MKFS_TIME_HI)),
            backup_bgs: [r.u32(offset::BACKUP_BGS), r.u32(offset::BACKUP_BGS + 4)],
            base,
        })
    }
}

impl SuperBlock for DynamicSuperblock {
    base_accessors!();

    fn blocks_count(&self) -> u64 {
        self.blocks_count
    }

    fn reserved_blocks_count(&self) -> u64 {
        self.r_blocks_count
    }

    fn free_blocks_count(&self) -> u64 {
        self.free_blocks_count
    }

    fn first_inode(&self) -> u32 {
        self.first_ino
    }

    fn inode_size(&self) -> u16 {
        self.inode_size
    }

    fn group_desc_size(&self) -> u16 {
        self.desc_size
    }

    fn compat_features(&self) -> CompatFeatures {
        self.words.compat_features()
    }

    fn incompat_features(&self) -> IncompatFeatures {
        self.words.incompat_features()
    }

    fn ro_compat_features(&self) -> RoCompatFeatures {
        self.words.ro_compat_features()
    }

    fn feature_words(&self) -> FeatureWords {
        self.words
    }

    fn mount_time(&self) -> Timestamp {
        self.mtime
    }

    fn write_time(&self) -> Timestamp {
        self.wtime
    }

    fn creation_time(&self) -> Timestamp {
        self.mkfs_time
    }

    fn last_check_time(&self) -> Timestamp {
        Timestamp::from_secs(self.base.lastcheck)
    }

    fn group_number(&self) -> u16 {
        self.block_group_nr
    }

    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn label(&self) -> VolumeLabel {
        self.label
    }

    fn backup_groups(&self) -> [u32; 2] {
        self.backup_bgs
    }
}
