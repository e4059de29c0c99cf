//! Revision 0 superblock
//!
//! 原始格式只有固定的 0x54 字节。特性字、UUID、卷标在磁盘上不存在，
//! 分别解码为全 false、全零和空；inode 大小固定为 128。

use super::{
    base_accessors, check_magic, read::FieldReader, BaseFields, Geometry, SuperBlock,
};
use crate::{
    consts::*,
    error::Result,
    features::{CompatFeatures, FeatureWords, IncompatFeatures, RoCompatFeatures},
    types::{Timestamp, Uuid, VolumeLabel},
};

/// Revision 0 superblock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OldSuperblock {
    base: BaseFields,
    geometry: Geometry,
}

impl OldSuperblock {
    /// 从 superblock 起始处的字节解码
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let r = FieldReader::new(buf, EXT4_REV0_SPAN)?;
        check_magic(&r)?;

        let base = BaseFields::parse(&r);
        // 没有特性字，bigalloc 恒为 false
        let geometry = Geometry::derive(&base.raw_geometry(), false)?;
        base.check_data_start(base.blocks_count_lo as u64)?;

        Ok(Self { base, geometry })
    }
}

impl SuperBlock for OldSuperblock {
    base_accessors!();

    fn blocks_count(&self) -> u64 {
        self.base.blocks_count_lo as u64
    }

    fn reserved_blocks_count(&self) -> u64 {
        self.base.r_blocks_count_lo as u64
    }

    fn free_blocks_count(&self) -> u64 {
        self.base.free_blocks_count_lo as u64
    }

    fn first_inode(&self) -> u32 {
        EXT4_GOOD_OLD_FIRST_INO
    }

    fn inode_size(&self) -> u16 {
        EXT4_GOOD_OLD_INODE_SIZE
    }

    fn group_desc_size(&self) -> u16 {
        EXT4_MIN_DESC_SIZE
    }

    fn compat_features(&self) -> CompatFeatures {
        CompatFeatures::default()
    }

    fn incompat_features(&self) -> IncompatFeatures {
        IncompatFeatures::default()
    }

    fn ro_compat_features(&self) -> RoCompatFeatures {
        RoCompatFeatures::default()
    }

    fn feature_words(&self) -> FeatureWords {
        FeatureWords::default()
    }

    fn mount_time(&self) -> Timestamp {
        Timestamp::from_secs(self.base.mtime)
    }

    fn write_time(&self) -> Timestamp {
        Timestamp::from_secs(self.base.wtime)
    }

    fn creation_time(&self) -> Timestamp {
        Timestamp::default()
    }

    fn last_check_time(&self) -> Timestamp {
        Timestamp::from_secs(self.base.lastcheck)
    }

    fn group_number(&self) -> u16 {
        0
    }

    fn uuid(&self) -> Uuid {
        Uuid::default()
    }

    fn label(&self) -> VolumeLabel {
        VolumeLabel::default()
    }

    fn backup_groups(&self) -> [u32; 2] {
        [0, 0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn put32(buf: &mut [u8], off: usize, v: u32) {
        buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
    }

    fn old_image() -> [u8; EXT4_REV0_SPAN] {
        let mut buf = [0u8; EXT4_REV0_SPAN];
        put32(&mut buf, offset::INODES_COUNT, 2048);
        put32(&mut buf, offset::BLOCKS_COUNT_LO, 8192);
        put32(&mut buf, offset::FREE_BLOCKS_COUNT_LO, 7000);
        put32(&mut buf, offset::FREE_INODES_COUNT, 2037);
        put32(&mut buf, offset::FIRST_DATA_BLOCK, 1);
        put32(&mut buf, offset::BLOCKS_PER_GROUP, 8192);
        put32(&mut buf, offset::CLUSTERS_PER_GROUP, 8192);
        put32(&mut buf, offset::INODES_PER_GROUP, 2048);
        put32(&mut buf, offset::MTIME, 1_000_000);
        buf[offset::MAGIC..offset::MAGIC + 2].copy_from_slice(&EXT4_SUPERBLOCK_MAGIC.to_le_bytes());
        buf[offset::ERRORS..offset::ERRORS + 2].copy_from_slice(&3u16.to_le_bytes());
        put32(&mut buf, offset::CREATOR_OS, 1);
        buf
    }

    #[test]
    fn test_decode_fixed_fields() {
        let sb = OldSuperblock::decode(&old_image()).unwrap();
        assert_eq!(sb.inodes_count(), 2048);
        assert_eq!(sb.blocks_count(), 8192);
        assert_eq!(sb.free_blocks_count(), 7000);
        assert_eq!(sb.block_size(), 1024);
        assert_eq!(sb.first_data_block(), 1);
        assert_eq!(sb.inode_size(), 128);
        assert_eq!(sb.first_inode(), 11);
        assert_eq!(sb.group_desc_size(), 32);
        assert_eq!(sb.mount_time().secs(), 1_000_000);
        assert_eq!(sb.error_policy(), crate::types::ErrorPolicy::Panic);
        assert_eq!(sb.creator_os(), crate::types::CreatorOs::Hurd);
    }

    #[test]
    fn test_absent_fields_are_empty() {
        let sb = OldSuperblock::decode(&old_image()).unwrap();
        assert!(sb.compat_features().is_empty());
        assert!(sb.incompat_features().is_empty());
        assert!(sb.ro_compat_features().is_empty());
        assert!(sb.uuid().is_nil());
        assert!(sb.label().is_empty());
        assert_eq!(sb.group_number(), 0);
    }

    #[test]
    fn test_short_buffer() {
        let buf = old_image();
        let err = OldSuperblock::decode(&buf[..EXT4_REV0_SPAN - 1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferTooSmall);
    }

    #[test]
    fn test_data_start_beyond_volume() {
        let mut buf = old_image();
        put32(&mut buf, offset::BLOCKS_COUNT_LO, 1);
        let err = OldSuperblock::decode(&buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InconsistentGeometry);
    }
}
