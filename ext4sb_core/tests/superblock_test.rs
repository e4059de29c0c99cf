//! 集成测试 - 从字节构造 superblock 镜像并走完整的解码、准入流程

use ext4sb_core::consts::{offset, EXT4_SUPERBLOCK_MAGIC, EXT4_SUPERBLOCK_SIZE};
use ext4sb_core::superblock::replica;
use ext4sb_core::{
    decode, CompatFeatures, DecodedSuperblock, Downgrade, ErrorKind, Ext4Mount, FeatureWord,
    IncompatFeatures, MountDecision, MountMode, MountOptions, RoCompatFeatures, SuperBlock,
};

/// 按字段填写 superblock 的测试辅助
struct ImageBuilder {
    buf: Vec<u8>,
}

impl ImageBuilder {
    fn new(rev: u32) -> Self {
        let mut b = Self {
            buf: vec![0u8; EXT4_SUPERBLOCK_SIZE],
        };
        b.u32(offset::INODES_COUNT, 16384)
            .u32(offset::BLOCKS_COUNT_LO, 65536)
            .u32(offset::FREE_BLOCKS_COUNT_LO, 60000)
            .u32(offset::FREE_INODES_COUNT, 16000)
            .u32(offset::LOG_BLOCK_SIZE, 2)
            .u32(offset::LOG_CLUSTER_SIZE, 2)
            .u32(offset::BLOCKS_PER_GROUP, 32768)
            .u32(offset::CLUSTERS_PER_GROUP, 32768)
            .u32(offset::INODES_PER_GROUP, 8192)
            .u16(offset::MAGIC, EXT4_SUPERBLOCK_MAGIC)
            .u16(offset::STATE, 1)
            .u16(offset::ERRORS, 1)
            .u32(offset::REV_LEVEL, rev);
        if rev >= 1 {
            b.u32(offset::FIRST_INO, 11).u16(offset::INODE_SIZE, 256);
        }
        b
    }

    fn u16(&mut self, off: usize, v: u16) -> &mut Self {
        self.buf[off..off + 2].copy_from_slice(&v.to_le_bytes());
        self
    }

    fn u32(&mut self, off: usize, v: u32) -> &mut Self {
        self.buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
        self
    }

    fn bytes(&self) -> &[u8] {
        &self.buf
    }
}

#[test]
fn scenario_a_revision0_4k() {
    let img = ImageBuilder::new(0);
    let sb = decode(img.bytes()).unwrap();
    assert!(matches!(sb, DecodedSuperblock::Original(_)));
    assert_eq!(sb.block_size(), 4096);
    assert_eq!(sb.compat_features(), CompatFeatures::default());
    assert_eq!(sb.incompat_features(), IncompatFeatures::default());
    assert_eq!(sb.ro_compat_features(), RoCompatFeatures::default());

    let mount = Ext4Mount::admit(sb, &MountOptions::read_write()).unwrap();
    assert_eq!(mount.mode(), MountMode::ReadWrite);
}

#[test]
fn bare_header_is_rejected() {
    // 只有魔数和块大小：每组块数、inode 数都是 0
    let mut buf = vec![0u8; EXT4_SUPERBLOCK_SIZE];
    buf[offset::LOG_BLOCK_SIZE..offset::LOG_BLOCK_SIZE + 4].copy_from_slice(&2u32.to_le_bytes());
    buf[offset::LOG_CLUSTER_SIZE..offset::LOG_CLUSTER_SIZE + 4].copy_from_slice(&2u32.to_le_bytes());
    buf[offset::MAGIC..offset::MAGIC + 2].copy_from_slice(&EXT4_SUPERBLOCK_MAGIC.to_le_bytes());
    let err = decode(&buf).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InconsistentGeometry);

    // 每组参数补齐后，块数仍为 0，第一个数据块落在卷外
    buf[offset::BLOCKS_PER_GROUP..offset::BLOCKS_PER_GROUP + 4].copy_from_slice(&32768u32.to_le_bytes());
    buf[offset::INODES_PER_GROUP..offset::INODES_PER_GROUP + 4].copy_from_slice(&8192u32.to_le_bytes());
    let err = decode(&buf).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InconsistentGeometry);

    buf[offset::BLOCKS_COUNT_LO..offset::BLOCKS_COUNT_LO + 4].copy_from_slice(&65536u32.to_le_bytes());
    let sb = decode(&buf).unwrap();
    assert_eq!(sb.block_size(), 4096);
}

#[test]
fn scenario_b_known_features() {
    let mut img = ImageBuilder::new(1);
    img.u32(offset::FEATURE_INCOMPAT, 0x40)
        .u32(offset::FEATURE_RO_COMPAT, 0x10);
    let sb = decode(img.bytes()).unwrap();
    assert!(sb.incompat_features().extents);
    assert!(sb.ro_compat_features().gdt_csum);

    let decision = ext4sb_core::admission::evaluate(&sb, &MountOptions::read_only());
    assert_eq!(decision, MountDecision::Permit(MountMode::ReadOnly));
}

#[test]
fn scenario_c_unknown_incompat_bit() {
    let mut img = ImageBuilder::new(1);
    img.u32(offset::FEATURE_INCOMPAT, 0x40 | 0x2000_0000)
        .u32(offset::FEATURE_RO_COMPAT, 0x10);
    let err = Ext4Mount::from_superblock(img.bytes(), &MountOptions::read_only()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
    assert!(err.is_fatal());
    let feature = err.feature().unwrap();
    assert_eq!(feature.word, FeatureWord::Incompat);
    assert_eq!(feature.bits, 0x2000_0000);
}

#[test]
fn scenario_d_bad_magic() {
    let mut img = ImageBuilder::new(1);
    img.u16(offset::MAGIC, 0x0000)
        // 其余字段也不合法，必须先报告魔数
        .u32(offset::LOG_BLOCK_SIZE, 17)
        .u16(offset::INODE_SIZE, 3);
    let err = decode(img.bytes()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadMagic);
}

#[test]
fn unknown_ro_compat_only_changes_mode() {
    let mut base = ImageBuilder::new(1);
    base.u32(offset::FEATURE_INCOMPAT, 0x40)
        .u32(offset::FEATURE_RO_COMPAT, 0x10);
    let mut extra = ImageBuilder::new(1);
    extra
        .u32(offset::FEATURE_INCOMPAT, 0x40)
        .u32(offset::FEATURE_RO_COMPAT, 0x10 | 0x8000_0000);

    let a = decode(base.bytes()).unwrap();
    let b = decode(extra.bytes()).unwrap();
    assert_eq!(a.ro_compat_features(), b.ro_compat_features());
    assert_eq!(a.geometry(), b.geometry());
    assert_eq!(a.blocks_count(), b.blocks_count());

    let mount = Ext4Mount::admit(b, &MountOptions::read_write()).unwrap();
    assert_eq!(mount.mode(), MountMode::ReadOnly);
    match mount.downgrade() {
        Some(Downgrade::UnsupportedFeature(err)) => {
            assert!(!err.is_fatal());
            assert_eq!(err.feature().map(|f| f.bits), Some(0x8000_0000));
        }
        other => panic!("unexpected downgrade {:?}", other),
    }
}

#[test]
fn unknown_incompat_refused_whatever_else_is_set() {
    for ro in [0u32, 0x10, 0xFFFF_FFFF] {
        for compat in [0u32, 0x3FF, 0x8000_0000] {
            let mut img = ImageBuilder::new(1);
            img.u32(offset::FEATURE_INCOMPAT, 0x0002_0000)
                .u32(offset::FEATURE_RO_COMPAT, ro & !0x200)
                .u32(offset::FEATURE_COMPAT, compat);
            let sb = decode(img.bytes()).unwrap();
            for opts in [MountOptions::read_only(), MountOptions::read_write()] {
                let decision = ext4sb_core::admission::evaluate(&sb, &opts);
                assert!(decision.is_refused(), "ro={:#x} compat={:#x}", ro, compat);
            }
        }
    }
}

#[test]
fn block_sizes() {
    for log in [0u32, 1, 2, 6] {
        let mut img = ImageBuilder::new(1);
        let bpg = 8192u32.min(8 * (1024 << log));
        img.u32(offset::LOG_BLOCK_SIZE, log)
            .u32(offset::LOG_CLUSTER_SIZE, log)
            .u32(offset::BLOCKS_PER_GROUP, bpg)
            .u32(offset::CLUSTERS_PER_GROUP, bpg)
            .u32(offset::FIRST_DATA_BLOCK, if log == 0 { 1 } else { 0 });
        let sb = decode(img.bytes()).unwrap();
        assert_eq!(sb.block_size(), 1024u64 << log);
        assert_eq!(sb.cluster_size(), sb.block_size());
        assert_eq!(sb.clusters_per_group(), sb.blocks_per_group());
    }

    for log in [3u32, 4, 5, 7, 10] {
        let mut img = ImageBuilder::new(1);
        img.u32(offset::LOG_BLOCK_SIZE, log)
            .u32(offset::LOG_CLUSTER_SIZE, log);
        let err = decode(img.bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InconsistentGeometry, "log {}", log);
    }
}

#[test]
fn bigalloc_geometry() {
    let mut img = ImageBuilder::new(1);
    // 4K 块，每簇 2^4 块
    img.u32(offset::FEATURE_RO_COMPAT, 0x200)
        .u32(offset::LOG_CLUSTER_SIZE, 4)
        .u32(offset::CLUSTERS_PER_GROUP, 2048);
    let sb = decode(img.bytes()).unwrap();
    assert!(sb.ro_compat_features().bigalloc);
    assert_eq!(sb.block_size(), 4096);
    assert_eq!(sb.cluster_size(), 65536);
    assert_eq!(sb.clusters_per_group(), 2048);
    assert_eq!(sb.blocks_per_group(), 32768);
}

#[test]
fn bigalloc_cluster_log_counts_blocks() {
    // 簇的 log 是相对块大小的，而不是相对 1024
    let mut img = ImageBuilder::new(1);
    img.u32(offset::FEATURE_RO_COMPAT, 0x200)
        .u32(offset::LOG_CLUSTER_SIZE, 1)
        .u32(offset::CLUSTERS_PER_GROUP, 16384);
    let sb = decode(img.bytes()).unwrap();
    assert_eq!(sb.cluster_size(), 8192);

    // 按 1024 << log 的读法才一致的组合必须被拒绝
    let mut img = ImageBuilder::new(1);
    img.u32(offset::FEATURE_RO_COMPAT, 0x200)
        .u32(offset::LOG_CLUSTER_SIZE, 4)
        .u32(offset::CLUSTERS_PER_GROUP, 8192);
    let err = decode(img.bytes()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InconsistentGeometry);
}

#[test]
fn cluster_log_mismatch_without_bigalloc() {
    let mut img = ImageBuilder::new(1);
    img.u32(offset::LOG_CLUSTER_SIZE, 4);
    let err = decode(img.bytes()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InconsistentGeometry);
}

#[test]
fn high_words_ignored_without_64bit() {
    let mut img = ImageBuilder::new(1);
    img.u32(offset::BLOCKS_COUNT_HI, 0xFFFF_FFFF)
        .u32(offset::R_BLOCKS_COUNT_HI, 0xFFFF_FFFF)
        .u32(offset::FREE_BLOCKS_COUNT_HI, 0xFFFF_FFFF);
    let sb = decode(img.bytes()).unwrap();
    assert_eq!(sb.blocks_count(), 65536);
    assert_eq!(sb.free_blocks_count(), 60000);
    assert_eq!(sb.reserved_blocks_count(), 0);
}

#[test]
fn label_and_uuid() {
    let mut img = ImageBuilder::new(1);
    img.buf[offset::VOLUME_NAME..offset::VOLUME_NAME + 16].copy_from_slice(b"data\0junk\0\0\0\0\0\0\0");
    img.buf[offset::UUID..offset::UUID + 16].copy_from_slice(&[1; 16]);
    let sb = decode(img.bytes()).unwrap();
    assert_eq!(sb.label().as_bytes(), b"data");
    assert_eq!(sb.uuid().as_bytes(), &[1u8; 16]);
}

#[test]
fn replicas_follow_sparse_super() {
    let mut img = ImageBuilder::new(1);
    // 10 个组
    img.u32(offset::BLOCKS_COUNT_LO, 10 * 32768)
        .u32(offset::FEATURE_RO_COMPAT, 0x1);
    let sb = decode(img.bytes()).unwrap();
    let groups: Vec<u64> = replica::backup_groups(&sb).collect();
    assert_eq!(groups, vec![1, 3, 5, 7, 9]);
    assert_eq!(replica::superblock_offset(&sb, 3), Some(3 * 32768 * 4096));
}

#[test]
fn decoded_superblock_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DecodedSuperblock>();
    assert_send_sync::<Ext4Mount>();
}
