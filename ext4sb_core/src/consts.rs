//! ext4 superblock 常量定义

/// Superblock 位置（从设备开始的字节偏移）
pub const EXT4_SUPERBLOCK_OFFSET: u64 = 1024;

/// Superblock 大小
pub const EXT4_SUPERBLOCK_SIZE: usize = 1024;

/// ext4 魔数
pub const EXT4_SUPERBLOCK_MAGIC: u16 = 0xEF53;

/// Revision 0 布局所覆盖的字节数（到 s_def_resgid 为止）
pub const EXT4_REV0_SPAN: usize = 0x54;

/// Dynamic 布局所覆盖的字节数（整个 superblock）
pub const EXT4_DYNAMIC_SPAN: usize = EXT4_SUPERBLOCK_SIZE;

/// 版本号
pub const EXT4_GOOD_OLD_REV: u32 = 0;
pub const EXT4_DYNAMIC_REV: u32 = 1;

/// Revision 0 的固定值
pub const EXT4_GOOD_OLD_INODE_SIZE: u16 = 128;
pub const EXT4_GOOD_OLD_FIRST_INO: u32 = 11;

/// 块组描述符大小
pub const EXT4_MIN_DESC_SIZE: u16 = 32;
pub const EXT4_MIN_DESC_SIZE_64BIT: u16 = 64;
pub const EXT4_MAX_DESC_SIZE: u16 = 1024;

/// 块大小：2^(10 + s_log_block_size)
pub const EXT4_MIN_BLOCK_LOG_SIZE: u32 = 10;

/// 可接受的 s_log_block_size（1K、2K、4K、64K）
pub const EXT4_SUPPORTED_LOG_BLOCK_SIZES: [u32; 4] = [0, 1, 2, 6];

/// bigalloc 簇大小上限（2^30）
pub const EXT4_MAX_CLUSTER_LOG_SIZE: u32 = 30;

/// 错误处理策略（s_errors）
pub const EXT4_ERRORS_CONTINUE: u16 = 1;
pub const EXT4_ERRORS_RO: u16 = 2;
pub const EXT4_ERRORS_PANIC: u16 = 3;

/// 创建者操作系统（s_creator_os）
pub const EXT4_OS_LINUX: u32 = 0;
pub const EXT4_OS_HURD: u32 = 1;
pub const EXT4_OS_MASIX: u32 = 2;
pub const EXT4_OS_FREEBSD: u32 = 3;
pub const EXT4_OS_LITES: u32 = 4;

/// 字段偏移
///
/// 对应 struct ext4_super_block 的布局，全部小端序。
pub mod offset {
    // Revision 0 区域
    pub const INODES_COUNT: usize = 0x00;
    pub const BLOCKS_COUNT_LO: usize = 0x04;
    pub const R_BLOCKS_COUNT_LO: usize = 0x08;
    pub const FREE_BLOCKS_COUNT_LO: usize = 0x0C;
    pub const FREE_INODES_COUNT: usize = 0x10;
    pub const FIRST_DATA_BLOCK: usize = 0x14;
    pub const LOG_BLOCK_SIZE: usize = 0x18;
    pub const LOG_CLUSTER_SIZE: usize = 0x1C;
    pub const BLOCKS_PER_GROUP: usize = 0x20;
    pub const CLUSTERS_PER_GROUP: usize = 0x24;
    pub const INODES_PER_GROUP: usize = 0x28;
    pub const MTIME: usize = 0x2C;
    pub const WTIME: usize = 0x30;
    pub const MNT_COUNT: usize = 0x34;
    pub const MAX_MNT_COUNT: usize = 0x36;
    pub const MAGIC: usize = 0x38;
    pub const STATE: usize = 0x3A;
    pub const ERRORS: usize = 0x3C;
    pub const MINOR_REV_LEVEL: usize = 0x3E;
    pub const LASTCHECK: usize = 0x40;
    pub const CHECKINTERVAL: usize = 0x44;
    pub const CREATOR_OS: usize = 0x48;
    pub const REV_LEVEL: usize = 0x4C;
    pub const DEF_RESUID: usize = 0x50;
    pub const DEF_RESGID: usize = 0x52;

    // Dynamic 扩展
    pub const FIRST_INO: usize = 0x54;
    pub const INODE_SIZE: usize = 0x58;
    pub const BLOCK_GROUP_NR: usize = 0x5A;
    pub const FEATURE_COMPAT: usize = 0x5C;
    pub const FEATURE_INCOMPAT: usize = 0x60;
    pub const FEATURE_RO_COMPAT: usize = 0x64;
    pub const UUID: usize = 0x68;
    pub const VOLUME_NAME: usize = 0x78;
    pub const DESC_SIZE: usize = 0xFE;
    pub const MKFS_TIME: usize = 0x108;
    pub const BLOCKS_COUNT_HI: usize = 0x150;
    pub const R_BLOCKS_COUNT_HI: usize = 0x154;
    pub const FREE_BLOCKS_COUNT_HI: usize = 0x158;
    pub const BACKUP_BGS: usize = 0x24C;
    pub const WTIME_HI: usize = 0x274;
    pub const MTIME_HI: usize = 0x275;
    pub const MKFS_TIME_HI: usize = 0x276;
}
