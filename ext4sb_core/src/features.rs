//! Superblock 特性标志
//!
//! 三个特性字（compat / incompat / ro_compat）各自对应一个 bitflags 位表和一个
//! 由布尔字段组成的结构体。结构体与整数之间可以无损互转，但只保留已知位：
//! 未知位在解码时被丢弃，编码时也不会被设置。

use bitflags::bitflags;

bitflags! {
    /// s_feature_compat 位表
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CompatFlags: u32 {
        const DIR_PREALLOC = 0x1;
        const IMAGIC_INODES = 0x2;
        const HAS_JOURNAL = 0x4;
        const EXT_ATTR = 0x8;
        const RESIZE_INODE = 0x10;
        const DIR_INDEX = 0x20;
        const LAZY_BG = 0x40;
        const EXCLUDE_INODE = 0x80;
        const EXCLUDE_BITMAP = 0x100;
        const SPARSE_SUPER2 = 0x200;
    }

    /// s_feature_incompat 位表
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct IncompatFlags: u32 {
        const COMPRESSION = 0x1;
        const FILETYPE = 0x2;
        const RECOVER = 0x4;
        const JOURNAL_DEV = 0x8;
        const META_BG = 0x10;
        const EXTENTS = 0x40;
        const BIT64 = 0x80;
        const MMP = 0x100;
        const FLEX_BG = 0x200;
        const EA_INODE = 0x400;
        const DIRDATA = 0x1000;
        const CSUM_SEED = 0x2000;
        const LARGEDIR = 0x4000;
        const INLINE_DATA = 0x8000;
        const ENCRYPT = 0x10000;
    }

    /// s_feature_ro_compat 位表
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RoCompatFlags: u32 {
        const SPARSE_SUPER = 0x1;
        const LARGE_FILE = 0x2;
        const BTREE_DIR = 0x4;
        const HUGE_FILE = 0x8;
        const GDT_CSUM = 0x10;
        const DIR_NLINK = 0x20;
        const EXTRA_ISIZE = 0x40;
        const HAS_SNAPSHOT = 0x80;
        const QUOTA = 0x100;
        const BIGALLOC = 0x200;
        const METADATA_CSUM = 0x400;
        const REPLICA = 0x800;
        const READONLY = 0x1000;
        const PROJECT = 0x2000;
    }
}

/// 生成布尔结构体及其与位表之间的转换
///
/// 每个字段对应位表中的一个常量，位表中的每个常量也必须出现一次。
macro_rules! feature_set {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($flags:ident: $int:ty) {
            $( $(#[$fmeta:meta])* $field:ident => $flag:ident, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: bool, )+
        }

        impl $name {
            /// 所有已知位
            pub const KNOWN_BITS: $int = $flags::all().bits();

            /// 从整数解码，未知位被丢弃
            pub fn from_bits(raw: $int) -> Self {
                let flags = $flags::from_bits_truncate(raw);
                Self {
                    $( $field: flags.contains($flags::$flag), )+
                }
            }

            /// 编码为整数
            pub fn to_bits(self) -> $int {
                self.flags().bits()
            }

            pub fn flags(self) -> $flags {
                let mut flags = $flags::empty();
                $( flags.set($flags::$flag, self.$field); )+
                flags
            }

            /// `raw` 中不属于任何已知字段的位
            pub fn unknown_bits(raw: $int) -> $int {
                raw & !Self::KNOWN_BITS
            }

            /// `self` 中置位而 `supported` 中未置位的位
            pub fn difference(self, supported: Self) -> $int {
                self.to_bits() & !supported.to_bits()
            }

            /// 所有字段都为 true 的集合
            pub fn all() -> Self {
                Self::from_bits(Self::KNOWN_BITS)
            }

            pub fn is_empty(self) -> bool {
                self.to_bits() == 0
            }
        }

        impl From<$int> for $name {
            fn from(raw: $int) -> Self {
                Self::from_bits(raw)
            }
        }

        impl From<$name> for $int {
            fn from(set: $name) -> Self {
                set.to_bits()
            }
        }

        impl From<$flags> for $name {
            fn from(flags: $flags) -> Self {
                Self::from_bits(flags.bits())
            }
        }
    };
}

pub(crate) use feature_set;

feature_set! {
    /// 兼容特性：不理解也可以安全读写
    pub struct CompatFeatures(CompatFlags: u32) {
        dir_prealloc => DIR_PREALLOC,
        imagic_inodes => IMAGIC_INODES,
        /// 有日志（jbd2）
        has_journal => HAS_JOURNAL,
        ext_attr => EXT_ATTR,
        /// 为在线扩容保留了 GDT 块
        resize_inode => RESIZE_INODE,
        dir_index => DIR_INDEX,
        lazy_bg => LAZY_BG,
        exclude_inode => EXCLUDE_INODE,
        exclude_bitmap => EXCLUDE_BITMAP,
        /// 稀疏 superblock v2：只有 s_backup_bgs 指定的两个副本
        sparse_v2 => SPARSE_SUPER2,
    }
}

feature_set! {
    /// 不兼容特性：不理解就必须拒绝挂载
    pub struct IncompatFeatures(IncompatFlags: u32) {
        compression => COMPRESSION,
        /// 目录项记录文件类型
        dirent_file_type => FILETYPE,
        /// 日志需要回放
        recovery => RECOVER,
        journal_dev => JOURNAL_DEV,
        meta_bg => META_BG,
        extents => EXTENTS,
        /// 64 位块号
        is_64bit => BIT64,
        mmp => MMP,
        flex_bg => FLEX_BG,
        ext_attr_inode => EA_INODE,
        dir_data => DIRDATA,
        csum_seed => CSUM_SEED,
        large_dir => LARGEDIR,
        inline_data => INLINE_DATA,
        encrypted => ENCRYPT,
    }
}

feature_set! {
    /// 只读兼容特性：不理解时只能只读挂载
    pub struct RoCompatFeatures(RoCompatFlags: u32) {
        /// 副本只存在于 0 号组以及 3、5、7 的幂次组
        sparse => SPARSE_SUPER,
        large_file => LARGE_FILE,
        btree_dir => BTREE_DIR,
        huge_file => HUGE_FILE,
        gdt_csum => GDT_CSUM,
        dir_nlink => DIR_NLINK,
        extra_isize => EXTRA_ISIZE,
        has_snapshot => HAS_SNAPSHOT,
        quota => QUOTA,
        /// 分配单位是簇而不是块
        bigalloc => BIGALLOC,
        metadata_csum => METADATA_CSUM,
        replica => REPLICA,
        /// 文件系统被标记为只读
        read_only => READONLY,
        project => PROJECT,
    }
}

/// 磁盘上的三个原始特性字
///
/// 布尔结构体会丢弃未知位，挂载准入需要看到原始值才能指出具体是哪一位。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FeatureWords {
    pub compat: u32,
    pub incompat: u32,
    pub ro_compat: u32,
}

impl FeatureWords {
    pub fn compat_features(&self) -> CompatFeatures {
        CompatFeatures::from_bits(self.compat)
    }

    pub fn incompat_features(&self) -> IncompatFeatures {
        IncompatFeatures::from_bits(self.incompat)
    }

    pub fn ro_compat_features(&self) -> RoCompatFeatures {
        RoCompatFeatures::from_bits(self.ro_compat)
    }
}
