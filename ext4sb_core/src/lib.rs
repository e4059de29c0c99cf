//! ext4sb-core: ext4 superblock 解码
//!
//! 把磁盘上的 superblock 字节解码成经过校验、感知特性的只读描述符，
//! 并根据特性决定能否挂载以及挂载模式。磁盘镜像来源不可信，所有字段在使用前都经过检查。

#![no_std]

extern crate alloc;

// 公共模块
pub mod admission;
pub mod consts;
pub mod error;
pub mod features;
pub mod fs;
pub mod superblock;
pub mod types;

// 重新导出常用类型
pub use admission::{Downgrade, MountDecision, MountMode, MountOptions, SupportedFeatures};
pub use error::{Error, ErrorKind, FeatureWord, Result, UnknownFeatures};
pub use features::{
    CompatFeatures, CompatFlags, FeatureWords, IncompatFeatures, IncompatFlags, RoCompatFeatures,
    RoCompatFlags,
};
pub use fs::Ext4Mount;
pub use superblock::{decode, DecodedSuperblock, DynamicSuperblock, Geometry, OldSuperblock, SuperBlock};
pub use types::{CreatorOs, ErrorPolicy, Revision, SbState, Timestamp, Uuid, VolumeLabel};
