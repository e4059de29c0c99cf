//! superblock 中的小型值类型
//!
//! 状态位、错误处理策略、创建者操作系统、版本号以及卷标。
//! 所有从磁盘解码的枚举都带有 `Unknown` 分支，解码本身不会失败。

use core::fmt;

use bitflags::bitflags;
use time::OffsetDateTime;

use crate::consts::*;
use crate::features::feature_set;

bitflags! {
    /// s_state 位表
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StateFlags: u16 {
        const VALID_FS = 0x1;
        const ERROR_FS = 0x2;
        const ORPHAN_FS = 0x4;
    }
}

feature_set! {
    /// 文件系统状态
    pub struct SbState(StateFlags: u16) {
        /// 干净卸载
        umounted => VALID_FS,
        /// 检测到错误
        error => ERROR_FS,
        /// 正在恢复孤儿 inode
        orphan_recovery => ORPHAN_FS,
    }
}

/// 检测到错误时的行为（s_errors）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorPolicy {
    Continue,
    RemountReadOnly,
    Panic,
    Unknown(u16),
}

impl From<u16> for ErrorPolicy {
    fn from(raw: u16) -> Self {
        match raw {
            EXT4_ERRORS_CONTINUE => ErrorPolicy::Continue,
            EXT4_ERRORS_RO => ErrorPolicy::RemountReadOnly,
            EXT4_ERRORS_PANIC => ErrorPolicy::Panic,
            other => ErrorPolicy::Unknown(other),
        }
    }
}

impl From<ErrorPolicy> for u16 {
    fn from(policy: ErrorPolicy) -> Self {
        match policy {
            ErrorPolicy::Continue => EXT4_ERRORS_CONTINUE,
            ErrorPolicy::RemountReadOnly => EXT4_ERRORS_RO,
            ErrorPolicy::Panic => EXT4_ERRORS_PANIC,
            ErrorPolicy::Unknown(raw) => raw,
        }
    }
}

/// 创建文件系统的操作系统（s_creator_os）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreatorOs {
    Linux,
    Hurd,
    Masix,
    FreeBsd,
    Lites,
    Unknown(u32),
}

impl From<u32> for CreatorOs {
    fn from(raw: u32) -> Self {
        match raw {
            EXT4_OS_LINUX => CreatorOs::Linux,
            EXT4_OS_HURD => CreatorOs::Hurd,
            EXT4_OS_MASIX => CreatorOs::Masix,
            EXT4_OS_FREEBSD => CreatorOs::FreeBsd,
            EXT4_OS_LITES => CreatorOs::Lites,
            other => CreatorOs::Unknown(other),
        }
    }
}

impl From<CreatorOs> for u32 {
    fn from(os: CreatorOs) -> Self {
        match os {
            CreatorOs::Linux => EXT4_OS_LINUX,
            CreatorOs::Hurd => EXT4_OS_HURD,
            CreatorOs::Masix => EXT4_OS_MASIX,
            CreatorOs::FreeBsd => EXT4_OS_FREEBSD,
            CreatorOs::Lites => EXT4_OS_LITES,
            CreatorOs::Unknown(raw) => raw,
        }
    }
}

/// 磁盘布局版本（s_rev_level）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Revision {
    /// 原始格式，只有固定字段
    Original,
    /// 动态格式，带特性字、UUID、卷标等扩展字段
    Dynamic,
    /// 比 Dynamic 更新的版本，按 Dynamic 解码
    Unknown(u32),
}

impl From<u32> for Revision {
    fn from(raw: u32) -> Self {
        match raw {
            EXT4_GOOD_OLD_REV => Revision::Original,
            EXT4_DYNAMIC_REV => Revision::Dynamic,
            other => Revision::Unknown(other),
        }
    }
}

impl From<Revision> for u32 {
    fn from(rev: Revision) -> Self {
        match rev {
            Revision::Original => EXT4_GOOD_OLD_REV,
            Revision::Dynamic => EXT4_DYNAMIC_REV,
            Revision::Unknown(raw) => raw,
        }
    }
}

/// 时间戳（自 Unix 纪元起的秒数）
///
/// Dynamic 布局用一个额外字节把 32 位秒数扩展到 40 位。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn from_secs(secs: u32) -> Self {
        Self(secs as u64)
    }

    pub fn from_parts(lo: u32, hi: u8) -> Self {
        Self(((hi as u64) << 32) | lo as u64)
    }

    pub fn secs(&self) -> u64 {
        self.0
    }

    /// 超出 `time` 可表示范围时返回 None
    pub fn to_datetime(&self) -> Option<OffsetDateTime> {
        let secs = i64::try_from(self.0).ok()?;
        OffsetDateTime::from_unix_timestamp(secs).ok()
    }
}

/// 卷 UUID（128 位）
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Uuid(pub [u8; 16]);

impl Uuid {
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn is_nil(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if matches!(i, 4 | 6 | 8 | 10) {
                f.write_str("-")?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uuid({})", self)
    }
}

/// 卷标（最多 16 字节，不要求以 NUL 结尾）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct VolumeLabel {
    raw: [u8; 16],
    len: usize,
}

impl VolumeLabel {
    /// 在第一个 NUL 处截断
    pub fn from_raw(raw: [u8; 16]) -> Self {
        let len = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        Self { raw, len }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw[..self.len]
    }

    /// UTF-8 形式（不是合法 UTF-8 时返回 None）
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(self.as_bytes()).ok()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
