//! 块/簇几何参数推导
//!
//! 磁盘上只存了 log 值和每组计数，块大小、簇大小、每组簇数以及 64 位计数都在这里计算。
//! 这些函数都是纯函数；自相矛盾的参数返回 `InconsistentGeometry`。

use crate::consts::*;
use crate::error::{Error, ErrorKind, Result};

/// 从磁盘读出的、与几何相关的原始字段
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RawGeometry {
    pub log_block_size: u32,
    pub log_cluster_size: u32,
    pub blocks_per_group: u32,
    pub clusters_per_group: u32,
    pub inodes_per_group: u32,
    pub first_data_block: u32,
}

/// 推导后的几何参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub block_size: u64,
    pub cluster_size: u64,
    pub blocks_per_group: u32,
    pub clusters_per_group: u32,
    pub inodes_per_group: u32,
}

fn inconsistent(message: &'static str) -> Error {
    Error::new(ErrorKind::InconsistentGeometry, message)
}

/// 块大小 = 2^(10 + log_block_size)
///
/// 只接受 1K、2K、4K、64K。
pub fn block_size(log_block_size: u32) -> Result<u64> {
    if !EXT4_SUPPORTED_LOG_BLOCK_SIZES.contains(&log_block_size) {
        log::debug!("unsupported s_log_block_size {}", log_block_size);
        return Err(inconsistent("unsupported block size"));
    }
    Ok(1024u64 << log_block_size)
}

/// 簇大小
///
/// bigalloc 时为 2^log_cluster_size * 块大小，否则等于块大小。
/// 结果溢出 u64 时返回 None。
pub fn cluster_size(bigalloc: bool, log_cluster_size: u32, block_size: u64) -> Option<u64> {
    if !bigalloc {
        return Some(block_size);
    }
    1u64.checked_shl(log_cluster_size)?.checked_mul(block_size)
}

/// 每组簇数：bigalloc 时取磁盘值，否则等于每组块数
pub fn clusters_per_group(bigalloc: bool, raw_clusters_per_group: u32, blocks_per_group: u32) -> u32 {
    if bigalloc {
        raw_clusters_per_group
    } else {
        blocks_per_group
    }
}

/// 合并 64 位计数的高低 32 位
///
/// 未启用 64bit 特性时忽略 `hi`，即使缓冲区里有非零值。
pub fn reconcile_count(is_64bit: bool, lo: u32, hi: u32) -> u64 {
    if is_64bit {
        ((hi as u64) << 32) | lo as u64
    } else {
        lo as u64
    }
}

/// 块组数量
pub fn group_count(blocks_count: u64, first_data_block: u32, blocks_per_group: u32) -> u64 {
    if blocks_per_group == 0 {
        return 0;
    }
    let data_blocks = blocks_count.saturating_sub(first_data_block as u64);
    data_blocks.div_ceil(blocks_per_group as u64)
}

impl Geometry {
    /// 校验并推导几何参数
    pub(crate) fn derive(raw: &RawGeometry, bigalloc: bool) -> Result<Self> {
        let block_size = block_size(raw.log_block_size)?;

        if raw.blocks_per_group == 0 || raw.inodes_per_group == 0 {
            return Err(inconsistent("zero blocks or inodes per group"));
        }

        if bigalloc {
            // 簇的总字节数不能超过 2^30
            let max_log = EXT4_MAX_CLUSTER_LOG_SIZE - EXT4_MIN_BLOCK_LOG_SIZE - raw.log_block_size;
            if raw.log_cluster_size > max_log {
                return Err(inconsistent("cluster size too large"));
            }
            let expected = (raw.clusters_per_group as u64)
                .checked_mul(1u64 << raw.log_cluster_size)
                .ok_or_else(|| inconsistent("clusters per group overflow"))?;
            if expected != raw.blocks_per_group as u64 {
                log::debug!(
                    "clusters per group {} << {} != blocks per group {}",
                    raw.clusters_per_group,
                    raw.log_cluster_size,
                    raw.blocks_per_group
                );
                return Err(inconsistent("blocks per group does not match clusters per group"));
            }
            if raw.clusters_per_group as u64 > block_size * 8 {
                return Err(inconsistent("clusters per group exceed bitmap capacity"));
            }
        } else {
            if raw.log_cluster_size != raw.log_block_size {
                log::debug!(
                    "cluster log {} differs from block log {} without bigalloc",
                    raw.log_cluster_size,
                    raw.log_block_size
                );
                return Err(inconsistent("cluster size differs from block size without bigalloc"));
            }
            if raw.blocks_per_group as u64 > block_size * 8 {
                return Err(inconsistent("blocks per group exceed bitmap capacity"));
            }
        }

        let expected_first = if block_size == 1024 { 1 } else { 0 };
        if raw.first_data_block != expected_first {
            log::warn!(
                "unusual s_first_data_block {} for block size {}",
                raw.first_data_block,
                block_size
            );
        }

        let geometry = Self {
            block_size,
            cluster_size: cluster_size(bigalloc, raw.log_cluster_size, block_size)
                .ok_or_else(|| inconsistent("cluster size too large"))?,
            blocks_per_group: raw.blocks_per_group,
            clusters_per_group: clusters_per_group(bigalloc, raw.clusters_per_group, raw.blocks_per_group),
            inodes_per_group: raw.inodes_per_group,
        };
        log::debug!("derived geometry: {:?}", geometry);
        Ok(geometry)
    }
}

/// 校验 Dynamic 布局里的 inode 大小
pub(crate) fn check_inode_size(inode_size: u16, block_size: u64) -> Result<u16> {
    if inode_size < EXT4_GOOD_OLD_INODE_SIZE
        || !inode_size.is_power_of_two()
        || inode_size as u64 > block_size
    {
        log::debug!("bad s_inode_size {}", inode_size);
        return Err(inconsistent("invalid inode size"));
    }
    Ok(inode_size)
}

/// 块组描述符大小
///
/// 64bit 特性下取 s_desc_size，否则固定为 32 字节。
pub(crate) fn group_desc_size(is_64bit: bool, raw_desc_size: u16) -> Result<u16> {
    if !is_64bit {
        return Ok(EXT4_MIN_DESC_SIZE);
    }
    if raw_desc_size < EXT4_MIN_DESC_SIZE_64BIT
        || raw_desc_size > EXT4_MAX_DESC_SIZE
        || !raw_desc_size.is_power_of_two()
    {
        log::debug!("bad s_desc_size {}", raw_desc_size);
        return Err(inconsistent("invalid group descriptor size"));
    }
    Ok(raw_desc_size)
}
