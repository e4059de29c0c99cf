//! superblock 副本位置
//!
//! - 未启用 sparse_super 时，每个块组都有一份副本。
//! - 启用 sparse_super 时，只有 0 号组以及 3、5、7 的幂次组有副本。
//! - 启用 sparse_super2 时，除 0 号组外只有 s_backup_bgs 指定的两个组有副本。
//!
//! 这里只计算位置，读取副本由外部的 I/O 层完成。

use super::SuperBlock;
use crate::consts::EXT4_SUPERBLOCK_OFFSET;

/// `n` 是否为 `base` 的整数次幂（含 base^0 = 1）
fn is_power_of(mut n: u64, base: u64) -> bool {
    if n == 0 {
        return false;
    }
    while n % base == 0 {
        n /= base;
    }
    n == 1
}

/// sparse_super 规则：0、1 以及 3、5、7 的幂次
pub fn is_sparse_group(group: u64) -> bool {
    group <= 1 || is_power_of(group, 3) || is_power_of(group, 5) || is_power_of(group, 7)
}

/// 块组 `group` 中是否有 superblock（0 号组为主 superblock）
pub fn has_superblock<S: SuperBlock + ?Sized>(sb: &S, group: u64) -> bool {
    if group == 0 {
        return true;
    }
    if sb.compat_features().sparse_v2 {
        let [first, second] = sb.backup_groups();
        return group == first as u64 || group == second as u64;
    }
    if sb.ro_compat_features().sparse {
        return is_sparse_group(group);
    }
    true
}

/// 块组 `group` 中 superblock 副本的字节偏移
///
/// 0 号组固定在 1024；其他组位于该组的第一个块。溢出时返回 None。
pub fn superblock_offset<S: SuperBlock + ?Sized>(sb: &S, group: u64) -> Option<u64> {
    if group == 0 {
        return Some(EXT4_SUPERBLOCK_OFFSET);
    }
    let block = group
        .checked_mul(sb.blocks_per_group() as u64)?
        .checked_add(sb.first_data_block() as u64)?;
    block.checked_mul(sb.block_size())
}

/// 遍历所有带 superblock 副本的块组（不含 0 号组）
pub fn backup_groups<S: SuperBlock + ?Sized>(sb: &S) -> BackupGroups<'_, S> {
    BackupGroups {
        sb,
        next: 1,
        end: sb.group_count(),
    }
}

/// [`backup_groups`] 返回的迭代器
pub struct BackupGroups<'a, S: SuperBlock + ?Sized> {
    sb: &'a S,
    next: u64,
    end: u64,
}

impl<S: SuperBlock + ?Sized> Iterator for BackupGroups<'_, S> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        while self.next < self.end {
            let group = self.next;
            self.next += 1;
            if has_superblock(self.sb, group) {
                return Some(group);
            }
        }
        None
    }
}
