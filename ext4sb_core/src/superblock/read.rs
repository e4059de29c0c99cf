//! 小端字段读取
//!
//! 解码器先检查缓冲区长度，再通过这里按偏移读取字段。

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, ErrorKind, Result};

/// 已通过长度检查的 superblock 字节视图
#[derive(Clone, Copy)]
pub(crate) struct FieldReader<'a> {
    buf: &'a [u8],
}

impl<'a> FieldReader<'a> {
    /// 缓冲区至少要覆盖 `span` 字节
    pub(crate) fn new(buf: &'a [u8], span: usize) -> Result<Self> {
        if buf.len() < span {
            log::debug!("superblock buffer too small: len={}, need={}", buf.len(), span);
            return Err(Error::new(
                ErrorKind::BufferTooSmall,
                "buffer shorter than superblock layout",
            ));
        }
        Ok(Self { buf: &buf[..span] })
    }

    pub(crate) fn u8(&self, off: usize) -> u8 {
        self.buf[off]
    }

    pub(crate) fn u16(&self, off: usize) -> u16 {
        LittleEndian::read_u16(&self.buf[off..off + 2])
    }

    pub(crate) fn u32(&self, off: usize) -> u32 {
        LittleEndian::read_u32(&self.buf[off..off + 4])
    }

    pub(crate) fn bytes16(&self, off: usize) -> [u8; 16] {
        let mut out = [0u8; 16];
        out.copy_from_slice(&self.buf[off..off + 16]);
        out
    }
}
