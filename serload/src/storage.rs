//! Byte storage behind the upload and capture paths.
//!
//! [`Storage`] is a small handle-based file interface. [`MemoryStorage`]
//! implements it with one fixed-size region per name and never grows a
//! file past its region.

use embedded_io::SeekFrom;
use heapless::Vec;
use log::{debug, warn};

use crate::config::MAX_CODE_LEN;
use crate::error::Error;
use crate::session::{parse_name, Name};

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum OpenMode {
    Read,
    /// Create or truncate
    Write,
    /// Create or keep, position at the end
    Append,
}

/// Opaque file handle issued by a [`Storage`]
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct Handle(pub usize);

pub trait Storage {
    fn open(&mut self, name: &str, mode: OpenMode) -> Option<Handle>;

    /// Move the handle position and return the new absolute offset
    fn seek(&mut self, handle: Handle, pos: SeekFrom) -> Result<u64, Error>;

    fn read(&mut self, handle: Handle, buf: &mut [u8]) -> Result<usize, Error>;

    /// Write at the handle position. Bytes that do not fit are not written.
    fn write(&mut self, handle: Handle, buf: &[u8]) -> Result<usize, Error>;

    fn close(&mut self, handle: Handle);

    fn size(&self, handle: Handle) -> Result<usize, Error>;

    fn exists(&self, name: &str) -> bool;

    /// Delete a file. Returns false when there was nothing to delete.
    fn remove(&mut self, name: &str) -> bool;

    /// Call `f` with the name and size of every file
    fn list(&self, f: &mut dyn FnMut(&str, usize));
}

struct Region<const SIZE: usize> {
    name: Name,
    data: Vec<u8, SIZE>,
}

#[derive(Clone, Copy)]
struct Cursor {
    region: usize,
    pos: usize,
}

/// Storage held entirely in RAM
pub struct MemoryStorage<const FILES: usize = 4, const SIZE: usize = MAX_CODE_LEN> {
    regions: Vec<Region<SIZE>, FILES>,
    handles: [Option<Cursor>; FILES],
}

impl<const FILES: usize, const SIZE: usize> MemoryStorage<FILES, SIZE> {
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
            handles: [None; FILES],
        }
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.regions.iter().position(|r| r.name.as_str() == name)
    }

    fn cursor(&self, handle: Handle) -> Result<Cursor, Error> {
        self.handles
            .get(handle.0)
            .copied()
            .flatten()
            .ok_or(Error::NotFound)
    }

    fn cursor_mut(&mut self, handle: Handle) -> Result<&mut Cursor, Error> {
        self.handles
            .get_mut(handle.0)
            .and_then(Option::as_mut)
            .ok_or(Error::NotFound)
    }

    fn create(&mut self, name: &str) -> Option<usize> {
        let name = parse_name(name).ok()?;

        let region = Region {
            name,
            data: Vec::new(),
        };

        if let Err(region) = self.regions.push(region) {
            warn!("storage full, cannot create {}", region.name);
            return None;
        }

        Some(self.regions.len() - 1)
    }
}

impl<const FILES: usize, const SIZE: usize> Default for MemoryStorage<FILES, SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const FILES: usize, const SIZE: usize> Storage for MemoryStorage<FILES, SIZE> {
    fn open(&mut self, name: &str, mode: OpenMode) -> Option<Handle> {
        let slot = self.handles.iter().position(Option::is_none)?;

        let region = match (self.find(name), mode) {
            (Some(index), OpenMode::Write) => {
                self.regions[index].data.clear();
                index
            }
            (Some(index), _) => index,
            (None, OpenMode::Read) => return None,
            (None, _) => self.create(name)?,
        };

        let pos = match mode {
            OpenMode::Append => self.regions[region].data.len(),
            _ => 0,
        };

        self.handles[slot] = Some(Cursor { region, pos });
        debug!("open {} as #{} ({:?})", name, slot, mode);

        Some(Handle(slot))
    }

    fn seek(&mut self, handle: Handle, pos: SeekFrom) -> Result<u64, Error> {
        let len = self.size(handle)? as i64;
        let cursor = self.cursor_mut(handle)?;

        let target = match pos {
            SeekFrom::Start(offset) => offset.min(SIZE as u64) as i64,
            SeekFrom::End(offset) => len.saturating_add(offset),
            SeekFrom::Current(offset) => (cursor.pos as i64).saturating_add(offset),
        };

        cursor.pos = target.clamp(0, SIZE as i64) as usize;

        Ok(cursor.pos as u64)
    }

    fn read(&mut self, handle: Handle, buf: &mut [u8]) -> Result<usize, Error> {
        let Cursor { region, pos } = self.cursor(handle)?;
        let data = &self.regions[region].data;

        let start = pos.min(data.len());
        let count = buf.len().min(data.len() - start);

        buf[..count].copy_from_slice(&data[start..start + count]);
        self.cursor_mut(handle)?.pos = start + count;

        Ok(count)
    }

    fn write(&mut self, handle: Handle, buf: &[u8]) -> Result<usize, Error> {
        let Cursor { region, pos } = self.cursor(handle)?;
        let data = &mut self.regions[region].data;

        let count = buf.len().min(SIZE - pos);

        if count < buf.len() {
            warn!("write clipped at region end, {} of {} bytes", count, buf.len());
        }

        if data.len() < pos + count {
            // Gap between the old end and `pos` reads back as zeroes
            let _ = data.resize(pos + count, 0);
        }

        data[pos..pos + count].copy_from_slice(&buf[..count]);
        self.cursor_mut(handle)?.pos = pos + count;

        Ok(count)
    }

    fn close(&mut self, handle: Handle) {
        if let Some(slot) = self.handles.get_mut(handle.0) {
            *slot = None;
        }
    }

    fn size(&self, handle: Handle) -> Result<usize, Error> {
        let cursor = self.cursor(handle)?;

        Ok(self.regions[cursor.region].data.len())
    }

    fn exists(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    fn remove(&mut self, name: &str) -> bool {
        let Some(index) = self.find(name) else {
            return false;
        };

        self.regions.swap_remove(index);

        let moved = self.regions.len();

        for slot in self.handles.iter_mut() {
            match slot.map(|c| c.region) {
                Some(region) if region == index => *slot = None,
                Some(region) if region == moved => {
                    if let Some(cursor) = slot {
                        cursor.region = index;
                    }
                }
                _ => (),
            }
        }

        true
    }

    fn list(&self, f: &mut dyn FnMut(&str, usize)) {
        for region in self.regions.iter() {
            f(region.name.as_str(), region.data.len());
        }
    }
}
