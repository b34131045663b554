extern crate alloc;

use core::result::Result;

use alloc::{format, string::String, vec::Vec};
use embedded_io::{ErrorKind, ErrorType, Read, Write};

pub enum Mode {
    Read,
    /// Create or truncate.
    Write,
}

pub trait Filesystem: ErrorType {
    type File<'a>: File<Error = Self::Error>
    where
        Self: 'a;
    type Directory<'a>: Directory<Error = Self::Error>
    where
        Self: 'a;

    fn open_file(&self, path: &str, mode: Mode) -> Result<Self::File<'_>, Self::Error>;
    fn open_directory(&self, path: &str) -> Result<Self::Directory<'_>, Self::Error>;
    fn create_dir_all(&self, path: &str) -> Result<(), Self::Error>;
    /// Block counts of the volume holding the launcher files.
    fn stat(&self) -> Result<FsStats, Self::Error>;
}

pub trait File: Read + Write {
    fn size(&self) -> usize;
}

pub trait Directory: ErrorType {
    type Entry: DirEntry;

    fn list(&self) -> Result<Vec<Self::Entry>, Self::Error>;
}

pub trait DirEntry {
    fn name(&self) -> &str;
    fn is_directory(&self) -> bool;
    fn size(&self) -> usize;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FsStats {
    pub total_blocks: u64,
    pub free_blocks: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FsError {
    #[error("not found")]
    NotFound,
    #[error("filesystem reports no blocks")]
    NoBlocks,
    #[error("i/o error: {0:?}")]
    Io(ErrorKind),
}

impl FsError {
    pub fn from_io<E: embedded_io::Error>(err: E) -> Self {
        match err.kind() {
            ErrorKind::NotFound => FsError::NotFound,
            kind => FsError::Io(kind),
        }
    }
}

pub fn join(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    format!("{}/{}", dir, name)
}

pub fn read_to_end<F: Filesystem>(fs: &F, path: &str) -> Result<Vec<u8>, FsError> {
    let mut file = fs.open_file(path, Mode::Read).map_err(FsError::from_io)?;
    let mut data = Vec::with_capacity(file.size());
    let mut chunk = [0u8; 256];
    loop {
        let read = file.read(&mut chunk).map_err(FsError::from_io)?;
        if read == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..read]);
    }
    Ok(data)
}

pub fn write_file<F: Filesystem>(fs: &F, path: &str, data: &[u8]) -> Result<(), FsError> {
    let mut file = fs.open_file(path, Mode::Write).map_err(FsError::from_io)?;
    file.write_all(data).map_err(FsError::from_io)?;
    file.flush().map_err(FsError::from_io)?;
    Ok(())
}
