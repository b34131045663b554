use std::{
    fs,
    io::{self, Read as _, Write as _},
    path::{Path, PathBuf},
};

use badge_core::{
    fs::{DirEntry, Directory, File, Filesystem, FsStats, Mode},
    icons::{ICON_SIZE, IconSource, ImageData, ImageError},
};
use embedded_io::ErrorType;
use image::imageops::FilterType;

/// `std::io::Error` seen through the core's error kinds.
#[derive(Debug)]
pub struct DiskError(io::Error);

impl From<io::Error> for DiskError {
    fn from(err: io::Error) -> Self {
        Self(err)
    }
}

impl embedded_io::Error for DiskError {
    fn kind(&self) -> embedded_io::ErrorKind {
        use embedded_io::ErrorKind as Kind;
        match self.0.kind() {
            io::ErrorKind::NotFound => Kind::NotFound,
            io::ErrorKind::PermissionDenied => Kind::PermissionDenied,
            io::ErrorKind::AlreadyExists => Kind::AlreadyExists,
            io::ErrorKind::InvalidInput => Kind::InvalidInput,
            io::ErrorKind::InvalidData => Kind::InvalidData,
            io::ErrorKind::Interrupted => Kind::Interrupted,
            io::ErrorKind::Unsupported => Kind::Unsupported,
            io::ErrorKind::OutOfMemory => Kind::OutOfMemory,
            _ => Kind::Other,
        }
    }
}

/// Badge storage backed by a host directory: badge path `/x/y` is
/// `<root>/x/y`.
#[derive(Clone)]
pub struct DirFs {
    root: PathBuf,
}

impl DirFs {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl ErrorType for DirFs {
    type Error = DiskError;
}

pub struct DiskFile {
    file: fs::File,
    size: usize,
}

impl ErrorType for DiskFile {
    type Error = DiskError;
}

impl embedded_io::Read for DiskFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, DiskError> {
        Ok(self.file.read(buf)?)
    }
}

impl embedded_io::Write for DiskFile {
    fn write(&mut self, buf: &[u8]) -> Result<usize, DiskError> {
        Ok(self.file.write(buf)?)
    }

    fn flush(&mut self) -> Result<(), DiskError> {
        Ok(self.file.flush()?)
    }
}

impl File for DiskFile {
    fn size(&self) -> usize {
        self.size
    }
}

pub struct DiskEntry {
    name: String,
    is_directory: bool,
    size: usize,
}

impl DirEntry for DiskEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_directory(&self) -> bool {
        self.is_directory
    }

    fn size(&self) -> usize {
        self.size
    }
}

pub struct DiskDirectory {
    path: PathBuf,
}

impl ErrorType for DiskDirectory {
    type Error = DiskError;
}

impl Directory for DiskDirectory {
    type Entry = DiskEntry;

    fn list(&self) -> Result<Vec<DiskEntry>, DiskError> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            entries.push(DiskEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                is_directory: metadata.is_dir(),
                size: metadata.len() as usize,
            });
        }
        Ok(entries)
    }
}

impl Filesystem for DirFs {
    type File<'a> = DiskFile;
    type Directory<'a> = DiskDirectory;

    fn open_file(&self, path: &str, mode: Mode) -> Result<DiskFile, DiskError> {
        let path = self.resolve(path);
        let file = match mode {
            Mode::Read => fs::File::open(&path)?,
            Mode::Write => fs::File::create(&path)?,
        };
        let size = file.metadata()?.len() as usize;
        Ok(DiskFile { file, size })
    }

    fn open_directory(&self, path: &str) -> Result<DiskDirectory, DiskError> {
        let path = self.resolve(path);
        if !fs::metadata(&path)?.is_dir() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "not a directory").into());
        }
        Ok(DiskDirectory { path })
    }

    fn create_dir_all(&self, path: &str) -> Result<(), DiskError> {
        Ok(fs::create_dir_all(self.resolve(path))?)
    }

    fn stat(&self) -> Result<FsStats, DiskError> {
        let stats = nix::sys::statvfs::statvfs(self.root.as_path()).map_err(io::Error::from)?;
        Ok(FsStats {
            total_blocks: stats.blocks() as u64,
            free_blocks: stats.blocks_free() as u64,
        })
    }
}

impl IconSource for DirFs {
    fn load_icon(&mut self, path: &str) -> Result<ImageData, ImageError> {
        let data = fs::read(self.resolve(path)).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => ImageError::NotFound,
            _ => ImageError::Io,
        })?;
        let image = image::load_from_memory(&data).map_err(|_| ImageError::Decode)?;
        let image = if image.width() != ICON_SIZE || image.height() != ICON_SIZE {
            log::debug!("Scaling icon {} from {}x{}", path, image.width(), image.height());
            image.resize_exact(ICON_SIZE, ICON_SIZE, FilterType::Triangle)
        } else {
            image
        };
        let luma = image.to_luma8();
        Ok(ImageData {
            width: luma.width(),
            height: luma.height(),
            pixels: luma.into_raw(),
        })
    }
}
