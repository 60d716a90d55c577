//! 平面文件持久化
//!
//! 每个集合是单独文件中的一个 JSON 数组。处理函数只通过 [`Storage`] 访问，
//! 换成数据库实现时无需改动 [`JsonFileStorage`] 的调用方。

use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    io::Write,
    marker::PhantomData,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tempfile::NamedTempFile;
use tracing::debug;

/// 存储错误
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize records: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// 整集合读写接口
///
/// `save` 整体替换已存集合。跨进程的读改写不做互斥，调用方自行串行化。
pub trait Storage<T>: Send + Sync {
    fn load(&self) -> Result<Vec<T>, StoreError>;
    fn save(&self, items: &[T]) -> Result<(), StoreError>;
}

/// 单文件 JSON 数组存储。`save` 先写同目录临时文件再重命名覆盖，
/// 读取方不会看到写了一半的文件。
pub struct JsonFileStorage<T> {
    path: PathBuf,
    _records: PhantomData<fn() -> T>,
}

impl<T> JsonFileStorage<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _records: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl<T> Storage<T> for JsonFileStorage<T>
where
    T: Serialize + DeserializeOwned,
{
    fn load(&self) -> Result<Vec<T>, StoreError> {
        if !self.path.exists() {
            debug!("{} 不存在，按空集合处理", self.path.display());
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, items: &[T]) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(items).map_err(StoreError::Serialize)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;

        // 临时文件与目标同目录，保证 rename 不跨文件系统
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(content.as_bytes())
            .map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;
        debug!("已写入 {} 条记录到 {}", items.len(), self.path.display());
        Ok(())
    }
}

/// 进程内存储，测试用
pub struct MemoryStorage<T> {
    items: Mutex<Vec<T>>,
}

impl<T> MemoryStorage<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }
}

impl<T> Default for MemoryStorage<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T> Storage<T> for MemoryStorage<T>
where
    T: Clone + Send,
{
    fn load(&self) -> Result<Vec<T>, StoreError> {
        let items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        Ok(items.clone())
    }

    fn save(&self, items: &[T]) -> Result<(), StoreError> {
        let mut stored = self.items.lock().unwrap_or_else(|e| e.into_inner());
        *stored = items.to_vec();
        Ok(())
    }
}
