// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{Namespace, StateKey, StateStore, decode_component, encode_bounded_component};
use crate::errors::StoreError;
use atomicwrites::{AtomicFile, OverwriteBehavior};
use camino::{Utf8Path, Utf8PathBuf};
use std::{fs, io, io::Write};
use tracing::{debug, warn};

/// A [`StateStore`] backed by a directory tree.
///
/// Each namespace component maps to a directory and each key to a file holding the value as text.
/// Components are escaped with [`encode_bounded_component`], so arbitrary browser labels and
/// timestamps can be used as keys without exceeding file name limits. Names listed by
/// [`StateStore::names`] are only exact for components short enough to be stored untruncated.
#[derive(Clone, Debug)]
pub struct FsStore {
    root: Utf8PathBuf,
}

impl FsStore {
    /// Opens a store rooted at `root`, creating the directory if it doesn't exist.
    pub fn open(root: impl Into<Utf8PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|error| StoreError::CreateDir {
            path: root.clone(),
            error,
        })?;
        Ok(Self { root })
    }

    /// Returns the root directory of this store.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn namespace_dir(&self, namespace: &Namespace) -> Utf8PathBuf {
        let mut dir = self.root.clone();
        for component in namespace.components() {
            dir.push(encode_bounded_component(component));
        }
        dir
    }

    fn key_path(&self, key: &StateKey) -> Utf8PathBuf {
        self.namespace_dir(key.namespace()).join(encode_bounded_component(key.name()))
    }
}

impl StateStore for FsStore {
    fn get(&self, key: &StateKey) -> Result<Option<String>, StoreError> {
        let path = self.key_path(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(StoreError::Read { path, error }),
        }
    }

    fn set(&mut self, key: &StateKey, value: &str) -> Result<(), StoreError> {
        let dir = self.namespace_dir(key.namespace());
        fs::create_dir_all(&dir).map_err(|error| StoreError::CreateDir {
            path: dir.clone(),
            error,
        })?;

        let path = self.key_path(key);
        debug!("writing state entry `{key}` to {path}");
        AtomicFile::new(&path, OverwriteBehavior::AllowOverwrite)
            .write(|file| file.write_all(value.as_bytes()))
            .map_err(|error| StoreError::Write { path, error })
    }

    fn delete(&mut self, key: &StateKey) -> Result<(), StoreError> {
        let path = self.key_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(StoreError::Remove { path, error }),
        }
    }

    fn clear(&mut self, namespace: &Namespace) -> Result<(), StoreError> {
        let path = self.namespace_dir(namespace);
        debug!("clearing state namespace `{namespace}` at {path}");
        match fs::remove_dir_all(&path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(StoreError::Remove { path, error }),
        }
    }

    fn names(&self, namespace: &Namespace) -> Result<Vec<String>, StoreError> {
        let dir = self.namespace_dir(namespace);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(StoreError::Read { path: dir, error }),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|error| StoreError::Read {
                path: dir.clone(),
                error,
            })?;
            let is_file = entry
                .file_type()
                .map_err(|error| StoreError::Read {
                    path: dir.clone(),
                    error,
                })?
                .is_file();
            if !is_file {
                continue;
            }

            let file_name = entry.file_name();
            match file_name.to_str().and_then(decode_component) {
                Some(name) => names.push(name),
                None => warn!(
                    "ignoring unrecognized entry {:?} in state directory {dir}",
                    file_name
                ),
            }
        }
        names.sort_unstable();
        Ok(names)
    }
}
