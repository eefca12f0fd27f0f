//! Profile persistence
//!
//! One YAML file per profile in the profiles directory, plus
//! `assignments.yaml` mapping device model names to profile names. The whole
//! directory is read once on open and kept in memory; every mutation writes
//! through to disk before it is reflected in memory.

use super::defaults::{default_profile, default_profile_name};
use super::record::ProfileRecord;
use super::{BindingTable, CompiledProfile, Context, InputRef, Profile};
use crate::action::Action;
use crate::device::DeviceModel;
use crate::error::ProfileError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

const PROFILE_EXTENSION: &str = "yaml";
const ASSIGNMENTS_FILE: &str = "assignments.yaml";
const MAX_NAME_CHARS: usize = 100;

/// Names the filesystem (or the store itself) reserves
const RESERVED_NAMES: &[&str] = &[
    "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8",
    "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9", "assignments",
];

/// Make a profile name safe to use as a file name
///
/// Never fails: illegal characters are dropped and an empty result becomes
/// `Profile`.
///
/// ```
/// use padmap::profile::sanitize_profile_name;
/// assert_eq!(sanitize_profile_name("My: Pad?"), "My Pad");
/// assert_eq!(sanitize_profile_name("CON"), "CON_");
/// ```
pub fn sanitize_profile_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .filter(|c| !c.is_control())
        .collect();
    let mut cleaned: String = cleaned
        .trim()
        .trim_end_matches(['.', ' '])
        .chars()
        .take(MAX_NAME_CHARS)
        .collect();
    cleaned = cleaned.trim_end_matches(['.', ' ']).to_string();

    if cleaned.is_empty() {
        return "Profile".to_string();
    }
    if RESERVED_NAMES.contains(&cleaned.to_ascii_lowercase().as_str()) {
        cleaned.push('_');
    }
    cleaned
}

/// Persisted profiles and device assignments
#[derive(Debug)]
pub struct ProfileStore {
    dir: PathBuf,
    profiles: BTreeMap<String, Profile>,
    /// Device model name -> profile name
    assignments: BTreeMap<String, String>,
    /// Files skipped on open
    corrupt: Vec<String>,
}

impl ProfileStore {
    /// Load every profile in `dir`, creating the directory if needed
    ///
    /// Corrupt files are skipped with a warning. An empty store is seeded
    /// with the standard gamepad default.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, ProfileError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(|source| ProfileError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut store = Self {
            dir,
            profiles: BTreeMap::new(),
            assignments: BTreeMap::new(),
            corrupt: Vec::new(),
        };
        store.load_all().await?;

        if store.profiles.is_empty() {
            let model = DeviceModel::generic(16, 4, 0);
            info!("📁 No profiles found, creating '{}'", default_profile_name(&model));
            store.save(default_profile(&model)).await?;
        }

        info!(
            "✅ Profile store ready: {} profiles in {}",
            store.profiles.len(),
            store.dir.display()
        );
        Ok(store)
    }

    async fn load_all(&mut self) -> Result<(), ProfileError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| ProfileError::Io { path, source }
        };

        let mut entries = fs::read_dir(&self.dir).await.map_err(io_err(&self.dir))?;
        while let Some(entry) = entries.next_entry().await.map_err(io_err(&self.dir))? {
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().to_string();
            if file_name == ASSIGNMENTS_FILE
                || path.extension().and_then(|e| e.to_str()) != Some(PROFILE_EXTENSION)
            {
                continue;
            }
            match Self::load_file(&path).await {
                Ok(profile) => {
                    if profile.is_inert() {
                        warn!(
                            "⚠️ Profile '{}' targets unknown device '{}', keeping it inactive",
                            profile.name, profile.device
                        );
                    }
                    debug!("Loaded profile '{}'", profile.name);
                    self.profiles.insert(profile.name.clone(), profile);
                }
                Err(e) => {
                    warn!("⚠️ Skipping {}: {}", file_name, e);
                    self.corrupt.push(file_name);
                }
            }
        }

        let assignments_path = self.dir.join(ASSIGNMENTS_FILE);
        if fs::try_exists(&assignments_path).await.unwrap_or(false) {
            let text = fs::read_to_string(&assignments_path)
                .await
                .map_err(io_err(&assignments_path))?;
            match serde_yaml::from_str::<BTreeMap<String, String>>(&text) {
                Ok(assignments) => {
                    self.assignments = assignments
                        .into_iter()
                        .filter(|(_, profile)| self.profiles.contains_key(profile))
                        .collect();
                }
                Err(e) => warn!("⚠️ Ignoring corrupt {}: {}", ASSIGNMENTS_FILE, e),
            }
        }
        Ok(())
    }

    async fn load_file(path: &Path) -> Result<Profile, ProfileError> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let text = fs::read_to_string(path)
            .await
            .map_err(|source| ProfileError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let mut profile: Profile = serde_yaml::from_str(&text).map_err(|e| ProfileError::Corrupt {
            name: stem.clone(),
            reason: e.to_string(),
        })?;
        // The file name is authoritative
        profile.name = stem;
        profile.validate()?;
        Ok(profile)
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, PROFILE_EXTENSION))
    }

    async fn write_atomic(path: &Path, contents: String) -> Result<(), ProfileError> {
        let tmp = path.with_extension("tmp");
        let io_err = |source: std::io::Error| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        };
        fs::write(&tmp, contents).await.map_err(io_err)?;
        fs::rename(&tmp, path).await.map_err(io_err)
    }

    async fn write_profile(&self, profile: &Profile) -> Result<(), ProfileError> {
        let text = serde_yaml::to_string(profile).map_err(|source| ProfileError::Serialize {
            name: profile.name.clone(),
            source,
        })?;
        Self::write_atomic(&self.path_for(&profile.name), text).await
    }

    async fn write_assignments(&self) -> Result<(), ProfileError> {
        let text = serde_yaml::to_string(&self.assignments).map_err(|source| {
            ProfileError::Serialize {
                name: ASSIGNMENTS_FILE.to_string(),
                source,
            }
        })?;
        Self::write_atomic(&self.dir.join(ASSIGNMENTS_FILE), text).await
    }

    async fn remove_file(&self, name: &str) -> Result<(), ProfileError> {
        let path = self.path_for(name);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ProfileError::Io { path, source }),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stored profile names, sorted
    pub fn list(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    /// File names skipped on open
    pub fn corrupt(&self) -> &[String] {
        &self.corrupt
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&Profile, ProfileError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ProfileError::NotFound(name.to_string()))
    }

    /// Write a profile, replacing any profile with the same stored name
    ///
    /// Returns the sanitized name it was stored under.
    pub async fn save(&mut self, mut profile: Profile) -> Result<String, ProfileError> {
        profile.name = sanitize_profile_name(&profile.name);
        profile.validate()?;
        self.write_profile(&profile).await?;
        debug!("Saved profile '{}'", profile.name);
        let name = profile.name.clone();
        self.profiles.insert(name.clone(), profile);
        Ok(name)
    }

    /// First free name of the form `base`, `base (2)`, `base (3)`...
    pub fn unique_name(&self, base: &str) -> String {
        let base = sanitize_profile_name(base);
        if !self.contains(&base) {
            return base;
        }
        (2..)
            .map(|n| sanitize_profile_name(&format!("{} ({})", base, n)))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or(base)
    }

    /// Create a new profile from an existing one
    pub async fn copy(&mut self, source: &str, new_name: &str) -> Result<String, ProfileError> {
        let mut profile = self.get(source)?.clone();
        let new_name = sanitize_profile_name(new_name);
        if self.contains(&new_name) {
            return Err(ProfileError::AlreadyExists(new_name));
        }
        profile.name = new_name;
        self.save(profile).await
    }

    pub async fn rename(&mut self, old: &str, new: &str) -> Result<String, ProfileError> {
        let new = sanitize_profile_name(new);
        if old == new {
            self.get(old)?;
            return Ok(new);
        }
        if self.contains(&new) {
            return Err(ProfileError::AlreadyExists(new));
        }
        let mut profile = self.get(old)?.clone();
        profile.name = new.clone();
        self.save(profile).await?;
        self.profiles.remove(old);
        self.remove_file(old).await?;

        let mut touched = false;
        for assigned in self.assignments.values_mut() {
            if assigned == old {
                *assigned = new.clone();
                touched = true;
            }
        }
        if touched {
            self.write_assignments().await?;
        }
        info!("Renamed profile '{}' to '{}'", old, new);
        Ok(new)
    }

    /// Delete a profile; the last remaining profile cannot be deleted
    pub async fn delete(&mut self, name: &str) -> Result<(), ProfileError> {
        self.get(name)?;
        if self.profiles.len() == 1 {
            return Err(ProfileError::LastProfile(name.to_string()));
        }
        self.remove_file(name).await?;
        self.profiles.remove(name);

        let before = self.assignments.len();
        self.assignments.retain(|_, assigned| assigned != name);
        if self.assignments.len() != before {
            self.write_assignments().await?;
        }
        info!("Deleted profile '{}'", name);
        Ok(())
    }

    /// Set or clear one binding and persist the profile
    pub async fn update_binding(
        &mut self,
        name: &str,
        context: Context,
        input: InputRef,
        action: Option<Action>,
    ) -> Result<(), ProfileError> {
        let mut profile = self.get(name)?.clone();
        profile.update_binding(context, input, action);
        self.save(profile).await.map(|_| ())
    }

    /// Remember which profile a device model uses
    pub async fn assign(&mut self, model: &str, profile: &str) -> Result<(), ProfileError> {
        self.get(profile)?;
        self.assignments.insert(model.to_string(), profile.to_string());
        self.write_assignments().await
    }

    pub fn assigned(&self, model: &str) -> Option<&str> {
        self.assignments.get(model).map(String::as_str)
    }

    /// Profile to activate for a device model
    ///
    /// The assigned profile if it still exists and is usable, else a stored
    /// profile named after the model, else a freshly written default.
    pub async fn find_profile(&mut self, model: &DeviceModel) -> Result<Profile, ProfileError> {
        if let Some(name) = self.assigned(&model.name) {
            match self.profiles.get(name) {
                Some(profile) if !profile.is_inert() => return Ok(profile.clone()),
                _ => warn!(
                    "⚠️ Assigned profile '{}' for {} is unusable, falling back to default",
                    name, model.name
                ),
            }
        }

        let default_name = sanitize_profile_name(&default_profile_name(model));
        let usable = self
            .profiles
            .get(&default_name)
            .is_some_and(|profile| !profile.is_inert());
        let name = if usable {
            default_name
        } else {
            info!("📝 Creating default profile for {}", model.name);
            self.save(default_profile(model)).await?
        };
        self.assign(&model.name, &name).await?;
        self.get(&name).cloned()
    }

    /// Binding table for one context of a named profile
    pub fn resolve_context(
        &self,
        model: &DeviceModel,
        context: Context,
        profile_name: &str,
    ) -> Result<BindingTable, ProfileError> {
        let profile = self.get(profile_name)?;
        profile.model()?;
        if profile.device != model.name {
            debug!(
                "Profile '{}' was made for {}, resolving for {}",
                profile.name, profile.device, model.name
            );
        }
        Ok(BindingTable::build(profile, context))
    }

    /// Flatten a named profile for publication to the polling loop
    pub fn compile(
        &self,
        profile_name: &str,
        model: Arc<DeviceModel>,
    ) -> Result<CompiledProfile, ProfileError> {
        let profile = self.get(profile_name)?;
        profile.model()?;
        Ok(CompiledProfile::compile(profile, model))
    }

    /// Write a profile as a self-contained record
    pub async fn export(&self, name: &str, path: impl AsRef<Path>) -> Result<(), ProfileError> {
        let path = path.as_ref();
        let record = ProfileRecord::new(self.get(name)?.clone());
        fs::write(path, record.to_yaml()?)
            .await
            .map_err(|source| ProfileError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        info!("📤 Exported '{}' to {}", name, path.display());
        Ok(())
    }

    /// Read a record and store its profile under a free name
    pub async fn import(&mut self, path: impl AsRef<Path>) -> Result<String, ProfileError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .await
            .map_err(|source| ProfileError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let record = ProfileRecord::from_yaml(&text, &path.display().to_string())?;
        let mut profile = record.profile;
        profile.name = self.unique_name(&profile.name);
        let name = self.save(profile).await?;
        info!("📥 Imported '{}' from {}", name, path.display());
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Command;
    use crate::device::find_model;
    use tempfile::TempDir;

    fn custom(model: &DeviceModel) -> Profile {
        let mut profile = default_profile(model);
        profile.name = "Evening Reviews".to_string();
        profile.axes.deadzone = 0.25;
        profile.axes.inverted.insert(1);
        profile.update_binding(
            Context::Review,
            InputRef::Button(7),
            Some(Action::custom("Zoom", "Ctrl+=").unwrap()),
        );
        profile
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_profile_name("a/b\\c:d*e?f\"g<h>i|j"), "abcdefghij");
        assert_eq!(sanitize_profile_name("  Name.. "), "Name");
        assert_eq!(sanitize_profile_name("???"), "Profile");
        assert_eq!(sanitize_profile_name("lpt1"), "lpt1_");
        assert_eq!(sanitize_profile_name("assignments"), "assignments_");
        assert_eq!(sanitize_profile_name("tab\there"), "tabhere");
        assert_eq!(sanitize_profile_name(&"x".repeat(300)).len(), 100);
    }

    #[tokio::test]
    async fn test_open_seeds_default() {
        let dir = TempDir::new().unwrap();
        let store = ProfileStore::open(dir.path()).await.unwrap();
        assert_eq!(store.list(), vec!["Standard Gamepad (16 Buttons 4 Axes)"]);
        assert!(dir
            .path()
            .join("Standard Gamepad (16 Buttons 4 Axes).yaml")
            .exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Broken.yaml"), "name: [unterminated").unwrap();
        std::fs::write(
            dir.path().join("Unknown Command.yaml"),
            "name: x\ndevice: Standard Gamepad (16 Buttons 4 Axes)\nsize: {buttons: 16, axes: 4}\nbindings:\n  global:\n    btn:0: warp-drive\n",
        )
        .unwrap();

        let store = ProfileStore::open(dir.path()).await.unwrap();
        let mut corrupt = store.corrupt().to_vec();
        corrupt.sort();
        assert_eq!(corrupt, vec!["Broken.yaml", "Unknown Command.yaml"]);
        // Nothing valid was found, so the default was written
        assert_eq!(store.list().len(), 1);
    }

    #[tokio::test]
    async fn test_save_sanitizes_name() {
        let dir = TempDir::new().unwrap();
        let mut store = ProfileStore::open(dir.path()).await.unwrap();
        let mut profile = custom(&DeviceModel::generic(16, 4, 0));
        profile.name = "Work/Home: v2".to_string();
        let name = store.save(profile).await.unwrap();
        assert_eq!(name, "WorkHome v2");
        assert!(dir.path().join("WorkHome v2.yaml").exists());

        let reopened = ProfileStore::open(dir.path()).await.unwrap();
        assert!(reopened.contains("WorkHome v2"));
    }

    #[tokio::test]
    async fn test_delete_rename_copy() {
        let dir = TempDir::new().unwrap();
        let mut store = ProfileStore::open(dir.path()).await.unwrap();
        let only = store.list()[0].to_string();
        assert!(matches!(
            store.delete(&only).await,
            Err(ProfileError::LastProfile(_))
        ));

        let copy = store.copy(&only, "Copy").await.unwrap();
        assert!(matches!(
            store.copy(&only, "Copy").await,
            Err(ProfileError::AlreadyExists(_))
        ));
        store.assign("Some Pad", &copy).await.unwrap();

        let renamed = store.rename(&copy, "Renamed").await.unwrap();
        assert_eq!(store.assigned("Some Pad"), Some("Renamed"));
        assert!(!dir.path().join("Copy.yaml").exists());

        store.delete(&renamed).await.unwrap();
        assert_eq!(store.assigned("Some Pad"), None);
        assert!(matches!(store.get("Renamed"), Err(ProfileError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_binding_persists() {
        let dir = TempDir::new().unwrap();
        let mut store = ProfileStore::open(dir.path()).await.unwrap();
        let name = store.list()[0].to_string();
        store
            .update_binding(&name, Context::Review, InputRef::Button(9), Some(Action::command(Command::Undo)))
            .await
            .unwrap();

        let reopened = ProfileStore::open(dir.path()).await.unwrap();
        let model = DeviceModel::generic(16, 4, 0);
        let table = reopened.resolve_context(&model, Context::Review, &name).unwrap();
        assert_eq!(table.lookup(&InputRef::Button(9)), Some(&Action::command(Command::Undo)));
        // Unbound input resolves to nothing, not an error
        assert_eq!(table.lookup(&InputRef::Button(40)), None);
    }

    #[tokio::test]
    async fn test_find_profile_assigns_model_default() {
        let dir = TempDir::new().unwrap();
        let mut store = ProfileStore::open(dir.path()).await.unwrap();
        let model = find_model("DualSense").unwrap();

        let profile = store.find_profile(&model).await.unwrap();
        assert_eq!(profile.name, "DualSense");
        assert_eq!(store.assigned("DualSense"), Some("DualSense"));

        store.copy("DualSense", "Mine").await.unwrap();
        store.assign("DualSense", "Mine").await.unwrap();
        assert_eq!(store.find_profile(&model).await.unwrap().name, "Mine");

        // A deleted assignment falls back to the model default
        store.delete("Mine").await.unwrap();
        assert_eq!(store.find_profile(&model).await.unwrap().name, "DualSense");
    }

    #[tokio::test]
    async fn test_export_import_round_trip() {
        let source_dir = TempDir::new().unwrap();
        let mut source = ProfileStore::open(source_dir.path()).await.unwrap();
        let model = DeviceModel::generic(16, 4, 0);
        let name = source.save(custom(&model)).await.unwrap();

        let export = source_dir.path().join("export.padmap");
        source.export(&name, &export).await.unwrap();

        let target_dir = TempDir::new().unwrap();
        let mut target = ProfileStore::open(target_dir.path()).await.unwrap();
        let imported = target.import(&export).await.unwrap();
        assert_eq!(imported, name);

        for context in Context::ALL {
            assert_eq!(
                source.resolve_context(&model, context, &name).unwrap(),
                target.resolve_context(&model, context, &imported).unwrap()
            );
        }
        assert_eq!(source.get(&name).unwrap().axes, target.get(&imported).unwrap().axes);

        // A second import gets a fresh name
        assert_eq!(target.import(&export).await.unwrap(), "Evening Reviews (2)");
    }
}
