//! File-backed [`TokenStore`] that survives across process runs.
//!
//! The cache file holds a single JSON object, `{"access_token": "<jwt>"}`. The expiry is not
//! written; it is decoded from the token's `exp` claim every time the file is read.

// std
use std::{
	fs::{self, File, OpenOptions},
	io::{ErrorKind, Write},
};
// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	error::ConfigError,
	store::{StoreError, StoreFuture, TokenStore},
};

const CACHE_DIR: &str = ".cipherowl";
const CACHE_FILE: &str = "token-cache.json";

#[derive(Serialize, Deserialize)]
struct CacheFile {
	access_token: String,
}

/// Persists the access token to a JSON file after each successful fetch.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
}
impl FileStore {
	/// Creates a store rooted at `path`; nothing is touched until the first read or write.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Creates a store at [`FileStore::default_path`].
	pub fn at_default_path() -> Result<Self, ConfigError> {
		Ok(Self::new(Self::default_path()?))
	}

	/// `~/.cipherowl/token-cache.json`.
	pub fn default_path() -> Result<PathBuf, ConfigError> {
		dirs::home_dir()
			.map(|home| home.join(CACHE_DIR).join(CACHE_FILE))
			.ok_or(ConfigError::MissingHomeDir)
	}

	/// Location of the cache file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load(&self) -> Result<Option<TokenRecord>, StoreError> {
		let bytes = match fs::read(&self.path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
			Err(e) =>
				return Err(StoreError::Backend {
					message: format!("Failed to read {}: {e}", self.path.display()),
				}),
		};

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(None);
		}

		let de = &mut serde_json::Deserializer::from_slice(&bytes);
		let cached: CacheFile =
			serde_path_to_error::deserialize(de).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", self.path.display()),
			})?;
		let record =
			TokenRecord::from_jwt(cached.access_token).map_err(|e| StoreError::Serialization {
				message: format!("Cached token in {} is unusable: {e}", self.path.display()),
			})?;

		Ok(Some(record))
	}

	fn ensure_parent_exists(&self) -> Result<(), StoreError> {
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create cache directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist(&self, record: &TokenRecord) -> Result<(), StoreError> {
		self.ensure_parent_exists()?;

		let serialized = serde_json::to_vec(&CacheFile {
			access_token: record.access_token.expose().to_owned(),
		})
		.map_err(|e| StoreError::Serialization {
			message: format!("Failed to serialize token cache: {e}"),
		})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = create_private(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	fn remove(&self) -> Result<(), StoreError> {
		match fs::remove_file(&self.path) {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StoreError::Backend {
				message: format!("Failed to remove {}: {e}", self.path.display()),
			}),
		}
	}
}
impl TokenStore for FileStore {
	fn fetch(&self) -> StoreFuture<'_, Option<TokenRecord>> {
		Box::pin(async move { self.load() })
	}

	fn save(&self, record: TokenRecord) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.persist(&record) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.remove() })
	}
}

// The cache holds a live bearer credential, so it is readable by the owner only.
fn create_private(path: &Path) -> std::io::Result<File> {
	let mut options = OpenOptions::new();

	options.write(true).create(true).truncate(true);

	#[cfg(unix)]
	{
		use std::os::unix::fs::OpenOptionsExt;

		options.mode(0o600);
	}

	options.open(path)
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
	use tempfile::TempDir;
	use tokio::runtime::Runtime;
	// self
	use super::*;

	fn jwt(exp: i64) -> String {
		let payload = URL_SAFE_NO_PAD.encode(format!("{{\"exp\":{exp}}}"));

		format!("e30.{payload}.sig")
	}

	#[test]
	fn save_writes_access_token_only_and_reload_decodes_expiry() {
		let dir = TempDir::new().expect("Failed to create temporary directory.");
		let path = dir.path().join("nested").join("token-cache.json");
		let store = FileStore::new(&path);
		let record = TokenRecord::from_jwt(jwt(4_102_444_800)).expect("Fixture JWT should decode.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.save(record.clone())).expect("Failed to save fixture record.");

		let on_disk: serde_json::Value = serde_json::from_slice(
			&fs::read(&path).expect("Cache file should exist after save."),
		)
		.expect("Cache file should contain JSON.");

		assert_eq!(on_disk, serde_json::json!({ "access_token": record.access_token.expose() }));

		let fetched = rt
			.block_on(FileStore::new(&path).fetch())
			.expect("Failed to fetch fixture record.")
			.expect("File store lost record after reopen.");

		assert_eq!(fetched.access_token, record.access_token);
		assert_eq!(fetched.expires_at, record.expires_at);
		assert!(!path.with_extension("tmp").exists());
	}

	#[test]
	fn missing_or_blank_files_are_cache_misses() {
		let dir = TempDir::new().expect("Failed to create temporary directory.");
		let path = dir.path().join("token-cache.json");
		let store = FileStore::new(&path);
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		assert!(rt.block_on(store.fetch()).expect("Missing file should not error.").is_none());

		fs::write(&path, "  \n").expect("Failed to write blank cache file.");

		assert!(rt.block_on(store.fetch()).expect("Blank file should not error.").is_none());
	}

	#[test]
	fn corrupt_files_surface_serialization_errors() {
		let dir = TempDir::new().expect("Failed to create temporary directory.");
		let path = dir.path().join("token-cache.json");
		let store = FileStore::new(&path);
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		fs::write(&path, "{\"access_token\": 42}").expect("Failed to write corrupt cache.");

		assert!(matches!(rt.block_on(store.fetch()), Err(StoreError::Serialization { .. })));

		fs::write(&path, "{\"access_token\": \"opaque\"}").expect("Failed to write cache.");

		assert!(matches!(rt.block_on(store.fetch()), Err(StoreError::Serialization { .. })));
	}

	#[test]
	fn clear_removes_file_and_tolerates_absence() {
		let dir = TempDir::new().expect("Failed to create temporary directory.");
		let path = dir.path().join("token-cache.json");
		let store = FileStore::new(&path);
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		fs::write(&path, "{}").expect("Failed to write cache file.");
		rt.block_on(store.clear()).expect("Clearing an existing cache should succeed.");

		assert!(!path.exists());

		rt.block_on(store.clear()).expect("Clearing a missing cache should succeed.");
	}

	#[cfg(unix)]
	#[test]
	fn cache_file_is_owner_only() {
		// std
		use std::os::unix::fs::PermissionsExt;

		let dir = TempDir::new().expect("Failed to create temporary directory.");
		let path = dir.path().join("token-cache.json");
		let record = TokenRecord::from_jwt(jwt(4_102_444_800)).expect("Fixture JWT should decode.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(FileStore::new(&path).save(record)).expect("Failed to save fixture record.");

		let mode = fs::metadata(&path).expect("Cache file should exist.").permissions().mode();

		assert_eq!(mode & 0o777, 0o600);
	}
}
