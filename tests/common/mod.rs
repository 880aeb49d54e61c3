//! Shared fixtures for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use blockconf::Schema;

/// Dialect used across the integration tests.
pub const SCHEMA: &str = r#"
[[blocks]]
name = "system"
mandatory = true

[[blocks.params]]
name = "hostname"
type = "string"
min = 1
max = 64

[[blocks.params]]
name = "path_to_user_group"
type = "string"

[[blocks.params]]
name = "debug"
type = "bool"

[[blocks.params]]
name = "level"
type = "byte"
max = 15

[[blocks.params]]
name = "timeout"
type = "int32"

[[blocks.params]]
name = "queue"
type = "uint32"

[[blocks.params]]
name = "offset"
type = "int64"

[[blocks.params]]
name = "quota"
type = "uint64"

[[blocks.params]]
name = "epoch"
type = "long"

[[blocks.params]]
name = "serial"
type = "ulong"

[[blocks.params]]
name = "generation"
type = "uint32"

[[blocks]]
name = "bridge"
map = true

[[blocks.params]]
name = "admin_status"
type = "uint32"

[[blocks.params]]
name = "mac"
type = "byte"
array = 6

[[blocks.params]]
name = "vlans"
type = "uint32"
array = "variable"
"#;

pub fn schema() -> Arc<Schema> {
    Arc::new(Schema::from_toml_str(SCHEMA).unwrap())
}

/// Write `text` to `dir/name` with owner-only write permission.
pub fn write_conf(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    // Write-then-rename so concurrent readers never see a half-written file.
    let staging = dir.join(format!(".{name}.tmp"));
    fs::write(&staging, text).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&staging, fs::Permissions::from_mode(0o644)).unwrap();
    }
    fs::rename(&staging, &path).unwrap();
    path
}
