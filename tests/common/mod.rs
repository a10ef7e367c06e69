#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Builtin preset with host policy widened to the current host.
pub fn config_for_this_host(dir: &Path, interpreter: &str) -> PathBuf {
    let config = format!(
        r#"
[upstream]
package = "gdb"
version = "7.2"
compression = "bz2"
patch_root = "gdb"
strip = 1

[patches]
"7.2" = ["gdb-leak", "gdb-strings"]

[host]
os = "{os}"
arch = ["{arch}"]

[runtime]
name = "python"
headers = ["python2.5/Python.h", "python2.6/Python.h"]
install_hint = "apt-get install python2.5-dev"

[launcher]
interpreter = "{interpreter}"
script = "scripts/ruby-gdb.py"

[report]
contact = "test@example.invalid"
"#,
        os = std::env::consts::OS,
        arch = std::env::consts::ARCH,
    );
    let path = dir.join("pipeline.toml");
    fs::write(&path, config).unwrap();
    path
}

pub fn write_script(path: &Path, body: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Runtime installation with a development header, for `--with-python-dir`.
pub fn python_dir(dir: &Path) -> PathBuf {
    let python = dir.join("python");
    let header = python.join("include/python2.6/Python.h");
    fs::create_dir_all(header.parent().unwrap()).unwrap();
    fs::write(header, "").unwrap();
    python
}

/// Project root with the pinned archive, patches and the scripting extension.
pub fn project(dir: &Path) -> PathBuf {
    let root = dir.join("project");
    fs::create_dir_all(root.join("ext/src")).unwrap();
    fs::write(root.join("ext/src/gdb-7.2.tar.bz2"), "archive").unwrap();
    fs::create_dir_all(root.join("patches")).unwrap();
    fs::write(root.join("patches/gdb-leak.patch"), "leak").unwrap();
    fs::write(root.join("patches/gdb-strings.patch"), "strings").unwrap();
    fs::create_dir_all(root.join("scripts")).unwrap();
    fs::write(root.join("scripts/ruby-gdb.py"), "import gdb\n").unwrap();
    root
}

/// Directory with fake `tar`, `patch` and `make`, to put in front of `PATH`.
/// `tar` resolves `-C` against its working directory like GNU tar, and the extracted
/// `configure` rejects a relative prefix. `patch` fails for any patch whose content is `FAIL`.
pub fn fake_tools(dir: &Path) -> PathBuf {
    let bin = dir.join("fakebin");
    write_script(
        &bin.join("tar"),
        r#"dest=.
while [ $# -gt 0 ]; do
  if [ "$1" = "-C" ]; then shift; dest="$1"; fi
  shift
done
cd "$dest" || exit 2
mkdir -p gdb-7.2/gdb
cat > gdb-7.2/configure <<'EOF'
#!/bin/sh
echo configure "$@"
case "$1" in --prefix=/*) ;; *) echo "relative prefix $1" >&2; exit 1 ;; esac
EOF
chmod +x gdb-7.2/configure"#,
    );
    write_script(
        &bin.join("patch"),
        "content=$(cat)\necho \"patching with $content\"\n[ \"$content\" != FAIL ]",
    );
    write_script(&bin.join("make"), "echo make \"$@\"");
    bin
}

pub fn path_with(bin: &Path) -> String {
    format!(
        "{}:{}",
        bin.display(),
        std::env::var("PATH").unwrap_or_default()
    )
}
