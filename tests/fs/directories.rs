//! Directory operations and moves.

use simfs::fs::{CachingScheme, ErrorKind, FsError, OneDiskStorage};
use simfs::units::{KB, MB};
use simfs::Result;

use crate::{default_fs, one_disk};

#[test]
fn directories() -> Result {
    let mut t = one_disk();
    let fs = default_fs(t.disk)?;

    t.sim.actor(t.host, "app", async move {
        assert!(fs.directory_exists("/dev/a"));
        assert!(!fs.directory_exists("/dev/a/dir"));

        fs.create_directory("/dev/a/dir")?;
        assert!(fs.directory_exists("/dev/a/dir/"));
        assert!(fs.files_in_directory("/dev/a/dir")?.is_empty());

        let err = fs.create_directory("/dev/a/dir").unwrap_err();
        assert!(matches!(err, FsError::DirectoryAlreadyExists(_)));

        // parents are created along with files
        fs.create_file("/dev/a/dir/b.txt", KB)?;
        fs.create_file("/dev/a/dir/a.txt", KB)?;
        fs.create_file("/dev/a/dir/sub/c.txt", KB)?;
        assert!(fs.directory_exists("/dev/a/dir/sub"));
        assert_eq!(fs.files_in_directory("/dev/a/dir")?, ["a.txt", "b.txt"]);
        assert_eq!(fs.files_in_directory("/dev/a/./dir/sub/..")?, ["a.txt", "b.txt"]);

        let err = fs.files_in_directory("/dev/a/nope").unwrap_err();
        assert!(matches!(err, FsError::DirectoryDoesNotExist(_)));

        let err = fs.create_file("/dev/a/dir", KB).unwrap_err();
        assert!(matches!(err, FsError::InvalidPath(_)));
        let err = fs.create_directory("/dev/a/dir/a.txt/inner").unwrap_err();
        assert!(matches!(err, FsError::InvalidPath(_)));

        Ok(())
    });

    t.sim.run()
}

#[test]
fn unlink_directory() -> Result {
    let mut t = one_disk();
    let fs = default_fs(t.disk)?;

    t.sim.actor(t.host, "app", async move {
        fs.create_file("/dev/a/dir/a.txt", MB)?;
        fs.create_file("/dev/a/dir/sub/b.txt", MB)?;
        fs.create_file("/dev/a/dirty.txt", MB)?;

        let file = fs.open("/dev/a/dir/sub/b.txt", "r")?;
        let err = fs.unlink_directory("/dev/a/dir").unwrap_err();
        assert!(matches!(err, FsError::FileIsOpen(_)));
        assert!(fs.file_exists("/dev/a/dir/a.txt"));
        drop(file);

        fs.unlink_directory("/dev/a/dir")?;
        assert!(!fs.directory_exists("/dev/a/dir"));
        assert!(!fs.directory_exists("/dev/a/dir/sub"));
        assert!(!fs.file_exists("/dev/a/dir/a.txt"));
        assert!(fs.file_exists("/dev/a/dirty.txt"));
        assert_eq!(fs.free_space_at_path("/dev/a")?, 99 * MB);

        let err = fs.unlink_directory("/dev/a/dir").unwrap_err();
        assert!(matches!(err, FsError::DirectoryDoesNotExist(_)));

        Ok(())
    });

    t.sim.run()
}

#[test]
fn move_file() -> Result {
    let mut t = one_disk();
    let fs = default_fs(t.disk)?;
    let storage = OneDiskStorage::create("other", t.disk);
    fs.mount_partition("/dev/b", storage, 100 * MB, CachingScheme::None)?;

    t.sim.actor(t.host, "app", async move {
        fs.create_file("/dev/a/foo.txt", 10 * MB)?;
        fs.create_file("/dev/a/bar.txt", 30 * MB)?;

        fs.move_file("/dev/a/foo.txt", "/dev/a/dir/../foo.txt")?;
        assert!(fs.file_exists("/dev/a/foo.txt"));

        fs.move_file("/dev/a/foo.txt", "/dev/a/dir/foo.txt")?;
        assert!(!fs.file_exists("/dev/a/foo.txt"));
        assert_eq!(fs.file_size("/dev/a/dir/foo.txt")?, 10 * MB);
        assert_eq!(fs.free_space_at_path("/dev/a")?, 60 * MB);

        // replacing a file reclaims its bytes
        fs.move_file("/dev/a/dir/foo.txt", "/dev/a/bar.txt")?;
        assert!(!fs.file_exists("/dev/a/dir/foo.txt"));
        assert_eq!(fs.file_size("/dev/a/bar.txt")?, 10 * MB);
        assert_eq!(fs.free_space_at_path("/dev/a")?, 90 * MB);

        let err = fs.move_file("/dev/a/nope.txt", "/dev/a/bar.txt").unwrap_err();
        assert!(matches!(err, FsError::FileNotFound(_)));

        // moving a missing file onto itself is still an error
        let err = fs.move_file("/dev/a/nope.txt", "/dev/a/./nope.txt").unwrap_err();
        assert!(matches!(err, FsError::FileNotFound(_)));

        let err = fs.move_file("/dev/a/bar.txt", "/dev/b/bar.txt").unwrap_err();
        assert!(matches!(err, FsError::InvalidMove { .. }));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = fs.move_file("/dev/a/bar.txt", "/dev/a/dir").unwrap_err();
        assert!(matches!(err, FsError::InvalidPath(_)));

        fs.create_file("/dev/a/baz.txt", MB)?;
        let file = fs.open("/dev/a/baz.txt", "r")?;
        let err = fs.move_file("/dev/a/bar.txt", "/dev/a/baz.txt").unwrap_err();
        assert!(matches!(err, FsError::FileIsOpen(_)));
        let err = fs.move_file("/dev/a/baz.txt", "/dev/a/qux.txt").unwrap_err();
        assert!(matches!(err, FsError::FileIsOpen(_)));
        drop(file);

        assert!(fs.file_exists("/dev/a/bar.txt"));
        assert!(fs.file_exists("/dev/a/baz.txt"));

        Ok(())
    });

    t.sim.run()
}
