//! Asynchronous and detached operations.

use std::time::Duration;

use simfs::fs::{FsError, IoSet};
use simfs::units::{KB, MB};
use simfs::Result;

use crate::{default_fs, one_disk};

#[test]
fn async_write() -> Result {
    let mut t = one_disk();
    let fs = default_fs(t.disk)?;

    t.sim.actor(t.host, "app", async move {
        let mut file = fs.open("/dev/a/foo.txt", "w")?;
        let start = simfs::elapsed();

        let mut io = file.write_async(2 * MB)?;
        assert!(!io.is_detached());

        // the position moves and the space is reserved right away, the size
        // only grows once the write completes
        assert_eq!(file.tell(), 2 * MB);
        assert_eq!(fs.free_space_at_path("/dev/a")?, 98 * MB);
        assert_eq!(fs.file_size("/dev/a/foo.txt")?, 0);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!io.is_done());
        assert_eq!(io.bytes_done(), 0);

        assert_eq!(io.wait().await?, 2 * MB);
        assert_eq!(simfs::elapsed() - start, Duration::from_secs(2));
        assert!(io.is_done());
        assert_eq!(io.bytes_done(), 2 * MB);
        assert_eq!(fs.file_size("/dev/a/foo.txt")?, 2 * MB);

        // waiting again returns the same outcome
        assert_eq!(io.wait().await?, 2 * MB);

        file.close()?;
        Ok(())
    });

    t.sim.run()
}

#[test]
fn concurrent_operations() -> Result {
    let mut t = one_disk();
    let fs = default_fs(t.disk)?;

    t.sim.actor(t.host, "app", async move {
        fs.create_file("/dev/a/in.txt", 4 * MB)?;
        let mut input = fs.open("/dev/a/in.txt", "r")?;
        let mut output = fs.open("/dev/a/out.txt", "w")?;

        let start = simfs::elapsed();

        let mut ios = IoSet::new();
        ios.push(input.read_async(4 * MB)?);
        ios.push(output.write_async(MB)?);
        ios.push(output.write_async(MB)?);
        assert_eq!(ios.len(), 3);
        assert_eq!(ios.bytes_done(), 0);

        assert_eq!(ios.wait_all().await?, [4 * MB, MB, MB]);
        assert_eq!(ios.bytes_done(), 6 * MB);

        // operations overlap: the set lasts as long as the longest one
        assert_eq!(simfs::elapsed() - start, Duration::from_secs(2));
        assert_eq!(fs.file_size("/dev/a/out.txt")?, 2 * MB);

        Ok(())
    });

    t.sim.run()
}

#[test]
fn detached_write_outlives_its_actor() -> Result {
    let mut t = one_disk();
    let fs = default_fs(t.disk)?;
    let handle = fs.clone();

    t.sim.actor(t.host, "app", async move {
        let mut file = fs.open("/dev/a/foo.txt", "w")?;
        let io = file.write_detached(5 * MB)?;
        assert!(io.is_detached());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(io.bytes_done(), 0);
        assert_eq!(fs.file_size("/dev/a/foo.txt")?, 0);

        Ok(())
    });

    t.sim.run()?;

    assert!(t.sim.elapsed() >= Duration::from_secs(5));
    assert_eq!(handle.file_size("/dev/a/foo.txt")?, 5 * MB);
    assert_eq!(handle.num_open_files(), 0);

    Ok(())
}

#[test]
fn failed_writes_release_their_reservation() -> Result {
    let mut t = one_disk();
    let fs = default_fs(t.disk)?;
    let disk = t.disk;

    t.sim.actor(t.host, "app", async move {
        let mut file = fs.open("/dev/a/foo.txt", "w")?;
        file.write(KB).await?;

        simfs::turn_off_disk(disk);

        let mut io = file.write_async(MB)?;
        assert_eq!(fs.free_space_at_path("/dev/a")?, 100 * MB - KB - MB);

        let err = io.wait().await.unwrap_err();
        assert!(matches!(err, FsError::StorageFailure(_)));
        assert_eq!(io.bytes_done(), 0);
        assert_eq!(fs.free_space_at_path("/dev/a")?, 100 * MB - KB);
        assert_eq!(fs.file_size("/dev/a/foo.txt")?, KB);

        Ok(())
    });

    t.sim.run()
}
