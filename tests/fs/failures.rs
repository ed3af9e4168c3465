//! Disks turned off under running I/O.

use std::time::Duration;

use simfs::fs::FsError;
use simfs::units::MB;
use simfs::Result;

use crate::{default_fs, one_disk};

#[test]
fn disk_turned_off_during_write() -> Result {
    let mut t = one_disk();
    let fs = default_fs(t.disk)?;
    let disk = t.disk;

    t.sim.actor(t.host, "writer", async move {
        let mut file = fs.open("/dev/a/foo.txt", "w")?;
        let start = simfs::elapsed();

        let err = file.write(5 * MB).await.unwrap_err();
        assert!(matches!(err, FsError::StorageFailure(_)));

        // the failure is noticed when it happens, not when the write would
        // have completed
        assert_eq!(simfs::elapsed() - start, Duration::from_secs(1));
        assert_eq!(fs.file_size("/dev/a/foo.txt")?, 0);
        assert_eq!(fs.free_space_at_path("/dev/a")?, 100 * MB);
        assert_eq!(file.tell(), 0);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(simfs::is_disk_on(disk));

        // the next write starts where the failed one did
        file.write(MB).await?;
        assert_eq!(file.tell(), MB);
        assert_eq!(fs.file_size("/dev/a/foo.txt")?, MB);
        assert_eq!(fs.free_space_at_path("/dev/a")?, 99 * MB);

        Ok(())
    });

    t.sim.actor(t.host, "operator", async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        simfs::turn_off_disk(disk);
        assert!(!simfs::is_disk_on(disk));

        tokio::time::sleep(Duration::from_millis(500)).await;
        simfs::turn_on_disk(disk);

        Ok(())
    });

    t.sim.run()
}

#[test]
fn disk_off_before_the_simulation_starts() -> Result {
    let mut t = one_disk();
    let fs = default_fs(t.disk)?;

    t.sim.turn_off_disk(t.disk);
    assert!(!t.sim.is_disk_on(t.disk));

    t.sim.actor(t.host, "app", async move {
        fs.create_file("/dev/a/foo.txt", MB)?;
        let mut file = fs.open("/dev/a/foo.txt", "r")?;

        let start = simfs::elapsed();
        let err = file.read(MB).await.unwrap_err();
        assert!(matches!(err, FsError::StorageFailure(_)));
        assert_eq!(simfs::elapsed(), start);
        assert_eq!(file.tell(), 0);

        Ok(())
    });

    t.sim.run()
}

#[test]
fn brief_outage_fails_the_operation() -> Result {
    let mut t = one_disk();
    let fs = default_fs(t.disk)?;
    let disk = t.disk;

    t.sim.actor(t.host, "reader", async move {
        fs.create_file("/dev/a/foo.txt", 4 * MB)?;
        let mut file = fs.open("/dev/a/foo.txt", "r")?;

        let err = file.read(4 * MB).await.unwrap_err();
        assert!(matches!(err, FsError::StorageFailure(_)));

        Ok(())
    });

    t.sim.actor(t.host, "operator", async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        simfs::turn_off_disk(disk);
        simfs::turn_on_disk(disk);

        Ok(())
    });

    t.sim.run()
}
