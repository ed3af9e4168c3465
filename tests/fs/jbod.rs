//! RAID arrays.

use std::rc::Rc;
use std::time::Duration;

use simfs::fs::{CachingScheme, FileSystem, FsError, JbodStorage, Raid};
use simfs::units::MB;
use simfs::{DiskId, HostId, Result, Sim};
use test_case::test_case;

/// A server with four disks reading at 2MB/s and writing at 1MB/s, and a
/// client reaching it over a 120MB/s link.
struct Platform {
    sim: Sim,
    client: HostId,
    server: HostId,
    disks: Vec<DiskId>,
}

fn platform() -> Platform {
    let mut sim = simfs::Builder::new().link_bandwidth(120e6).build();
    let zone = sim.zone("zone", sim.root_zone());
    let client = sim.host("client", zone, 100e9);
    let server = sim.host("fs_server", zone, 200e6);
    let disks = (0..4)
        .map(|i| sim.disk(server, format!("disk{i}"), 2e6, 1e6))
        .collect();

    Platform {
        sim,
        client,
        server,
        disks,
    }
}

fn jbod_fs(storage: &Rc<JbodStorage>) -> Result<Rc<FileSystem>> {
    let fs = FileSystem::create("fs");
    fs.mount_partition("/dev/a", storage, 100 * MB, CachingScheme::None)?;
    Ok(fs)
}

#[test_case(Raid::Raid0, 12 * MB, 3100, 1600; "raid0")]
#[test_case(Raid::Raid1, 6 * MB, 6050, 3050; "raid1")]
#[test_case(Raid::Raid4, 6 * MB, 2060, 1050; "raid4")]
#[test_case(Raid::Raid5, 12 * MB, 4120, 2100; "raid5")]
#[test_case(Raid::Raid6, 6 * MB, 3080, 1550; "raid6")]
fn remote_write_then_read(level: Raid, bytes: u64, write_ms: u64, read_ms: u64) -> Result {
    let mut p = platform();
    let jbod = JbodStorage::create("jbod", p.disks.clone())?;
    jbod.set_raid_level(level)?;
    let fs = jbod_fs(&jbod)?;

    p.sim.actor(p.client, "client", async move {
        let start = simfs::elapsed();
        let mut file = fs.open("/dev/a/foo.txt", "w")?;
        assert_eq!(file.write(bytes).await?, bytes);
        file.close()?;
        assert_eq!(
            simfs::elapsed() - start,
            Duration::from_millis(write_ms)
        );

        let start = simfs::elapsed();
        let mut file = fs.open("/dev/a/foo.txt", "r")?;
        assert_eq!(file.read(bytes).await?, bytes);
        file.close()?;
        assert_eq!(simfs::elapsed() - start, Duration::from_millis(read_ms));

        Ok(())
    });

    p.sim.run()
}

#[test]
fn local_access_skips_the_network() -> Result {
    let mut p = platform();
    let jbod = JbodStorage::create("jbod", p.disks.clone())?;
    jbod.set_raid_level(Raid::Raid5)?;
    let fs = jbod_fs(&jbod)?;

    p.sim.actor(p.server, "local", async move {
        fs.create_file("/dev/a/foo.txt", 12 * MB)?;
        let mut file = fs.open("/dev/a/foo.txt", "r")?;

        let start = simfs::elapsed();
        file.read(12 * MB).await?;
        assert_eq!(simfs::elapsed() - start, Duration::from_secs(2));

        Ok(())
    });

    p.sim.run()
}

#[test]
fn parity_cost_is_configurable() -> Result {
    let mut p = platform();
    let jbod = JbodStorage::create("jbod", p.disks.clone())?;
    jbod.set_raid_level(Raid::Raid5)?;
    assert_eq!(jbod.parity_flops_per_byte(), 1.0);
    jbod.set_parity_flops_per_byte(10.0)?;
    assert!(matches!(
        jbod.set_parity_flops_per_byte(-1.0),
        Err(FsError::InvalidArgument(_))
    ));
    let fs = jbod_fs(&jbod)?;

    p.sim.actor(p.server, "local", async move {
        let mut file = fs.open("/dev/a/foo.txt", "w")?;

        // 4MB stripes: 40Mf at 200Mf/s, then 4s on the disks
        let start = simfs::elapsed();
        file.write(12 * MB).await?;
        assert_eq!(simfs::elapsed() - start, Duration::from_millis(4200));

        Ok(())
    });

    p.sim.run()
}

#[test]
fn raid6_parity_rotates_with_writes() -> Result {
    let mut p = platform();
    let jbod = JbodStorage::create("jbod", p.disks.clone())?;
    jbod.set_raid_level(Raid::Raid6)?;
    let fs = jbod_fs(&jbod)?;
    let disks = p.disks.clone();

    p.sim.actor(p.server, "local", async move {
        let mut file = fs.open("/dev/a/foo.txt", "w")?;

        let mut expected = Vec::new();
        let mut seen = Vec::new();
        for first in [2, 1, 0, 3, 2] {
            file.write(2 * MB).await?;
            expected.push(vec![disks[first], disks[(first + 1) % 4]]);
            seen.push(jbod.parity_disks());
        }
        assert_eq!(seen, expected);

        // reads leave the rotation alone
        file.close()?;
        let mut file = fs.open("/dev/a/foo.txt", "r")?;
        file.read(4 * MB).await?;
        assert_eq!(jbod.parity_disks(), expected[4]);

        Ok(())
    });

    p.sim.run()
}

#[test]
fn degraded_configurations() -> Result {
    let mut p = platform();

    let err = JbodStorage::create("jbod", vec![p.disks[0]]).unwrap_err();
    assert!(matches!(err, FsError::InvalidArgument(_)));

    let other = p.sim.disk(p.client, "elsewhere", 2e6, 1e6);
    let err = JbodStorage::create("jbod", vec![p.disks[0], other]).unwrap_err();
    assert!(matches!(err, FsError::InvalidArgument(_)));

    let jbod = JbodStorage::create("jbod", p.disks[..3].to_vec())?;
    let err = jbod.set_raid_level(Raid::Raid6).unwrap_err();
    assert!(matches!(err, FsError::InvalidArgument(_)));
    assert_eq!(jbod.raid_level(), Raid::Raid0);

    jbod.set_raid_level(Raid::Raid3)?;
    let fs = jbod_fs(&jbod)?;

    p.sim.actor(p.server, "local", async move {
        let mut file = fs.open("/dev/a/foo.txt", "w")?;
        let err = file.write(MB).await.unwrap_err();
        assert!(matches!(err, FsError::InvalidArgument(_)));

        // nothing was written, nothing is reserved
        assert_eq!(fs.free_space_at_path("/dev/a")?, 100 * MB);
        assert_eq!(fs.file_size("/dev/a/foo.txt")?, 0);

        Ok(())
    });

    p.sim.run()
}

#[test]
fn failure_of_one_disk_fails_the_array() -> Result {
    let mut p = platform();
    let jbod = JbodStorage::create("jbod", p.disks.clone())?;
    let fs = jbod_fs(&jbod)?;
    let disk = p.disks[3];

    p.sim.actor(p.server, "local", async move {
        let mut file = fs.open("/dev/a/foo.txt", "w")?;
        file.write(4 * MB).await?;

        simfs::turn_off_disk(disk);
        let err = file.write(4 * MB).await.unwrap_err();
        assert!(matches!(err, FsError::StorageFailure(_)));
        assert_eq!(fs.file_size("/dev/a/foo.txt")?, 4 * MB);

        Ok(())
    });

    p.sim.run()
}

#[test]
fn striping_beats_a_single_disk() -> Result {
    let mut sim = simfs::Builder::new().build();
    let zone = sim.zone("zone", sim.root_zone());
    let host = sim.host("host", zone, 1e9);
    let striped = vec![
        sim.disk(host, "d0", 2e6, 1e6),
        sim.disk(host, "d1", 2e6, 1e6),
    ];
    let single = sim.disk(host, "single", 2e6, 1e6);

    let fs = FileSystem::create("fs");
    fs.mount_partition(
        "/dev/raid",
        JbodStorage::create("raid0", striped)?,
        100 * MB,
        CachingScheme::None,
    )?;
    fs.mount_partition(
        "/dev/single",
        simfs::fs::OneDiskStorage::create("single", single),
        100 * MB,
        CachingScheme::None,
    )?;

    sim.actor(host, "app", async move {
        let mut timings = Vec::new();

        for path in ["/dev/raid/foo", "/dev/single/foo"] {
            let mut file = fs.open(path, "w")?;
            let start = simfs::elapsed();
            file.write(10 * MB).await?;
            timings.push(simfs::elapsed() - start);
        }

        assert_eq!(timings, [Duration::from_secs(5), Duration::from_secs(10)]);
        assert!(timings[0] < timings[1]);

        Ok(())
    });

    sim.run()
}
