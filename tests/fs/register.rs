//! File system registration against zones.

use simfs::fs::{FileSystem, FsError};
use simfs::{HostId, Result, Sim, ZoneId};

/// Three zones under a common one, with a host each.
fn platform() -> (Sim, ZoneId, Vec<ZoneId>, Vec<HostId>) {
    let mut sim = simfs::Builder::new().build();
    let root = sim.zone("root_zone", sim.root_zone());

    let mut zones = Vec::new();
    let mut hosts = Vec::new();
    for i in 0..3 {
        let zone = sim.zone(format!("my_zone_{i}"), root);
        zones.push(zone);
        hosts.push(sim.host(format!("host_{i}"), zone, 1e9));
    }

    (sim, root, zones, hosts)
}

#[test]
fn reachable_file_systems() -> Result {
    let (mut sim, root, zones, hosts) = platform();

    sim.register_file_system(Some(root), &FileSystem::create("my_fs"))?;
    sim.register_file_system(Some(zones[0]), &FileSystem::create("my_extra_fs"))?;

    assert_eq!(sim.file_systems_by_zone(root).len(), 1);
    assert_eq!(sim.file_systems_by_zone(zones[0]).len(), 1);
    assert!(sim.file_systems_by_zone(zones[1]).is_empty());
    assert!(sim.file_systems_by_zone(sim.root_zone()).is_empty());

    for (i, host) in hosts.iter().copied().enumerate() {
        sim.actor(host, format!("actor_{i}"), async move {
            let reachable = simfs::file_systems_by_actor(simfs::current_actor().as_ref());
            let expected = if i == 0 { 2 } else { 1 };
            assert_eq!(reachable.len(), expected);
            assert!(reachable.contains_key("my_fs"));

            Ok(())
        });
    }

    sim.actor(hosts[0], "observer", async move {
        assert!(simfs::file_systems_by_actor(None).is_empty());
        assert_eq!(simfs::file_systems_by_zone(root).len(), 1);
        Ok(())
    });

    sim.run()
}

#[test]
fn registration_from_actors() -> Result {
    let (mut sim, root, zones, hosts) = platform();
    let world = sim.root_zone();

    sim.register_file_system(None, &FileSystem::create("global_fs"))?;
    assert_eq!(sim.file_systems_by_zone(world).len(), 1);

    let err = sim
        .register_file_system(None, &FileSystem::create("global_fs"))
        .unwrap_err();
    assert!(matches!(err, FsError::InvalidArgument(_)));

    // the same name may be registered on different zones
    sim.register_file_system(Some(root), &FileSystem::create("global_fs"))?;

    let zone = zones[2];
    sim.actor(hosts[2], "registrar", async move {
        simfs::register_file_system(Some(zone), &FileSystem::create("local_fs"))?;

        let reachable = simfs::file_systems_by_actor(simfs::current_actor().as_ref());
        assert_eq!(
            reachable.keys().collect::<Vec<_>>(),
            ["local_fs", "global_fs"]
        );
        assert_eq!(simfs::file_systems_by_actor(None).len(), 1);

        Ok(())
    });

    sim.run()?;

    assert!(sim.file_systems_by_zone(zone).contains_key("local_fs"));
    Ok(())
}
