use std::{fs, path::Path, time::Duration};

use pitherm_lib::{init_state, resolve_device, serve_until, settings::Settings};
use tokio_util::sync::CancellationToken;

const FRAME: &str = "72 01 4b 46 7f ff 0e 10 57 : crc=57 YES\n72 01 4b 46 7f ff 0e 10 57 t=23125\n";

fn add_device(devices: &Path, name: &str, frame: Option<&str>) {
    let dir = devices.join(name);
    fs::create_dir_all(&dir).unwrap();
    if let Some(frame) = frame {
        fs::write(dir.join("w1_slave"), frame).unwrap();
    }
}

fn settings_for(root: &Path) -> Settings {
    Settings {
        devices_dir: root.join("devices"),
        database_path: root.join("data").join("piTemps.db"),
        ..Settings::default()
    }
}

#[test]
fn test_resolve_prefers_configured_path() {
    let root = tempfile::tempdir().unwrap();
    let settings = Settings {
        device_path: Some(root.path().join("custom")),
        devices_dir: root.path().join("does-not-exist"),
        ..Settings::default()
    };

    let device = resolve_device(&settings).unwrap();
    assert_eq!(device.path(), root.path().join("custom"));
}

#[test]
fn test_resolve_discovers_first_slave() {
    let root = tempfile::tempdir().unwrap();
    let devices = root.path().join("devices");
    add_device(&devices, "w1_bus_master1", None);
    add_device(&devices, "28-0000075f1c2b", Some(FRAME));
    add_device(&devices, "28-0000075e9a11", Some(FRAME));

    let device = resolve_device(&settings_for(root.path())).unwrap();
    assert_eq!(device.path(), devices.join("28-0000075e9a11").join("w1_slave"));
}

#[test]
fn test_no_device_is_fatal() {
    let root = tempfile::tempdir().unwrap();
    add_device(&root.path().join("devices"), "w1_bus_master1", None);

    assert!(init_state(settings_for(root.path())).is_err());
}

#[test]
fn test_unreadable_device_is_fatal() {
    let root = tempfile::tempdir().unwrap();
    add_device(&root.path().join("devices"), "28-0000075f1c2b", None);

    let err = init_state(settings_for(root.path())).err().unwrap();
    assert!(format!("{err:#}").contains("is not readable"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_serve_until_samples_at_startup_and_shuts_down() {
    let root = tempfile::tempdir().unwrap();
    add_device(&root.path().join("devices"), "28-0000075f1c2b", Some(FRAME));

    let settings = Settings {
        port: 0,
        ..settings_for(root.path())
    };
    let state = init_state(settings).unwrap();
    let db = state.db.clone();
    let latest = state.latest.clone();

    let shutdown = CancellationToken::new();
    let running = tokio::spawn(serve_until(state, shutdown.clone()));

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while db.count_readings().await.unwrap() == 0 {
        assert!(tokio::time::Instant::now() < deadline, "no startup sample");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(latest.celsius(), Some(23.1));

    shutdown.cancel();
    running.await.unwrap().unwrap();
    assert_eq!(db.count_readings().await.unwrap(), 1);
}
